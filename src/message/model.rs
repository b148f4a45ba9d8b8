use chrono::NaiveDateTime;
use diesel::prelude::{Insertable, Queryable, Selectable};
use serde::Serialize;

use crate::receipt::model::Reader;
use crate::{chat, user};

use super::{Content, Id};

#[derive(Queryable, Selectable, Serialize, Clone, Debug, PartialEq)]
#[diesel(table_name = crate::schema::messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Message {
    id: Id,
    chat_id: chat::Id,
    user_id: user::Id,
    message: String,
    is_image: bool,
    created_at: NaiveDateTime,
}

impl Message {
    pub const fn id(&self) -> Id {
        self.id
    }

    pub const fn chat_id(&self) -> chat::Id {
        self.chat_id
    }

    pub const fn user_id(&self) -> user::Id {
        self.user_id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn is_image(&self) -> bool {
        self.is_image
    }

    pub const fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::messages)]
pub struct NewMessage<'a> {
    chat_id: chat::Id,
    user_id: user::Id,
    message: &'a str,
    is_image: bool,
}

impl<'a> NewMessage<'a> {
    pub fn new(chat_id: chat::Id, user_id: user::Id, content: &'a Content) -> Self {
        Self {
            chat_id,
            user_id,
            message: content.as_str(),
            is_image: content.is_image(),
        }
    }

    pub const fn chat_id(&self) -> chat::Id {
        self.chat_id
    }
}

/// A message joined with its author's name and avatar.
#[derive(Clone, Debug)]
pub struct Authored {
    pub message: Message,
    pub username: String,
    pub avatar: Option<String>,
}

impl From<(Message, String, Option<String>)> for Authored {
    fn from((message, username, avatar): (Message, String, Option<String>)) -> Self {
        Self {
            message,
            username,
            avatar,
        }
    }
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// Transcript entry as rendered for one viewer.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: Id,
    pub user_id: user::Id,
    pub username: String,
    pub avatar: Option<String>,
    pub message: String,
    pub is_image: bool,
    pub created_at: NaiveDateTime,
    pub direction: Direction,
    pub read_by: Vec<Reader>,
}

impl MessageDto {
    pub fn new(a: Authored, viewer: user::Id, read_by: Vec<Reader>) -> Self {
        let direction = if a.message.user_id == viewer {
            Direction::Outgoing
        } else {
            Direction::Incoming
        };

        Self {
            id: a.message.id,
            user_id: a.message.user_id,
            username: a.username,
            avatar: a.avatar,
            message: a.message.message,
            is_image: a.message.is_image,
            created_at: a.message.created_at,
            direction,
            read_by,
        }
    }
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Posted {
    #[serde(flatten)]
    pub message: Message,
    pub image_url: Option<String>,
}

impl From<Message> for Posted {
    fn from(message: Message) -> Self {
        let image_url = message.is_image.then(|| message.message.clone());
        Self { message, image_url }
    }
}
