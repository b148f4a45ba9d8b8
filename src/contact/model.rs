use std::collections::HashMap;

use chrono::NaiveDateTime;
use diesel::QueryableByName;
use diesel::sql_types::{BigInt, Bool, Integer, Nullable, Text, Timestamp};
use serde::Serialize;

use crate::{chat, message, user};

use super::Error;

/// Raw per-chat aggregate, one per membership of the viewer.
#[derive(QueryableByName, Clone, Debug)]
pub struct SummaryRow {
    #[diesel(sql_type = Integer)]
    pub chat_id: chat::Id,
    #[diesel(sql_type = Bool)]
    pub is_group_chat: bool,
    #[diesel(sql_type = Nullable<Text>)]
    pub title: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub group_avatar: Option<String>,
    #[diesel(sql_type = Bool)]
    pub is_favourite: bool,

    #[diesel(sql_type = Nullable<Integer>)]
    pub peer_id: Option<user::Id>,
    #[diesel(sql_type = Nullable<Text>)]
    pub peer_username: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub peer_avatar: Option<String>,
    #[diesel(sql_type = Nullable<Bool>)]
    pub peer_online: Option<bool>,

    #[diesel(sql_type = Nullable<Integer>)]
    pub last_id: Option<message::Id>,
    #[diesel(sql_type = Nullable<Text>)]
    pub last_message: Option<String>,
    #[diesel(sql_type = Nullable<Bool>)]
    pub last_is_image: Option<bool>,
    #[diesel(sql_type = Nullable<Timestamp>)]
    pub last_created_at: Option<NaiveDateTime>,
    #[diesel(sql_type = Nullable<Text>)]
    pub last_sender: Option<String>,

    #[diesel(sql_type = BigInt)]
    pub unread: i64,
    #[diesel(sql_type = Bool)]
    pub read_last: bool,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Peer {
    #[serde(rename_all = "camelCase")]
    Direct {
        user_id: user::Id,
        username: String,
        avatar: Option<String>,
        is_online: bool,
    },
    #[serde(rename_all = "camelCase")]
    Group {
        title: String,
        group_avatar: Option<String>,
        members: Vec<String>,
    },
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LastMessage {
    pub id: message::Id,
    pub message: String,
    pub is_image: bool,
    pub created_at: NaiveDateTime,
    pub sender: Option<String>,
}

/// One entry of the viewer's chat list.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContactDto {
    pub chat_id: chat::Id,
    #[serde(flatten)]
    pub peer: Peer,
    pub last_message: Option<LastMessage>,
    pub unread_messages: i64,
    pub read_last_message: bool,
    pub is_favourite: bool,
}

impl SummaryRow {
    fn into_contact(self, members: Option<Vec<String>>) -> super::Result<ContactDto> {
        let peer = if self.is_group_chat {
            Peer::Group {
                title: self.title.unwrap_or_default(),
                group_avatar: self.group_avatar,
                members: members.unwrap_or_default(),
            }
        } else {
            match (self.peer_id, self.peer_username) {
                (Some(user_id), Some(username)) => Peer::Direct {
                    user_id,
                    username,
                    avatar: self.peer_avatar,
                    is_online: self.peer_online.unwrap_or(false),
                },
                _ => return Err(Error::Integrity(self.chat_id)),
            }
        };

        let last_message = match (self.last_id, self.last_message, self.last_created_at) {
            (Some(id), Some(message), Some(created_at)) => Some(LastMessage {
                id,
                message,
                is_image: self.last_is_image.unwrap_or(false),
                created_at,
                sender: self.last_sender,
            }),
            _ => None,
        };

        Ok(ContactDto {
            chat_id: self.chat_id,
            peer,
            read_last_message: last_message.is_some() && self.read_last,
            last_message,
            unread_messages: self.unread,
            is_favourite: self.is_favourite,
        })
    }
}

/// Turns raw rows into tagged contacts, keeping row order.
pub fn assemble(
    rows: Vec<SummaryRow>,
    mut members: HashMap<chat::Id, Vec<String>>,
) -> super::Result<Vec<ContactDto>> {
    rows.into_iter()
        .map(|row| {
            let names = members.remove(&row.chat_id);
            row.into_contact(names)
        })
        .collect()
}
