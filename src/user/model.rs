use chrono::NaiveDateTime;
use diesel::prelude::{Insertable, Queryable, Selectable};
use serde::Serialize;

use crate::chat::model::GroupSummary;

use super::Id;

#[derive(Queryable, Selectable, Clone, Debug)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    id: Id,
    username: String,
    password: String,
    avatar: Option<String>,
    bio: String,
    is_online: bool,
    created_at: NaiveDateTime,
}

impl User {
    pub const fn id(&self) -> Id {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Password hash in PHC string format.
    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }

    pub fn bio(&self) -> &str {
        &self.bio
    }

    pub const fn is_online(&self) -> bool {
        self.is_online
    }

    pub const fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser<'a> {
    username: &'a str,
    password: &'a str,
}

impl<'a> NewUser<'a> {
    pub fn new(username: &'a str, password: &'a str) -> Self {
        Self { username, password }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub user_id: Id,
    pub username: String,
    pub avatar: Option<String>,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            user_id: u.id,
            username: u.username,
            avatar: u.avatar,
        }
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct Me {
    pub username: String,
    pub avatar: Option<String>,
}

impl From<User> for Me {
    fn from(u: User) -> Self {
        Self {
            username: u.username,
            avatar: u.avatar,
        }
    }
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub username: String,
    pub bio: String,
    pub avatar: Option<String>,
    pub created_at: NaiveDateTime,
    pub is_online: bool,
}

impl From<User> for Settings {
    fn from(u: User) -> Self {
        Self {
            username: u.username,
            bio: u.bio,
            avatar: u.avatar,
            created_at: u.created_at,
            is_online: u.is_online,
        }
    }
}

/// Another user as seen by the viewer.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: Id,
    pub username: String,
    pub avatar: Option<String>,
    pub bio: String,
    pub is_online: bool,
    pub added_at: Option<NaiveDateTime>,
    pub is_favourite: bool,
    pub groups_in: Vec<GroupSummary>,
}
