use chrono::NaiveDateTime;
use diesel::prelude::{Insertable, Queryable, Selectable};
use serde::Serialize;

use crate::user;

use super::Id;

#[derive(Queryable, Selectable, Clone, Debug)]
#[diesel(table_name = crate::schema::chats)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Chat {
    id: Id,
    title: Option<String>,
    description: Option<String>,
    group_avatar: Option<String>,
    is_group_chat: bool,
    created_at: NaiveDateTime,
}

impl Chat {
    pub const fn id(&self) -> Id {
        self.id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn group_avatar(&self) -> Option<&str> {
        self.group_avatar.as_deref()
    }

    pub const fn is_group(&self) -> bool {
        self.is_group_chat
    }

    pub const fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }
}

/// Canonical `"<min>:<max>"` key of an unordered user pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectKey(String);

impl DirectKey {
    pub fn new(a: user::Id, b: user::Id) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("{lo}:{hi}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Sorted, duplicate free member id set of a group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberSignature(Vec<user::Id>);

impl MemberSignature {
    pub fn new(members: impl IntoIterator<Item = user::Id>) -> Self {
        let mut ids: Vec<user::Id> = members.into_iter().collect();
        ids.sort();
        ids.dedup();
        Self(ids)
    }

    pub fn ids(&self) -> &[user::Id] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn raw(&self) -> Vec<i32> {
        self.0.iter().map(user::Id::get).collect()
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::chats)]
pub struct NewChat<'a> {
    title: Option<&'a str>,
    description: Option<&'a str>,
    group_avatar: Option<&'a str>,
    is_group_chat: bool,
    direct_key: Option<&'a str>,
}

impl<'a> NewChat<'a> {
    pub fn direct(key: &'a DirectKey) -> Self {
        Self {
            title: None,
            description: None,
            group_avatar: None,
            is_group_chat: false,
            direct_key: Some(key.as_str()),
        }
    }

    pub fn group(title: &'a str, description: &'a str, group_avatar: Option<&'a str>) -> Self {
        Self {
            title: Some(title),
            description: Some(description),
            group_avatar,
            is_group_chat: true,
            direct_key: None,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::chat_users)]
pub struct NewMember {
    chat_id: Id,
    user_id: user::Id,
}

impl NewMember {
    pub const fn new(chat_id: Id, user_id: user::Id) -> Self {
        Self { chat_id, user_id }
    }
}

/// A viewer's own row in a chat.
#[derive(Queryable, Selectable, Clone, Debug)]
#[diesel(table_name = crate::schema::chat_users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Membership {
    chat_id: Id,
    user_id: user::Id,
    added_at: NaiveDateTime,
    is_favourite: bool,
}

impl Membership {
    pub const fn chat_id(&self) -> Id {
        self.chat_id
    }

    pub const fn user_id(&self) -> user::Id {
        self.user_id
    }

    pub const fn added_at(&self) -> NaiveDateTime {
        self.added_at
    }

    pub const fn is_favourite(&self) -> bool {
        self.is_favourite
    }
}

/// A chat member joined with their user row.
#[derive(Queryable, Clone, Debug)]
pub struct Member {
    pub user_id: user::Id,
    pub username: String,
    pub avatar: Option<String>,
    pub bio: String,
    pub is_online: bool,
    pub added_at: NaiveDateTime,
}

/// Group creation request after the creator has been folded in.
#[derive(Clone, Debug, Default)]
pub struct GroupDraft {
    pub members: Vec<user::Id>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OtherUser {
    pub user_id: user::Id,
    pub username: String,
    pub avatar: Option<String>,
    pub is_online: bool,
}

impl From<Member> for OtherUser {
    fn from(m: Member) -> Self {
        Self {
            user_id: m.user_id,
            username: m.username,
            avatar: m.avatar,
            is_online: m.is_online,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Header {
    #[serde(rename_all = "camelCase")]
    Direct { chat_id: Id, other_user: OtherUser },
    #[serde(rename_all = "camelCase")]
    Group {
        chat_id: Id,
        title: String,
        group_avatar: Option<String>,
        members: Vec<String>,
    },
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub user_id: user::Id,
    pub username: String,
    pub avatar: Option<String>,
    pub bio: String,
}

impl From<Member> for GroupMember {
    fn from(m: Member) -> Self {
        Self {
            user_id: m.user_id,
            username: m.username,
            avatar: m.avatar,
            bio: m.bio,
        }
    }
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GroupProfile {
    pub title: String,
    pub description: Option<String>,
    pub group_avatar: Option<String>,
    pub created_at: NaiveDateTime,
    pub added_at: NaiveDateTime,
    pub is_favourite: bool,
    pub members: Vec<GroupMember>,
}

/// Group shown on a user profile.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub chat_id: Id,
    pub title: String,
    pub group_avatar: Option<String>,
    pub members: Vec<String>,
}
