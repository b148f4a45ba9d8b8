use std::collections::HashSet;

use serde::Deserialize;

use crate::user;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    SetOnline,
    SetOffline,
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct Frame {
    pub token: String,
    pub action: Action,
}

/// Users this socket has put online; they go offline when it closes.
#[derive(Default, Debug)]
pub struct Presence(HashSet<user::Id>);

impl Presence {
    pub fn apply(&mut self, id: user::Id, action: Action) {
        match action {
            Action::SetOnline => self.0.insert(id),
            Action::SetOffline => self.0.remove(&id),
        };
    }

    pub fn drain(&mut self) -> impl Iterator<Item = user::Id> + '_ {
        self.0.drain()
    }
}
