use crate::{chat, user};

use super::Repository;
use super::model::{ContactDto, assemble};

#[async_trait::async_trait]
pub trait ContactService {
    async fn find_contacts(&self, viewer: user::Id) -> super::Result<Vec<ContactDto>>;
}

#[derive(Clone)]
pub struct ContactServiceImpl {
    repo: Repository,
    chat_repo: chat::Repository,
}

impl ContactServiceImpl {
    pub fn new(repo: Repository, chat_repo: chat::Repository) -> Self {
        Self { repo, chat_repo }
    }
}

#[async_trait::async_trait]
impl ContactService for ContactServiceImpl {
    async fn find_contacts(&self, viewer: user::Id) -> super::Result<Vec<ContactDto>> {
        let rows = self.repo.find_summaries(viewer)?;

        let groups = rows
            .iter()
            .filter(|r| r.is_group_chat)
            .map(|r| r.chat_id)
            .collect::<Vec<_>>();
        let members = self.chat_repo.find_member_names(&groups)?;

        assemble(rows, members)
    }
}
