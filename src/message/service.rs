use log::debug;

use crate::{chat, receipt, user};

use super::Content;
use super::Repository;
use super::model::{Message, MessageDto, NewMessage};

#[async_trait::async_trait]
pub trait MessageService {
    async fn post(
        &self,
        chat: chat::Id,
        author: user::Id,
        content: Content,
    ) -> super::Result<Message>;

    /// Renders the chat log and marks every rendered message as read by `viewer`.
    async fn transcript(
        &self,
        chat: chat::Id,
        viewer: user::Id,
    ) -> super::Result<Vec<MessageDto>>;
}

#[derive(Clone)]
pub struct MessageServiceImpl {
    repo: Repository,
    receipt_repo: receipt::Repository,
    chat_service: chat::Service,
}

impl MessageServiceImpl {
    pub fn new(
        repo: Repository,
        receipt_repo: receipt::Repository,
        chat_service: chat::Service,
    ) -> Self {
        Self {
            repo,
            receipt_repo,
            chat_service,
        }
    }
}

#[async_trait::async_trait]
impl MessageService for MessageServiceImpl {
    async fn post(
        &self,
        chat: chat::Id,
        author: user::Id,
        content: Content,
    ) -> super::Result<Message> {
        self.chat_service.check_member(chat, author).await?;

        let msg = self.repo.append(&NewMessage::new(chat, author, &content))?;
        debug!("message {} appended to chat {chat} by {author}", msg.id());

        Ok(msg)
    }

    async fn transcript(
        &self,
        chat: chat::Id,
        viewer: user::Id,
    ) -> super::Result<Vec<MessageDto>> {
        self.chat_service.check_member(chat, viewer).await?;

        // receipts cover exactly the listed log
        let log = self.repo.list_by_chat(chat)?;
        let ids = log.iter().map(|a| a.message.id()).collect::<Vec<_>>();

        let marked = self.receipt_repo.record_read_through(chat, viewer, &ids)?;
        if marked > 0 {
            debug!("{viewer} read {marked} new messages in chat {chat}");
        }

        let mut readers = self.receipt_repo.find_by_messages(&ids)?;

        let transcript = log
            .into_iter()
            .map(|a| {
                let read_by = readers.remove(&a.message.id()).unwrap_or_default();
                MessageDto::new(a, viewer, read_by)
            })
            .collect();

        Ok(transcript)
    }
}
