use std::sync::Arc;

use axum::extract::FromRef;
use log::info;

use crate::integration::{self, Config, db::Pool, storage::Uploads};
use crate::{auth, chat, contact, message, receipt, user};

use crate::auth::service::AuthServiceImpl;
use crate::chat::{repository::PgChatRepository, service::ChatServiceImpl};
use crate::contact::{repository::PgContactRepository, service::ContactServiceImpl};
use crate::message::{repository::PgMessageRepository, service::MessageServiceImpl};
use crate::receipt::repository::PgReceiptRepository;
use crate::user::{repository::PgUserRepository, service::UserServiceImpl};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub auth_service: auth::Service,
    pub user_service: user::Service,
    pub chat_service: chat::Service,
    pub message_service: message::Service,
    pub contact_service: contact::Service,
    pub uploads: Uploads,
}

impl AppState {
    pub fn init(cfg: &Config) -> integration::Result<Self> {
        let pool = cfg.pg.init()?;
        let uploads = cfg.uploads.connect()?;
        info!("Uploads are stored in {}", uploads.dir().display());

        Ok(Self::new(pool, cfg.auth.clone(), uploads))
    }

    pub fn new(pool: Pool, auth_cfg: auth::Config, uploads: Uploads) -> Self {
        let user_repo: user::Repository = Arc::new(PgUserRepository::new(pool.clone()));
        let chat_repo: chat::Repository = Arc::new(PgChatRepository::new(pool.clone()));
        let message_repo: message::Repository = Arc::new(PgMessageRepository::new(pool.clone()));
        let receipt_repo: receipt::Repository = Arc::new(PgReceiptRepository::new(pool.clone()));
        let contact_repo: contact::Repository = Arc::new(PgContactRepository::new(pool));

        let chat_service: chat::Service =
            Arc::new(ChatServiceImpl::new(chat_repo.clone(), user_repo.clone()));
        let user_service: user::Service =
            Arc::new(UserServiceImpl::new(user_repo.clone(), chat_service.clone()));
        let message_service: message::Service = Arc::new(MessageServiceImpl::new(
            message_repo,
            receipt_repo,
            chat_service.clone(),
        ));
        let contact_service: contact::Service =
            Arc::new(ContactServiceImpl::new(contact_repo, chat_repo));
        let auth_service: auth::Service = Arc::new(AuthServiceImpl::new(auth_cfg, user_repo));

        Self {
            auth_service,
            user_service,
            chat_service,
            message_service,
            contact_service,
            uploads,
        }
    }
}
