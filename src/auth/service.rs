use async_trait::async_trait;
use log::debug;

use crate::user::{self, Username, model::NewUser};

use super::{Config, Error, check_password, hash_password, verify_password};

#[async_trait]
pub trait AuthService {
    async fn register(&self, username: &str, password: &str) -> super::Result<user::Id>;

    /// Issues a bearer token and marks the user online.
    async fn login(&self, username: &str, password: &str) -> super::Result<String>;

    async fn logout(&self, viewer: user::Id) -> super::Result<()>;

    async fn validate(&self, token: &str) -> super::Result<user::Id>;

    async fn change_password(
        &self,
        viewer: user::Id,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> super::Result<()>;

    async fn delete_account(&self, viewer: user::Id, current: &str) -> super::Result<()>;
}

#[derive(Clone)]
pub struct AuthServiceImpl {
    cfg: Config,
    user_repo: user::Repository,
}

impl AuthServiceImpl {
    pub fn new(cfg: Config, user_repo: user::Repository) -> Self {
        Self { cfg, user_repo }
    }

    fn check_current(&self, viewer: user::Id, current: &str) -> super::Result<()> {
        let user = self.user_repo.find_by_id(viewer)?;
        if !verify_password(current, user.password())? {
            return Err(Error::WrongPassword);
        }
        Ok(())
    }
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    async fn register(&self, username: &str, password: &str) -> super::Result<user::Id> {
        let username = Username::parse(username)?;
        check_password(password)?;

        let hash = hash_password(password)?;
        let id = self
            .user_repo
            .insert(&NewUser::new(username.as_str(), &hash))?;

        debug!("registered {} as user {id}", username.as_str());
        Ok(id)
    }

    async fn login(&self, username: &str, password: &str) -> super::Result<String> {
        let user = self
            .user_repo
            .find_by_username(username)?
            .ok_or(Error::InvalidCredentials)?;

        if !verify_password(password, user.password())? {
            debug!("wrong password for {username}");
            return Err(Error::InvalidCredentials);
        }

        self.user_repo.set_online(user.id(), true)?;
        self.cfg.issue(user.id(), user.username())
    }

    async fn logout(&self, viewer: user::Id) -> super::Result<()> {
        self.user_repo.set_online(viewer, false)?;
        Ok(())
    }

    async fn validate(&self, token: &str) -> super::Result<user::Id> {
        self.cfg.verify(token).map(|claims| claims.sub)
    }

    async fn change_password(
        &self,
        viewer: user::Id,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> super::Result<()> {
        self.check_current(viewer, current)?;
        if new != confirm {
            return Err(Error::PasswordMismatch);
        }
        check_password(new)?;

        let hash = hash_password(new)?;
        self.user_repo.update_password(viewer, &hash)?;
        debug!("user {viewer} changed password");
        Ok(())
    }

    async fn delete_account(&self, viewer: user::Id, current: &str) -> super::Result<()> {
        self.check_current(viewer, current)?;
        self.user_repo.delete(viewer)?;
        debug!("user {viewer} deleted");
        Ok(())
    }
}
