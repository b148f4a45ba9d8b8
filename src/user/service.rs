use log::debug;

use crate::chat;

use super::model::{Me, Profile, Settings, UserDto};
use super::{Bio, Id, Repository, Username};

#[async_trait::async_trait]
pub trait UserService {
    async fn find_all(&self, viewer: Id) -> super::Result<Vec<UserDto>>;

    async fn find_me(&self, viewer: Id) -> super::Result<Me>;

    async fn settings(&self, viewer: Id) -> super::Result<Settings>;

    async fn profile(&self, viewer: Id, id: Id) -> super::Result<Profile>;

    async fn update_bio(&self, viewer: Id, bio: &str) -> super::Result<()>;

    async fn update_username(&self, viewer: Id, username: &str) -> super::Result<()>;

    async fn update_avatar(&self, viewer: Id, avatar: Option<&str>) -> super::Result<()>;

    async fn set_online(&self, id: Id, online: bool) -> super::Result<()>;

    async fn exists(&self, id: Id) -> super::Result<bool>;
}

#[derive(Clone)]
pub struct UserServiceImpl {
    repo: Repository,
    chat_service: chat::Service,
}

impl UserServiceImpl {
    pub fn new(repo: Repository, chat_service: chat::Service) -> Self {
        Self { repo, chat_service }
    }
}

#[async_trait::async_trait]
impl UserService for UserServiceImpl {
    async fn find_all(&self, viewer: Id) -> super::Result<Vec<UserDto>> {
        let users = self.repo.find_all_except(viewer)?;
        Ok(users.into_iter().map(UserDto::from).collect())
    }

    async fn find_me(&self, viewer: Id) -> super::Result<Me> {
        self.repo.find_by_id(viewer).map(Me::from)
    }

    async fn settings(&self, viewer: Id) -> super::Result<Settings> {
        self.repo.find_by_id(viewer).map(Settings::from)
    }

    async fn profile(&self, viewer: Id, id: Id) -> super::Result<Profile> {
        let user = self.repo.find_by_id(id)?;

        let direct = if viewer == id {
            None
        } else {
            self.chat_service.find_direct_membership(viewer, id).await?
        };
        let groups_in = self.chat_service.find_shared_groups(viewer, id).await?;

        Ok(Profile {
            user_id: user.id(),
            username: user.username().to_owned(),
            avatar: user.avatar().map(str::to_owned),
            bio: user.bio().to_owned(),
            is_online: user.is_online(),
            added_at: direct.as_ref().map(chat::model::Membership::added_at),
            is_favourite: direct.is_some_and(|m| m.is_favourite()),
            groups_in,
        })
    }

    async fn update_bio(&self, viewer: Id, bio: &str) -> super::Result<()> {
        let bio = Bio::parse(bio)?;
        self.repo.update_bio(viewer, &bio)
    }

    async fn update_username(&self, viewer: Id, username: &str) -> super::Result<()> {
        let username = Username::parse(username)?;
        self.repo.update_username(viewer, &username)?;
        debug!("user {viewer} renamed to {}", username.as_str());
        Ok(())
    }

    async fn update_avatar(&self, viewer: Id, avatar: Option<&str>) -> super::Result<()> {
        self.repo.update_avatar(viewer, avatar)
    }

    async fn set_online(&self, id: Id, online: bool) -> super::Result<()> {
        self.repo.set_online(id, online)?;
        debug!("user {id} is {}", if online { "online" } else { "offline" });
        Ok(())
    }

    async fn exists(&self, id: Id) -> super::Result<bool> {
        self.repo.exists(id)
    }
}
