use log::debug;

use crate::user;

use super::model::{
    GroupDraft, GroupMember, GroupProfile, GroupSummary, Header, MemberSignature, Membership,
    NewChat,
};
use super::{DEFAULT_DESCRIPTION, Error, Id, MAX_TEXT_LEN, Repository, bounded_text};

#[async_trait::async_trait]
pub trait ChatService {
    /// Viewer's membership row, `NotFound` for a missing chat and `NotMember` for outsiders.
    async fn check_member(&self, id: Id, viewer: user::Id) -> super::Result<Membership>;

    async fn start_direct(&self, viewer: user::Id, other: user::Id) -> super::Result<Id>;

    async fn start_group(&self, viewer: user::Id, draft: GroupDraft) -> super::Result<Id>;

    async fn header(&self, id: Id, viewer: user::Id) -> super::Result<Header>;

    async fn group_profile(&self, id: Id, viewer: user::Id) -> super::Result<GroupProfile>;

    async fn set_favourite(&self, id: Id, viewer: user::Id, favourite: bool)
    -> super::Result<()>;

    async fn set_favourite_direct(
        &self,
        viewer: user::Id,
        other: user::Id,
        favourite: bool,
    ) -> super::Result<()>;

    async fn remove_friend(&self, viewer: user::Id, other: user::Id) -> super::Result<()>;

    async fn update_title(&self, id: Id, viewer: user::Id, title: &str) -> super::Result<()>;

    async fn update_description(
        &self,
        id: Id,
        viewer: user::Id,
        description: &str,
    ) -> super::Result<()>;

    async fn update_avatar(
        &self,
        id: Id,
        viewer: user::Id,
        avatar: Option<&str>,
    ) -> super::Result<()>;

    async fn add_members(
        &self,
        id: Id,
        viewer: user::Id,
        users: &[user::Id],
    ) -> super::Result<usize>;

    async fn remove_member(&self, id: Id, viewer: user::Id, member: user::Id)
    -> super::Result<()>;

    async fn leave(&self, id: Id, viewer: user::Id) -> super::Result<()>;

    async fn find_direct_membership(
        &self,
        viewer: user::Id,
        other: user::Id,
    ) -> super::Result<Option<Membership>>;

    async fn find_shared_groups(
        &self,
        viewer: user::Id,
        other: user::Id,
    ) -> super::Result<Vec<GroupSummary>>;
}

#[derive(Clone)]
pub struct ChatServiceImpl {
    repo: Repository,
    user_repo: user::Repository,
}

impl ChatServiceImpl {
    pub fn new(repo: Repository, user_repo: user::Repository) -> Self {
        Self { repo, user_repo }
    }
}

#[async_trait::async_trait]
impl ChatService for ChatServiceImpl {
    async fn check_member(&self, id: Id, viewer: user::Id) -> super::Result<Membership> {
        match self.repo.find_membership(id, viewer)? {
            Some(m) => Ok(m),
            None => {
                // distinguishes a missing chat from a foreign one
                self.repo.find_by_id(id)?;
                Err(Error::NotMember(id))
            }
        }
    }

    async fn start_direct(&self, viewer: user::Id, other: user::Id) -> super::Result<Id> {
        if viewer == other {
            return Err(Error::SelfChat);
        }

        if let Some(id) = self.repo.find_direct(viewer, other)? {
            return Ok(id);
        }

        let id = self.repo.create_direct(viewer, other)?;
        debug!("direct chat {id} between {viewer} and {other}");
        Ok(id)
    }

    async fn start_group(&self, viewer: user::Id, draft: GroupDraft) -> super::Result<Id> {
        let others = MemberSignature::new(draft.members.iter().copied().filter(|u| *u != viewer));
        let members = MemberSignature::new(others.ids().iter().copied().chain([viewer]));

        if members.len() <= 1 {
            return Err(Error::NotEnoughMembers(members.len()));
        }

        let title = match draft.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => bounded_text(t, Error::InvalidTitle)?.to_owned(),
            _ => self.default_title(others.ids())?,
        };
        let description = match draft.description.as_deref().map(str::trim) {
            Some(d) if !d.is_empty() => bounded_text(d, Error::InvalidDescription)?,
            _ => DEFAULT_DESCRIPTION,
        };

        let chat = NewChat::group(&title, description, draft.avatar.as_deref());
        let id = self.repo.create_group(&chat, &members)?;
        debug!("group chat {id} created by {viewer} with {} members", members.len());

        Ok(id)
    }

    async fn header(&self, id: Id, viewer: user::Id) -> super::Result<Header> {
        self.check_member(id, viewer).await?;
        let chat = self.repo.find_by_id(id)?;
        let members = self.repo.find_members(id)?;

        if chat.is_group() {
            return Ok(Header::Group {
                chat_id: id,
                title: chat.title().unwrap_or_default().to_owned(),
                group_avatar: chat.group_avatar().map(str::to_owned),
                members: members.into_iter().map(|m| m.username).collect(),
            });
        }

        let other = members
            .into_iter()
            .find(|m| m.user_id != viewer)
            .ok_or(Error::Integrity(id))?;

        Ok(Header::Direct {
            chat_id: id,
            other_user: other.into(),
        })
    }

    async fn group_profile(&self, id: Id, viewer: user::Id) -> super::Result<GroupProfile> {
        let membership = self.check_member(id, viewer).await?;
        let chat = self.repo.find_by_id(id)?;
        if !chat.is_group() {
            return Err(Error::NotFound(id));
        }

        let members = self.repo.find_members(id)?;

        Ok(GroupProfile {
            title: chat.title().unwrap_or_default().to_owned(),
            description: chat.description().map(str::to_owned),
            group_avatar: chat.group_avatar().map(str::to_owned),
            created_at: chat.created_at(),
            added_at: membership.added_at(),
            is_favourite: membership.is_favourite(),
            members: members.into_iter().map(GroupMember::from).collect(),
        })
    }

    async fn set_favourite(
        &self,
        id: Id,
        viewer: user::Id,
        favourite: bool,
    ) -> super::Result<()> {
        self.check_member(id, viewer).await?;
        self.repo.set_favourite(id, viewer, favourite)?;
        Ok(())
    }

    async fn set_favourite_direct(
        &self,
        viewer: user::Id,
        other: user::Id,
        favourite: bool,
    ) -> super::Result<()> {
        let id = self
            .repo
            .find_direct(viewer, other)?
            .ok_or(Error::NoDirectChat(other))?;

        self.repo.set_favourite(id, viewer, favourite)?;
        Ok(())
    }

    async fn remove_friend(&self, viewer: user::Id, other: user::Id) -> super::Result<()> {
        let id = self
            .repo
            .find_direct(viewer, other)?
            .ok_or(Error::NoDirectChat(other))?;

        self.repo.delete(id)?;
        debug!("direct chat {id} removed by {viewer}");
        Ok(())
    }

    async fn update_title(&self, id: Id, viewer: user::Id, title: &str) -> super::Result<()> {
        let title = bounded_text(title, Error::InvalidTitle)?;
        self.check_group(id, viewer).await?;
        self.repo.update_title(id, title)
    }

    async fn update_description(
        &self,
        id: Id,
        viewer: user::Id,
        description: &str,
    ) -> super::Result<()> {
        let description = bounded_text(description, Error::InvalidDescription)?;
        self.check_group(id, viewer).await?;
        self.repo.update_description(id, description)
    }

    async fn update_avatar(
        &self,
        id: Id,
        viewer: user::Id,
        avatar: Option<&str>,
    ) -> super::Result<()> {
        self.check_group(id, viewer).await?;
        self.repo.update_avatar(id, avatar)
    }

    async fn add_members(
        &self,
        id: Id,
        viewer: user::Id,
        users: &[user::Id],
    ) -> super::Result<usize> {
        self.check_group(id, viewer).await?;
        let added = self.repo.add_members(id, users)?;
        debug!("{viewer} added {added} members to {id}");
        Ok(added)
    }

    async fn remove_member(
        &self,
        id: Id,
        viewer: user::Id,
        member: user::Id,
    ) -> super::Result<()> {
        self.check_group(id, viewer).await?;
        if !self.repo.remove_member(id, member)? {
            return Err(Error::MemberNotFound(member));
        }
        Ok(())
    }

    async fn leave(&self, id: Id, viewer: user::Id) -> super::Result<()> {
        self.check_group(id, viewer).await?;
        self.repo.remove_member(id, viewer)?;
        Ok(())
    }

    async fn find_direct_membership(
        &self,
        viewer: user::Id,
        other: user::Id,
    ) -> super::Result<Option<Membership>> {
        match self.repo.find_direct(viewer, other)? {
            Some(id) => self.repo.find_membership(id, viewer),
            None => Ok(None),
        }
    }

    async fn find_shared_groups(
        &self,
        viewer: user::Id,
        other: user::Id,
    ) -> super::Result<Vec<GroupSummary>> {
        let groups = self.repo.find_shared_groups(viewer, other)?;
        let ids = groups.iter().map(|g| g.id()).collect::<Vec<_>>();
        let mut names = self.repo.find_member_names(&ids)?;

        let summaries = groups
            .into_iter()
            .map(|g| GroupSummary {
                chat_id: g.id(),
                title: g.title().unwrap_or_default().to_owned(),
                group_avatar: g.group_avatar().map(str::to_owned),
                members: names.remove(&g.id()).unwrap_or_default(),
            })
            .collect();

        Ok(summaries)
    }
}

impl ChatServiceImpl {
    async fn check_group(&self, id: Id, viewer: user::Id) -> super::Result<()> {
        self.check_member(id, viewer).await?;
        if !self.repo.find_by_id(id)?.is_group() {
            return Err(Error::NotGroup(id));
        }
        Ok(())
    }

    /// Comma joined usernames of everyone but the creator.
    fn default_title(&self, others: &[user::Id]) -> super::Result<String> {
        let users = self.user_repo.find_by_ids(others)?;

        if let Some(missing) = others
            .iter()
            .find(|id| !users.iter().any(|u| u.id() == **id))
        {
            return Err(Error::NonExistingUser(*missing));
        }

        let title = users
            .iter()
            .map(|u| u.username())
            .collect::<Vec<_>>()
            .join(", ");

        Ok(title.chars().take(MAX_TEXT_LEN).collect())
    }
}
