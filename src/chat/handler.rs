use axum::http::StatusCode;

impl From<&super::Error> for StatusCode {
    fn from(e: &super::Error) -> Self {
        match e {
            super::Error::NotFound(_)
            | super::Error::MemberNotFound(_)
            | super::Error::NoDirectChat(_) => Self::NOT_FOUND,
            super::Error::NotMember(_) => Self::FORBIDDEN,
            super::Error::AlreadyExists => Self::CONFLICT,
            super::Error::NotGroup(_)
            | super::Error::SelfChat
            | super::Error::NonExistingUser(_)
            | super::Error::NotEnoughMembers(_)
            | super::Error::NoNewMembers
            | super::Error::InvalidTitle
            | super::Error::InvalidDescription => Self::BAD_REQUEST,
            super::Error::_User(e) => e.into(),
            super::Error::Integrity(_)
            | super::Error::Contention(_)
            | super::Error::_R2d2(_)
            | super::Error::_Diesel(_) => Self::INTERNAL_SERVER_ERROR,
        }
    }
}

pub(super) mod api {
    use axum::{
        Extension, Json,
        extract::{Multipart, Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use serde::{Deserialize, Serialize};

    use crate::{
        AvatarSaved, Reply,
        chat::{
            self,
            model::{GroupDraft, GroupProfile, Header},
        },
        integration::storage::Uploads,
        user,
    };

    /// A selected user, sent either as a bare id or as a `{userId, username}` object.
    #[derive(Deserialize)]
    #[serde(untagged)]
    pub enum Selected {
        Id(user::Id),
        User {
            #[serde(rename = "userId")]
            user_id: user::Id,
        },
    }

    impl Selected {
        fn id(&self) -> user::Id {
            match self {
                Self::Id(id) | Self::User { user_id: id } => *id,
            }
        }
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Started {
        #[serde(flatten)]
        reply: Reply,
        chat_id: chat::Id,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct StartDirectParams {
        user_id: user::Id,
    }

    pub async fn start_direct(
        Extension(viewer): Extension<user::Id>,
        chat_service: State<chat::Service>,
        Json(params): Json<StartDirectParams>,
    ) -> crate::Result<Json<Started>> {
        let chat_id = chat_service.start_direct(viewer, params.user_id).await?;

        Ok(Json(Started {
            reply: Reply::ok("Chat started"),
            chat_id,
        }))
    }

    pub async fn start_group(
        Extension(viewer): Extension<user::Id>,
        chat_service: State<chat::Service>,
        uploads: State<Uploads>,
        mut multipart: Multipart,
    ) -> crate::Result<impl IntoResponse> {
        let mut draft = GroupDraft::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some("users") => {
                    let text = field.text().await?;
                    let selected = serde_json::from_str::<Selected>(&text)
                        .map_err(|_| crate::Error::MalformedField("users"))?;
                    draft.members.push(selected.id());
                }
                Some("title") => draft.title = Some(field.text().await?),
                Some("description") => draft.description = Some(field.text().await?),
                Some("avatar") => {
                    let file_name = field.file_name().map(str::to_owned);
                    let data = field.bytes().await?;
                    if !data.is_empty() {
                        draft.avatar = Some(uploads.save(file_name.as_deref(), &data).await?);
                    }
                }
                _ => {}
            }
        }

        let chat_id = chat_service.start_group(viewer, draft).await?;

        Ok((
            StatusCode::CREATED,
            Json(Started {
                reply: Reply::ok("Group chat created successfully"),
                chat_id,
            }),
        ))
    }

    pub async fn header(
        Extension(viewer): Extension<user::Id>,
        chat_service: State<chat::Service>,
        Path(id): Path<chat::Id>,
    ) -> crate::Result<Json<Header>> {
        let header = chat_service.header(id, viewer).await?;
        Ok(Json(header))
    }

    pub async fn group_profile(
        Extension(viewer): Extension<user::Id>,
        chat_service: State<chat::Service>,
        Path(id): Path<chat::Id>,
    ) -> crate::Result<Json<GroupProfile>> {
        let profile = chat_service.group_profile(id, viewer).await?;
        Ok(Json(profile))
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FavouriteParams {
        is_favourite: bool,
    }

    pub async fn favourite(
        Extension(viewer): Extension<user::Id>,
        chat_service: State<chat::Service>,
        Path(id): Path<chat::Id>,
        Json(params): Json<FavouriteParams>,
    ) -> crate::Result<Reply> {
        chat_service
            .set_favourite(id, viewer, params.is_favourite)
            .await?;
        Ok(Reply::ok("Favourite status updated successfully"))
    }

    pub async fn favourite_user(
        Extension(viewer): Extension<user::Id>,
        chat_service: State<chat::Service>,
        Path(other): Path<user::Id>,
        Json(params): Json<FavouriteParams>,
    ) -> crate::Result<Reply> {
        chat_service
            .set_favourite_direct(viewer, other, params.is_favourite)
            .await?;
        Ok(Reply::ok("Favourite status updated successfully"))
    }

    pub async fn remove_friend(
        Extension(viewer): Extension<user::Id>,
        chat_service: State<chat::Service>,
        Path(other): Path<user::Id>,
    ) -> crate::Result<Reply> {
        chat_service.remove_friend(viewer, other).await?;
        Ok(Reply::ok("Friend and chat removed successfully"))
    }

    #[derive(Deserialize)]
    pub struct TitleParams {
        title: String,
    }

    pub async fn update_title(
        Extension(viewer): Extension<user::Id>,
        chat_service: State<chat::Service>,
        Path(id): Path<chat::Id>,
        Json(params): Json<TitleParams>,
    ) -> crate::Result<Reply> {
        chat_service.update_title(id, viewer, &params.title).await?;
        Ok(Reply::ok("Title updated successfully"))
    }

    #[derive(Deserialize)]
    pub struct DescriptionParams {
        description: String,
    }

    pub async fn update_description(
        Extension(viewer): Extension<user::Id>,
        chat_service: State<chat::Service>,
        Path(id): Path<chat::Id>,
        Json(params): Json<DescriptionParams>,
    ) -> crate::Result<Reply> {
        chat_service
            .update_description(id, viewer, &params.description)
            .await?;
        Ok(Reply::ok("Description updated successfully"))
    }

    pub async fn upload_avatar(
        Extension(viewer): Extension<user::Id>,
        chat_service: State<chat::Service>,
        uploads: State<Uploads>,
        Path(id): Path<chat::Id>,
        multipart: Multipart,
    ) -> crate::Result<Json<AvatarSaved>> {
        chat_service.check_member(id, viewer).await?;

        let avatar_path = uploads.save_field(multipart, "avatar").await?;
        chat_service
            .update_avatar(id, viewer, Some(&avatar_path))
            .await?;

        Ok(Json(AvatarSaved::new(
            "Group photo uploaded successfully",
            avatar_path,
        )))
    }

    pub async fn delete_avatar(
        Extension(viewer): Extension<user::Id>,
        chat_service: State<chat::Service>,
        Path(id): Path<chat::Id>,
    ) -> crate::Result<Reply> {
        chat_service.update_avatar(id, viewer, None).await?;
        Ok(Reply::ok("Group photo deleted successfully"))
    }

    #[derive(Deserialize)]
    pub struct AddMembersParams {
        users: Vec<Selected>,
    }

    pub async fn add_members(
        Extension(viewer): Extension<user::Id>,
        chat_service: State<chat::Service>,
        Path(id): Path<chat::Id>,
        Json(params): Json<AddMembersParams>,
    ) -> crate::Result<Reply> {
        let users = params.users.iter().map(Selected::id).collect::<Vec<_>>();
        chat_service.add_members(id, viewer, &users).await?;
        Ok(Reply::ok("New members added successfully"))
    }

    pub async fn remove_member(
        Extension(viewer): Extension<user::Id>,
        chat_service: State<chat::Service>,
        Path((id, member)): Path<(chat::Id, user::Id)>,
    ) -> crate::Result<Reply> {
        chat_service.remove_member(id, viewer, member).await?;
        Ok(Reply::ok("User removed successfully"))
    }

    pub async fn leave(
        Extension(viewer): Extension<user::Id>,
        chat_service: State<chat::Service>,
        Path(id): Path<chat::Id>,
    ) -> crate::Result<Reply> {
        chat_service.leave(id, viewer).await?;
        Ok(Reply::ok("Left group successfully"))
    }

}
