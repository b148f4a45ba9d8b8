use axum::http::StatusCode;

impl From<&super::Error> for StatusCode {
    fn from(e: &super::Error) -> Self {
        match e {
            super::Error::NotFound(_) => Self::NOT_FOUND,
            super::Error::UsernameTaken
            | super::Error::InvalidUsername
            | super::Error::InvalidBio => Self::BAD_REQUEST,
            super::Error::_Chat(e) => e.as_ref().into(),
            super::Error::_R2d2(_) | super::Error::_Diesel(_) => Self::INTERNAL_SERVER_ERROR,
        }
    }
}

pub(super) mod api {
    use axum::{
        Extension, Json,
        extract::{Multipart, Path, State},
    };
    use serde::Deserialize;

    use crate::{
        AvatarSaved, Reply,
        integration::storage::Uploads,
        user::{
            self,
            model::{Me, Profile, Settings, UserDto},
        },
    };

    pub async fn find_all(
        Extension(viewer): Extension<user::Id>,
        user_service: State<user::Service>,
    ) -> crate::Result<Json<Vec<UserDto>>> {
        let users = user_service.find_all(viewer).await?;
        Ok(Json(users))
    }

    pub async fn find_me(
        Extension(viewer): Extension<user::Id>,
        user_service: State<user::Service>,
    ) -> crate::Result<Json<Me>> {
        let me = user_service.find_me(viewer).await?;
        Ok(Json(me))
    }

    pub async fn profile(
        Extension(viewer): Extension<user::Id>,
        user_service: State<user::Service>,
        Path(id): Path<user::Id>,
    ) -> crate::Result<Json<Profile>> {
        let profile = user_service.profile(viewer, id).await?;
        Ok(Json(profile))
    }

    pub async fn settings(
        Extension(viewer): Extension<user::Id>,
        user_service: State<user::Service>,
    ) -> crate::Result<Json<Settings>> {
        let settings = user_service.settings(viewer).await?;
        Ok(Json(settings))
    }

    #[derive(Deserialize)]
    pub struct BioParams {
        bio: String,
    }

    pub async fn update_bio(
        Extension(viewer): Extension<user::Id>,
        user_service: State<user::Service>,
        Json(params): Json<BioParams>,
    ) -> crate::Result<Reply> {
        user_service.update_bio(viewer, &params.bio).await?;
        Ok(Reply::ok("Bio updated successfully"))
    }

    #[derive(Deserialize)]
    pub struct UsernameParams {
        username: String,
    }

    pub async fn update_username(
        Extension(viewer): Extension<user::Id>,
        user_service: State<user::Service>,
        Json(params): Json<UsernameParams>,
    ) -> crate::Result<Reply> {
        user_service
            .update_username(viewer, &params.username)
            .await?;
        Ok(Reply::ok("Username updated successfully"))
    }

    pub async fn upload_avatar(
        Extension(viewer): Extension<user::Id>,
        user_service: State<user::Service>,
        uploads: State<Uploads>,
        multipart: Multipart,
    ) -> crate::Result<Json<AvatarSaved>> {
        let avatar_path = uploads.save_field(multipart, "avatar").await?;
        user_service
            .update_avatar(viewer, Some(&avatar_path))
            .await?;

        Ok(Json(AvatarSaved::new(
            "Photo uploaded successfully",
            avatar_path,
        )))
    }

    pub async fn delete_avatar(
        Extension(viewer): Extension<user::Id>,
        user_service: State<user::Service>,
    ) -> crate::Result<Reply> {
        user_service.update_avatar(viewer, None).await?;
        Ok(Reply::ok("Photo deleted successfully"))
    }
}
