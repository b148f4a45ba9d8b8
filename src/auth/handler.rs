use axum::http::StatusCode;

impl From<&super::Error> for StatusCode {
    fn from(e: &super::Error) -> Self {
        match e {
            super::Error::Unauthorized | super::Error::InvalidCredentials => Self::UNAUTHORIZED,
            super::Error::WrongPassword
            | super::Error::PasswordMismatch
            | super::Error::WeakPassword(_) => Self::BAD_REQUEST,
            super::Error::_User(e) => e.into(),
            super::Error::Hashing(_) | super::Error::_Jwt(_) => Self::INTERNAL_SERVER_ERROR,
        }
    }
}

pub(super) mod api {
    use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
    use serde::{Deserialize, Serialize};

    use crate::{Reply, auth, user};

    #[derive(Deserialize)]
    pub struct Credentials {
        username: String,
        password: String,
    }

    pub async fn register(
        auth_service: State<auth::Service>,
        Json(params): Json<Credentials>,
    ) -> crate::Result<impl IntoResponse> {
        auth_service
            .register(&params.username, &params.password)
            .await?;

        Ok((
            StatusCode::CREATED,
            Reply::ok("User registered successfully"),
        ))
    }

    #[derive(Serialize)]
    pub struct LoggedIn {
        #[serde(flatten)]
        reply: Reply,
        token: String,
    }

    pub async fn login(
        auth_service: State<auth::Service>,
        Json(params): Json<Credentials>,
    ) -> crate::Result<Json<LoggedIn>> {
        let token = auth_service
            .login(&params.username, &params.password)
            .await?;

        Ok(Json(LoggedIn {
            reply: Reply::ok("Logged in successfully"),
            token,
        }))
    }

    pub async fn logout(
        Extension(viewer): Extension<user::Id>,
        auth_service: State<auth::Service>,
    ) -> crate::Result<Reply> {
        auth_service.logout(viewer).await?;
        Ok(Reply::ok("Logged out successfully"))
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PasswordParams {
        current_password: String,
        new_password: String,
        confirm_password: String,
    }

    pub async fn change_password(
        Extension(viewer): Extension<user::Id>,
        auth_service: State<auth::Service>,
        Json(params): Json<PasswordParams>,
    ) -> crate::Result<Reply> {
        auth_service
            .change_password(
                viewer,
                &params.current_password,
                &params.new_password,
                &params.confirm_password,
            )
            .await?;

        Ok(Reply::ok("Password updated successfully"))
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DeleteParams {
        current_password: String,
    }

    pub async fn delete_account(
        Extension(viewer): Extension<user::Id>,
        auth_service: State<auth::Service>,
        Json(params): Json<DeleteParams>,
    ) -> crate::Result<Reply> {
        auth_service
            .delete_account(viewer, &params.current_password)
            .await?;

        Ok(Reply::ok("Account deleted successfully"))
    }
}
