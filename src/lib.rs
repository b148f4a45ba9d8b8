use axum::{
    Json, Router,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
};
use log::{error, warn};
use serde::Serialize;
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Declares an integer primary key newtype that maps onto an `INT` column.
macro_rules! integer_id {
    ($name:ident) => {
        #[derive(
            Clone,
            Copy,
            Debug,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Deserialize,
            serde::Serialize,
            diesel::expression::AsExpression,
            diesel::deserialize::FromSqlRow,
        )]
        #[serde(transparent)]
        #[diesel(sql_type = diesel::sql_types::Integer)]
        pub struct $name(i32);

        impl $name {
            pub const fn get(&self) -> i32 {
                self.0
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl diesel::serialize::ToSql<diesel::sql_types::Integer, diesel::pg::Pg> for $name {
            fn to_sql<'b>(
                &'b self,
                out: &mut diesel::serialize::Output<'b, '_, diesel::pg::Pg>,
            ) -> diesel::serialize::Result {
                <i32 as diesel::serialize::ToSql<diesel::sql_types::Integer, diesel::pg::Pg>>::to_sql(
                    &self.0, out,
                )
            }
        }

        impl diesel::deserialize::FromSql<diesel::sql_types::Integer, diesel::pg::Pg> for $name {
            fn from_sql(bytes: diesel::pg::PgValue<'_>) -> diesel::deserialize::Result<Self> {
                <i32 as diesel::deserialize::FromSql<diesel::sql_types::Integer, diesel::pg::Pg>>::from_sql(
                    bytes,
                )
                .map(Self)
            }
        }
    };
}

pub mod auth;
pub mod chat;
pub mod contact;
pub mod event;
pub mod integration;
pub mod message;
pub mod receipt;
pub mod schema;
pub mod state;
pub mod user;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("missing form field: {0}")]
    MissingField(&'static str),
    #[error("malformed form field: {0}")]
    MalformedField(&'static str),

    #[error(transparent)]
    _Auth(#[from] auth::Error),
    #[error(transparent)]
    _User(#[from] user::Error),
    #[error(transparent)]
    _Chat(#[from] chat::Error),
    #[error(transparent)]
    _Message(#[from] message::Error),
    #[error(transparent)]
    _Receipt(#[from] receipt::Error),
    #[error(transparent)]
    _Contact(#[from] contact::Error),
    #[error(transparent)]
    _Integration(#[from] integration::Error),
    #[error(transparent)]
    _Multipart(#[from] axum::extract::multipart::MultipartError),
}

impl From<&Error> for StatusCode {
    fn from(e: &Error) -> Self {
        match e {
            Error::MissingField(_) | Error::MalformedField(_) => StatusCode::BAD_REQUEST,
            Error::_Auth(e) => e.into(),
            Error::_User(e) => e.into(),
            Error::_Chat(e) => e.into(),
            Error::_Message(e) => e.into(),
            Error::_Receipt(_) | Error::_Contact(_) | Error::_Integration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Error::_Multipart(e) => e.status(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = StatusCode::from(&self);

        let message = if status.is_server_error() {
            error!("{self:?}");
            "Something went wrong".to_owned()
        } else {
            warn!("{self}");
            self.to_string()
        };

        (status, Json(Reply::failure(message))).into_response()
    }
}

/// Success flag plus a human readable message, returned by every mutation.
#[derive(Serialize, Debug)]
pub struct Reply {
    success: bool,
    message: String,
}

impl Reply {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    pub const fn success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Reply carrying the public path of a freshly stored avatar.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AvatarSaved {
    #[serde(flatten)]
    reply: Reply,
    avatar_path: String,
}

impl AvatarSaved {
    pub fn new(message: impl Into<String>, avatar_path: String) -> Self {
        Self {
            reply: Reply::ok(message),
            avatar_path,
        }
    }
}

pub fn app(s: state::AppState) -> Router {
    let protected = Router::new()
        .merge(user::api(s.clone()))
        .merge(chat::api(s.clone()))
        .merge(message::api(s.clone()))
        .merge(contact::api(s.clone()))
        .merge(auth::protected(s.clone()))
        .route_layer(from_fn_with_state(s.clone(), auth::middleware::authorize));

    Router::new()
        .nest("/api", auth::public(s.clone()).merge(protected))
        .merge(event::ws(s.clone()))
        .nest_service("/uploads", ServeDir::new(s.uploads.dir()))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_map_missing_field_to_bad_request() {
        let e = Error::MissingField("chatId");
        assert_eq!(StatusCode::from(&e), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn should_map_nested_errors() {
        let e = Error::from(chat::Error::AlreadyExists);
        assert_eq!(StatusCode::from(&e), StatusCode::CONFLICT);

        let e = Error::from(auth::Error::Unauthorized);
        assert_eq!(StatusCode::from(&e), StatusCode::UNAUTHORIZED);

        let e = Error::from(user::Error::NotFound(user::Id::from(7)));
        assert_eq!(StatusCode::from(&e), StatusCode::NOT_FOUND);
    }

    #[test]
    fn should_hide_internal_error_text() {
        let e = Error::from(contact::Error::Integrity(chat::Id::from(3)));
        let resp = e.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn should_serialize_reply() {
        let json = serde_json::to_value(Reply::ok("done")).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "message": "done"}));
    }
}
