use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use log::debug;

use crate::{auth, user};

/// Resolves the bearer token into a `user::Id` request extension.
pub async fn authorize(
    auth_service: State<auth::Service>,
    user_service: State<user::Service>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> crate::Result<Response> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        debug!("No bearer token on {}", req.uri());
        return Err(super::Error::Unauthorized.into());
    };

    let viewer = auth_service.validate(bearer.token()).await?;

    if !user_service.exists(viewer).await? {
        debug!("Token subject {viewer} no longer exists");
        return Err(super::Error::Unauthorized.into());
    }

    req.extensions_mut().insert(viewer);

    Ok(next.run(req).await)
}
