pub(super) mod api {
    use axum::{Extension, Json, extract::State};

    use crate::{
        contact::{self, model::ContactDto},
        user,
    };

    pub async fn find_all(
        Extension(viewer): Extension<user::Id>,
        contact_service: State<contact::Service>,
    ) -> crate::Result<Json<Vec<ContactDto>>> {
        let contacts = contact_service.find_contacts(viewer).await?;
        Ok(Json(contacts))
    }
}
