use axum::http::StatusCode;

impl From<&super::Error> for StatusCode {
    fn from(e: &super::Error) -> Self {
        match e {
            super::Error::ChatNotFound(_) => Self::NOT_FOUND,
            super::Error::Empty => Self::BAD_REQUEST,
            super::Error::_Chat(e) => e.into(),
            super::Error::_Receipt(_) | super::Error::_R2d2(_) | super::Error::_Diesel(_) => {
                Self::INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub(super) mod api {
    use axum::{
        Extension, Json,
        extract::{FromRequest, Multipart, Path, Request, State},
        http::{StatusCode, header::CONTENT_TYPE},
        response::IntoResponse,
    };
    use serde::Deserialize;

    use crate::{
        chat,
        integration::storage::Uploads,
        message::{
            self, Content,
            model::{MessageDto, Posted},
        },
        user,
    };

    pub async fn transcript(
        Extension(viewer): Extension<user::Id>,
        message_service: State<message::Service>,
        Path(chat_id): Path<chat::Id>,
    ) -> crate::Result<Json<Vec<MessageDto>>> {
        let transcript = message_service.transcript(chat_id, viewer).await?;
        Ok(Json(transcript))
    }

    #[derive(Deserialize)]
    pub struct PostParams {
        message: String,
    }

    /// Accepts `{"message": ...}` JSON or a multipart form with `message` and `image`.
    pub async fn post(
        Extension(viewer): Extension<user::Id>,
        message_service: State<message::Service>,
        uploads: State<Uploads>,
        Path(chat_id): Path<chat::Id>,
        request: Request,
    ) -> crate::Result<impl IntoResponse> {
        let is_multipart = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("multipart/form-data"));

        let content = if is_multipart {
            let multipart = Multipart::from_request(request, &())
                .await
                .map_err(|_| crate::Error::MalformedField("image"))?;
            read_content(multipart, &uploads).await?
        } else {
            let Json(params) = Json::<PostParams>::from_request(request, &())
                .await
                .map_err(|_| crate::Error::MalformedField("message"))?;
            Content::text(&params.message)?
        };

        let msg = message_service.post(chat_id, viewer, content).await?;

        Ok((StatusCode::CREATED, Json(Posted::from(msg))))
    }

    /// An uploaded image takes precedence; `message` text sent along with it is dropped.
    async fn read_content(mut multipart: Multipart, uploads: &Uploads) -> crate::Result<Content> {
        let mut text = None;
        let mut image = None;

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some("message") => text = Some(field.text().await?),
                Some("image") => {
                    let file_name = field.file_name().map(str::to_owned);
                    let data = field.bytes().await?;
                    if !data.is_empty() {
                        image = Some(uploads.save(file_name.as_deref(), &data).await?);
                    }
                }
                _ => {}
            }
        }

        match image {
            Some(path) => Ok(Content::image(path)),
            None => Ok(Content::text(text.as_deref().unwrap_or_default())?),
        }
    }
}
