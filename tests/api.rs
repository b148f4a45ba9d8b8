use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use testcontainers_modules::postgres::Postgres;
use testcontainers_modules::testcontainers::{ContainerAsync, runners::AsyncRunner};
use tower::ServiceExt;

use chat_service::auth;
use chat_service::integration::{db, storage::Uploads};
use chat_service::state::AppState;

struct Api {
    _node: ContainerAsync<Postgres>,
    app: Router,
}

impl Api {
    async fn new() -> Self {
        let node = Postgres::default().start().await.unwrap();
        let host = node.get_host().await.unwrap().to_string();
        let port = node.get_host_port_ipv4(5432).await.unwrap();
        let pool = db::Config::at(host, port).init().unwrap();

        let auth_cfg = auth::Config::new("secret", Duration::from_secs(60));
        let uploads = Uploads::new(std::env::temp_dir().join("chat_service_api"));

        Self {
            _node: node,
            app: chat_service::app(AppState::new(pool, auth_cfg, uploads)),
        }
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, json)
    }

    async fn call_multipart(
        &self,
        uri: &str,
        token: &str,
        parts: &[(&str, Option<&str>, &str)],
    ) -> (StatusCode, Value) {
        let boundary = "chat-service-boundary";
        let mut body = String::new();
        for (name, file_name, data) in parts {
            body.push_str(&format!("--{boundary}\r\n"));
            match file_name {
                Some(file_name) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                )),
            }
            body.push_str(data);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{boundary}--\r\n"));

        let req = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, json)
    }

    async fn sign_up(&self, username: &str) -> String {
        let credentials = json!({"username": username, "password": "Secret1"});

        let (status, _) = self
            .call(Method::POST, "/api/register", None, Some(credentials.clone()))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .call(Method::POST, "/api/login", None, Some(credentials))
            .await;
        assert_eq!(status, StatusCode::OK);

        body["token"].as_str().unwrap().to_owned()
    }

    async fn user_id(&self, token: &str, username: &str) -> Value {
        let (_, users) = self.call(Method::GET, "/api/users", Some(token), None).await;
        users
            .as_array()
            .unwrap()
            .iter()
            .find(|u| u["username"] == username)
            .unwrap()["userId"]
            .clone()
    }
}

#[tokio::test]
async fn should_require_token() {
    let api = Api::new().await;

    let (status, body) = api.call(Method::GET, "/api/contacts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = api
        .call(Method::GET, "/api/contacts", Some("garbage"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn should_reject_bad_registration() {
    let api = Api::new().await;
    api.sign_up("jora").await;

    let (status, body) = api
        .call(
            Method::POST,
            "/api/register",
            None,
            Some(json!({"username": "jora", "password": "Secret1"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Username already exists");

    let (status, _) = api
        .call(
            Method::POST,
            "/api/register",
            None,
            Some(json!({"username": "valera", "password": "weak"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = api
        .call(
            Method::POST,
            "/api/login",
            None,
            Some(json!({"username": "jora", "password": "Secret2"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn should_chat_and_read_through() {
    let api = Api::new().await;
    let jora = api.sign_up("jora").await;
    let valera = api.sign_up("valera").await;
    let valera_id = api.user_id(&jora, "valera").await;

    let (status, started) = api
        .call(
            Method::POST,
            "/api/chats/direct",
            Some(&jora),
            Some(json!({"userId": valera_id})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let chat_id = started["chatId"].as_i64().unwrap();
    let messages = format!("/api/chats/{chat_id}/messages");

    let (status, posted) = api
        .call(Method::POST, &messages, Some(&jora), Some(json!({"message": "hi"})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(posted["message"], "hi");
    assert_eq!(posted["isImage"], false);

    let (_, contacts) = api.call(Method::GET, "/api/contacts", Some(&valera), None).await;
    assert_eq!(contacts[0]["chatId"], chat_id);
    assert_eq!(contacts[0]["kind"], "direct");
    assert_eq!(contacts[0]["username"], "jora");
    assert_eq!(contacts[0]["unreadMessages"], 1);
    assert_eq!(contacts[0]["lastMessage"]["message"], "hi");

    let (status, transcript) = api.call(Method::GET, &messages, Some(&valera), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(transcript[0]["direction"], "incoming");
    assert_eq!(transcript[0]["readBy"][0]["username"], "valera");

    let (_, contacts) = api.call(Method::GET, "/api/contacts", Some(&valera), None).await;
    assert_eq!(contacts[0]["unreadMessages"], 0);
    assert_eq!(contacts[0]["readLastMessage"], true);
}

#[tokio::test]
async fn should_reject_empty_message() {
    let api = Api::new().await;
    let jora = api.sign_up("jora").await;
    api.sign_up("valera").await;
    let valera_id = api.user_id(&jora, "valera").await;

    let (_, started) = api
        .call(
            Method::POST,
            "/api/chats/direct",
            Some(&jora),
            Some(json!({"userId": valera_id})),
        )
        .await;
    let uri = format!("/api/chats/{}/messages", started["chatId"]);

    let (status, _) = api
        .call(Method::POST, &uri, Some(&jora), Some(json!({"message": "   "})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn should_forbid_reading_foreign_chat() {
    let api = Api::new().await;
    let jora = api.sign_up("jora").await;
    api.sign_up("valera").await;
    let radu = api.sign_up("radu").await;
    let valera_id = api.user_id(&jora, "valera").await;

    let (_, started) = api
        .call(
            Method::POST,
            "/api/chats/direct",
            Some(&jora),
            Some(json!({"userId": valera_id})),
        )
        .await;
    let uri = format!("/api/chats/{}/messages", started["chatId"]);

    let (status, _) = api.call(Method::GET, &uri, Some(&radu), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = api
        .call(Method::GET, "/api/chats/9999/messages", Some(&radu), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_update_settings() {
    let api = Api::new().await;
    let jora = api.sign_up("jora").await;

    let (status, _) = api
        .call(
            Method::PUT,
            "/api/settings/bio",
            Some(&jora),
            Some(json!({"bio": "out hiking"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, settings) = api.call(Method::GET, "/api/settings", Some(&jora), None).await;
    assert_eq!(settings["bio"], "out hiking");
    assert_eq!(settings["isOnline"], true);

    let (status, _) = api.call(Method::POST, "/api/logout", Some(&jora), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, settings) = api.call(Method::GET, "/api/settings", Some(&jora), None).await;
    assert_eq!(settings["isOnline"], false);
}

#[tokio::test]
async fn should_prefer_image_over_text_in_multipart_post() {
    let api = Api::new().await;
    let jora = api.sign_up("jora").await;
    api.sign_up("valera").await;
    let valera_id = api.user_id(&jora, "valera").await;

    let (_, started) = api
        .call(
            Method::POST,
            "/api/chats/direct",
            Some(&jora),
            Some(json!({"userId": valera_id})),
        )
        .await;
    let uri = format!("/api/chats/{}/messages", started["chatId"]);

    let (status, posted) = api
        .call_multipart(
            &uri,
            &jora,
            &[
                ("message", None, "look at this"),
                ("image", Some("cat.png"), "not really a png"),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(posted["isImage"], true);
    let path = posted["message"].as_str().unwrap();
    assert!(path.starts_with("/uploads/") && path.ends_with(".png"));
    assert_eq!(posted["imageUrl"], posted["message"]);

    let (status, posted) = api
        .call_multipart(&uri, &jora, &[("message", None, "just text")])
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(posted["isImage"], false);
    assert_eq!(posted["message"], "just text");
}
