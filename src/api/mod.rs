use crate::models::{AccountInfo, Note};
use crate::storage::{TOKEN_KEY, USER_KEY};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Unauthorized,
    NotFound,
    Network,
    Http,
    Parse,
}

#[derive(Clone, Debug)]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn status(status: u16, body: String, ctx: &str) -> Self {
        Self {
            kind: classify_status(status),
            message: format!("{ctx} ({status}): {body}"),
        }
    }
}

pub(crate) fn classify_status(status: u16) -> ApiErrorKind {
    match status {
        401 => ApiErrorKind::Unauthorized,
        404 => ApiErrorKind::NotFound,
        _ => ApiErrorKind::Http,
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnvConfig {
    pub api_url: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        let default_api_url = "http://localhost:8080".to_string();

        // We support BOTH `window.ENV.API_URL` (documented in README) and
        // `window.ENV.api_url` (legacy/implementation detail) for compatibility.
        if let Some(window) = web_sys::window() {
            if let Some(env) = window.get("ENV") {
                if !env.is_undefined() && env.is_object() {
                    // 1) Prefer README style: API_URL
                    if let Ok(api_url) = js_sys::Reflect::get(&env, &"API_URL".into()) {
                        if let Some(url_str) = api_url.as_string() {
                            return Self { api_url: url_str };
                        }
                    }

                    // 2) Fallback: api_url
                    if let Ok(api_url) = js_sys::Reflect::get(&env, &"api_url".into()) {
                        if let Some(url_str) = api_url.as_string() {
                            return Self { api_url: url_str };
                        }
                    }
                }
            }
        }

        Self {
            api_url: default_api_url,
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn get_api_url() -> String {
    EnvConfig::new().api_url
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct LoginResponse {
    pub token: String,
    pub user: AccountInfo,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct CreateNoteRequest {
    pub title: String,
    pub content: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct SaveNoteRequest {
    pub title: String,
    pub content: String,
}

/// Client for the notes store.
///
/// The bearer token is carried explicitly in the client value; every store
/// call is made against whatever identity the caller threaded in, never
/// ambient state.
#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
    pub(crate) token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            token: None,
        }
    }

    pub fn load_from_storage() -> Self {
        let base_url = get_api_url();
        let token = leptos::web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .and_then(|s| s.get_item(TOKEN_KEY).ok().flatten());

        Self { base_url, token }
    }

    pub fn save_to_storage(&self) {
        if let Some(storage) =
            leptos::web_sys::window().and_then(|w| w.local_storage().ok().flatten())
        {
            if let Some(token) = &self.token {
                let _ = storage.set_item(TOKEN_KEY, token);
            }
        }
    }

    pub fn clear_storage() {
        if let Some(storage) =
            leptos::web_sys::window().and_then(|w| w.local_storage().ok().flatten())
        {
            let _ = storage.remove_item(TOKEN_KEY);
            let _ = storage.remove_item(USER_KEY);
        }
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub(crate) fn get_auth_token(&self) -> Option<String> {
        self.token.clone()
    }

    pub fn logout(&mut self) {
        self.token = None;
        Self::clear_storage();
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn with_auth_headers(
        mut req: reqwest::RequestBuilder,
        token: Option<String>,
    ) -> reqwest::RequestBuilder {
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }
        req
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&impl serde::Serialize>,
    ) -> ApiResult<reqwest::Response> {
        let client = reqwest::Client::new();
        let url = format!("{}{}", self.base_url, path);
        let mut req = client.request(method, url);
        req = Self::with_auth_headers(req, self.get_auth_token());

        if let Some(b) = body {
            req = req.json(b);
        }

        let res = req.send().await.map_err(ApiError::network)?;

        if res.status().is_success() {
            Ok(res)
        } else {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::status(status, body, "Request failed"))
        }
    }

    async fn request_api<T: serde::de::DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&impl serde::Serialize>,
    ) -> ApiResult<T> {
        let res = self.send(method, path, body).await?;
        res.json().await.map_err(ApiError::parse)
    }

    /// For calls where the backend responds with an empty (or irrelevant) body.
    async fn request_empty(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&impl serde::Serialize>,
    ) -> ApiResult<()> {
        let _ = self.send(method, path, body).await?;
        Ok(())
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        self.request_api(
            reqwest::Method::POST,
            "/api/login",
            Some(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            }),
        )
        .await
    }

    /// Notes list has been observed both as a bare array and wrapped in a
    /// `notes` field; accept both.
    pub(crate) fn parse_notes_response(data: serde_json::Value) -> Vec<Note> {
        let list = if data.is_array() {
            data
        } else {
            data.get("notes").cloned().unwrap_or_default()
        };

        let items = list.as_array().cloned().unwrap_or_default();

        let mut out: Vec<Note> = Vec::with_capacity(items.len());
        for item in items {
            if let Ok(n) = serde_json::from_value::<Note>(item) {
                if !n.uuid.trim().is_empty() {
                    out.push(n);
                }
            }
        }

        out
    }

    pub(crate) fn parse_note_response(data: serde_json::Value) -> Option<Note> {
        let obj = data.get("note").cloned().unwrap_or(data);
        serde_json::from_value::<Note>(obj)
            .ok()
            .filter(|n| !n.uuid.trim().is_empty())
    }

    pub async fn fetch_notes(&self) -> ApiResult<Vec<Note>> {
        let data: serde_json::Value = self
            .request_api(reqwest::Method::GET, "/api/notes", None::<&()>)
            .await?;
        Ok(Self::parse_notes_response(data))
    }

    /// Fetch one note by uuid. A missing note is `Ok(None)`, not an error;
    /// the page renders it as the not-found state.
    pub async fn get_note_by_uuid(&self, uuid: &str) -> ApiResult<Option<Note>> {
        let result: ApiResult<serde_json::Value> = self
            .request_api(
                reqwest::Method::GET,
                &format!("/api/notes/{}", uuid),
                None::<&()>,
            )
            .await;

        match result {
            Ok(data) => Ok(Self::parse_note_response(data)),
            Err(e) if e.kind == ApiErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn create_note(&self, title: &str, content: &str) -> ApiResult<Note> {
        let data: serde_json::Value = self
            .request_api(
                reqwest::Method::POST,
                "/api/notes",
                Some(&CreateNoteRequest {
                    title: title.to_string(),
                    content: content.to_string(),
                }),
            )
            .await?;

        Self::parse_note_response(data).ok_or_else(|| {
            ApiError::parse("Create note succeeded but response is missing the note")
        })
    }

    pub async fn save_note(&self, uuid: &str, title: &str, content: &str) -> ApiResult<()> {
        self.request_empty(
            reqwest::Method::PUT,
            &format!("/api/notes/{}", uuid),
            Some(&SaveNoteRequest {
                title: title.to_string(),
                content: content.to_string(),
            }),
        )
        .await
    }

    pub async fn delete_note(&self, uuid: &str) -> ApiResult<()> {
        self.request_empty(
            reqwest::Method::DELETE,
            &format!("/api/notes/{}", uuid),
            None::<&()>,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_maps_auth_and_missing() {
        assert_eq!(classify_status(401), ApiErrorKind::Unauthorized);
        assert_eq!(classify_status(404), ApiErrorKind::NotFound);
        assert_eq!(classify_status(500), ApiErrorKind::Http);
        assert_eq!(classify_status(422), ApiErrorKind::Http);
    }

    #[test]
    fn notes_list_accepts_wrapped_and_bare_shapes() {
        let wrapped = serde_json::json!({
            "notes": [
                {"uuid": "a-1", "title": "First", "content": "<p>x</p>", "createdAt": "2026-08-01T00:00:00Z"},
                {"uuid": "a-2", "title": "", "content": "<p></p>"}
            ]
        });
        let parsed = ApiClient::parse_notes_response(wrapped);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].uuid, "a-1");
        assert_eq!(parsed[0].created_at, "2026-08-01T00:00:00Z");
        assert_eq!(parsed[1].created_at, "");

        let bare = serde_json::json!([
            {"uuid": "b-1", "title": "Only", "content": "<p></p>"}
        ]);
        assert_eq!(ApiClient::parse_notes_response(bare).len(), 1);
    }

    #[test]
    fn notes_list_skips_malformed_entries() {
        let data = serde_json::json!({
            "notes": [
                {"uuid": "", "title": "no id", "content": ""},
                {"title": "missing uuid"},
                {"uuid": "ok", "title": "t", "content": "c"}
            ]
        });
        let parsed = ApiClient::parse_notes_response(data);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].uuid, "ok");
    }

    #[test]
    fn single_note_accepts_wrapped_and_bare_shapes() {
        let wrapped = serde_json::json!({
            "note": {"uuid": "n-1", "title": "T", "content": "<p></p>", "createdAt": "2026-02-03T00:00:00Z"}
        });
        let n = ApiClient::parse_note_response(wrapped).expect("wrapped note should parse");
        assert_eq!(n.uuid, "n-1");

        let bare = serde_json::json!({"uuid": "n-2", "title": "T", "content": "<p></p>"});
        assert!(ApiClient::parse_note_response(bare).is_some());

        assert!(ApiClient::parse_note_response(serde_json::json!({})).is_none());
    }

    #[test]
    fn note_serializes_camel_case() {
        let n = Note {
            uuid: "n-1".to_string(),
            title: "T".to_string(),
            content: "<p></p>".to_string(),
            created_at: "2026-08-25T00:00:00Z".to_string(),
        };
        let v = serde_json::to_value(n).expect("should serialize");
        assert_eq!(v["createdAt"], "2026-08-25T00:00:00Z");
        assert!(v.get("created_at").is_none());
    }

    #[test]
    fn login_response_contract_deserialize() {
        let json = r#"{
            "token": "jwt-token",
            "user": {"id": 1, "username": "u", "mail": "u@example.com"}
        }"#;
        let parsed: LoginResponse =
            serde_json::from_str(json).expect("login response should parse");
        assert_eq!(parsed.token, "jwt-token");
        // user is opaque; just ensure it's an object
        assert!(parsed.user.extra.is_object());
    }

    #[test]
    fn api_client_token_handling() {
        let mut client = ApiClient::new("http://localhost:8080".to_string());
        assert!(!client.is_authenticated());
        assert!(client.get_auth_token().is_none());

        client.set_token("my-jwt-token".to_string());
        assert!(client.is_authenticated());
        assert_eq!(client.get_auth_token().as_deref(), Some("my-jwt-token"));
    }
}
