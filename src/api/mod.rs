use crate::models::{
    AcceptMode, CreateRequestBody, RequestPage, SongRequest, UpdateRequestBody,
};
use crate::storage::load_api_key;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Unauthorized,
    /// Server-side acceptance flag is off; creates are refused.
    Rejected,
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

    /// Classify a non-success response. 401 means a missing/bad API key;
    /// 400 on the request endpoints means the queue is not accepting.
    fn http(status: u16, body: String, ctx: &str) -> Self {
        match status {
            401 => Self {
                kind: ApiErrorKind::Unauthorized,
                message: "Unauthorized".to_string(),
            },
            400 => Self {
                kind: ApiErrorKind::Rejected,
                message: if body.trim().is_empty() {
                    "Rejected".to_string()
                } else {
                    body
                },
            },
            _ => Self {
                kind: ApiErrorKind::Http,
                message: format!("{ctx} ({status}): {body}"),
            },
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnvConfig {
    pub api_url: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        // Matches the prefix the legacy web client pointed ky at.
        let default_api_url = "http://localhost:4000/api".to_string();

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

#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            api_key: None,
        }
    }

    pub fn load_from_storage() -> Self {
        Self {
            base_url: EnvConfig::new().api_url,
            api_key: load_api_key(),
        }
    }

    pub fn set_api_key(&mut self, key: Option<String>) {
        self.api_key = key.filter(|k| !k.trim().is_empty());
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach `x-api-key`. Only mutating endpoints want it; GETs are public.
    fn with_api_key(&self, mut req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key.clone());
        }
        req
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        req: reqwest::RequestBuilder,
        ctx: &str,
    ) -> ApiResult<T> {
        let res = req.send().await.map_err(ApiError::network)?;

        if res.status().is_success() {
            res.json().await.map_err(ApiError::parse)
        } else {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, ctx))
        }
    }

    async fn send_empty(req: reqwest::RequestBuilder, ctx: &str) -> ApiResult<()> {
        let res = req.send().await.map_err(ApiError::network)?;

        if res.status().is_success() {
            Ok(())
        } else {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, ctx))
        }
    }

    pub async fn list_requests(
        &self,
        cursor: Option<&str>,
        limit: u32,
    ) -> ApiResult<RequestPage> {
        let client = reqwest::Client::new();
        let mut req = client
            .get(self.url("/requests"))
            .query(&[("limit", limit.to_string())]);
        if let Some(cursor) = cursor {
            req = req.query(&[("cursor", cursor)]);
        }
        Self::send_json(req, "Listing requests failed").await
    }

    pub async fn create_request(&self, title: &str) -> ApiResult<SongRequest> {
        let client = reqwest::Client::new();
        let req = self.with_api_key(client.post(self.url("/requests"))).json(
            &CreateRequestBody {
                title: title.to_string(),
                requester: None,
            },
        );
        Self::send_json(req, "Creating request failed").await
    }

    pub async fn update_request(&self, id: &str, done: bool) -> ApiResult<SongRequest> {
        let client = reqwest::Client::new();
        let req = self
            .with_api_key(client.patch(self.url(&format!("/requests/{id}"))))
            .json(&UpdateRequestBody { done });
        Self::send_json(req, "Updating request failed").await
    }

    pub async fn delete_request(&self, id: &str) -> ApiResult<()> {
        let client = reqwest::Client::new();
        let req = self.with_api_key(client.delete(self.url(&format!("/requests/{id}"))));
        Self::send_empty(req, "Deleting request failed").await
    }

    pub async fn fetch_accept_mode(&self) -> ApiResult<bool> {
        let client = reqwest::Client::new();
        let mode: AcceptMode =
            Self::send_json(client.get(self.url("/config")), "Loading mode failed").await?;
        Ok(mode.accept)
    }

    pub async fn toggle_accept_mode(&self) -> ApiResult<()> {
        let client = reqwest::Client::new();
        let req = self.with_api_key(client.post(self.url("/config")));
        Self::send_empty(req, "Toggling mode failed").await
    }
}
