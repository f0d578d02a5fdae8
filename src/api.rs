use crate::errors::RequestError;
use crate::models::{
    Comment, LoginRequest, NewComment, NewPost, NewTip, PasswordChange, Post, Profile,
    RedeemedCode, RegisterRequest, StoreProduct, SupportTicket, SyncResult, Tip, TokenResponse,
    UploadResult,
};
use reqwest::{
    header::{CONTENT_TYPE, HeaderMap},
    multipart::{Form, Part},
    Client, Method, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// What a successful call produced. `Empty` is only ever a body-less reply and is
/// distinct from a JSON `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    Json(Value),
    Text(String),
}

impl Payload {
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, RequestError> {
        match self {
            Payload::Json(value) => serde_json::from_value(value)
                .map_err(|err| RequestError::new(None, format!("Unexpected response: {err}"))),
            Payload::Empty => Err(RequestError::new(None, "Empty response")),
            Payload::Text(_) => Err(RequestError::new(None, "Unexpected response")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(http: Client, base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http,
            base_url: crate::config::normalize_base_url(&base_url.into()),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Payload, RequestError> {
        let mut builder = self
            .http
            .request(method.clone(), self.url(path))
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.body(body.to_string());
        }

        let response = builder.send().await?;
        debug!("{method} {path} -> {}", response.status());
        read_payload(response).await
    }

    /// Multipart variant: same auth, but the content type (and its boundary) comes
    /// from the form itself.
    pub async fn request_form(&self, path: &str, form: Form) -> Result<Payload, RequestError> {
        let mut builder = self.http.post(self.url(path)).multipart(form);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        debug!("POST {path} (multipart) -> {}", response.status());
        read_payload(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RequestError> {
        self.request(Method::GET, path, None).await?.into_json()
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, RequestError> {
        self.send(Method::POST, path, Some(body)).await?.into_json()
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Payload, RequestError> {
        let body = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(|err| RequestError::new(None, err.to_string()))?;
        self.request(method, path, body.as_ref()).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<String, RequestError> {
        let out: TokenResponse = self
            .post("/auth/login", &LoginRequest { username, password })
            .await?;
        Ok(out.access_token)
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<String, RequestError> {
        let out: TokenResponse = self
            .post(
                "/auth/register",
                &RegisterRequest {
                    email,
                    password,
                    display_name,
                },
            )
            .await?;
        Ok(out.access_token)
    }

    pub async fn me(&self) -> Result<Profile, RequestError> {
        self.get("/me").await
    }

    pub async fn tricks(&self) -> Result<Vec<Tip>, RequestError> {
        self.get("/tricks").await
    }

    pub async fn create_trick(&self, tip: &NewTip<'_>) -> Result<Tip, RequestError> {
        self.post("/tricks", tip).await
    }

    pub async fn delete_trick(&self, id: &str) -> Result<(), RequestError> {
        self.send::<Value>(Method::DELETE, &format!("/tricks/{id}"), None)
            .await
            .map(drop)
    }

    pub async fn posts(&self) -> Result<Vec<Post>, RequestError> {
        self.get("/posts").await
    }

    pub async fn create_post(&self, post: &NewPost<'_>) -> Result<Post, RequestError> {
        self.post("/posts", post).await
    }

    pub async fn comments(&self, post_id: &str) -> Result<Vec<Comment>, RequestError> {
        self.get(&format!("/posts/{post_id}/comments")).await
    }

    pub async fn create_comment(&self, post_id: &str, text: &str) -> Result<Comment, RequestError> {
        self.post(&format!("/posts/{post_id}/comments"), &NewComment { text })
            .await
    }

    pub async fn upload_media(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<UploadResult, RequestError> {
        let mut part = Part::bytes(bytes).file_name(file_name.to_string());
        if let Some(content_type) = content_type {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new().part("file", part);
        self.request_form("/media/upload", form).await?.into_json()
    }

    pub async fn redeem_code(&self, credits: u32) -> Result<RedeemedCode, RequestError> {
        self.post("/credits/redeem-code", &serde_json::json!({ "credits": credits }))
            .await
    }

    pub async fn sync_shopify(&self) -> Result<SyncResult, RequestError> {
        match self.send::<Value>(Method::POST, "/shopify/sync-me", None).await? {
            Payload::Empty => Ok(SyncResult {
                updated: false,
                message: None,
            }),
            payload => payload.into_json(),
        }
    }

    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), RequestError> {
        self.send(
            Method::POST,
            "/me/password",
            Some(&PasswordChange {
                old_password,
                new_password,
            }),
        )
        .await
        .map(drop)
    }

    pub async fn create_support_ticket(&self, ticket: &SupportTicket<'_>) -> Result<(), RequestError> {
        self.send(Method::POST, "/support/tickets", Some(ticket))
            .await
            .map(drop)
    }
}

async fn read_payload(response: Response) -> Result<Payload, RequestError> {
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return Ok(Payload::Empty);
    }

    let json_body = is_json(response.headers());
    let text = response.text().await?;

    if !status.is_success() {
        return Err(RequestError::new(
            Some(status.as_u16()),
            error_message(status, &text),
        ));
    }

    if text.trim().is_empty() {
        return Ok(Payload::Empty);
    }
    match serde_json::from_str(&text) {
        Ok(value) => Ok(Payload::Json(value)),
        Err(err) if json_body => Err(RequestError::new(
            Some(status.as_u16()),
            format!("Malformed JSON response: {err}"),
        )),
        Err(_) => Ok(Payload::Text(text)),
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"))
}

/// `{detail}` wins verbatim; any other JSON is echoed compactly; anything else
/// collapses to the status text.
pub fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(detail)) => detail.clone(),
            Some(detail) => detail.to_string(),
            None => Value::Object(map.clone()).to_string(),
        },
        Ok(other) => other.to_string(),
        Err(_) => status_text(status),
    }
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_u16().to_string())
}

const STOREFRONT_QUERY: &str = "{ products(first: 8, sortKey: CREATED_AT, reverse: true) { edges { node { title handle onlineStoreUrl featuredImage { url } } } } }";

/// Latest storefront products. The shop links render regardless, so every failure
/// here is swallowed into an empty list.
pub async fn storefront_products(http: &Client, domain: &str, token: &str) -> Vec<StoreProduct> {
    let url = format!("https://{}/api/2024-07/graphql.json", domain.trim());
    let response = http
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .header("X-Shopify-Storefront-Access-Token", token.trim())
        .json(&serde_json::json!({ "query": STOREFRONT_QUERY }))
        .send()
        .await;

    let body: Value = match response {
        Ok(response) if response.status().is_success() => match response.json().await {
            Ok(body) => body,
            Err(err) => {
                warn!("storefront returned an unreadable body: {err}");
                return Vec::new();
            }
        },
        Ok(response) => {
            warn!("storefront request failed with {}", response.status());
            return Vec::new();
        }
        Err(err) => {
            warn!("storefront request failed: {err}");
            return Vec::new();
        }
    };

    parse_storefront(&body)
}

fn parse_storefront(body: &Value) -> Vec<StoreProduct> {
    body.pointer("/data/products/edges")
        .and_then(Value::as_array)
        .map(|edges| {
            edges
                .iter()
                .filter_map(|edge| {
                    let node = edge.get("node")?;
                    Some(StoreProduct {
                        title: node.get("title")?.as_str()?.to_string(),
                        url: node
                            .get("onlineStoreUrl")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                        image_url: node
                            .pointer("/featuredImage/url")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}
