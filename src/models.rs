use crate::classify::{self, PostKind};
use serde::{Deserialize, Deserializer, Serialize};

/// Reads `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_admin: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_vip: bool,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub discount_percent: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub monthly_credits: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub credits_balance: i64,
    #[serde(default)]
    pub credit_costs: Option<serde_json::Value>,
}

impl Profile {
    pub fn display_name(&self) -> &str {
        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("Member")
    }

    pub fn plan_label(&self) -> String {
        let plan = match self.plan.as_deref() {
            Some(plan) if !plan.is_empty() => plan,
            _ if self.is_vip => "VIP_DIGITAL",
            _ => "FREE",
        };
        match plan {
            "FREE" => "Free".to_string(),
            "VIP_DIGITAL" => "VIP Digital".to_string(),
            "VIP_PRINT" => "VIP Print Pack".to_string(),
            "PRO_STUDIO" => "PRO Studio".to_string(),
            other => other.to_string(),
        }
    }
}

/// Server-side ids arrive as numbers or strings depending on the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for RemoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteId::Number(id) => write!(f, "{id}"),
            RemoteId::Text(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tip {
    pub id: RemoteId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_vip: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Tip {
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        format!("{} {}", self.title, self.body)
            .to_lowercase()
            .contains(&needle)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: RemoteId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub kind: Option<PostKind>,
    #[serde(default)]
    pub author_display_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Post {
    pub fn kind(&self) -> PostKind {
        self.kind.unwrap_or_else(|| classify::classify(&self.text))
    }

    pub fn display_text(&self) -> &str {
        classify::strip(&self.text)
    }

    pub fn author(&self) -> &str {
        self.author_display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or("Member")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: RemoteId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default)]
    pub author_display_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedeemedCode {
    pub code: String,
    pub amount_gbp: serde_json::Value,
    #[serde(default)]
    pub expires_at: Option<String>,
}

impl RedeemedCode {
    pub fn amount_label(&self) -> String {
        match &self.amount_gbp {
            serde_json::Value::String(amount) => amount.clone(),
            other => other.to_string(),
        }
    }

    pub fn expires_label(&self) -> String {
        self.expires_at
            .as_deref()
            .unwrap_or("")
            .replace('T', " ")
            .replace('Z', "")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncResult {
    #[serde(default)]
    pub updated: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResult {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreProduct {
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub display_name: &'a str,
}

#[derive(Debug, Serialize)]
pub struct NewTip<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub media_url: Option<&'a str>,
    pub is_vip: bool,
}

#[derive(Debug, Serialize)]
pub struct NewPost<'a> {
    pub text: &'a str,
    pub image_url: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct NewComment<'a> {
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
pub struct PasswordChange<'a> {
    pub old_password: &'a str,
    pub new_password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SupportTicket<'a> {
    pub subject: &'a str,
    pub message: &'a str,
    pub order_number: Option<&'a str>,
    pub image_url: Option<&'a str>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionSummary {
    pub tab: String,
    pub authenticated: bool,
    pub has_token: bool,
    pub display_name: Option<String>,
    pub generation: u64,
}
