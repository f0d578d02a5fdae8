use crate::api::ApiClient;
use crate::classify::{self, CommunityFilter, PostKind};
use crate::config::normalize_base_url;
use crate::errors::{AppError, RequestError};
use crate::models::{Comment, NewPost, NewTip, Post, SessionSummary, SupportTicket};
use crate::render::render_pass;
use crate::state::{AccountMode, Action, AppState, Severity, Tab};
use crate::storage::PrefKey;
use crate::support;
use axum::{
    extract::{Multipart, Path, State},
    response::{Html, Redirect},
    Form, Json,
};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{info, warn};

const TIP_TITLE_CHARS: usize = 90;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_pass(&state).await)
}

pub async fn session(State(state): State<AppState>) -> Json<SessionSummary> {
    let view = state.view.lock().await;
    Json(SessionSummary {
        tab: view.tab.slug().to_string(),
        authenticated: view.account_mode() == AccountMode::Authenticated,
        has_token: view.token.is_some(),
        display_name: view.me.as_ref().map(|me| me.display_name().to_string()),
        generation: view.generation,
    })
}

pub async fn select_tab(
    State(state): State<AppState>,
    Path(tab): Path<String>,
) -> Result<Redirect, AppError> {
    let tab = Tab::parse(&tab).ok_or_else(|| AppError::bad_request(format!("unknown tab {tab:?}")))?;
    state.dispatch(Action::SelectTab(tab)).await;
    Ok(Redirect::to("/"))
}

pub async fn refresh_tip_of_day(State(state): State<AppState>) -> Redirect {
    let mut prefs = state.prefs.lock().await;
    prefs.clear(PrefKey::TipOfDayDate).await;
    prefs.clear(PrefKey::TipOfDayId).await;
    Redirect::to("/")
}

pub async fn open_tip(State(state): State<AppState>, Path(id): Path<String>) -> Redirect {
    state.dispatch(Action::OpenTip(id)).await;
    Redirect::to("/")
}

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    q: String,
}

pub async fn search_tips(State(state): State<AppState>, Form(form): Form<SearchForm>) -> Redirect {
    state
        .dispatch(Action::SetTrickSearch(form.q.trim().to_string()))
        .await;
    Redirect::to("/")
}

pub async fn clear_search(State(state): State<AppState>) -> Redirect {
    state.dispatch(Action::SetTrickSearch(String::new())).await;
    Redirect::to("/")
}

pub async fn ask_question(State(state): State<AppState>) -> Redirect {
    let (question, signed_in) = {
        let view = state.view.lock().await;
        (view.trick_search.trim().to_string(), view.me.is_some())
    };
    if question.is_empty() {
        state.notify(Severity::Error, "Type your question first.").await;
        return Redirect::to("/");
    }
    if !signed_in {
        state.dispatch(Action::SelectTab(Tab::Account)).await;
        state
            .notify(Severity::Error, "Please sign in to ask in Community.")
            .await;
        return Redirect::to("/");
    }
    if support::looks_like_store_issue(&question) {
        send_to_support(&state, &question).await;
        return Redirect::to("/");
    }

    let text = classify::apply_prefix(PostKind::Question, &question);
    let client = state.client().await;
    match client.create_post(&NewPost { text: &text, image_url: None }).await {
        Ok(_) => {
            state.dispatch(Action::SelectTab(Tab::Community)).await;
            state
                .notify(Severity::Success, "Question posted in Community.")
                .await;
        }
        Err(err) => failed(&state, "Could not post", err).await,
    }
    Redirect::to("/")
}

#[derive(Debug, Deserialize)]
pub struct TipForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    media_url: String,
    #[serde(default)]
    is_vip: Option<String>,
}

pub async fn publish_tip(State(state): State<AppState>, Form(form): Form<TipForm>) -> Redirect {
    if !state.view.lock().await.is_admin() {
        state.notify(Severity::Error, "Only admins can publish tips.").await;
        return Redirect::to("/");
    }
    let title = form.title.trim();
    let body = form.body.trim();
    if title.is_empty() || body.is_empty() {
        state
            .notify(Severity::Error, "Please add a title and a body.")
            .await;
        return Redirect::to("/");
    }

    let tip = NewTip {
        title,
        body,
        media_url: non_empty(&form.media_url),
        is_vip: form.is_vip.is_some(),
    };
    let client = state.client().await;
    match client.create_trick(&tip).await {
        Ok(created) => {
            info!("published tip {}", created.id);
            state.notify(Severity::Success, "Tip published.").await;
        }
        Err(err) => failed(&state, "Publish failed", err).await,
    }
    Redirect::to("/")
}

pub async fn delete_tip(State(state): State<AppState>, Path(id): Path<String>) -> Redirect {
    if !state.view.lock().await.is_admin() {
        state.notify(Severity::Error, "Only admins can delete tips.").await;
        return Redirect::to("/");
    }
    let client = state.client().await;
    match client.delete_trick(&id).await {
        Ok(()) => state.notify(Severity::Success, "Tip deleted.").await,
        Err(err) => failed(&state, "Delete failed", err).await,
    }
    Redirect::to("/")
}

#[derive(Debug, Deserialize)]
pub struct FilterForm {
    #[serde(default)]
    filter: String,
}

pub async fn set_community_filter(
    State(state): State<AppState>,
    Form(form): Form<FilterForm>,
) -> Redirect {
    state
        .dispatch(Action::SetCommunityFilter(CommunityFilter::parse(&form.filter)))
        .await;
    Redirect::to("/")
}

pub async fn create_post(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Redirect, AppError> {
    let mut form = read_multipart(multipart).await?;
    let text = form.field("text").trim().to_string();
    if text.is_empty() {
        state
            .notify(Severity::Error, "Please write something first.")
            .await;
        return Ok(Redirect::to("/"));
    }
    let kind = PostKind::parse(form.field("kind")).unwrap_or(PostKind::Work);
    if kind == PostKind::Question && support::looks_like_store_issue(&text) {
        send_to_support(&state, &text).await;
        return Ok(Redirect::to("/"));
    }

    let client = state.client().await;
    let mut image_url = non_empty(form.field("image_url")).map(str::to_string);
    if let Some(upload) = form.file.take() {
        match upload.send(&client).await {
            Ok(url) => image_url = url,
            Err(err) => {
                failed(&state, "Post failed", err).await;
                return Ok(Redirect::to("/"));
            }
        }
    }

    let text = classify::apply_prefix(kind, &text);
    let post = NewPost {
        text: &text,
        image_url: image_url.as_deref(),
    };
    match client.create_post(&post).await {
        Ok(_) => state.notify(Severity::Success, "Posted.").await,
        Err(err) => failed(&state, "Post failed", err).await,
    }
    Ok(Redirect::to("/"))
}

pub async fn open_comments(State(state): State<AppState>, Path(id): Path<String>) -> Redirect {
    state.dispatch(Action::OpenComments(id)).await;
    Redirect::to("/")
}

pub async fn open_answers(State(state): State<AppState>, Path(id): Path<String>) -> Redirect {
    state.dispatch(Action::OpenAnswers(id)).await;
    Redirect::to("/")
}

fn post_kind(kind: &str) -> Result<PostKind, AppError> {
    PostKind::parse(kind).ok_or_else(|| AppError::bad_request(format!("unknown post kind {kind:?}")))
}

pub async fn browse_community(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Redirect, AppError> {
    let filter = match post_kind(&kind)? {
        PostKind::Question => CommunityFilter::Questions,
        PostKind::Work => CommunityFilter::Works,
    };
    state.dispatch(Action::SetCommunityFilter(filter)).await;
    state.dispatch(Action::SelectTab(Tab::Community)).await;
    Ok(Redirect::to("/"))
}

pub async fn compose_post(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Redirect, AppError> {
    let kind = post_kind(&kind)?;
    if state.view.lock().await.me.is_none() {
        state.dispatch(Action::SelectTab(Tab::Account)).await;
        state
            .notify(Severity::Error, "Please sign in to post in Community.")
            .await;
        return Ok(Redirect::to("/"));
    }
    state.dispatch(Action::Compose(kind)).await;
    Ok(Redirect::to("/"))
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    text: String,
}

pub async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Redirect {
    let text = form.text.trim();
    if text.is_empty() {
        state
            .notify(Severity::Error, "Please write a comment first.")
            .await;
    } else {
        let client = state.client().await;
        match client.create_comment(&id, text).await {
            Ok(_) => state.notify(Severity::Success, "Comment added.").await,
            Err(err) => failed(&state, "Comment failed", err).await,
        }
    }
    state.dispatch(Action::OpenComments(id)).await;
    Redirect::to("/")
}

pub async fn save_answer_as_tip(State(state): State<AppState>, Path(id): Path<String>) -> Redirect {
    state.dispatch(Action::OpenComments(id.clone())).await;
    if !state.view.lock().await.is_admin() {
        state.notify(Severity::Error, "Only admins can save tips.").await;
        return Redirect::to("/");
    }

    let client = state.client().await;
    let posts = client.posts().await.unwrap_or_else(|err| {
        warn!("could not reload posts for tip: {err}");
        Vec::new()
    });
    let comments = match client.comments(&id).await {
        Ok(comments) => comments,
        Err(err) => {
            failed(&state, "Save failed", err).await;
            return Redirect::to("/");
        }
    };

    let post = posts.iter().find(|post| post.id.to_string() == id);
    let Some(draft) = answer_tip(&id, post, &comments) else {
        state
            .notify(Severity::Error, "No answer comment to save.")
            .await;
        return Redirect::to("/");
    };
    let tip = NewTip {
        title: &draft.title,
        body: &draft.body,
        media_url: draft.media_url.as_deref(),
        is_vip: false,
    };
    match client.create_trick(&tip).await {
        Ok(_) => {
            state
                .notify(Severity::Success, "Saved as a tip in Tips.")
                .await
        }
        Err(err) => failed(&state, "Save failed", err).await,
    }
    Redirect::to("/")
}

#[derive(Debug, PartialEq, Eq)]
struct TipDraft {
    title: String,
    body: String,
    media_url: Option<String>,
}

/// A public tip built from a community question and its latest comment.
fn answer_tip(post_id: &str, post: Option<&Post>, comments: &[Comment]) -> Option<TipDraft> {
    let answer = comments.last().map(|c| c.text.trim()).unwrap_or("");
    if answer.is_empty() {
        return None;
    }
    let fallback = format!("Community post #{post_id}");
    let question = post
        .map(|post| post.display_text().trim())
        .filter(|text| !text.is_empty())
        .unwrap_or(&fallback);
    Some(TipDraft {
        title: question.chars().take(TIP_TITLE_CHARS).collect(),
        body: format!("Q: {question}\n\nA: {answer}"),
        media_url: post.and_then(|post| post.image_url.clone()),
    })
}

#[derive(Debug, Deserialize)]
pub struct AuthForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    nickname: String,
}

fn anonymous_client(state: &AppState, api_url: String) -> ApiClient {
    ApiClient::new(state.http.clone(), api_url, None)
}

pub async fn login(State(state): State<AppState>, Form(form): Form<AuthForm>) -> Redirect {
    let client = anonymous_client(&state, state.api_url().await);
    match client.login(form.email.trim(), &form.password).await {
        Ok(token) => {
            state.dispatch(Action::LoggedIn(token)).await;
            state.notify(Severity::Success, "Logged in.").await;
        }
        Err(err) => failed(&state, "Login failed", err).await,
    }
    Redirect::to("/")
}

pub async fn register(State(state): State<AppState>, Form(form): Form<AuthForm>) -> Redirect {
    let nickname = form.nickname.trim();
    if nickname.is_empty() {
        state
            .notify(
                Severity::Error,
                "Register failed: Please choose a nickname (public in Community)",
            )
            .await;
        return Redirect::to("/");
    }

    let client = anonymous_client(&state, state.api_url().await);
    match client
        .register(form.email.trim(), &form.password, nickname)
        .await
    {
        Ok(token) => {
            state.dispatch(Action::LoggedIn(token)).await;
            state
                .notify(Severity::Success, "Registered & logged in.")
                .await;
        }
        Err(err) => failed(&state, "Register failed", err).await,
    }
    Redirect::to("/")
}

pub async fn logout(State(state): State<AppState>) -> Redirect {
    state.dispatch(Action::Logout).await;
    Redirect::to("/")
}

pub async fn sync_vip(State(state): State<AppState>) -> Redirect {
    let client = state.client().await;
    match client.sync_shopify().await {
        Ok(out) => {
            let message = if out.updated {
                "VIP updated!".to_string()
            } else {
                out.message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "Sync complete.".to_string())
            };
            state.notify(Severity::Success, message).await;
        }
        Err(err) => failed(&state, "Sync failed", err).await,
    }
    Redirect::to("/")
}

#[derive(Debug, Deserialize)]
pub struct RedeemForm {
    #[serde(default)]
    credits: String,
}

pub async fn redeem_credits(State(state): State<AppState>, Form(form): Form<RedeemForm>) -> Redirect {
    let credits = match form.credits.trim().parse::<u32>() {
        Ok(credits) if credits >= 1 => credits,
        _ => {
            state
                .notify(Severity::Error, "Enter how many credits you want to redeem.")
                .await;
            return Redirect::to("/");
        }
    };

    let client = state.client().await;
    match client.redeem_code(credits).await {
        Ok(code) => {
            info!("redeemed {credits} credits");
            state.dispatch(Action::CodeRedeemed(code)).await;
            state
                .notify(Severity::Success, "Discount code generated.")
                .await;
        }
        Err(err) => failed(&state, "Redeem failed", err).await,
    }
    Redirect::to("/")
}

#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    #[serde(default)]
    old_password: String,
    #[serde(default)]
    new_password: String,
}

pub async fn change_password(
    State(state): State<AppState>,
    Form(form): Form<PasswordForm>,
) -> Redirect {
    let old_password = form.old_password.trim();
    let new_password = form.new_password.trim();
    if old_password.is_empty() || new_password.is_empty() {
        state
            .notify(Severity::Error, "Please fill both password fields.")
            .await;
        return Redirect::to("/");
    }
    if new_password.chars().count() < 8 {
        state
            .notify(Severity::Error, "New password must be at least 8 characters.")
            .await;
        return Redirect::to("/");
    }

    let client = state.client().await;
    match client.change_password(old_password, new_password).await {
        Ok(()) => state.notify(Severity::Success, "Password updated.").await,
        Err(err) => failed(&state, "Password change failed", err).await,
    }
    Redirect::to("/")
}

pub async fn enable_notifications(State(state): State<AppState>) -> Redirect {
    state
        .notify(
            Severity::Info,
            "Notifications will be enabled after online deploy (HTTPS + VAPID).",
        )
        .await;
    Redirect::to("/")
}

#[derive(Debug, Deserialize)]
pub struct SettingsForm {
    #[serde(default)]
    api_url: String,
    #[serde(default)]
    shop_domain: String,
    #[serde(default)]
    shop_token: String,
}

pub async fn save_settings(State(state): State<AppState>, Form(form): Form<SettingsForm>) -> Redirect {
    if !state.view.lock().await.is_admin() {
        state.notify(Severity::Error, "Only admins can change settings.").await;
        return Redirect::to("/");
    }
    {
        let mut prefs = state.prefs.lock().await;
        let api_url = normalize_base_url(&form.api_url);
        if !api_url.is_empty() {
            prefs.set(PrefKey::ApiUrl, api_url).await;
        }
        prefs.set(PrefKey::ShopDomain, form.shop_domain.trim()).await;
        prefs.set(PrefKey::ShopToken, form.shop_token.trim()).await;
    }
    state.notify(Severity::Success, "Saved admin settings.").await;
    Redirect::to("/")
}

pub async fn send_support(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Redirect, AppError> {
    let mut form = read_multipart(multipart).await?;
    let message = form.field("message").trim().to_string();
    if message.chars().count() < 3 {
        state.notify(Severity::Error, "Please write a message.").await;
        return Ok(Redirect::to("/"));
    }
    let subject = non_empty(form.field("subject")).unwrap_or("Support").to_string();
    let order_number = non_empty(form.field("order_number"))
        .or_else(|| support::extract_order_number(&message))
        .map(str::to_string);

    let client = state.client().await;
    let ticket = TicketDraft {
        subject,
        message,
        order_number,
        upload: form.file.take(),
    };
    let sent = ticket.submit(&client).await;

    match sent {
        Ok(()) => {
            state
                .notify(Severity::Success, "Sent ✅ We'll reply as soon as we can.")
                .await
        }
        Err(err) => {
            warn!("support ticket not sent: {err}");
            state
                .notify(Severity::Error, "Could not send. Please try again.")
                .await;
        }
    }
    Ok(Redirect::to("/"))
}

struct TicketDraft {
    subject: String,
    message: String,
    order_number: Option<String>,
    upload: Option<Upload>,
}

impl TicketDraft {
    /// Uploads the attachment first; a failed upload means no ticket.
    async fn submit(self, client: &ApiClient) -> Result<(), RequestError> {
        let image_url = match self.upload {
            Some(upload) => upload.send(client).await?,
            None => None,
        };
        client
            .create_support_ticket(&SupportTicket {
                subject: &self.subject,
                message: &self.message,
                order_number: self.order_number.as_deref(),
                image_url: image_url.as_deref(),
            })
            .await
    }
}

/// Order problems go to the private support form instead of the public feed.
async fn send_to_support(state: &AppState, text: &str) {
    let hint = match support::extract_order_number(text) {
        Some(order) => format!(
            "This looks like an order question (order {order}). Please use Order help below, it stays private."
        ),
        None => "This looks like an order question. Please use Order help below, it stays private.".to_string(),
    };
    state.dispatch(Action::SelectTab(Tab::Account)).await;
    state.notify(Severity::Info, hint).await;
}

async fn failed(state: &AppState, what: &str, err: RequestError) {
    warn!("{what}: {err}");
    state
        .notify(Severity::Error, format!("{what}: {}", err.message))
        .await;
}

fn non_empty(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|value| !value.is_empty())
}

struct Upload {
    file_name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

impl Upload {
    async fn send(self, client: &ApiClient) -> Result<Option<String>, RequestError> {
        let out = client
            .upload_media(&self.file_name, self.content_type.as_deref(), self.bytes)
            .await?;
        Ok(out.url.filter(|url| !url.is_empty()))
    }
}

#[derive(Default)]
struct MultipartForm {
    fields: HashMap<String, String>,
    file: Option<Upload>,
}

impl MultipartForm {
    fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }
}

/// Text fields by name plus the first non-empty `file` part.
async fn read_multipart(mut multipart: Multipart) -> Result<MultipartForm, AppError> {
    let mut form = MultipartForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await?;
            if !bytes.is_empty() && form.file.is_none() {
                form.file = Some(Upload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
        } else {
            let value = field.text().await?;
            form.fields.insert(name, value);
        }
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RemoteId;
    use crate::views::fixtures::post;

    fn comment(text: &str) -> Comment {
        Comment {
            id: RemoteId::Number(1),
            text: text.to_string(),
            author_display_name: None,
            created_at: None,
        }
    }

    #[test]
    fn answer_tip_uses_latest_comment_and_stripped_question() {
        let question = post(5, "Q: which varnish for outdoor pots?", Some("https://img/pot.jpg"));
        let draft = answer_tip(
            "5",
            Some(&question),
            &[comment("Try acrylic"), comment(" Use yacht varnish ")],
        )
        .unwrap();
        assert_eq!(draft.title, "which varnish for outdoor pots?");
        assert_eq!(
            draft.body,
            "Q: which varnish for outdoor pots?\n\nA: Use yacht varnish"
        );
        assert_eq!(draft.media_url.as_deref(), Some("https://img/pot.jpg"));
    }

    #[test]
    fn answer_tip_needs_a_comment() {
        assert_eq!(answer_tip("5", None, &[]), None);
        assert_eq!(answer_tip("5", None, &[comment("   ")]), None);
    }

    #[test]
    fn answer_tip_falls_back_when_post_is_gone() {
        let draft = answer_tip("12", None, &[comment("Sand first")]).unwrap();
        assert_eq!(draft.title, "Community post #12");
        assert!(draft.media_url.is_none());
    }

    #[test]
    fn long_questions_are_cut_for_the_title() {
        let long = "a".repeat(200);
        let question = post(1, &long, None);
        let draft = answer_tip("1", Some(&question), &[comment("ok")]).unwrap();
        assert_eq!(draft.title.chars().count(), TIP_TITLE_CHARS);
    }

    #[test]
    fn non_empty_trims() {
        assert_eq!(non_empty("  x "), Some("x"));
        assert_eq!(non_empty("   "), None);
    }
}
