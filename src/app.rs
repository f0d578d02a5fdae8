use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

const UPLOAD_LIMIT: usize = 10 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/session", get(handlers::session))
        .route("/tab/:tab", post(handlers::select_tab))
        .route("/tip-of-day/refresh", post(handlers::refresh_tip_of_day))
        .route("/tips", post(handlers::publish_tip))
        .route("/tips/search", post(handlers::search_tips))
        .route("/tips/search/clear", post(handlers::clear_search))
        .route("/tips/ask", post(handlers::ask_question))
        .route("/tips/:id/open", post(handlers::open_tip))
        .route("/tips/:id/delete", post(handlers::delete_tip))
        .route("/community/filter", post(handlers::set_community_filter))
        .route("/community/browse/:kind", post(handlers::browse_community))
        .route("/community/compose/:kind", post(handlers::compose_post))
        .route("/community/posts", post(handlers::create_post))
        .route(
            "/community/posts/:id/comments/open",
            post(handlers::open_comments),
        )
        .route(
            "/community/posts/:id/answers/open",
            post(handlers::open_answers),
        )
        .route("/community/posts/:id/comments", post(handlers::add_comment))
        .route(
            "/community/posts/:id/save-tip",
            post(handlers::save_answer_as_tip),
        )
        .route("/account/login", post(handlers::login))
        .route("/account/register", post(handlers::register))
        .route("/account/logout", post(handlers::logout))
        .route("/account/sync-vip", post(handlers::sync_vip))
        .route("/account/redeem", post(handlers::redeem_credits))
        .route("/account/password", post(handlers::change_password))
        .route("/account/notifications", post(handlers::enable_notifications))
        .route("/account/settings", post(handlers::save_settings))
        .route("/account/support", post(handlers::send_support))
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT))
        .with_state(state)
}
