use crate::api::{self, ApiClient};
use crate::errors::RequestError;
use crate::models::Tip;
use crate::picker::{self, DailyPick};
use crate::state::{Action, AppState, Focus, Tab};
use crate::storage::PrefKey;
use crate::ui;
use crate::views::{
    self, AccountData, CommunityData, Flash, HomeData, Section, ShopData, TabData, TipsData,
};
use chrono::Local;
use tracing::{debug, info, warn};

const MAX_ATTEMPTS: u32 = 3;

/// One full page: session check, fetch for the current tab, render, then consume
/// the flash values the page showed.
pub async fn render_pass(state: &AppState) -> String {
    refresh_session(state).await;

    let mut attempt = 0;
    let data = loop {
        attempt += 1;
        let (tab, generation) = {
            let view = state.view.lock().await;
            (view.tab, view.generation)
        };
        let data = fetch(state, tab).await;
        let current = state.view.lock().await.generation;
        if current == generation || attempt >= MAX_ATTEMPTS {
            break data;
        }
        debug!("tab changed while loading {}, reloading", tab.slug());
    };

    let mut view = state.view.lock().await;
    let flash = Flash {
        focus: view.take_focus(),
        redeemed: view.take_redeemed(),
    };
    let status = view.take_status();
    let body = views::render(&view, &data, &flash);
    ui::render_page(data.tab(), status.as_ref(), &body)
}

/// Loads the profile for the stored token. Any failure ends the session without a
/// message, unless the user already logged in again with a different token.
pub async fn refresh_session(state: &AppState) {
    let Some(token) = state.view.lock().await.token.clone() else {
        return;
    };
    let client = ApiClient::new(state.http.clone(), state.api_url().await, Some(token.clone()));
    let outcome = client.me().await;

    let still_current = state.view.lock().await.token.as_deref() == Some(token.as_str());
    if !still_current {
        return;
    }
    match outcome {
        Ok(profile) => state.dispatch(Action::ProfileLoaded(profile)).await,
        Err(err) => {
            if err.is_unauthorized() {
                info!("stored token rejected, signing out");
            } else {
                warn!("profile check failed, signing out: {err}");
            }
            state.dispatch(Action::SessionExpired).await;
        }
    }
}

async fn fetch(state: &AppState, tab: Tab) -> TabData {
    match tab {
        Tab::Home => TabData::Home(fetch_home(state).await),
        Tab::Tips => {
            let client = state.client().await;
            TabData::Tips(TipsData {
                tips: section("tips", client.tricks().await),
            })
        }
        Tab::Community => TabData::Community(fetch_community(state).await),
        Tab::Shop => TabData::Shop(fetch_shop(state).await),
        Tab::Account => {
            let api_url = state.api_url().await;
            let prefs = state.prefs.lock().await;
            TabData::Account(AccountData {
                api_url,
                shop_domain: prefs.get(PrefKey::ShopDomain).unwrap_or("").to_string(),
                shop_token: prefs.get(PrefKey::ShopToken).unwrap_or("").to_string(),
            })
        }
    }
}

fn section<T>(what: &str, result: Result<T, RequestError>) -> Section<T> {
    result.map_err(|err| {
        warn!("failed to load {what}: {err}");
        err.message
    })
}

async fn fetch_home(state: &AppState) -> HomeData {
    let client = state.client().await;
    let (tips, posts) = tokio::join!(client.tricks(), client.posts());
    let tips = section("tips", tips);
    let posts = section("posts", posts);

    let tip_of_day = match &tips {
        Ok(tips) => tip_of_day(state, tips).await,
        Err(_) => None,
    };
    HomeData {
        tips,
        posts,
        tip_of_day,
    }
}

async fn tip_of_day(state: &AppState, tips: &[Tip]) -> Option<Tip> {
    let mut prefs = state.prefs.lock().await;
    let cached = match (prefs.get(PrefKey::TipOfDayDate), prefs.get(PrefKey::TipOfDayId)) {
        (Some(date_key), Some(item_id)) => Some(DailyPick {
            date_key: date_key.to_string(),
            item_id: item_id.to_string(),
        }),
        _ => None,
    };

    let today = Local::now().date_naive();
    let (index, pick) = {
        let mut rng = rand::thread_rng();
        picker::pick_daily(today, tips, cached.as_ref(), |tip| tip.id.to_string(), &mut rng)?
    };

    if cached.as_ref() != Some(&pick) {
        prefs.set(PrefKey::TipOfDayDate, pick.date_key).await;
        prefs.set(PrefKey::TipOfDayId, pick.item_id).await;
    }
    tips.get(index).cloned()
}

async fn fetch_community(state: &AppState) -> CommunityData {
    let open = match state.view.lock().await.focus() {
        Some(Focus::Comments(post_id)) => Some(post_id.clone()),
        _ => None,
    };
    let client = state.client().await;
    let posts = section("posts", client.posts().await);
    let comments = match open {
        Some(post_id) => {
            let comments = section("comments", client.comments(&post_id).await);
            Some((post_id, comments))
        }
        None => None,
    };
    CommunityData { posts, comments }
}

async fn fetch_shop(state: &AppState) -> ShopData {
    let (domain, token) = {
        let prefs = state.prefs.lock().await;
        (
            prefs.get(PrefKey::ShopDomain).unwrap_or("").trim().to_string(),
            prefs.get(PrefKey::ShopToken).unwrap_or("").trim().to_string(),
        )
    };
    if domain.is_empty() || token.is_empty() {
        return ShopData::default();
    }
    ShopData {
        products: api::storefront_products(&state.http, &domain, &token).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::storage::PreferenceStore;
    use axum::{extract::State, routing::get, Json, Router};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn offline_state() -> AppState {
        // Port 9 (discard) on loopback refuses connections, so every fetch fails fast.
        let config = Config::from_lookup(|key| match key {
            "API_URL" => Some("http://127.0.0.1:9".to_string()),
            _ => None,
        });
        AppState::new(config, PreferenceStore::in_memory())
    }

    #[tokio::test]
    async fn unreachable_backend_still_renders_shell() {
        let state = offline_state();
        let html = render_pass(&state).await;
        assert!(html.contains(r#"id="tip-of-day""#));
        assert!(html.contains(&ui::escape("Couldn't load tips right now.")));
        assert!(html.contains(r#"action="/tab/account""#));
    }

    #[tokio::test]
    async fn failed_profile_load_expires_session_silently() {
        let state = offline_state();
        state.dispatch(Action::LoggedIn("stale".into())).await;
        refresh_session(&state).await;

        let view = state.view.lock().await;
        assert!(view.token.is_none());
        assert!(view.me.is_none());
        assert!(view.status().is_none());
    }

    #[tokio::test]
    async fn account_tab_renders_without_network() {
        let state = offline_state();
        state.dispatch(Action::SelectTab(Tab::Account)).await;
        let html = render_pass(&state).await;
        assert!(html.contains("Login / Register"));
    }

    /// A backend whose `/tricks` handler switches the local tab while the render
    /// pass is waiting on it.
    async fn racing_state(flip: fn(Tab) -> Option<Tab>) -> (AppState, Arc<AtomicUsize>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let config = Config::from_lookup(|key| match key {
            "API_URL" => Some(url.clone()),
            _ => None,
        });
        let state = AppState::new(config, PreferenceStore::in_memory());
        let calls = Arc::new(AtomicUsize::new(0));

        let app = Router::new()
            .route(
                "/tricks",
                get(
                    move |State((app, calls)): State<(AppState, Arc<AtomicUsize>)>| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        let current = app.view.lock().await.tab;
                        if let Some(next) = flip(current) {
                            app.dispatch(Action::SelectTab(next)).await;
                        }
                        Json(json!([{ "id": 1, "title": "Glass prep", "body": "Clean first" }]))
                    },
                ),
            )
            .route("/posts", get(|| async { Json(json!([])) }))
            .with_state((state.clone(), Arc::clone(&calls)));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (state, calls)
    }

    #[tokio::test]
    async fn tab_switch_during_fetch_renders_the_new_tab() {
        let (state, calls) = racing_state(|tab| (tab == Tab::Home).then_some(Tab::Account)).await;

        let html = render_pass(&state).await;
        assert!(html.contains("Login / Register"));
        assert!(!html.contains(r#"id="tip-of-day""#));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn endless_tab_switching_stops_after_three_fetches() {
        let (state, calls) = racing_state(|tab| match tab {
            Tab::Home => Some(Tab::Tips),
            _ => Some(Tab::Home),
        })
        .await;

        let html = render_pass(&state).await;
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS as usize);
        // Home, Tips, Home: the third snapshot is kept even though the tab moved on.
        assert!(html.contains(r#"id="tip-of-day""#));
        assert_eq!(state.view.lock().await.tab, Tab::Tips);
    }

    #[tokio::test]
    async fn status_is_shown_once() {
        let state = offline_state();
        state.dispatch(Action::SelectTab(Tab::Shop)).await;
        state
            .notify(crate::state::Severity::Success, "Saved ✅")
            .await;
        assert!(render_pass(&state).await.contains("Saved ✅"));
        assert!(!render_pass(&state).await.contains("Saved ✅"));
    }
}
