use crate::api::ApiClient;
use crate::classify::{CommunityFilter, PostKind};
use crate::config::Config;
use crate::models::{Profile, RedeemedCode};
use crate::storage::{PrefKey, PreferenceStore};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Home,
    Tips,
    Community,
    Shop,
    Account,
}

impl Tab {
    pub const ALL: [Tab; 5] = [Tab::Home, Tab::Tips, Tab::Community, Tab::Shop, Tab::Account];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "home" => Some(Tab::Home),
            "tips" | "tricks" => Some(Tab::Tips),
            "community" => Some(Tab::Community),
            "shop" => Some(Tab::Shop),
            "account" => Some(Tab::Account),
            _ => None,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Tab::Home => "home",
            Tab::Tips => "tips",
            Tab::Community => "community",
            Tab::Shop => "shop",
            Tab::Account => "account",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tab::Home => "Home",
            Tab::Tips => "Tips",
            Tab::Community => "Community",
            Tab::Shop => "Shop",
            Tab::Account => "Account",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Tab::Home => "🏠",
            Tab::Tips => "✨",
            Tab::Community => "👩‍🎨",
            Tab::Shop => "🛍️",
            Tab::Account => "👤",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountMode {
    Authenticated,
    Anonymous,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Focus {
    Tip(String),
    Comments(String),
    Compose(PostKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    pub fn class(self) -> &'static str {
        match self {
            Severity::Info => "",
            Severity::Success => "success",
            Severity::Error => "danger",
        }
    }

    /// Milliseconds before the banner hides itself.
    pub fn dismiss_after_ms(self) -> u32 {
        match self {
            Severity::Error => 5500,
            Severity::Info | Severity::Success => 2600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone)]
pub enum Action {
    SelectTab(Tab),
    OpenTip(String),
    OpenComments(String),
    OpenAnswers(String),
    Compose(PostKind),
    LoggedIn(String),
    ProfileLoaded(Profile),
    SessionExpired,
    Logout,
    SetTrickSearch(String),
    SetCommunityFilter(CommunityFilter),
    Notify(Severity, String),
    CodeRedeemed(RedeemedCode),
}

/// Everything the views branch on. Mutated only through [`ViewState::apply`].
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub tab: Tab,
    pub token: Option<String>,
    pub me: Option<Profile>,
    pub trick_search: String,
    pub community_filter: CommunityFilter,
    pub generation: u64,
    focus: Option<Focus>,
    status: Option<Status>,
    redeemed: Option<RedeemedCode>,
}

impl ViewState {
    pub fn restore(prefs: &PreferenceStore, restore_last_tab: bool) -> Self {
        let tab = if restore_last_tab {
            prefs.get(PrefKey::LastTab).and_then(Tab::parse)
        } else {
            None
        };
        Self {
            tab: tab.unwrap_or_default(),
            token: prefs
                .get(PrefKey::Token)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            trick_search: prefs.get(PrefKey::TrickSearch).unwrap_or("").to_string(),
            community_filter: prefs
                .get(PrefKey::CommunityFilter)
                .map(CommunityFilter::parse)
                .unwrap_or_default(),
            ..Self::default()
        }
    }

    pub fn account_mode(&self) -> AccountMode {
        if self.me.is_some() {
            AccountMode::Authenticated
        } else {
            AccountMode::Anonymous
        }
    }

    pub fn is_admin(&self) -> bool {
        self.me.as_ref().is_some_and(|me| me.is_admin)
    }

    pub fn focus(&self) -> Option<&Focus> {
        self.focus.as_ref()
    }

    pub fn take_focus(&mut self) -> Option<Focus> {
        self.focus.take()
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn take_status(&mut self) -> Option<Status> {
        self.status.take()
    }

    pub fn take_redeemed(&mut self) -> Option<RedeemedCode> {
        self.redeemed.take()
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::SelectTab(tab) => self.select(tab),
            Action::OpenTip(id) => {
                self.select(Tab::Tips);
                self.focus = Some(Focus::Tip(id));
            }
            Action::OpenComments(post_id) => {
                self.select(Tab::Community);
                self.focus = Some(Focus::Comments(post_id));
            }
            Action::OpenAnswers(post_id) => {
                self.community_filter = CommunityFilter::Questions;
                self.select(Tab::Community);
                self.focus = Some(Focus::Comments(post_id));
            }
            Action::Compose(kind) => {
                self.community_filter = match kind {
                    PostKind::Question => CommunityFilter::Questions,
                    PostKind::Work => CommunityFilter::Works,
                };
                self.select(Tab::Community);
                self.focus = Some(Focus::Compose(kind));
            }
            Action::LoggedIn(token) => {
                self.token = Some(token).filter(|t| !t.is_empty());
                self.me = None;
            }
            Action::ProfileLoaded(profile) => self.me = Some(profile),
            Action::SessionExpired => {
                self.token = None;
                self.me = None;
            }
            Action::Logout => {
                self.token = None;
                self.me = None;
                self.redeemed = None;
                self.select(Tab::Home);
                self.notify(Severity::Success, "Logged out.");
            }
            Action::SetTrickSearch(search) => self.trick_search = search,
            Action::SetCommunityFilter(filter) => self.community_filter = filter,
            Action::Notify(severity, message) => self.notify(severity, message),
            Action::CodeRedeemed(code) => self.redeemed = Some(code),
        }
    }

    fn select(&mut self, tab: Tab) {
        if self.tab != tab {
            self.focus = None;
        }
        self.tab = tab;
        self.generation = self.generation.wrapping_add(1);
    }

    fn notify(&mut self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        self.status = if message.trim().is_empty() {
            None
        } else {
            Some(Status { message, severity })
        };
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http: reqwest::Client,
    pub prefs: Arc<Mutex<PreferenceStore>>,
    pub view: Arc<Mutex<ViewState>>,
}

impl AppState {
    pub fn new(config: Config, prefs: PreferenceStore) -> Self {
        let view = ViewState::restore(&prefs, config.restore_last_tab);
        Self {
            config: Arc::new(config),
            http: reqwest::Client::new(),
            prefs: Arc::new(Mutex::new(prefs)),
            view: Arc::new(Mutex::new(view)),
        }
    }

    pub async fn api_url(&self) -> String {
        let prefs = self.prefs.lock().await;
        prefs
            .get(PrefKey::ApiUrl)
            .map(crate::config::normalize_base_url)
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| self.config.api_url.clone())
    }

    /// A gateway bound to the endpoint and token as they are right now. Requests
    /// already in flight keep whatever token they started with.
    pub async fn client(&self) -> ApiClient {
        let token = self.view.lock().await.token.clone();
        ApiClient::new(self.http.clone(), self.api_url().await, token)
    }

    /// Applies an action and writes the durable parts of the outcome through to the
    /// preference store.
    pub async fn dispatch(&self, action: Action) {
        let mut view = self.view.lock().await;
        let before = (
            view.tab,
            view.token.clone(),
            view.trick_search.clone(),
            view.community_filter,
        );
        view.apply(action);
        let after = (
            view.tab,
            view.token.clone(),
            view.trick_search.clone(),
            view.community_filter,
        );
        drop(view);

        if before == after {
            return;
        }
        let mut prefs = self.prefs.lock().await;
        if before.0 != after.0 {
            prefs.set(PrefKey::LastTab, after.0.slug()).await;
        }
        if before.1 != after.1 {
            match &after.1 {
                Some(token) => prefs.set(PrefKey::Token, token.clone()).await,
                None => prefs.clear(PrefKey::Token).await,
            }
        }
        if before.2 != after.2 {
            prefs.set(PrefKey::TrickSearch, after.2.clone()).await;
        }
        if before.3 != after.3 {
            prefs.set(PrefKey::CommunityFilter, after.3.as_str()).await;
        }
    }

    pub async fn notify(&self, severity: Severity, message: impl Into<String>) {
        self.dispatch(Action::Notify(severity, message.into())).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(admin: bool) -> Profile {
        serde_json::from_value(serde_json::json!({
            "email": "a@b.c",
            "display_name": "Ada",
            "is_admin": admin
        }))
        .unwrap()
    }

    #[test]
    fn starts_on_home_anonymous() {
        let state = ViewState::restore(&PreferenceStore::in_memory(), true);
        assert_eq!(state.tab, Tab::Home);
        assert_eq!(state.account_mode(), AccountMode::Anonymous);
        assert!(state.token.is_none());
    }

    #[tokio::test]
    async fn last_tab_is_restored_only_on_request() {
        let mut prefs = PreferenceStore::in_memory();
        prefs.set(PrefKey::LastTab, "shop").await;
        prefs.set(PrefKey::Token, "tok").await;

        assert_eq!(ViewState::restore(&prefs, false).tab, Tab::Home);
        let restored = ViewState::restore(&prefs, true);
        assert_eq!(restored.tab, Tab::Shop);
        assert_eq!(restored.token.as_deref(), Some("tok"));
        assert_eq!(restored.account_mode(), AccountMode::Anonymous);
    }

    #[test]
    fn focus_is_consumed_once() {
        let mut state = ViewState::default();
        state.apply(Action::OpenTip("42".into()));
        assert_eq!(state.tab, Tab::Tips);
        assert_eq!(state.take_focus(), Some(Focus::Tip("42".into())));
        assert_eq!(state.take_focus(), None);

        state.apply(Action::SelectTab(Tab::Tips));
        assert_eq!(state.take_focus(), None);
    }

    #[test]
    fn switching_tabs_drops_unconsumed_focus() {
        let mut state = ViewState::default();
        state.apply(Action::OpenComments("7".into()));
        state.apply(Action::SelectTab(Tab::Shop));
        assert_eq!(state.take_focus(), None);
    }

    #[test]
    fn compose_deep_link_sets_filter_and_focuses_once() {
        let mut state = ViewState::default();
        state.apply(Action::Compose(PostKind::Question));
        assert_eq!(state.tab, Tab::Community);
        assert_eq!(state.community_filter, CommunityFilter::Questions);
        assert_eq!(state.take_focus(), Some(Focus::Compose(PostKind::Question)));
        assert_eq!(state.take_focus(), None);

        state.apply(Action::Compose(PostKind::Work));
        assert_eq!(state.community_filter, CommunityFilter::Works);
    }

    #[test]
    fn open_answers_switches_to_questions() {
        let mut state = ViewState::default();
        state.apply(Action::OpenAnswers("7".into()));
        assert_eq!(state.tab, Tab::Community);
        assert_eq!(state.community_filter, CommunityFilter::Questions);
        assert_eq!(state.focus(), Some(&Focus::Comments("7".into())));
    }

    #[test]
    fn tab_changes_bump_generation() {
        let mut state = ViewState::default();
        let start = state.generation;
        state.apply(Action::SelectTab(Tab::Community));
        state.apply(Action::SetTrickSearch("glue".into()));
        assert_eq!(state.generation, start + 1);
    }

    #[test]
    fn expiry_is_silent_and_logout_is_not() {
        let mut state = ViewState::default();
        state.apply(Action::LoggedIn("tok".into()));
        state.apply(Action::ProfileLoaded(profile(true)));
        state.apply(Action::SelectTab(Tab::Account));
        assert_eq!(state.account_mode(), AccountMode::Authenticated);
        assert!(state.is_admin());

        state.apply(Action::SessionExpired);
        assert_eq!(state.account_mode(), AccountMode::Anonymous);
        assert_eq!(state.tab, Tab::Account);
        assert!(state.status().is_none());

        state.apply(Action::LoggedIn("tok2".into()));
        state.apply(Action::Logout);
        assert_eq!(state.tab, Tab::Home);
        assert!(state.token.is_none());
        assert_eq!(state.take_status().map(|s| s.severity), Some(Severity::Success));
        assert!(state.take_status().is_none());
    }

    #[test]
    fn tabs_parse_legacy_names() {
        assert_eq!(Tab::parse("Tricks"), Some(Tab::Tips));
        assert_eq!(Tab::parse("ACCOUNT"), Some(Tab::Account));
        assert_eq!(Tab::parse("settings"), None);
        for tab in Tab::ALL {
            assert_eq!(Tab::parse(tab.slug()), Some(tab));
        }
    }

    #[tokio::test]
    async fn dispatch_persists_token_and_tab() {
        let state = AppState::new(
            Config::from_lookup(|_| None),
            PreferenceStore::in_memory(),
        );
        state.dispatch(Action::LoggedIn("tok".into())).await;
        state.dispatch(Action::SelectTab(Tab::Community)).await;
        {
            let prefs = state.prefs.lock().await;
            assert_eq!(prefs.get(PrefKey::Token), Some("tok"));
            assert_eq!(prefs.get(PrefKey::LastTab), Some("community"));
        }

        state.dispatch(Action::SessionExpired).await;
        let prefs = state.prefs.lock().await;
        assert_eq!(prefs.get(PrefKey::Token), None);
        assert_eq!(prefs.get(PrefKey::LastTab), Some("community"));
    }
}
