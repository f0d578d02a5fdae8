use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrefKey {
    Token,
    ApiUrl,
    ShopDomain,
    ShopToken,
    TrickSearch,
    LastTab,
    CommunityFilter,
    TipOfDayDate,
    TipOfDayId,
}

impl PrefKey {
    pub fn as_str(self) -> &'static str {
        match self {
            PrefKey::Token => "token",
            PrefKey::ApiUrl => "apiUrl",
            PrefKey::ShopDomain => "shopDomain",
            PrefKey::ShopToken => "shopToken",
            PrefKey::TrickSearch => "sod_trickSearch",
            PrefKey::LastTab => "sod_lastTab",
            PrefKey::CommunityFilter => "sod_communityFilter",
            PrefKey::TipOfDayDate => "sod_tipOfDayDate",
            PrefKey::TipOfDayId => "sod_tipOfDayId",
        }
    }
}

/// Durable per-device preferences, written through to a JSON file on every change.
///
/// When the file cannot be written the store keeps working from memory for the rest
/// of the process; callers never see a storage error.
#[derive(Debug)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
    values: BTreeMap<String, String>,
}

impl PreferenceStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: BTreeMap::new(),
        }
    }

    pub async fn open(path: PathBuf) -> Self {
        let values = load_values(&path).await;
        Self {
            path: Some(path),
            values,
        }
    }

    pub fn is_durable(&self) -> bool {
        self.path.is_some()
    }

    pub fn get(&self, key: PrefKey) -> Option<&str> {
        self.values.get(key.as_str()).map(String::as_str)
    }

    pub async fn set(&mut self, key: PrefKey, value: impl Into<String>) {
        self.values.insert(key.as_str().to_string(), value.into());
        self.flush().await;
    }

    pub async fn clear(&mut self, key: PrefKey) {
        if self.values.remove(key.as_str()).is_some() {
            self.flush().await;
        }
    }

    async fn flush(&mut self) {
        let Some(path) = self.path.as_deref() else {
            return;
        };
        if let Err(err) = persist_values(path, &self.values).await {
            warn!(
                "preferences at {} are not writable, keeping them in memory: {err}",
                path.display()
            );
            self.path = None;
        }
    }
}

async fn load_values(path: &Path) -> BTreeMap<String, String> {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(values) => values,
            Err(err) => {
                error!("failed to parse preferences file: {err}");
                BTreeMap::new()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
        Err(err) => {
            error!("failed to read preferences file: {err}");
            BTreeMap::new()
        }
    }
}

async fn persist_values(path: &Path, values: &BTreeMap<String, String>) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let payload = serde_json::to_vec_pretty(values)?;
    fs::write(path, payload).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_is_visible_and_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let mut store = PreferenceStore::open(path.clone()).await;
        store.set(PrefKey::Token, "abc").await;
        store.set(PrefKey::TrickSearch, "glue").await;
        assert_eq!(store.get(PrefKey::Token), Some("abc"));

        let reopened = PreferenceStore::open(path).await;
        assert_eq!(reopened.get(PrefKey::Token), Some("abc"));
        assert_eq!(reopened.get(PrefKey::TrickSearch), Some("glue"));
        assert!(reopened.is_durable());
    }

    #[tokio::test]
    async fn clear_removes_only_that_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let mut store = PreferenceStore::open(path.clone()).await;
        store.set(PrefKey::Token, "abc").await;
        store.set(PrefKey::ApiUrl, "http://api").await;
        store.clear(PrefKey::Token).await;

        let reopened = PreferenceStore::open(path).await;
        assert_eq!(reopened.get(PrefKey::Token), None);
        assert_eq!(reopened.get(PrefKey::ApiUrl), Some("http://api"));
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = PreferenceStore::open(path).await;
        assert_eq!(store.get(PrefKey::Token), None);
    }

    #[tokio::test]
    async fn unwritable_path_degrades_to_memory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file, not a directory").unwrap();

        let mut store = PreferenceStore::open(blocker.join("prefs.json")).await;
        store.set(PrefKey::Token, "abc").await;

        assert!(!store.is_durable());
        assert_eq!(store.get(PrefKey::Token), Some("abc"));
        store.set(PrefKey::Token, "def").await;
        assert_eq!(store.get(PrefKey::Token), Some("def"));
    }
}
