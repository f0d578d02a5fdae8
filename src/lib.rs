pub mod api;
pub mod app;
pub mod classify;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod picker;
pub mod render;
pub mod state;
pub mod storage;
pub mod support;
pub mod ui;
pub mod views;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::PreferenceStore;
