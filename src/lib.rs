pub mod app;
pub mod assessment;
pub mod config;
pub mod duration;
pub mod errors;
pub mod estimator;
pub mod export;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod state;
pub mod stats;
pub mod storage;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::{load_data, resolve_data_path};
