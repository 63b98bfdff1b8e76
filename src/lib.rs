// Public modules
pub mod types;
pub mod error;
pub mod config;
pub mod presentation;
pub mod client;
pub mod dashboard;
pub mod view;

// Re-export commonly used items
pub use types::*;
pub use error::{DashboardError, Result};
pub use config::{load_config, load_config_with_env, EnvironmentProvider, SystemEnvironment, MockEnvironment};
pub use presentation::{classify, normalize, normalize_history, parse_timestamp, project, project_sorted, project_with, is_chronological};
pub use client::{AnalysisClient, audio_mime_type};
pub use dashboard::{Dashboard, DashboardSnapshot, RefreshOutcome, SubmitOutcome};
pub use view::{build_analysis_view, build_chart_payload, build_snapshot_json, render_snapshot_text};
