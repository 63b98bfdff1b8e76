// Analysis presentation pipeline: normalize -> project / classify
pub mod normalize;
pub mod history;
pub mod classify;

// Re-export commonly used items
pub use normalize::{normalize, normalize_history, parse_timestamp};
pub use history::{project, project_sorted, project_with, is_chronological};
pub use classify::classify;
