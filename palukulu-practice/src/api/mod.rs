//! HTTP API handlers for palukulu-practice

pub mod contributions;
pub mod health;
pub mod practice;
pub mod proverbs;
pub mod ui;

pub use contributions::contribution_routes;
pub use health::health_routes;
pub use practice::practice_routes;
pub use proverbs::proverb_routes;
pub use ui::ui_routes;
