mod health;

pub use health::{health_handler, metrics_handler, status_handler};
