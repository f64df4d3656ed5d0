pub mod distance;
pub mod matcher;
pub mod metrics;
pub mod store;
pub mod types;
