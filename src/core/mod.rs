pub mod clock;
pub mod config;
pub mod engine;
pub mod log;
pub mod presence;
pub mod reconciler;
pub mod store;
pub mod summary;
