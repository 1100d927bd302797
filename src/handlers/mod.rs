// HTTP request handlers for the sync service
pub mod health;
pub mod sync;

// Re-export the main handler functions
pub use health::health;
pub use sync::run_sync;
