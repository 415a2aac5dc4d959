//! Reminder notifications — per-user settings, push-token registry, the
//! scheduler that matches wall-clock trigger times to qualifying users, and
//! the FCM delivery client.

pub mod api;
pub mod push;
pub mod scheduler;
pub mod store;
pub mod types;
