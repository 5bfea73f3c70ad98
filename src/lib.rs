pub mod api;
pub mod config;
pub mod models;
pub mod services;

pub use api::{ApiError, ChatBackend, HttpBackend};
pub use config::ClientConfig;
pub use models::{ConversationSummary, CurrentUser, Message, Notification, ThreadKey};
pub use services::{
    ChatSession, ConversationFetcher, NotificationFetcher, SessionCache, SessionStore, ThreadSync,
};
