pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod host;
pub mod state;

// Re-export main types for convenience
pub use client::{ChatBackend, ChatReply, ChatRequest, HttpChatClient};
pub use config::{Config, UrlSetting, WidgetConfig};
pub use controller::{Exchange, PendingExchange, WidgetController};
pub use error::{ChatError, FailureKind};
pub use host::{expand_mount_marker, WidgetAssets};
pub use state::{ChatMessage, ChatRole, HistoryEntry, Transcript};
