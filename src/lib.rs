pub mod config;
pub mod error;
pub mod feedback;
pub mod provider;
pub mod testing;

pub mod prelude {
    pub use crate::config::AppConfig;
    pub use crate::error::Result;
    pub use crate::feedback::{
        FeedbackConfig, FeedbackEntry, FeedbackKind, FeedbackQuery, FeedbackRecorder, Sentiment,
    };
    pub use crate::provider::{Plugin, PluginRegistry, Prompter};
}
