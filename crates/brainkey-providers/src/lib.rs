//! brainkey-providers: Generative-AI lesson providers.
//!
//! Implements the `LessonProvider` trait for Gemini and OpenAI-compatible
//! services, plus the retry wrapper and offline lesson the shell falls
//! back on when generation fails.

pub mod config;
pub mod error;
pub mod fallback;
pub mod gemini;
pub mod mock;
pub mod openai;
pub mod prompt;

pub use config::{
    build_provider, create_provider, load_config, load_config_from, BrainkeyConfig,
    ProviderConfig, ProviderSelection,
};
pub use error::ProviderError;
pub use fallback::{offline_lesson, OfflineProvider, ResilientProvider};
