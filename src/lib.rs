//! `InboundAI` - inbound travel planning for Korean tour operators
//!
//! This library forecasts monthly foreign-visitor arrivals per country, looks up
//! festivals, seasonal attractions and nearby places, and drafts itineraries with
//! a hosted language model. Every page of the assistant is exposed as a typed view
//! driven by a per-session state machine.

pub mod analytics;
pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod dataset;
pub mod error;
pub mod forecast;
pub mod integrations;
pub mod logging;
pub mod models;
pub mod pages;
pub mod planner;
pub mod region;
pub mod session;
pub mod text;
pub mod web;

// Re-export core types for public API
pub use app::App;
pub use cache::PersistentCache;
pub use config::InboundAiConfig;
pub use dataset::DataStore;
pub use error::InboundAiError;
pub use forecast::{ForecastOutcome, ForecastSelector};
pub use models::{ForecastRecord, Season, VisitorRecord, YearMonth};
pub use pages::{PageView, Services};
pub use region::{Region, extract_region};
pub use session::{Command, Page, SessionState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, InboundAiError>;
