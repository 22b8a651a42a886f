//! Data models for the `InboundAI` service
//!
//! This module contains the core domain models organized by concern:
//! - Visitor: monthly arrival records, calendar months and seasons
//! - Tourism: festivals and seasonal attractions from the tourism API
//! - Place: map search results and coordinates
//! - Blog: cleaned blog search snippets
//! - Country: per-country travel profiles and seasonal growth rates

pub mod blog;
pub mod country;
pub mod place;
pub mod tourism;
pub mod visitor;

// Re-export all public types for convenient access
pub use blog::BlogSnippet;
pub use country::{CountryProfile, SeasonalGrowth};
pub use place::{Coordinates, DEFAULT_MAP_CENTER, Place};
pub use tourism::{Attraction, Festival};
pub use visitor::{ForecastRecord, Season, VisitorRecord, YearMonth};
