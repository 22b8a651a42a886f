//! Per-country reference tables

use serde::{Deserialize, Serialize};

use super::Season;

/// Language and travel style of visitors from one country
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryProfile {
    pub country: String,
    pub language: String,
    pub travel_preference: String,
}

/// Arrival growth per season relative to the yearly average, in percent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalGrowth {
    pub country: String,
    pub spring: f64,
    pub summer: f64,
    pub autumn: f64,
    pub winter: f64,
}

impl SeasonalGrowth {
    #[must_use]
    pub fn rate(&self, season: Season) -> f64 {
        match season {
            Season::Spring => self.spring,
            Season::Summer => self.summer,
            Season::Autumn => self.autumn,
            Season::Winter => self.winter,
        }
    }
}
