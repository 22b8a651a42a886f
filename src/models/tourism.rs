//! Festivals and seasonal attractions from the tourism API

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::YearMonth;

/// A festival with a known run period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Festival {
    pub title: String,
    pub address: Option<String>,
    pub starts: NaiveDate,
    pub ends: NaiveDate,
    pub image_url: Option<String>,
}

/// A seasonal travel destination found by keyword search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attraction {
    pub title: String,
    pub address: Option<String>,
    pub image_url: Option<String>,
}

impl Festival {
    /// Whether the festival runs at any time during the given month
    #[must_use]
    pub fn runs_during(&self, period: YearMonth) -> bool {
        let start = YearMonth::new(self.starts.year(), self.starts.month());
        let end = YearMonth::new(self.ends.year(), self.ends.month());
        start <= period && period <= end
    }

    /// `YYYYMMDD ~ YYYYMMDD`
    #[must_use]
    pub fn schedule(&self) -> String {
        format!(
            "{} ~ {}",
            self.starts.format("%Y%m%d"),
            self.ends.format("%Y%m%d")
        )
    }
}
