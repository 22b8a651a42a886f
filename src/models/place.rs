//! Map search results and coordinates

use haversine::{Location as HaversineLocation, Units, distance};
use serde::{Deserialize, Serialize};

/// Seoul City Hall, the map centre when nothing else resolves
pub const DEFAULT_MAP_CENTER: Coordinates = Coordinates {
    latitude: 37.5665,
    longitude: 126.9780,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A place returned by the map keyword search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    /// Full category path, e.g. `여행 > 관광,명소 > 테마파크`
    pub category: String,
    /// Top-level category group, e.g. `관광명소`, `숙박`
    pub category_group: String,
    pub address: String,
    pub road_address: Option<String>,
    pub phone: Option<String>,
    pub coordinates: Coordinates,
    pub place_url: Option<String>,
}

impl Coordinates {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance in kilometers
    #[must_use]
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        let from = HaversineLocation {
            latitude: self.latitude,
            longitude: self.longitude,
        };
        let to = HaversineLocation {
            latitude: other.latitude,
            longitude: other.longitude,
        };
        distance(from, to, Units::Kilometers)
    }

    /// Format as coordinates string
    #[must_use]
    pub fn format(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

impl Place {
    /// Road address when present, otherwise the lot address
    #[must_use]
    pub fn display_address(&self) -> &str {
        match &self.road_address {
            Some(road) if !road.is_empty() => road,
            _ => &self.address,
        }
    }

    /// Link to the place on the public map site
    #[must_use]
    pub fn map_link(&self) -> String {
        format!("https://map.kakao.com/link/map/{}", self.id)
    }
}
