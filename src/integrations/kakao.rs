//! Kakao local search: keyword search and address geocoding

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{PlaceSearch, build_retrying_client, build_url, ensure_success, missing_key};
use crate::config::InboundAiConfig;
use crate::models::{Coordinates, Place};
use crate::{InboundAiError, Result};

const SERVICE: &str = "kakao";
/// Largest page size the keyword endpoint accepts
pub const MAX_PAGE_SIZE: u32 = 15;

#[derive(Debug, Deserialize)]
struct SearchResponse<T> {
    #[serde(default = "Vec::new")]
    documents: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct PlaceDocument {
    id: String,
    place_name: String,
    #[serde(default)]
    category_name: String,
    #[serde(default)]
    category_group_name: String,
    #[serde(default)]
    address_name: String,
    #[serde(default)]
    road_address_name: String,
    #[serde(default)]
    phone: String,
    /// Longitude, sent as a string
    x: String,
    /// Latitude, sent as a string
    y: String,
    #[serde(default)]
    place_url: String,
}

#[derive(Debug, Deserialize)]
struct AddressDocument {
    x: String,
    y: String,
}

fn parse_coordinates(x: &str, y: &str) -> Option<Coordinates> {
    let longitude = x.trim().parse::<f64>().ok()?;
    let latitude = y.trim().parse::<f64>().ok()?;
    Some(Coordinates::new(latitude, longitude))
}

fn optional(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Places from a keyword search response; documents without coordinates are dropped
pub fn parse_places(json: &str) -> Result<Vec<Place>> {
    let response: SearchResponse<PlaceDocument> = serde_json::from_str(json)
        .map_err(|e| InboundAiError::api(SERVICE, format!("malformed keyword response: {e}")))?;

    Ok(response
        .documents
        .into_iter()
        .filter_map(|doc| {
            let Some(coordinates) = parse_coordinates(&doc.x, &doc.y) else {
                debug!(place = %doc.place_name, "Dropping place without coordinates");
                return None;
            };
            Some(Place {
                id: doc.id,
                name: doc.place_name,
                category: doc.category_name,
                category_group: doc.category_group_name,
                address: doc.address_name,
                road_address: optional(doc.road_address_name),
                phone: optional(doc.phone),
                coordinates,
                place_url: optional(doc.place_url),
            })
        })
        .collect())
}

/// First match of an address search response
pub fn parse_geocode(json: &str) -> Result<Option<Coordinates>> {
    let response: SearchResponse<AddressDocument> = serde_json::from_str(json)
        .map_err(|e| InboundAiError::api(SERVICE, format!("malformed address response: {e}")))?;
    Ok(response
        .documents
        .first()
        .and_then(|doc| parse_coordinates(&doc.x, &doc.y)))
}

pub struct KakaoClient {
    client: ClientWithMiddleware,
    rest_key: Option<String>,
    base_url: String,
}

impl KakaoClient {
    pub fn new(config: &InboundAiConfig) -> Result<Self> {
        Ok(Self {
            client: build_retrying_client(config.apis.timeout_seconds, config.apis.max_retries)?,
            rest_key: config.apis.kakao_rest_key.clone(),
            base_url: config.apis.kakao_base_url.clone(),
        })
    }

    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<String> {
        let key = self
            .rest_key
            .as_deref()
            .ok_or_else(|| missing_key(SERVICE, "apis.kakao_rest_key"))?;

        let url = build_url(&self.base_url, path, params);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("KakaoAK {key}"))
            .send()
            .await
            .map_err(|e| InboundAiError::api(SERVICE, format!("request failed: {e}")))?;
        let response = ensure_success(SERVICE, response).await?;
        response
            .text()
            .await
            .map_err(|e| InboundAiError::api(SERVICE, format!("failed to read body: {e}")))
    }
}

#[async_trait]
impl PlaceSearch for KakaoClient {
    #[instrument(skip(self))]
    async fn keyword(&self, query: &str, size: u32) -> Result<Vec<Place>> {
        let size = size.clamp(1, MAX_PAGE_SIZE).to_string();
        let body = self
            .get("search/keyword.json", &[("query", query), ("size", size.as_str())])
            .await?;
        let places = parse_places(&body)?;
        debug!(count = places.len(), "Keyword search finished");
        Ok(places)
    }

    #[instrument(skip(self))]
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>> {
        let body = self
            .get("search/address.json", &[("query", address)])
            .await?;
        parse_geocode(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYWORD: &str = r#"{
      "documents": [
        {
          "address_name": "서울 종로구 세종로 1-91",
          "category_group_code": "AT4",
          "category_group_name": "관광명소",
          "category_name": "여행 > 관광,명소 > 문화유적 > 고궁,궁",
          "distance": "",
          "id": "18619090",
          "phone": "02-3700-3900",
          "place_name": "경복궁",
          "place_url": "http://place.map.kakao.com/18619090",
          "road_address_name": "서울 종로구 사직로 161",
          "x": "126.977041",
          "y": "37.579617"
        },
        {
          "address_name": "서울 중구 을지로2가 50",
          "category_group_name": "",
          "category_name": "여행 > 숙박 > 호텔",
          "id": "8189573",
          "phone": "",
          "place_name": "좌표 없는 호텔",
          "road_address_name": "",
          "x": "",
          "y": ""
        }
      ],
      "meta": {"is_end": true, "pageable_count": 2, "total_count": 2}
    }"#;

    #[test]
    fn test_parse_places() {
        let places = parse_places(KEYWORD).unwrap();
        assert_eq!(places.len(), 1);
        let palace = &places[0];
        assert_eq!(palace.name, "경복궁");
        assert_eq!(palace.category_group, "관광명소");
        assert_eq!(palace.road_address.as_deref(), Some("서울 종로구 사직로 161"));
        assert!((palace.coordinates.latitude - 37.579_617).abs() < 1e-9);
        assert!((palace.coordinates.longitude - 126.977_041).abs() < 1e-9);
    }

    #[test]
    fn test_parse_geocode() {
        let json = r#"{"documents":[{"address_name":"서울 강남구 역삼동","x":"127.03","y":"37.50"}],"meta":{"total_count":1}}"#;
        let coords = parse_geocode(json).unwrap().unwrap();
        assert!((coords.latitude - 37.50).abs() < 1e-9);

        let empty = r#"{"documents":[],"meta":{"total_count":0}}"#;
        assert!(parse_geocode(empty).unwrap().is_none());
    }

    #[test]
    fn test_malformed_json_is_api_error() {
        let err = parse_places("<html>").unwrap_err();
        assert!(matches!(err, InboundAiError::Api { service: "kakao", .. }));
    }
}
