//! Korea Tourism Organization open API (`KorService1`), XML responses

use async_trait::async_trait;
use chrono::NaiveDate;
use quick_xml::de::from_str;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::{TourismApi, build_retrying_client, build_url, ensure_success, missing_key};
use crate::cache::{PersistentCache, get_or_fetch};
use crate::config::InboundAiConfig;
use crate::models::{Attraction, Festival, YearMonth};
use crate::{InboundAiError, Result};

const SERVICE: &str = "tour";
const SUCCESS_CODE: &str = "0000";
const FESTIVAL_ROWS: &str = "50";
const KEYWORD_ROWS: &str = "10";

#[derive(Debug, Deserialize)]
struct TourResponse {
    header: TourHeader,
    body: Option<TourBody>,
}

#[derive(Debug, Deserialize)]
struct TourHeader {
    #[serde(rename = "resultCode")]
    result_code: String,
    #[serde(rename = "resultMsg", default)]
    result_msg: String,
}

#[derive(Debug, Deserialize)]
struct TourBody {
    items: Option<TourItems>,
}

#[derive(Debug, Deserialize)]
struct TourItems {
    #[serde(default)]
    item: Vec<TourItem>,
}

#[derive(Debug, Deserialize)]
struct TourItem {
    title: String,
    addr1: Option<String>,
    eventstartdate: Option<String>,
    eventenddate: Option<String>,
    firstimage: Option<String>,
}

/// Gateway error envelope returned instead of `<response>` for key problems
#[derive(Debug, Deserialize)]
struct GatewayError {
    #[serde(rename = "cmmMsgHeader")]
    header: GatewayHeader,
}

#[derive(Debug, Deserialize)]
struct GatewayHeader {
    #[serde(rename = "returnAuthMsg", default)]
    auth_msg: String,
    #[serde(rename = "returnReasonCode", default)]
    reason_code: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw?.trim(), "%Y%m%d").ok()
}

fn parse_items(xml: &str) -> Result<Vec<TourItem>> {
    let response: TourResponse = match from_str(xml) {
        Ok(response) => response,
        Err(parse_error) => {
            if let Ok(gateway) = from_str::<GatewayError>(xml) {
                return Err(InboundAiError::api(
                    SERVICE,
                    format!(
                        "{} (reason {})",
                        gateway.header.auth_msg, gateway.header.reason_code
                    ),
                ));
            }
            return Err(InboundAiError::api(
                SERVICE,
                format!("malformed XML response: {parse_error}"),
            ));
        }
    };

    if response.header.result_code != SUCCESS_CODE {
        return Err(InboundAiError::api(
            SERVICE,
            format!(
                "result code {}: {}",
                response.header.result_code, response.header.result_msg
            ),
        ));
    }

    Ok(response
        .body
        .and_then(|body| body.items)
        .map(|items| items.item)
        .unwrap_or_default())
}

/// Festivals from a `searchFestival1` response; items without parseable dates are dropped
pub fn parse_festivals(xml: &str) -> Result<Vec<Festival>> {
    let festivals = parse_items(xml)?
        .into_iter()
        .filter_map(|item| {
            let starts = parse_date(item.eventstartdate.as_deref());
            let ends = parse_date(item.eventenddate.as_deref());
            match (starts, ends) {
                (Some(starts), Some(ends)) => Some(Festival {
                    title: item.title.trim().to_string(),
                    address: non_empty(item.addr1),
                    starts,
                    ends,
                    image_url: non_empty(item.firstimage),
                }),
                _ => {
                    debug!(title = %item.title, "Dropping festival without valid dates");
                    None
                }
            }
        })
        .collect();
    Ok(festivals)
}

/// Attractions from a `searchKeyword1` response
pub fn parse_attractions(xml: &str) -> Result<Vec<Attraction>> {
    Ok(parse_items(xml)?
        .into_iter()
        .map(|item| Attraction {
            title: item.title.trim().to_string(),
            address: non_empty(item.addr1),
            image_url: non_empty(item.firstimage),
        })
        .collect())
}

pub struct TourApiClient {
    client: ClientWithMiddleware,
    service_key: Option<String>,
    base_url: String,
    cache: Option<Arc<PersistentCache>>,
    festival_ttl: Duration,
    attraction_ttl: Duration,
}

impl TourApiClient {
    pub fn new(config: &InboundAiConfig, cache: Option<Arc<PersistentCache>>) -> Result<Self> {
        Ok(Self {
            client: build_retrying_client(config.apis.timeout_seconds, config.apis.max_retries)?,
            service_key: config.apis.tour_service_key.clone(),
            base_url: config.apis.tour_base_url.clone(),
            cache,
            festival_ttl: Duration::from_secs(u64::from(config.cache.festival_ttl_minutes) * 60),
            attraction_ttl: Duration::from_secs(
                u64::from(config.cache.attraction_ttl_hours) * 3600,
            ),
        })
    }

    async fn fetch(&self, operation: &str, extra: &[(&str, &str)]) -> Result<String> {
        let key = self
            .service_key
            .as_deref()
            .ok_or_else(|| missing_key(SERVICE, "apis.tour_service_key"))?;

        let mut params = vec![
            ("serviceKey", key),
            ("pageNo", "1"),
            ("MobileOS", "ETC"),
            ("MobileApp", "TravelApp"),
            ("_type", "xml"),
        ];
        params.extend_from_slice(extra);

        let url = build_url(&self.base_url, operation, &params);
        let response = self
            .client
            .get(&url)
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
impl TourismApi for TourApiClient {
    #[instrument(skip(self), fields(period = %period))]
    async fn festivals(&self, period: YearMonth) -> Result<Vec<Festival>> {
        let cache_key = format!("tour:festival:{}", period.first_day_compact());
        let fetch = move || async move {
            let start = period.first_day_compact();
            let xml = self
                .fetch(
                    "searchFestival1",
                    &[("numOfRows", FESTIVAL_ROWS), ("eventStartDate", start.as_str())],
                )
                .await?;
            parse_festivals(&xml)
        };
        let festivals =
            get_or_fetch(self.cache.as_deref(), &cache_key, self.festival_ttl, fetch).await?;

        let running: Vec<Festival> = festivals
            .into_iter()
            .filter(|f| f.runs_during(period))
            .collect();
        info!(count = running.len(), "Festivals running in month");
        Ok(running)
    }

    #[instrument(skip(self))]
    async fn keyword_attractions(&self, keyword: &str) -> Result<Vec<Attraction>> {
        let cache_key = format!("tour:keyword:{keyword}");
        let fetch = move || async move {
            let xml = self
                .fetch(
                    "searchKeyword1",
                    &[("numOfRows", KEYWORD_ROWS), ("keyword", keyword)],
                )
                .await?;
            parse_attractions(&xml)
        };
        let attractions =
            get_or_fetch(self.cache.as_deref(), &cache_key, self.attraction_ttl, fetch).await?;

        if attractions.is_empty() {
            warn!(keyword, "Keyword search returned no attractions");
        }
        Ok(attractions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FESTIVALS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<response>
  <header><resultCode>0000</resultCode><resultMsg>OK</resultMsg></header>
  <body>
    <items>
      <item>
        <addr1>경상남도 창원시 진해구 중원로타리 일원</addr1>
        <eventstartdate>20250328</eventstartdate>
        <eventenddate>20250406</eventenddate>
        <firstimage>http://tong.visitkorea.or.kr/cms/resource/1.jpg</firstimage>
        <title>진해군항제</title>
      </item>
      <item>
        <addr1></addr1>
        <eventstartdate>20250501</eventstartdate>
        <eventenddate>20250505</eventenddate>
        <firstimage></firstimage>
        <title>어린이날 축제</title>
      </item>
      <item>
        <eventstartdate>미정</eventstartdate>
        <eventenddate>20250505</eventenddate>
        <title>날짜 미정 축제</title>
      </item>
    </items>
    <numOfRows>50</numOfRows><pageNo>1</pageNo><totalCount>3</totalCount>
  </body>
</response>"#;

    #[test]
    fn test_parse_festivals() {
        let festivals = parse_festivals(FESTIVALS).unwrap();
        assert_eq!(festivals.len(), 2);
        assert_eq!(festivals[0].title, "진해군항제");
        assert_eq!(festivals[0].starts, NaiveDate::from_ymd_opt(2025, 3, 28).unwrap());
        assert!(festivals[0].image_url.is_some());
        assert_eq!(festivals[1].address, None);
        assert_eq!(festivals[1].image_url, None);

        let april: Vec<_> = festivals
            .iter()
            .filter(|f| f.runs_during(YearMonth::new(2025, 4)))
            .collect();
        assert_eq!(april.len(), 1);
    }

    #[test]
    fn test_parse_attractions() {
        let xml = r"<response><header><resultCode>0000</resultCode><resultMsg>OK</resultMsg></header>
<body><items><item><title>보성녹차밭</title><addr1>전라남도 보성군</addr1></item></items></body></response>";
        let attractions = parse_attractions(xml).unwrap();
        assert_eq!(attractions.len(), 1);
        assert_eq!(attractions[0].address.as_deref(), Some("전라남도 보성군"));
    }

    #[test]
    fn test_empty_items() {
        let xml = r"<response><header><resultCode>0000</resultCode><resultMsg>OK</resultMsg></header>
<body><items></items><totalCount>0</totalCount></body></response>";
        assert!(parse_festivals(xml).unwrap().is_empty());
    }

    #[test]
    fn test_error_result_code() {
        let xml = r"<response><header><resultCode>10</resultCode><resultMsg>INVALID_REQUEST_PARAMETER_ERROR</resultMsg></header></response>";
        let err = parse_festivals(xml).unwrap_err();
        assert!(err.to_string().contains("INVALID_REQUEST_PARAMETER_ERROR"));
    }

    #[test]
    fn test_gateway_error_envelope() {
        let xml = r"<OpenAPI_ServiceResponse><cmmMsgHeader><errMsg>SERVICE ERROR</errMsg>
<returnAuthMsg>SERVICE_KEY_IS_NOT_REGISTERED_ERROR</returnAuthMsg><returnReasonCode>30</returnReasonCode></cmmMsgHeader></OpenAPI_ServiceResponse>";
        let err = parse_festivals(xml).unwrap_err();
        assert!(err.to_string().contains("SERVICE_KEY_IS_NOT_REGISTERED_ERROR"));
    }

    #[test]
    fn test_garbage_is_api_error() {
        let err = parse_festivals("not xml at all").unwrap_err();
        assert!(matches!(err, InboundAiError::Api { .. }));
    }
}
