//! Itinerary prompt, plan generation and the free-form helpers of the Ask page

use regex::Regex;
use std::sync::LazyLock;
use tracing::{info, instrument, warn};

use crate::integrations::{ChatMessage, ChatModel, ChatRequest, PlaceSearch};
use crate::models::CountryProfile;
use crate::session::{Selection, SessionState};
use crate::{InboundAiError, Result};

pub const PROMPT_TEMPLATE: &str = "나는 한국 여행사의 직원입니다.
{year}년 {month}월 {country} 손님을 위한 한국{location} 여행 코스를 준비해야 합니다.
{language} 언어를 사용하는 {country} 손님을 위해 사전에 준비하면 좋을 것이 무엇인지 알려주세요.
이동은 우리 여행사 제공 버스로 이동합니다.
이번 여행은 {travel}를 중심으로 진행되며, 주요 방문지는 다음과 같습니다.

### 1. 숙박지 (호텔/펜션/리조트)
다음 장소에서 숙박이 이루어집니다.
- {hotels}

### 2. 관광지
다음 관광지를 방문할 예정입니다. 각 장소의 매력과 해당 국가 고객에게 어필할 만한 포인트를 설명해주세요.

- {spots}


고객이 한국에 입국해서 {location}의 관광지를 둘러보고, 귀국하는 전체 여행 일정을 작성해주세요.
또한, {preference} 성향의 {country} 고객에게 이 여행에서 어떤 부분이 어필될지도 작성해주세요.

한글로 작성해주세요.
";

const PLANNER_SYSTEM_PROMPT: &str = "당신은 여행 전문가입니다. 한글로, 꼼꼼하게 작성해주세요.";
const ASK_SYSTEM_PROMPT: &str = "당신은 여행 일정 추천 전문가입니다.";
const PLAN_MAX_TOKENS: u32 = 1024;
const ASK_TEMPERATURE: f32 = 0.7;

const DEFAULT_YEAR: i32 = 2025;
const DEFAULT_MONTH: u32 = 4;
const DEFAULT_COUNTRY: &str = "대만";
const UNKNOWN: &str = "알 수 없음";
const DEFAULT_TRAVEL: &str = "축제,테마 정보 없음";
const DEFAULT_LOCATION: &str = "위치 정보 없음";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("valid regex"));

/// Substitute every `{name}` in `template`. Fails when a placeholder has no value.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> Result<String> {
    let missing: Vec<&str> = PLACEHOLDER
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|name| !values.iter().any(|(key, _)| key == name))
        .collect();
    if !missing.is_empty() {
        return Err(InboundAiError::validation(format!(
            "template placeholders without a value: {}",
            missing.join(", ")
        )));
    }

    Ok(PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map_or_else(String::new, |(_, value)| (*value).to_string())
        })
        .into_owned())
}

/// Everything the itinerary prompt needs, with defaults for missing session values
#[derive(Debug, Clone, PartialEq)]
pub struct ItineraryRequest {
    pub year: i32,
    pub month: u32,
    pub country: String,
    pub location: String,
    pub language: String,
    pub preference: String,
    pub travel: String,
    pub hotels: Vec<Selection>,
    pub spots: Vec<Selection>,
}

fn describe_all(selections: &[Selection]) -> String {
    selections
        .iter()
        .map(Selection::describe)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ItineraryRequest {
    #[must_use]
    pub fn from_session(state: &SessionState, profile: Option<&CountryProfile>) -> Self {
        let (year, month) = state
            .period
            .map_or((DEFAULT_YEAR, DEFAULT_MONTH), |p| (p.year, p.month));
        Self {
            year,
            month,
            country: state
                .country
                .clone()
                .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            location: state
                .theme
                .as_ref()
                .map_or_else(|| DEFAULT_LOCATION.to_string(), |t| t.location.clone()),
            language: profile.map_or_else(|| UNKNOWN.to_string(), |p| p.language.clone()),
            preference: profile
                .map_or_else(|| UNKNOWN.to_string(), |p| p.travel_preference.clone()),
            travel: state
                .theme
                .as_ref()
                .map(|t| t.title.clone())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TRAVEL.to_string()),
            hotels: state.hotels.clone(),
            spots: state.spots.clone(),
        }
    }

    pub fn prompt(&self) -> Result<String> {
        let year = self.year.to_string();
        let month = self.month.to_string();
        let hotels = describe_all(&self.hotels);
        let spots = describe_all(&self.spots);
        render_template(
            PROMPT_TEMPLATE,
            &[
                ("year", year.as_str()),
                ("month", month.as_str()),
                ("country", self.country.as_str()),
                ("location", self.location.as_str()),
                ("language", self.language.as_str()),
                ("travel", self.travel.as_str()),
                ("hotels", hotels.as_str()),
                ("spots", spots.as_str()),
                ("preference", self.preference.as_str()),
            ],
        )
    }

    /// Download name of the exported plan
    #[must_use]
    pub fn export_filename(&self) -> String {
        format!(
            "{}고객을_위한_{}년{}월_{}_여행계획서.csv",
            self.country, self.year, self.month, self.travel
        )
    }
}

/// Ask the model for a full itinerary
#[instrument(skip_all, fields(country = %request.country, year = request.year, month = request.month))]
pub async fn generate_plan(chat: &dyn ChatModel, request: &ItineraryRequest) -> Result<String> {
    let prompt = request.prompt()?;
    let plan = chat
        .complete(ChatRequest {
            messages: vec![
                ChatMessage::system(PLANNER_SYSTEM_PROMPT),
                ChatMessage::user(prompt),
            ],
            max_tokens: Some(PLAN_MAX_TOKENS),
            temperature: None,
        })
        .await?;
    info!(chars = plan.chars().count(), "Itinerary generated");
    Ok(plan)
}

/// Free-form travel question
#[instrument(skip(chat))]
pub async fn ask(chat: &dyn ChatModel, question: &str) -> Result<String> {
    chat.complete(ChatRequest {
        messages: vec![
            ChatMessage::system(ASK_SYSTEM_PROMPT),
            ChatMessage::user(question),
        ],
        max_tokens: None,
        temperature: Some(ASK_TEMPERATURE),
    })
    .await
}

/// Great-circle distance in kilometers between two geocoded addresses
#[instrument(skip(places))]
pub async fn measure_distance(
    places: &dyn PlaceSearch,
    origin: &str,
    destination: &str,
) -> Result<f64> {
    let (from, to) = futures::try_join!(places.geocode(origin), places.geocode(destination))?;
    let locate = |found: Option<_>, address: &str| {
        found.ok_or_else(|| {
            warn!(address, "Address could not be geocoded");
            InboundAiError::validation(format!("주소를 찾을 수 없습니다: {address}"))
        })
    };
    let from = locate(from, origin)?;
    let to = locate(to, destination)?;
    Ok(from.distance_km(&to))
}

/// The plan as a one-column CSV with a `여행 일정` header
pub fn export_csv(plan: &str) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["여행 일정"])?;
    writer.write_record([plan])?;
    let bytes = writer
        .into_inner()
        .map_err(|e| InboundAiError::data(format!("failed to finish CSV export: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| InboundAiError::data(format!("CSV export is not UTF-8: {e}")))
}
