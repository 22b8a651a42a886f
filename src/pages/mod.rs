//! Page renderers and the serializable view they produce
//!
//! A renderer reads the session state and the shared services and returns a
//! [`PageView`]. Failures of an external service never fail the page: the
//! affected section is replaced by an inline error notice.

pub mod about;
pub mod ai_planner;
pub mod ask;
pub mod country;
pub mod festival;
pub mod home;
pub mod seasons;
pub mod tourist_spot;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, warn};

use crate::analytics::TrendSeries;
use crate::config::InboundAiConfig;
use crate::dataset::DataStore;
use crate::integrations::{BlogSearch, ChatModel, PlaceSearch, TourismApi};
use crate::models::{BlogSnippet, Coordinates};
use crate::session::{Command, Page, SessionState};

/// Shared dependencies of every renderer
#[derive(Clone)]
pub struct Services {
    pub data: Arc<DataStore>,
    pub tourism: Arc<dyn TourismApi>,
    pub places: Arc<dyn PlaceSearch>,
    pub blogs: Arc<dyn BlogSearch>,
    pub chat: Arc<dyn ChatModel>,
    pub config: Arc<InboundAiConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Message shown above the page content, optionally pointing at another page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Page>,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            link: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    #[must_use]
    pub fn with_link(mut self, page: Page) -> Self {
        self.link = Some(page);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub label: String,
    pub value: String,
}

impl Fact {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A command the client can send from this page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub label: String,
    pub command: Command,
}

impl Action {
    pub fn new(label: impl Into<String>, command: Command) -> Self {
        Self {
            label: label.into(),
            command,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub title: String,
    pub facts: Vec<Fact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Fact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    Center,
    Attraction,
    Lodging,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    pub kind: MarkerKind,
    pub coordinates: Coordinates,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

/// Page content blocks, rendered in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Section {
    Heading {
        text: String,
    },
    Paragraph {
        text: String,
    },
    Facts {
        items: Vec<Fact>,
    },
    Table {
        title: String,
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Cards {
        title: String,
        cards: Vec<Card>,
    },
    Map {
        center: Coordinates,
        markers: Vec<Marker>,
    },
    Series {
        title: String,
        series: Vec<TrendSeries>,
    },
    Plan {
        text: String,
        filename: String,
    },
}

impl Section {
    pub fn heading(text: impl Into<String>) -> Self {
        Section::Heading { text: text.into() }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Section::Paragraph { text: text.into() }
    }
}

/// Serializable description of one rendered page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageView {
    pub page: Page,
    pub title: String,
    pub notices: Vec<Notice>,
    pub sections: Vec<Section>,
    pub actions: Vec<Action>,
}

impl PageView {
    #[must_use]
    pub fn new(page: Page) -> Self {
        Self {
            page,
            title: page.title().to_string(),
            notices: Vec::new(),
            sections: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn notice(&mut self, notice: Notice) -> &mut Self {
        self.notices.push(notice);
        self
    }

    pub fn section(&mut self, section: Section) -> &mut Self {
        self.sections.push(section);
        self
    }

    pub fn action(&mut self, label: impl Into<String>, command: Command) -> &mut Self {
        self.actions.push(Action::new(label, command));
        self
    }

    #[must_use]
    pub fn has_notice(&self, level: NoticeLevel) -> bool {
        self.notices.iter().any(|n| n.level == level)
    }
}

/// Render the page the session is on
#[instrument(skip_all, fields(page = %state.page))]
pub async fn render(services: &Services, state: &SessionState) -> PageView {
    match state.page {
        Page::Home => home::render(),
        Page::Country => country::render(services, state),
        Page::Festival => festival::render(services, state).await,
        Page::Seasons => seasons::render(services, state).await,
        Page::TouristSpot => tourist_spot::render(services, state).await,
        Page::AiPlanner => ai_planner::render(services, state),
        Page::About => about::render(services),
        Page::Ask => ask::render(state),
    }
}

/// Top blog post for each query, looked up concurrently. Lookup failures are
/// logged and yield `None` so the cards still render.
pub(crate) async fn blog_snippets(blogs: &dyn BlogSearch, queries: &[String]) -> Vec<Option<BlogSnippet>> {
    join_all(queries.iter().map(|query| async move {
        match blogs.top_post(query).await {
            Ok(snippet) => snippet,
            Err(e) => {
                warn!(query = %query, "Blog lookup failed: {e}");
                None
            }
        }
    }))
    .await
}

/// Blog description and link fields of a card
pub(crate) fn apply_snippet(card: &mut Card, snippet: Option<BlogSnippet>, fallback: &str) {
    match snippet {
        Some(snippet) => {
            card.description = Some(snippet.description);
            if !snippet.link.is_empty() {
                card.links.push(Fact::new("🔗 관련 블로그 보기", snippet.link));
            }
        }
        None => card.description = Some(fallback.to_string()),
    }
}

/// `1234567` -> `1,234,567`
#[must_use]
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(c);
    }
    formatted
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fake services shared by the renderer tests

    use super::*;
    use crate::integrations::ChatRequest;
    use crate::models::{Attraction, Festival, Place, VisitorRecord, YearMonth};
    use crate::{InboundAiError, Result};
    use async_trait::async_trait;
    use chrono::NaiveDate;

    #[derive(Default)]
    pub struct FakeTourism {
        pub fail: bool,
        pub festivals: Vec<Festival>,
        pub attractions: Vec<Attraction>,
    }

    #[async_trait]
    impl TourismApi for FakeTourism {
        async fn festivals(&self, period: YearMonth) -> Result<Vec<Festival>> {
            if self.fail {
                return Err(InboundAiError::api_status("tour", 500, "boom"));
            }
            Ok(self
                .festivals
                .iter()
                .filter(|f| f.runs_during(period))
                .cloned()
                .collect())
        }

        async fn keyword_attractions(&self, _keyword: &str) -> Result<Vec<Attraction>> {
            if self.fail {
                return Err(InboundAiError::api("tour", "boom"));
            }
            Ok(self.attractions.clone())
        }
    }

    #[derive(Default)]
    pub struct FakePlaces {
        pub fail: bool,
        pub spots: Vec<Place>,
        pub hotels: Vec<Place>,
        pub center: Option<Coordinates>,
    }

    #[async_trait]
    impl PlaceSearch for FakePlaces {
        async fn keyword(&self, query: &str, _size: u32) -> Result<Vec<Place>> {
            if self.fail {
                return Err(InboundAiError::api_status("kakao", 401, "denied"));
            }
            if query.ends_with("호텔") {
                Ok(self.hotels.clone())
            } else {
                Ok(self.spots.clone())
            }
        }

        async fn geocode(&self, _address: &str) -> Result<Option<Coordinates>> {
            Ok(self.center)
        }
    }

    pub struct FakeBlogs;

    #[async_trait]
    impl BlogSearch for FakeBlogs {
        async fn top_post(&self, query: &str) -> Result<Option<BlogSnippet>> {
            Ok(Some(BlogSnippet {
                description: format!("{query} 후기"),
                link: format!("https://blog.example.com/{query}"),
            }))
        }
    }

    pub struct FakeChat;

    #[async_trait]
    impl ChatModel for FakeChat {
        async fn complete(&self, _request: ChatRequest) -> Result<String> {
            Ok("1일차: 인천공항 도착".to_string())
        }
    }

    pub fn place(id: &str, name: &str, group: &str, lat: f64, lon: f64) -> Place {
        Place {
            id: id.to_string(),
            name: name.to_string(),
            category: format!("여행 > {group}"),
            category_group: group.to_string(),
            address: "서울 종로구".to_string(),
            road_address: None,
            phone: None,
            coordinates: Coordinates::new(lat, lon),
            place_url: None,
        }
    }

    pub fn festival(title: &str, starts: (i32, u32, u32), ends: (i32, u32, u32)) -> Festival {
        Festival {
            title: title.to_string(),
            address: Some("경상남도 창원시 진해구".to_string()),
            starts: NaiveDate::from_ymd_opt(starts.0, starts.1, starts.2).unwrap(),
            ends: NaiveDate::from_ymd_opt(ends.0, ends.1, ends.2).unwrap(),
            image_url: None,
        }
    }

    pub fn store() -> DataStore {
        let mut records = Vec::new();
        let countries = [
            ("중국", 400_000),
            ("일본", 300_000),
            ("대만", 120_000),
            ("미국", 100_000),
            ("베트남", 60_000),
            ("태국", 40_000),
            ("몽골", 10_000),
        ];
        for (country, base) in countries {
            for month in 1..=12 {
                records.push(VisitorRecord {
                    country: country.to_string(),
                    year: 2025,
                    month,
                    count: base + u64::from(month) * 1_000,
                });
            }
        }
        DataStore::new(records, Vec::new(), Vec::new()).unwrap()
    }

    pub fn services(tourism: FakeTourism, places: FakePlaces) -> Services {
        Services {
            data: Arc::new(store()),
            tourism: Arc::new(tourism),
            places: Arc::new(places),
            blogs: Arc::new(FakeBlogs),
            chat: Arc::new(FakeChat),
            config: Arc::new(InboundAiConfig::default()),
        }
    }
}
