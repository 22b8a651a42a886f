//! Per-session page state and the commands that move it
//!
//! `apply` is pure: it validates a command against the current state, mutates the
//! state and reports whether anything changed plus any external work the command
//! asks for. Running that work and rendering the page is left to [`crate::App`].

pub mod store;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ForecastConfig;
use crate::models::YearMonth;
use crate::pages::Notice;

pub use store::{SessionEntry, SessionStore};

/// Pages of the assistant, in menu order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    #[default]
    Home,
    Country,
    Festival,
    Seasons,
    TouristSpot,
    AiPlanner,
    About,
    Ask,
}

impl Page {
    pub const ALL: [Page; 8] = [
        Page::Home,
        Page::Country,
        Page::Festival,
        Page::Seasons,
        Page::TouristSpot,
        Page::AiPlanner,
        Page::About,
        Page::Ask,
    ];

    /// Menu label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::Country => "Country",
            Page::Festival => "Festival",
            Page::Seasons => "Seasons",
            Page::TouristSpot => "TouristSpot",
            Page::AiPlanner => "AI PLANNER",
            Page::About => "About",
            Page::Ask => "Ask",
        }
    }

    /// Page heading
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::Country => "🌍 25,26년 국가별 예상입국인원과 국가 선택 가이드",
            Page::Festival => "🎉 월별 축제 정보",
            Page::Seasons => "🌸 계절별 여행 추천",
            Page::TouristSpot => "📍 테마 지역 관광지 & 숙소",
            Page::AiPlanner => "🤖 AI 여행 플래너",
            Page::About => "👩🏻‍💻 개발 프로세스",
            Page::Ask => "📍 AI 여행 일정 추천 시스템",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Festival or seasonal motif anchoring the tourist-spot search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub title: String,
    pub location: String,
}

/// A spot or lodging picked for the itinerary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub name: String,
    pub category: String,
}

impl Selection {
    /// `name (category)` as written into the itinerary prompt
    #[must_use]
    pub fn describe(&self) -> String {
        if self.category.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.category)
        }
    }
}

/// Outcome of a language model call made on behalf of the session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum Generation {
    #[default]
    NotRequested,
    Ready(String),
    Failed(String),
}

impl Generation {
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Generation::Ready(text) => Some(text),
            _ => None,
        }
    }
}

/// Distance lookup between two addresses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub origin: String,
    pub destination: String,
    pub kilometers: Option<f64>,
    pub error: Option<String>,
}

/// Everything the pages read, owned by one browser session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub page: Page,
    pub period: Option<YearMonth>,
    pub country: Option<String>,
    pub theme: Option<Theme>,
    pub spots: Vec<Selection>,
    pub hotels: Vec<Selection>,
    /// Selections confirmed on the tourist-spot page
    pub submitted: bool,
    pub plan: Generation,
    pub question: Option<String>,
    pub answer: Generation,
    pub distance: Option<Measurement>,
}

impl SessionState {
    #[must_use]
    pub fn has_selections(&self) -> bool {
        !self.spots.is_empty() || !self.hotels.is_empty()
    }

    fn clear_selections(&mut self) {
        self.spots.clear();
        self.hotels.clear();
        self.submitted = false;
        self.plan = Generation::NotRequested;
    }

    /// Theme, selections and plan all depend on the period and country
    fn clear_planning(&mut self) {
        self.theme = None;
        self.clear_selections();
    }
}

/// User events accepted by a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Navigate { page: Page },
    SelectPeriod { year: i32, month: u32 },
    SelectCountry { country: String },
    Continue,
    ChooseTheme { title: String, location: String },
    ToggleSpot { name: String, category: String },
    ToggleHotel { name: String, category: String },
    SubmitSelections,
    GeneratePlan,
    Ask { question: String },
    MeasureDistance { origin: String, destination: String },
    Reset,
}

/// External work requested by a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    GeneratePlan,
    Ask(String),
    MeasureDistance { origin: String, destination: String },
}

/// Result of applying one command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transition {
    pub changed: bool,
    pub effect: Option<Effect>,
    pub notice: Option<Notice>,
}

impl Transition {
    fn unchanged() -> Self {
        Self::default()
    }

    fn changed() -> Self {
        Self {
            changed: true,
            ..Self::default()
        }
    }

    fn with_effect(effect: Effect) -> Self {
        Self {
            changed: true,
            effect: Some(effect),
            notice: None,
        }
    }

    fn guidance(notice: Notice) -> Self {
        Self {
            changed: false,
            effect: None,
            notice: Some(notice),
        }
    }

    /// Nothing to re-render and nothing to run
    #[must_use]
    pub fn is_noop(&self) -> bool {
        !self.changed && self.effect.is_none() && self.notice.is_none()
    }
}

fn start_from_country() -> Notice {
    Notice::warning("🚨 외국인 관광객과 여행 날짜 정보가 없습니다. Country 메뉴부터 시작해주세요.😉")
        .with_link(Page::Country)
}

fn toggle(list: &mut Vec<Selection>, name: String, category: String) {
    if let Some(pos) = list.iter().position(|s| s.name == name) {
        list.remove(pos);
    } else {
        list.push(Selection { name, category });
    }
}

/// Apply `command` to `state`, validating the selectable period against `forecast`
pub fn apply(state: &mut SessionState, command: Command, forecast: &ForecastConfig) -> Transition {
    match command {
        Command::Navigate { page } => {
            if state.page == page {
                return Transition::unchanged();
            }
            state.page = page;
            Transition::changed()
        }
        Command::SelectPeriod { year, month } => {
            let period = match YearMonth::try_new(year, month) {
                Ok(period) => period,
                Err(e) => return Transition::guidance(Notice::error(e.user_message())),
            };
            let (first, last) = (forecast.start().year, forecast.end().year);
            if !(first..=last).contains(&year) {
                return Transition::guidance(Notice::error(format!(
                    "⚠️ 연도는 {first}년부터 {last}년 사이에서 선택해주세요."
                )));
            }
            if state.period == Some(period) {
                return Transition::unchanged();
            }
            state.period = Some(period);
            state.clear_planning();
            Transition::changed()
        }
        Command::SelectCountry { country } => {
            let country = country.trim();
            if country.is_empty() {
                return Transition::guidance(Notice::error("⚠️ 국가를 선택해 주세요."));
            }
            if state.country.as_deref() == Some(country) {
                return Transition::unchanged();
            }
            state.country = Some(country.to_string());
            state.clear_planning();
            Transition::changed()
        }
        Command::Continue => match state.page {
            Page::Country => {
                if state.period.is_some() && state.country.is_some() {
                    state.page = Page::Festival;
                    Transition::changed()
                } else {
                    Transition::guidance(
                        Notice::warning("⚠️ 여행 날짜와 국가를 먼저 선택해 주세요.")
                            .with_link(Page::Country),
                    )
                }
            }
            Page::TouristSpot => {
                if state.submitted && state.has_selections() {
                    state.page = Page::AiPlanner;
                    Transition::changed()
                } else {
                    Transition::guidance(
                        Notice::warning("❌ 아직 선택된 관광지 & 숙소가 없습니다.")
                            .with_link(Page::TouristSpot),
                    )
                }
            }
            _ => Transition::guidance(Notice::info("이 페이지에서는 다음 단계가 없습니다.")),
        },
        Command::ChooseTheme { title, location } => {
            if !matches!(state.page, Page::Festival | Page::Seasons) {
                return Transition::guidance(
                    Notice::warning("테마는 Festival 또는 Seasons 메뉴에서 선택할 수 있습니다.")
                        .with_link(Page::Seasons),
                );
            }
            if state.country.is_none() || state.period.is_none() {
                return Transition::guidance(
                    Notice::warning("❌ 대상 국가를 선택하지 않았습니다. Country 메뉴에서 선택해주세요.")
                        .with_link(Page::Country),
                );
            }
            let location = location.trim();
            if location.is_empty() {
                return Transition::guidance(Notice::warning(
                    "📍 주소 정보 없음. 직접 지역 키워드를 입력해주세요. (예: 강원도 삼척시)",
                ));
            }
            let theme = Theme {
                title: title.trim().to_string(),
                location: location.to_string(),
            };
            if state.theme.as_ref() != Some(&theme) {
                state.clear_selections();
                state.theme = Some(theme);
            }
            state.page = Page::TouristSpot;
            Transition::changed()
        }
        Command::ToggleSpot { name, category } => {
            toggle(&mut state.spots, name, category);
            state.submitted = false;
            Transition::changed()
        }
        Command::ToggleHotel { name, category } => {
            toggle(&mut state.hotels, name, category);
            state.submitted = false;
            Transition::changed()
        }
        Command::SubmitSelections => {
            if state.submitted {
                return Transition::unchanged();
            }
            state.submitted = true;
            Transition::changed()
        }
        Command::GeneratePlan => {
            if !state.has_selections() {
                return Transition::guidance(start_from_country());
            }
            state.page = Page::AiPlanner;
            Transition::with_effect(Effect::GeneratePlan)
        }
        Command::Ask { question } => {
            let question = question.trim();
            if question.is_empty() {
                return Transition::guidance(Notice::warning("여행 계획을 입력하세요"));
            }
            state.page = Page::Ask;
            state.question = Some(question.to_string());
            Transition::with_effect(Effect::Ask(question.to_string()))
        }
        Command::MeasureDistance {
            origin,
            destination,
        } => {
            let (origin, destination) = (origin.trim(), destination.trim());
            if origin.is_empty() || destination.is_empty() {
                return Transition::guidance(Notice::warning("출발지와 도착지를 모두 입력해주세요."));
            }
            state.page = Page::Ask;
            Transition::with_effect(Effect::MeasureDistance {
                origin: origin.to_string(),
                destination: destination.to_string(),
            })
        }
        Command::Reset => {
            *state = SessionState::default();
            Transition::changed()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::NoticeLevel;
    use rstest::rstest;

    fn forecast() -> ForecastConfig {
        ForecastConfig::default()
    }

    fn planned_state() -> SessionState {
        SessionState {
            page: Page::Country,
            period: Some(YearMonth::new(2025, 4)),
            country: Some("대만".to_string()),
            ..SessionState::default()
        }
    }

    #[test]
    fn test_navigate_to_current_page_is_noop() {
        let mut state = SessionState::default();
        let before = state.clone();
        let transition = apply(&mut state, Command::Navigate { page: Page::Home }, &forecast());
        assert!(transition.is_noop());
        assert_eq!(state, before);

        let transition = apply(&mut state, Command::Navigate { page: Page::About }, &forecast());
        assert!(transition.changed);
        assert_eq!(state.page, Page::About);
    }

    #[rstest]
    #[case(2025, 13)]
    #[case(2025, 0)]
    #[case(2030, 4)]
    #[case(2019, 4)]
    fn test_select_period_rejects_invalid(#[case] year: i32, #[case] month: u32) {
        let mut state = SessionState::default();
        let transition = apply(&mut state, Command::SelectPeriod { year, month }, &forecast());
        assert!(!transition.changed);
        assert_eq!(transition.notice.map(|n| n.level), Some(NoticeLevel::Error));
        assert_eq!(state.period, None);
    }

    #[test]
    fn test_select_period_twice_is_noop() {
        let mut state = SessionState::default();
        let select = Command::SelectPeriod {
            year: 2026,
            month: 12,
        };
        assert!(apply(&mut state, select.clone(), &forecast()).changed);
        assert!(apply(&mut state, select, &forecast()).is_noop());
        assert_eq!(state.period, Some(YearMonth::new(2026, 12)));
    }

    #[rstest]
    #[case(Command::SelectCountry { country: "일본".to_string() })]
    #[case(Command::SelectPeriod { year: 2025, month: 5 })]
    fn test_changing_country_or_period_discards_plan(#[case] command: Command) {
        let mut state = SessionState {
            theme: Some(Theme {
                title: "진해군항제".to_string(),
                location: "경상남도 창원시 진해구".to_string(),
            }),
            hotels: vec![Selection {
                name: "진해 호텔".to_string(),
                category: "숙박".to_string(),
            }],
            submitted: true,
            plan: Generation::Ready("1일차: 대만 고객 일정".to_string()),
            ..planned_state()
        };

        assert!(apply(&mut state, command, &forecast()).changed);
        assert_eq!(state.plan, Generation::NotRequested);
        assert_eq!(state.theme, None);
        assert!(!state.has_selections());
        assert!(!state.submitted);
    }

    #[test]
    fn test_reselecting_same_country_keeps_plan() {
        let mut state = SessionState {
            plan: Generation::Ready("1일차".to_string()),
            ..planned_state()
        };
        let command = Command::SelectCountry {
            country: "대만".to_string(),
        };
        assert!(apply(&mut state, command, &forecast()).is_noop());
        assert_eq!(state.plan.text(), Some("1일차"));
    }

    #[test]
    fn test_continue_from_country_requires_period_and_country() {
        let mut state = SessionState {
            page: Page::Country,
            ..SessionState::default()
        };
        let transition = apply(&mut state, Command::Continue, &forecast());
        assert!(!transition.changed);
        assert_eq!(transition.notice.and_then(|n| n.link), Some(Page::Country));
        assert_eq!(state.page, Page::Country);

        let mut state = planned_state();
        assert!(apply(&mut state, Command::Continue, &forecast()).changed);
        assert_eq!(state.page, Page::Festival);
    }

    #[test]
    fn test_choose_theme_deep_links_to_tourist_spot() {
        let mut state = planned_state();
        state.page = Page::Festival;
        state.spots.push(Selection {
            name: "이전 선택".to_string(),
            category: String::new(),
        });

        let transition = apply(
            &mut state,
            Command::ChooseTheme {
                title: "진해군항제".to_string(),
                location: " 경상남도 창원시 진해구 ".to_string(),
            },
            &forecast(),
        );
        assert!(transition.changed);
        assert_eq!(state.page, Page::TouristSpot);
        assert_eq!(
            state.theme.as_ref().map(|t| t.location.as_str()),
            Some("경상남도 창원시 진해구")
        );
        assert!(state.spots.is_empty());
    }

    #[test]
    fn test_choose_theme_without_location_or_country() {
        let mut state = planned_state();
        state.page = Page::Seasons;
        let transition = apply(
            &mut state,
            Command::ChooseTheme {
                title: "보성녹차밭".to_string(),
                location: "  ".to_string(),
            },
            &forecast(),
        );
        assert!(transition.notice.is_some());
        assert_eq!(state.page, Page::Seasons);

        state.country = None;
        let transition = apply(
            &mut state,
            Command::ChooseTheme {
                title: "보성녹차밭".to_string(),
                location: "전라남도 보성군".to_string(),
            },
            &forecast(),
        );
        assert_eq!(transition.notice.and_then(|n| n.link), Some(Page::Country));
        assert!(state.theme.is_none());
    }

    #[test]
    fn test_toggle_and_submit_flow() {
        let mut state = planned_state();
        state.page = Page::TouristSpot;
        let spot = Command::ToggleSpot {
            name: "경복궁".to_string(),
            category: "관광명소".to_string(),
        };

        apply(&mut state, spot.clone(), &forecast());
        assert_eq!(state.spots.len(), 1);

        // unsubmitted selections cannot continue
        assert!(!apply(&mut state, Command::Continue, &forecast()).changed);

        apply(&mut state, Command::SubmitSelections, &forecast());
        assert!(state.submitted);

        // toggling again removes and clears the submitted flag
        apply(&mut state, spot, &forecast());
        assert!(state.spots.is_empty());
        assert!(!state.submitted);

        apply(
            &mut state,
            Command::ToggleHotel {
                name: "신라호텔".to_string(),
                category: "호텔".to_string(),
            },
            &forecast(),
        );
        apply(&mut state, Command::SubmitSelections, &forecast());
        assert!(apply(&mut state, Command::Continue, &forecast()).changed);
        assert_eq!(state.page, Page::AiPlanner);
    }

    #[test]
    fn test_generate_plan_needs_selections() {
        let mut state = planned_state();
        let transition = apply(&mut state, Command::GeneratePlan, &forecast());
        assert_eq!(transition.effect, None);
        assert_eq!(transition.notice.and_then(|n| n.link), Some(Page::Country));

        state.hotels.push(Selection {
            name: "신라호텔".to_string(),
            category: "호텔".to_string(),
        });
        let transition = apply(&mut state, Command::GeneratePlan, &forecast());
        assert_eq!(transition.effect, Some(Effect::GeneratePlan));
        assert_eq!(state.page, Page::AiPlanner);
    }

    #[test]
    fn test_ask_and_distance_effects() {
        let mut state = SessionState::default();
        let transition = apply(
            &mut state,
            Command::Ask {
                question: " 서울 불꽃 축제 일정 추천 ".to_string(),
            },
            &forecast(),
        );
        assert_eq!(
            transition.effect,
            Some(Effect::Ask("서울 불꽃 축제 일정 추천".to_string()))
        );

        let transition = apply(
            &mut state,
            Command::MeasureDistance {
                origin: "경복궁, 서울".to_string(),
                destination: String::new(),
            },
            &forecast(),
        );
        assert!(transition.effect.is_none());
        assert!(transition.notice.is_some());
    }

    #[test]
    fn test_reset_returns_home() {
        let mut state = planned_state();
        assert!(apply(&mut state, Command::Reset, &forecast()).changed);
        assert_eq!(state, SessionState::default());
    }

    #[test]
    fn test_command_json_shape() {
        let command: Command =
            serde_json::from_str(r#"{"type":"navigate","page":"tourist_spot"}"#).unwrap();
        assert_eq!(
            command,
            Command::Navigate {
                page: Page::TouristSpot
            }
        );
        let command: Command =
            serde_json::from_str(r#"{"type":"select_period","year":2025,"month":4}"#).unwrap();
        assert_eq!(
            command,
            Command::SelectPeriod {
                year: 2025,
                month: 4
            }
        );
    }

    #[test]
    fn test_selection_describe() {
        let hotel = Selection {
            name: "신라호텔".to_string(),
            category: "호텔".to_string(),
        };
        assert_eq!(hotel.describe(), "신라호텔 (호텔)");
    }
}
