//! Session-aware command dispatch
//!
//! `App` owns the shared services and the session store. Each command is applied
//! to its session under that session's lock: the state transition runs first,
//! then any requested external call, then the page is re-rendered and cached.

use std::time::Duration;

use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::models::VisitorRecord;
use crate::pages::{self, PageView, Services};
use crate::planner::{self, ItineraryRequest};
use crate::session::{self, Command, Effect, Generation, Measurement, SessionState, SessionStore};
use crate::Result;

/// Plan text ready for download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItineraryExport {
    pub filename: String,
    pub csv: String,
}

pub struct App {
    services: Services,
    sessions: SessionStore,
}

impl App {
    #[must_use]
    pub fn new(services: Services) -> Self {
        let idle = Duration::from_secs(services.config.server.session_idle_minutes * 60);
        Self {
            services,
            sessions: SessionStore::new(idle),
        }
    }

    #[must_use]
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Start a session on the home page
    pub async fn create_session(&self) -> (Uuid, PageView) {
        let (id, entry) = self.sessions.create().await;
        let mut entry = entry.lock().await;
        let view = pages::render(&self.services, &entry.state).await;
        entry.last_view = Some(view.clone());
        (id, view)
    }

    /// Current view of a session, rendered only when nothing is cached
    pub async fn view(&self, id: Uuid) -> Option<PageView> {
        let entry = self.sessions.get(id).await?;
        let mut entry = entry.lock().await;
        if let Some(view) = entry.last_view.as_ref().filter(|v| v.page == entry.state.page) {
            return Some(view.clone());
        }
        let view = pages::render(&self.services, &entry.state).await;
        entry.last_view = Some(view.clone());
        Some(view)
    }

    /// Apply a command and return the resulting view; `None` for an unknown session
    #[instrument(skip(self, command), fields(session = %id))]
    pub async fn dispatch(&self, id: Uuid, command: Command) -> Option<PageView> {
        let entry = self.sessions.get(id).await?;
        let mut entry = entry.lock().await;

        let transition = session::apply(&mut entry.state, command, &self.services.config.forecast);

        if !transition.changed && transition.effect.is_none() {
            let cached = entry
                .last_view
                .as_ref()
                .filter(|view| view.page == entry.state.page)
                .cloned();
            let mut view = match cached {
                Some(view) => view,
                None => {
                    let view = pages::render(&self.services, &entry.state).await;
                    entry.last_view = Some(view.clone());
                    view
                }
            };
            debug!("Command left the session unchanged, reusing the last view");
            if let Some(notice) = transition.notice {
                view.notices.insert(0, notice);
            }
            return Some(view);
        }

        // the view is stale from here on, even if this future is dropped mid-render
        entry.last_view = None;

        if let Some(effect) = transition.effect {
            self.run_effect(&mut entry.state, effect).await;
        }

        let mut view = pages::render(&self.services, &entry.state).await;
        entry.last_view = Some(view.clone());
        if let Some(notice) = transition.notice {
            view.notices.insert(0, notice);
        }
        Some(view)
    }

    async fn run_effect(&self, state: &mut SessionState, effect: Effect) {
        let services = &self.services;
        match effect {
            Effect::GeneratePlan => {
                let profile = state
                    .country
                    .as_deref()
                    .and_then(|country| services.data.profile(country));
                let request = ItineraryRequest::from_session(state, profile);
                state.plan = match planner::generate_plan(services.chat.as_ref(), &request).await {
                    Ok(plan) => Generation::Ready(plan),
                    Err(e) => {
                        error!("Itinerary generation failed: {e}");
                        Generation::Failed(e.user_message())
                    }
                };
            }
            Effect::Ask(question) => {
                state.answer = match planner::ask(services.chat.as_ref(), &question).await {
                    Ok(answer) => Generation::Ready(answer),
                    Err(e) => {
                        error!("Question failed: {e}");
                        Generation::Failed(e.user_message())
                    }
                };
            }
            Effect::MeasureDistance {
                origin,
                destination,
            } => {
                let measured =
                    planner::measure_distance(services.places.as_ref(), &origin, &destination).await;
                let (kilometers, error) = match measured {
                    Ok(km) => (Some(km), None),
                    Err(e) => (None, Some(e.user_message())),
                };
                state.distance = Some(Measurement {
                    origin,
                    destination,
                    kilometers,
                    error,
                });
            }
        }
    }

    /// CSV export of the generated plan. `Ok(None)` when the session is unknown
    /// or has no plan yet.
    pub async fn itinerary_csv(&self, id: Uuid) -> Result<Option<ItineraryExport>> {
        let Some(entry) = self.sessions.get(id).await else {
            return Ok(None);
        };
        let entry = entry.lock().await;
        let state = &entry.state;
        let Some(plan) = state.plan.text() else {
            return Ok(None);
        };

        let profile = state
            .country
            .as_deref()
            .and_then(|country| self.services.data.profile(country));
        let filename = ItineraryRequest::from_session(state, profile).export_filename();
        Ok(Some(ItineraryExport {
            filename,
            csv: planner::export_csv(plan)?,
        }))
    }

    pub async fn end_session(&self, id: Uuid) -> bool {
        self.sessions.remove(id).await
    }

    /// Drop sessions idle for longer than `server.session_idle_minutes`
    pub async fn purge_idle_sessions(&self) -> usize {
        self.sessions.purge_idle().await
    }

    /// Observed and forecast arrivals of one country in chronological order
    #[must_use]
    pub fn forecast_records(&self, country: &str) -> Vec<VisitorRecord> {
        self.services
            .data
            .series(country)
            .into_iter()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::TourismApi;
    use crate::models::{Attraction, Festival, YearMonth};
    use crate::pages::testing::{FakePlaces, FakeTourism, festival, place, services};
    use crate::pages::{NoticeLevel, Section};
    use crate::session::Page;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Counts festival lookups to prove cached views skip external calls
    struct CountingTourism {
        inner: FakeTourism,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TourismApi for CountingTourism {
        async fn festivals(&self, period: YearMonth) -> Result<Vec<Festival>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.festivals(period).await
        }

        async fn keyword_attractions(&self, keyword: &str) -> Result<Vec<Attraction>> {
            self.inner.keyword_attractions(keyword).await
        }
    }

    fn app_with_counter() -> (App, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut services = services(FakeTourism::default(), FakePlaces::default());
        services.tourism = Arc::new(CountingTourism {
            inner: FakeTourism {
                festivals: vec![festival("진해군항제", (2025, 3, 28), (2025, 4, 6))],
                ..FakeTourism::default()
            },
            calls: Arc::clone(&calls),
        });
        (App::new(services), calls)
    }

    #[tokio::test]
    async fn test_navigate_to_current_page_reuses_view() {
        let (app, calls) = app_with_counter();
        let (id, _) = app.create_session().await;

        app.dispatch(id, Command::SelectPeriod { year: 2025, month: 4 })
            .await
            .unwrap();
        let first = app
            .dispatch(id, Command::Navigate { page: Page::Festival })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let again = app
            .dispatch(id, Command::Navigate { page: Page::Festival })
            .await
            .unwrap();
        assert_eq!(first, again);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    /// Stalls the first festival lookup
    struct StallOnce {
        inner: FakeTourism,
        stalled: AtomicBool,
    }

    #[async_trait]
    impl TourismApi for StallOnce {
        async fn festivals(&self, period: YearMonth) -> Result<Vec<Festival>> {
            if !self.stalled.swap(true, Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            self.inner.festivals(period).await
        }

        async fn keyword_attractions(&self, keyword: &str) -> Result<Vec<Attraction>> {
            self.inner.keyword_attractions(keyword).await
        }
    }

    #[tokio::test]
    async fn test_cancelled_render_does_not_leave_stale_view() {
        let mut services = services(FakeTourism::default(), FakePlaces::default());
        services.tourism = Arc::new(StallOnce {
            inner: FakeTourism {
                festivals: vec![festival("진해군항제", (2025, 3, 28), (2025, 4, 6))],
                ..FakeTourism::default()
            },
            stalled: AtomicBool::new(false),
        });
        let app = App::new(services);
        let (id, _) = app.create_session().await;
        app.dispatch(id, Command::SelectPeriod { year: 2025, month: 4 })
            .await
            .unwrap();

        let cancelled = tokio::time::timeout(
            Duration::from_millis(50),
            app.dispatch(id, Command::Navigate { page: Page::Festival }),
        )
        .await;
        assert!(cancelled.is_err());

        assert_eq!(app.view(id).await.unwrap().page, Page::Festival);
        let retried = app
            .dispatch(id, Command::Navigate { page: Page::Festival })
            .await
            .unwrap();
        assert_eq!(retried.page, Page::Festival);
    }

    #[tokio::test]
    async fn test_plan_is_not_exported_under_another_country() {
        let app = App::new(services(FakeTourism::default(), FakePlaces::default()));
        let (id, _) = app.create_session().await;
        for command in [
            Command::SelectPeriod { year: 2025, month: 4 },
            Command::SelectCountry {
                country: "대만".to_string(),
            },
            Command::ToggleHotel {
                name: "진해 호텔".to_string(),
                category: "숙박".to_string(),
            },
            Command::GeneratePlan,
        ] {
            app.dispatch(id, command).await.unwrap();
        }
        let export = app.itinerary_csv(id).await.unwrap().unwrap();
        assert!(export.filename.starts_with("대만고객을"));

        app.dispatch(
            id,
            Command::SelectCountry {
                country: "일본".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(app.itinerary_csv(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_idle_sessions_are_purged() {
        let app = App::new(services(FakeTourism::default(), FakePlaces::default()));
        app.create_session().await;
        assert_eq!(app.purge_idle_sessions().await, 0);
    }

    #[tokio::test]
    async fn test_guidance_notice_is_prepended_without_rerender() {
        let (app, calls) = app_with_counter();
        let (id, _) = app.create_session().await;
        app.dispatch(id, Command::SelectPeriod { year: 2025, month: 4 })
            .await
            .unwrap();
        app.dispatch(id, Command::Navigate { page: Page::Festival })
            .await
            .unwrap();

        let view = app
            .dispatch(
                id,
                Command::ChooseTheme {
                    title: "진해군항제".to_string(),
                    location: "경상남도 창원시 진해구".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(view.notices[0].link, Some(Page::Country));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // the cached view does not keep the one-off notice
        let cached = app.view(id).await.unwrap();
        assert_ne!(cached.notices.first().and_then(|n| n.link), Some(Page::Country));
    }

    #[tokio::test]
    async fn test_full_planning_flow() {
        let mut services = services(
            FakeTourism::default(),
            FakePlaces {
                spots: vec![place("1", "경복궁", "관광명소", 37.5796, 126.9770)],
                ..FakePlaces::default()
            },
        );
        services.tourism = Arc::new(FakeTourism {
            festivals: vec![festival("진해군항제", (2025, 3, 28), (2025, 4, 6))],
            ..FakeTourism::default()
        });
        let app = App::new(services);
        let (id, home) = app.create_session().await;
        assert_eq!(home.page, Page::Home);

        for command in [
            Command::Navigate { page: Page::Country },
            Command::SelectPeriod { year: 2025, month: 4 },
            Command::SelectCountry {
                country: "대만".to_string(),
            },
            Command::Continue,
            Command::ChooseTheme {
                title: "진해군항제".to_string(),
                location: "경상남도 창원시 진해구".to_string(),
            },
            Command::ToggleSpot {
                name: "경복궁".to_string(),
                category: "관광명소".to_string(),
            },
            Command::SubmitSelections,
            Command::Continue,
        ] {
            app.dispatch(id, command).await.unwrap();
        }
        assert!(app.itinerary_csv(id).await.unwrap().is_none());

        let view = app.dispatch(id, Command::GeneratePlan).await.unwrap();
        assert_eq!(view.page, Page::AiPlanner);
        assert!(view.sections.iter().any(|s| matches!(s, Section::Plan { .. })));

        let export = app.itinerary_csv(id).await.unwrap().unwrap();
        assert_eq!(export.filename, "대만고객을_위한_2025년4월_진해군항제_여행계획서.csv");
        assert!(export.csv.starts_with("여행 일정\n"));

        assert!(app.end_session(id).await);
        assert!(app.dispatch(id, Command::Reset).await.is_none());
    }

    #[tokio::test]
    async fn test_distance_failure_is_reported() {
        let app = App::new(services(FakeTourism::default(), FakePlaces::default()));
        let (id, _) = app.create_session().await;
        let view = app
            .dispatch(
                id,
                Command::MeasureDistance {
                    origin: "경복궁, 서울".to_string(),
                    destination: "남산타워, 서울".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(view.page, Page::Ask);
        assert!(view.has_notice(NoticeLevel::Error));
    }

    #[tokio::test]
    async fn test_forecast_records() {
        let app = App::new(services(FakeTourism::default(), FakePlaces::default()));
        let records = app.forecast_records("대만");
        assert_eq!(records.len(), 12);
        assert!(records.windows(2).all(|w| w[0].period() < w[1].period()));
        assert!(app.forecast_records("없는나라").is_empty());
    }
}
