use tracing::warn;

use super::{
    Action, Card, Fact, Marker, MarkerKind, Notice, PageView, Section, Services, apply_snippet,
    blog_snippets, format_count,
};
use crate::analytics;
use crate::models::{Coordinates, DEFAULT_MAP_CENTER, Place};
use crate::region::extract_region;
use crate::session::{Command, Page, Selection, SessionState};

/// Category keywords of places worth visiting
pub const ATTRACTION_KEYWORDS: [&str; 8] = [
    "관광", "명소", "유적지", "문화재", "전망대", "박물관", "테마파크", "공원",
];
/// Keywords marking a place as lodging
pub const LODGING_KEYWORDS: [&str; 4] = ["호텔", "숙소", "펜션", "리조트"];

const NO_DESCRIPTION: &str = "❌ 관련 블로그 설명을 찾을 수 없습니다.";
const DEFAULT_SPOT_CATEGORY: &str = "일반 관광지";
const DEFAULT_HOTEL_CATEGORY: &str = "숙박 시설";

#[must_use]
pub fn is_attraction(place: &Place) -> bool {
    ATTRACTION_KEYWORDS
        .iter()
        .any(|k| place.category_group.contains(k))
}

#[must_use]
pub fn is_lodging(place: &Place) -> bool {
    LODGING_KEYWORDS
        .iter()
        .any(|k| place.category_group.contains(k) || place.name.contains(k))
}

fn category_or(place: &Place, fallback: &str) -> String {
    if place.category_group.is_empty() {
        fallback.to_string()
    } else {
        place.category_group.clone()
    }
}

fn is_selected(list: &[Selection], name: &str) -> bool {
    list.iter().any(|s| s.name == name)
}

fn place_card(place: &Place, center: Coordinates, selected: bool) -> Card {
    let mut facts = vec![Fact::new("📍 주소", place.display_address())];
    if let Some(phone) = &place.phone {
        facts.push(Fact::new("📞 전화번호", phone.clone()));
    }
    facts.push(Fact::new("🏷 카테고리", place.category.clone()));
    facts.push(Fact::new(
        "📏 테마 지역까지",
        format!("{:.1} km", place.coordinates.distance_km(&center)),
    ));
    Card {
        title: place.name.clone(),
        facts,
        links: vec![Fact::new("📍 카카오 지도에서 보기", place.map_link())],
        selected: Some(selected),
        ..Card::default()
    }
}

fn markers(places: &[Place], kind: MarkerKind, center: Coordinates) -> Vec<Marker> {
    places
        .iter()
        .map(|p| Marker {
            name: p.name.clone(),
            kind,
            coordinates: p.coordinates,
            distance_km: Some(p.coordinates.distance_km(&center)),
        })
        .collect()
}

async fn search(
    services: &Services,
    view: &mut PageView,
    query: String,
    keep: fn(&Place) -> bool,
) -> Vec<Place> {
    match services
        .places
        .keyword(&query, services.config.planner.spot_display)
        .await
    {
        Ok(places) => places.into_iter().filter(keep).collect(),
        Err(e) => {
            view.notice(Notice::error(e.user_message()));
            Vec::new()
        }
    }
}

pub async fn render(services: &Services, state: &SessionState) -> PageView {
    let mut view = PageView::new(Page::TouristSpot);

    let (Some(country), Some(theme)) = (state.country.as_deref(), state.theme.as_ref()) else {
        view.notice(
            Notice::warning(
                "해당 메뉴에서는 선택한 외국인 관광객, 여행 날짜, 여행 지역 정보를 바탕으로 여행 일정을 계획할 수 있습니다. \
                 ❌ 현재 설정된 외국인 관광객 및 여행 정보가 없습니다.❌ Country 메뉴에서부터 시작해주세요.😉",
            )
            .with_link(Page::Country),
        );
        return view;
    };

    let profile = services.data.profile(country);
    let mut facts = Vec::new();
    if let Some(period) = state.period {
        facts.push(Fact::new(
            "📅 선택한 날짜",
            format!("{}년 {}월", period.year, period.month),
        ));
    }
    facts.push(Fact::new("🌍 선택한 국가", country));
    facts.push(Fact::new(
        "🗣 언어",
        profile.map_or("알 수 없음", |p| p.language.as_str()),
    ));
    facts.push(Fact::new(
        "🏝 여행 성향",
        profile.map_or("알 수 없음", |p| p.travel_preference.as_str()),
    ));
    if let Some(expected) = state
        .period
        .and_then(|period| analytics::expected_visitors(&services.data, country, period))
    {
        facts.push(Fact::new("👥 입국 예상 인원", format!("{} 명", format_count(expected))));
    }
    facts.push(Fact::new("🎉 선택 테마", theme.title.clone()));
    facts.push(Fact::new("📍 테마 지역", theme.location.clone()));
    view.section(Section::Facts { items: facts });

    let Some(region) = extract_region(&theme.location) else {
        view.notice(Notice::warning(
            "❌ 입력하신 위치정보로 검색에 실패했습니다. \
             해당 앱은 '도 + 시/군' 또는 '광역시' 정보로만 검색 가능합니다.",
        ));
        return view;
    };
    if state.period.is_none() {
        view.notice(
            Notice::warning(
                "❌ 날짜 선택이 되지 않았어요. 이전 메뉴에서 날짜를 선택하면 해당 지역 관광지를 알려드립니다.",
            )
            .with_link(Page::Country),
        );
        return view;
    }

    let prefix = region.query_prefix();
    let center = match services.places.geocode(&theme.location).await {
        Ok(found) => found,
        Err(e) => {
            warn!(location = %theme.location, "Theme location geocoding failed: {e}");
            None
        }
    };
    let spots = search(services, &mut view, format!("{prefix} 관광지"), is_attraction).await;
    let hotels = search(services, &mut view, format!("{prefix} 호텔"), is_lodging).await;

    let center = center
        .or_else(|| spots.first().map(|p| p.coordinates))
        .unwrap_or(DEFAULT_MAP_CENTER);

    view.notice(Notice::success(format!(
        "🔎 검색 결과 📍 {prefix}에서 {}개의 관광지를 찾았습니다. 🏨 {prefix}에서 {}개의 숙소를 찾았습니다.",
        spots.len(),
        hotels.len()
    )));

    let mut map_markers = vec![Marker {
        name: theme.location.clone(),
        kind: MarkerKind::Center,
        coordinates: center,
        distance_km: None,
    }];
    map_markers.extend(markers(&spots, MarkerKind::Attraction, center));
    map_markers.extend(markers(&hotels, MarkerKind::Lodging, center));
    view.section(Section::heading("🗺 카카오 지도에서 관광지 & 숙소 확인"))
        .section(Section::Map {
            center,
            markers: map_markers,
        });

    if spots.is_empty() {
        view.notice(Notice::warning("🔍 해당 지역에서 관광지를 찾을 수 없습니다."));
    } else {
        let names: Vec<String> = spots.iter().map(|p| p.name.clone()).collect();
        let snippets = blog_snippets(services.blogs.as_ref(), &names).await;
        let cards = spots
            .iter()
            .zip(snippets)
            .map(|(place, snippet)| {
                let selected = is_selected(&state.spots, &place.name);
                let mut card = place_card(place, center, selected);
                apply_snippet(&mut card, snippet, NO_DESCRIPTION);
                card.actions.push(Action::new(
                    format!("{} 여행일정에 추가하기!", place.name),
                    Command::ToggleSpot {
                        name: place.name.clone(),
                        category: category_or(place, DEFAULT_SPOT_CATEGORY),
                    },
                ));
                card
            })
            .collect();
        view.section(Section::Cards {
            title: format!("📍 {prefix} 인근 관광지 검색 결과"),
            cards,
        });
    }

    if hotels.is_empty() {
        view.notice(Notice::warning("🔍 해당 지역에서 숙소를 찾을 수 없습니다."));
    } else {
        let cards = hotels
            .iter()
            .map(|place| {
                let selected = is_selected(&state.hotels, &place.name);
                let mut card = place_card(place, center, selected);
                card.actions.push(Action::new(
                    format!("{} 여행일정에 추가하기!", place.name),
                    Command::ToggleHotel {
                        name: place.name.clone(),
                        category: category_or(place, DEFAULT_HOTEL_CATEGORY),
                    },
                ));
                card
            })
            .collect();
        view.section(Section::Cards {
            title: format!("🏨 {prefix} 인근 숙소 검색 결과"),
            cards,
        });
    }

    view.action("✅선택 완료!", Command::SubmitSelections);

    if state.submitted {
        view.section(Section::heading("✅ 선택한 관광지 & 숙소 목록"));
        if state.has_selections() {
            view.section(Section::Facts {
                items: state
                    .spots
                    .iter()
                    .chain(&state.hotels)
                    .map(|s| Fact::new("✔️", s.describe()))
                    .collect(),
            })
            .action("➡ AI와 함께 여행 패키지 만들기", Command::Continue);
        } else {
            view.section(Section::paragraph("❌ 아직 선택된 관광지 & 숙소가 없습니다."));
        }
    }
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::YearMonth;
    use crate::pages::NoticeLevel;
    use crate::pages::testing::{FakePlaces, FakeTourism, place, services};
    use crate::session::Theme;

    fn themed(location: &str) -> SessionState {
        SessionState {
            page: Page::TouristSpot,
            period: Some(YearMonth::new(2025, 4)),
            country: Some("대만".to_string()),
            theme: Some(Theme {
                title: "벚꽃".to_string(),
                location: location.to_string(),
            }),
            ..SessionState::default()
        }
    }

    fn seoul_places() -> FakePlaces {
        FakePlaces {
            spots: vec![
                place("1", "경복궁", "관광명소", 37.5796, 126.9770),
                place("2", "광화문 스타벅스", "카페", 37.5720, 126.9769),
            ],
            hotels: vec![
                place("3", "포시즌스 호텔 서울", "숙박", 37.5714, 126.9760),
                place("4", "종로 게스트하우스", "숙박", 37.5700, 126.9900),
            ],
            ..FakePlaces::default()
        }
    }

    #[test]
    fn test_keyword_filters() {
        assert!(is_attraction(&place("1", "경복궁", "관광명소", 0.0, 0.0)));
        assert!(!is_attraction(&place("2", "스타벅스", "카페", 0.0, 0.0)));
        assert!(is_lodging(&place("3", "그랜드 호텔", "숙박", 0.0, 0.0)));
        assert!(is_lodging(&place("4", "바다펜션", "", 0.0, 0.0)));
        assert!(!is_lodging(&place("5", "게스트하우스", "숙박", 0.0, 0.0)));
    }

    #[tokio::test]
    async fn test_requires_country_and_theme() {
        let services = services(FakeTourism::default(), seoul_places());
        let view = render(&services, &SessionState::default()).await;
        assert_eq!(view.notices[0].link, Some(Page::Country));
        assert!(view.sections.is_empty());
    }

    #[tokio::test]
    async fn test_spots_and_hotels_filtered() {
        let services = services(FakeTourism::default(), seoul_places());
        let mut state = themed("서울특별시 종로구 사직로");
        state.spots.push(Selection {
            name: "경복궁".to_string(),
            category: "관광명소".to_string(),
        });
        let view = render(&services, &state).await;

        let cards: Vec<&Vec<Card>> = view
            .sections
            .iter()
            .filter_map(|s| match s {
                Section::Cards { cards, .. } => Some(cards),
                _ => None,
            })
            .collect();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].len(), 1);
        assert_eq!(cards[0][0].selected, Some(true));
        assert_eq!(cards[0][0].description.as_deref(), Some("경복궁 후기"));
        assert_eq!(cards[1].len(), 1);
        assert_eq!(cards[1][0].title, "포시즌스 호텔 서울");

        // no geocode result: centre falls back to the first attraction
        let Some(Section::Map { center, markers }) =
            view.sections.iter().find(|s| matches!(s, Section::Map { .. }))
        else {
            panic!("expected map");
        };
        assert!((center.latitude - 37.5796).abs() < 1e-9);
        assert_eq!(markers.len(), 3);
    }

    #[tokio::test]
    async fn test_unrecognised_location_fails_softly() {
        let services = services(FakeTourism::default(), seoul_places());
        let view = render(&services, &themed("어딘가 멋진 곳")).await;
        assert!(view.has_notice(NoticeLevel::Warning));
        assert!(!view.sections.iter().any(|s| matches!(s, Section::Map { .. })));
    }

    #[tokio::test]
    async fn test_search_failure_uses_default_center() {
        let places = FakePlaces {
            fail: true,
            ..FakePlaces::default()
        };
        let services = services(FakeTourism::default(), places);
        let view = render(&services, &themed("부산광역시")).await;
        assert!(view.has_notice(NoticeLevel::Error));
        let Some(Section::Map { center, .. }) =
            view.sections.iter().find(|s| matches!(s, Section::Map { .. }))
        else {
            panic!("expected map");
        };
        assert_eq!(*center, DEFAULT_MAP_CENTER);
    }

    #[tokio::test]
    async fn test_submitted_selections_offer_continue() {
        let services = services(FakeTourism::default(), seoul_places());
        let mut state = themed("서울특별시 종로구");
        state.hotels.push(Selection {
            name: "포시즌스 호텔 서울".to_string(),
            category: "숙박".to_string(),
        });
        state.submitted = true;
        let view = render(&services, &state).await;
        assert!(view.actions.iter().any(|a| a.command == Command::Continue));
    }
}
