use super::{Action, Card, Fact, Notice, PageView, Section, Services, apply_snippet, blog_snippets};
use crate::session::{Command, Page, SessionState};

const NO_DESCRIPTION: &str = "설명 없음";
const ADDRESS_PROMPT: &str = "📍 주소 정보 없음. 직접 지역 키워드를 입력해주세요. (예: 강원도 삼척시)";

pub async fn render(services: &Services, state: &SessionState) -> PageView {
    let mut view = PageView::new(Page::Seasons);
    view.section(Section::paragraph(
        "🌸🌞🍂❄️ 사계절 여행 정보, 한눈에 확인하세요! 마음에 드는 여행지를 선택하면, \
         맞춤형 여행 코스를 함께 준비할 수 있어요! ✨🚀",
    ));

    let Some(period) = state.period else {
        view.notice(Notice::warning("📅 여행 날짜를 선택하세요!").with_link(Page::Country));
        return view;
    };
    let season = period.season().korean();
    view.section(Section::paragraph(format!(
        "📅 선택한 날짜: {}년 {}월 (계절: {season})",
        period.year, period.month
    )));

    let attractions = match services.tourism.keyword_attractions(season).await {
        Ok(attractions) => attractions,
        Err(e) => {
            view.notice(Notice::error(e.user_message()));
            return view;
        }
    };
    if attractions.is_empty() {
        view.notice(Notice::warning(format!("🚨 {season} 시즌의 여행 정보가 없습니다.")));
        return view;
    }
    view.notice(Notice::success(format!(
        "총 {}개의 여행 정보를 조회했습니다.",
        attractions.len()
    )));

    let can_choose = state.country.is_some();
    if !can_choose {
        view.notice(
            Notice::warning("❌ 대상 국가를 선택하지 않았습니다. Country 메뉴에서 선택해주세요.")
                .with_link(Page::Country),
        );
    }

    let titles: Vec<String> = attractions.iter().map(|a| a.title.clone()).collect();
    let snippets = blog_snippets(services.blogs.as_ref(), &titles).await;

    let cards = attractions
        .into_iter()
        .zip(snippets)
        .map(|(attraction, snippet)| {
            let address = attraction.address.filter(|a| a.trim() != "정보 없음");
            let mut card = Card {
                title: attraction.title.clone(),
                facts: vec![Fact::new(
                    "📍 위치",
                    address.clone().unwrap_or_else(|| ADDRESS_PROMPT.to_string()),
                )],
                image_url: attraction.image_url,
                ..Card::default()
            };
            apply_snippet(&mut card, snippet, NO_DESCRIPTION);
            // without an address the client supplies the location itself
            if let (true, Some(location)) = (can_choose, address) {
                card.actions.push(Action::new(
                    format!("➡ {} 시즌테마로 여행 패키지 만들기", attraction.title),
                    Command::ChooseTheme {
                        title: attraction.title,
                        location,
                    },
                ));
            }
            card
        })
        .collect();

    view.section(Section::Cards {
        title: format!("🧭 {season} 추천 여행지"),
        cards,
    });
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attraction, YearMonth};
    use crate::pages::NoticeLevel;
    use crate::pages::testing::{FakePlaces, FakeTourism, services};

    fn attraction(title: &str, address: Option<&str>) -> Attraction {
        Attraction {
            title: title.to_string(),
            address: address.map(str::to_string),
            image_url: None,
        }
    }

    fn october() -> SessionState {
        SessionState {
            page: Page::Seasons,
            period: Some(YearMonth::new(2025, 10)),
            country: Some("일본".to_string()),
            ..SessionState::default()
        }
    }

    #[tokio::test]
    async fn test_seasons_cards() {
        let tourism = FakeTourism {
            attractions: vec![
                attraction("내장산 단풍", Some("전북특별자치도 정읍시 내장산로")),
                attraction("하늘공원 억새", None),
            ],
            ..FakeTourism::default()
        };
        let services = services(tourism, FakePlaces::default());
        let view = render(&services, &october()).await;

        assert!(view.sections.contains(&Section::paragraph(
            "📅 선택한 날짜: 2025년 10월 (계절: 가을)"
        )));
        let Some(Section::Cards { cards, .. }) = view.sections.last() else {
            panic!("expected attraction cards");
        };
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].actions.len(), 1);
        assert!(cards[1].actions.is_empty());
        assert_eq!(cards[1].facts[0].value, ADDRESS_PROMPT);
    }

    #[tokio::test]
    async fn test_seasons_requires_period() {
        let services = services(FakeTourism::default(), FakePlaces::default());
        let view = render(&services, &SessionState::default()).await;
        assert_eq!(view.notices[0].link, Some(Page::Country));
    }

    #[tokio::test]
    async fn test_seasons_empty_and_failure() {
        let services = services(FakeTourism::default(), FakePlaces::default());
        let view = render(&services, &october()).await;
        assert!(view.notices[0].message.contains("가을 시즌의 여행 정보가 없습니다"));

        let tourism = FakeTourism {
            fail: true,
            ..FakeTourism::default()
        };
        let services = crate::pages::testing::services(tourism, FakePlaces::default());
        let view = render(&services, &october()).await;
        assert!(view.has_notice(NoticeLevel::Error));
    }
}
