use super::{Action, Card, Fact, Notice, PageView, Section, Services, apply_snippet, blog_snippets};
use crate::session::{Command, Page, SessionState};

const NO_DESCRIPTION: &str = "설명 없음";
const UNKNOWN: &str = "정보 없음";

pub async fn render(services: &Services, state: &SessionState) -> PageView {
    let mut view = PageView::new(Page::Festival);

    let Some(period) = state.period else {
        view.notice(
            Notice::error("📅 날짜가 선택되지 않았습니다. Country 메뉴에서 설정해 주세요.")
                .with_link(Page::Country),
        );
        return view;
    };
    let (year, month) = (period.year, period.month);
    view.section(Section::paragraph(format!("📅 선택한 날짜: {year}년 {month}월")));

    let festivals = match services.tourism.festivals(period).await {
        Ok(festivals) => festivals,
        Err(e) => {
            view.notice(Notice::error(e.user_message()));
            return view;
        }
    };

    if festivals.is_empty() {
        view.notice(
            Notice::warning(format!(
                "🚨 한국관광공사에 {year}년 {month}월에 진행 예정인 축제정보가 아직 업데이트 되지 않았습니다. \
                 계절별 여행추천 메뉴에서 고려해보세요."
            ))
            .with_link(Page::Seasons),
        );
        return view;
    }
    view.notice(Notice::success(format!(
        "총 {}개의 축제를 조회했습니다.",
        festivals.len()
    )));

    let can_choose = state.country.is_some();
    if !can_choose {
        view.notice(
            Notice::warning("❌ 대상 국가를 선택하지 않았습니다. Country 메뉴에서 선택해주세요.")
                .with_link(Page::Country),
        );
    }

    let titles: Vec<String> = festivals.iter().map(|f| f.title.clone()).collect();
    let snippets = blog_snippets(services.blogs.as_ref(), &titles).await;

    let cards = festivals
        .into_iter()
        .zip(snippets)
        .map(|(festival, snippet)| {
            let mut card = Card {
                facts: vec![
                    Fact::new(
                        "📍 위치",
                        festival.address.clone().unwrap_or_else(|| UNKNOWN.to_string()),
                    ),
                    Fact::new("📅 일정", festival.schedule()),
                ],
                image_url: festival.image_url.clone(),
                ..Card::default()
            };
            apply_snippet(&mut card, snippet, NO_DESCRIPTION);
            if let (true, Some(address)) = (can_choose, &festival.address) {
                card.actions.push(Action::new(
                    format!("➡ {} 테마로 여행 패키지 만들기", festival.title),
                    Command::ChooseTheme {
                        title: festival.title.clone(),
                        location: address.clone(),
                    },
                ));
            }
            card.title = festival.title;
            card
        })
        .collect();

    view.section(Section::Cards {
        title: "🎉 축제 목록".to_string(),
        cards,
    });
    view
}
