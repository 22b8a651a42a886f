use super::{Notice, PageView, Section, Services};
use crate::planner::ItineraryRequest;
use crate::session::{Command, Generation, Page, SessionState};

pub fn render(services: &Services, state: &SessionState) -> PageView {
    let mut view = PageView::new(Page::AiPlanner);

    if !state.has_selections() {
        view.notice(
            Notice::warning(
                "🚨 해당 메뉴에서는 외국인 관광객, 여행 날짜, 여행 지역 정보를 바탕으로 AI와 함께 여행 일정을 계획할 수 있습니다. \
                 Country 메뉴부터 시작해주세요.😉",
            )
            .with_link(Page::Country),
        );
        return view;
    }

    view.section(Section::paragraph(
        "✨ AI가 선택한 정보를 기반으로 맞춤형 여행 일정을 생성합니다. \
         아래 버튼을 클릭하면 AI가 여행 코스를 추천해줍니다! 🚀",
    ))
    .action("🚀 AI 여행 패키지 생성하기", Command::GeneratePlan);

    match &state.plan {
        Generation::NotRequested => {}
        Generation::Ready(plan) => {
            let profile = state
                .country
                .as_deref()
                .and_then(|country| services.data.profile(country));
            let filename = ItineraryRequest::from_session(state, profile).export_filename();
            view.section(Section::heading("📌 AI 추천 여행 일정"))
                .section(Section::Plan {
                    text: plan.clone(),
                    filename,
                });
        }
        Generation::Failed(message) => {
            view.notice(Notice::warning(message.clone()))
                .notice(Notice::info("AI 일정 생성이 실패했기 때문에 다운로드는 불가능합니다. 😢"));
        }
    }
    view
}
