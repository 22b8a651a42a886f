use super::{Fact, Notice, PageView, Section};
use crate::session::{Command, Generation, Page, SessionState};

const EXAMPLE_QUESTION: &str = "서울 불꽃 축제에 가고 싶은데, 근처 관광지도 포함해서 일정을 추천해줘.";
const EXAMPLE_ORIGIN: &str = "경복궁, 서울";
const EXAMPLE_DESTINATION: &str = "남산타워, 서울";

pub fn render(state: &SessionState) -> PageView {
    let mut view = PageView::new(Page::Ask);
    view.action(
        "여행 일정 추천받기",
        Command::Ask {
            question: state
                .question
                .clone()
                .unwrap_or_else(|| EXAMPLE_QUESTION.to_string()),
        },
    );

    match &state.answer {
        Generation::NotRequested => {
            view.section(Section::paragraph("여행 계획을 입력하세요"));
        }
        Generation::Ready(answer) => {
            view.section(Section::heading("📌 추천 일정"))
                .section(Section::paragraph(answer.clone()));
        }
        Generation::Failed(message) => {
            view.notice(Notice::warning(message.clone()));
        }
    }

    if let Some(measurement) = &state.distance {
        view.section(Section::heading("🚗 이동 거리 계산"));
        match (measurement.kilometers, &measurement.error) {
            (Some(km), _) => {
                view.section(Section::Facts {
                    items: vec![Fact::new(
                        format!("{} → {}", measurement.origin, measurement.destination),
                        format!("{km:.1} km"),
                    )],
                });
            }
            (None, Some(error)) => {
                view.notice(Notice::error(error.clone()));
            }
            (None, None) => {}
        }
    }

    view.action(
        "🚗 이동 거리 계산",
        Command::MeasureDistance {
            origin: EXAMPLE_ORIGIN.to_string(),
            destination: EXAMPLE_DESTINATION.to_string(),
        },
    );
    view
}
