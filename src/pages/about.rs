use super::{Fact, PageView, Section, Services};
use crate::planner::PROMPT_TEMPLATE;
use crate::session::Page;

pub fn render(services: &Services) -> PageView {
    let config = &services.config;
    let mut view = PageView::new(Page::About);

    view.section(Section::heading("🔍 사용된 기술"))
        .section(Section::Table {
            title: "데이터 출처 및 활용 API".to_string(),
            columns: vec!["구분".to_string(), "출처".to_string()],
            rows: [
                ("입국자 통계", "법무부_외국인 국적 및 월별 입국자 현황 (공공데이터포털)"),
                ("축제·계절 여행지", "한국관광공사 국문 관광정보 서비스"),
                ("관광지·숙소 검색", "카카오 로컬 API"),
                ("장소 설명", "네이버 블로그 검색 API"),
                ("여행 일정 생성", "Hugging Face Inference API"),
            ]
            .iter()
            .map(|(kind, source)| vec![(*kind).to_string(), (*source).to_string()])
            .collect(),
        });

    view.section(Section::heading("📌 최종 모델 선정-스위칭 기반 하이브리드 모델"))
        .section(Section::paragraph(format!(
            "✅ 계절성 모델: 월별 계절 지수와 로지스틱 추세로 대부분의 국가에 적용합니다. \
             상한은 최대 입국자 수의 {:.0}%, 하한은 최근 최소 입국자 수의 {}배입니다.\n\
             ✅ 주기 회귀 모델: 계절성 규칙이 깨진 {}에만 적용하며, 월을 sin/cos로 변환해 \
             1월과 12월의 연속성을 반영합니다.",
            config.forecast.cap_ratio * 100.0,
            config.forecast.floor_factor,
            config.forecast.outlier_country
        )))
        .section(Section::Facts {
            items: vec![
                Fact::new(
                    "제외 연도",
                    config
                        .forecast
                        .excluded_years
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", "),
                ),
                Fact::new(
                    "예측 기간",
                    format!("{} ~ {}", config.forecast.start(), config.forecast.end()),
                ),
            ],
        });

    view.section(Section::heading("LLM 선정 기준👾"))
        .section(Section::Facts {
            items: vec![Fact::new("채택한 LLM", config.llm.model.clone())],
        })
        .section(Section::paragraph(PROMPT_TEMPLATE));
    view
}
