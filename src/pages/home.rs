use super::{PageView, Section};
use crate::session::{Command, Page};

pub fn render() -> PageView {
    let mut view = PageView::new(Page::Home);
    view.section(Section::paragraph(
        "50개국 입국자 수를 토대로 관광 특수기를 예측하는 프로젝트입니다. \
         계절성 시계열 모델과 주기 회귀 모델을 국가별로 전환하여 25,26년 입국자 수를 예측하고, \
         예측 결과와 축제·계절 여행지·주변 관광지 정보를 묶어 AI와 함께 여행 패키지를 설계합니다.",
    ))
    .action(
        "➡ Country 메뉴로 이동",
        Command::Navigate {
            page: Page::Country,
        },
    );
    view
}
