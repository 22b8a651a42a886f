use super::{Fact, Notice, PageView, Section, Services, format_count};
use crate::analytics::{self, RankedCountry};
use crate::session::{Command, Page, SessionState};

fn ranking_rows(ranking: &[RankedCountry]) -> Vec<Vec<String>> {
    ranking
        .iter()
        .map(|r| {
            vec![
                r.rank.to_string(),
                r.country.clone(),
                r.iso_alpha3.clone().unwrap_or_default(),
                format_count(r.count),
            ]
        })
        .collect()
}

fn ranking_columns() -> Vec<String> {
    ["순위", "국가", "ISO", "입국자 수"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

pub fn render(services: &Services, state: &SessionState) -> PageView {
    let mut view = PageView::new(Page::Country);
    let store = &services.data;
    let planner = &services.config.planner;

    let Some(period) = state.period else {
        view.notice(Notice::info("예측 희망 년, 월을 입력하세요.🌍"));
        return view;
    };
    let (year, month) = (period.year, period.month);

    let ranking = analytics::ranking(store, period);
    if ranking.is_empty() {
        view.notice(Notice::warning("선택한 연도와 월에 대한 충분한 데이터가 없습니다."));
        return view;
    }

    view.section(Section::Table {
        title: format!("📊 {year}년 {month}월 각 국가별 예상 입국자 수"),
        columns: ranking_columns(),
        rows: ranking_rows(&ranking),
    });

    let busy = analytics::above_threshold(&ranking, planner.visitor_threshold);
    view.section(Section::Table {
        title: format!(
            "방문자 수가 {} 이상 예상되는 국가",
            format_count(planner.visitor_threshold)
        ),
        columns: ranking_columns(),
        rows: ranking_rows(&busy),
    });

    if let Some(tip) = analytics::seasonal_tip(store, &busy, period.season()) {
        view.section(Section::paragraph(format!(
            "💡 {} 시즌에는 {}의 입국자 증가율이 {:.1}%로 가장 높습니다.",
            tip.season.korean(),
            tip.country,
            tip.rate_percent
        )));
    }

    let window = planner.trend_window_months;
    let (top, others) = analytics::trend_groups(store, &ranking, period, window);
    view.section(Section::Series {
        title: format!("📊 {year}년 {month}월 기준 상위 5개국 ±{window}개월 입국자 수 추이"),
        series: top,
    })
    .section(Section::Series {
        title: format!("📊 {year}년 {month}월 기준 그 외 10개국 ±{window}개월 입국자 수"),
        series: others,
    });

    if let Some(leader) = analytics::top_growth(store, period) {
        view.section(Section::paragraph(format!(
            "📈 전월 대비 입국자 수가 가장 많이 늘어난 국가는 {}입니다. ({} → {}명, {:+.1}%)",
            leader.country,
            format_count(leader.previous),
            format_count(leader.current),
            leader.rate_percent
        )));
    }

    let tiers = analytics::tiers(&ranking);
    view.section(Section::Facts {
        items: vec![
            Fact::new("🥇 인기 국가 (1~5위)", tiers.leaders.join(", ")),
            Fact::new("🚀 떠오르는 국가 (6~10위)", tiers.rising.join(", ")),
            Fact::new("💎 숨은 보석 (하위 5개국)", tiers.hidden_gems.join(", ")),
        ],
    });
    let mut offered: Vec<&String> = Vec::new();
    for country in tiers
        .leaders
        .iter()
        .chain(&tiers.rising)
        .chain(&tiers.hidden_gems)
    {
        if offered.contains(&country) {
            continue;
        }
        offered.push(country);
        view.action(
            format!("{country} 선택"),
            Command::SelectCountry {
                country: country.clone(),
            },
        );
    }

    let Some(country) = state.country.as_deref() else {
        view.notice(Notice::info("⚠️ 국가를 선택해 주세요."));
        return view;
    };

    view.section(Section::heading(format!("🔎 {country} 여행 정보")));
    let mut facts = Vec::new();
    if let Some(profile) = store.profile(country) {
        facts.push(Fact::new("🗣️ 사용 언어", profile.language.clone()));
        facts.push(Fact::new("🏝 여행 성향", profile.travel_preference.clone()));
    }
    match analytics::expected_visitors(store, country, period) {
        Some(expected) => {
            facts.push(Fact::new("🙂 예상 입국인원", format!("{} 명", format_count(expected))));
            view.action("➡ 축제 정보 보기", Command::Continue);
        }
        None => {
            view.notice(Notice::info("🚫 예상 입국자 수 데이터가 없습니다."));
        }
    }
    view.section(Section::Facts { items: facts });
    view
}
