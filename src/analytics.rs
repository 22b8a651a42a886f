//! Country rankings and trend summaries for a selected month

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::dataset::DataStore;
use crate::models::{Season, YearMonth};

/// Countries per choice tier
pub const TIER_SIZE: usize = 5;
/// Countries in the secondary trend chart
pub const OTHERS_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCountry {
    pub rank: usize,
    pub country: String,
    pub iso_alpha3: Option<String>,
    pub count: u64,
}

/// Three ways to pick a target market
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoiceTiers {
    /// Ranks 1-5
    pub leaders: Vec<String>,
    /// Ranks 6-10
    pub rising: Vec<String>,
    /// The five smallest markets
    pub hidden_gems: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub country: String,
    pub points: Vec<TrendPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub period: YearMonth,
    pub count: u64,
}

/// Country with the largest month-over-month increase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthLeader {
    pub country: String,
    pub previous: u64,
    pub current: u64,
    pub increase: i64,
    /// Percent change; 0 when the previous month had no arrivals
    pub rate_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalTip {
    pub country: String,
    pub season: Season,
    pub rate_percent: f64,
}

/// ISO 3166-1 alpha-3 code for the Korean country names used in the datasets
#[must_use]
pub fn iso_alpha3(country: &str) -> Option<&'static str> {
    let code = match country {
        "중국" => "CHN",
        "일본" => "JPN",
        "미국" => "USA",
        "프랑스" => "FRA",
        "독일" => "DEU",
        "영국" => "GBR",
        "캐나다" => "CAN",
        "호주" | "오스트레일리아" => "AUS",
        "태국" => "THA",
        "베트남" => "VNM",
        "필리핀" => "PHL",
        "인도네시아" => "IDN",
        "말레이시아" => "MYS",
        "싱가포르" => "SGP",
        "러시아" => "RUS",
        "인도" => "IND",
        "브라질" => "BRA",
        "멕시코" => "MEX",
        "이탈리아" => "ITA",
        "스페인" => "ESP",
        "대만" => "TWN",
        "홍콩" => "HKG",
        _ => return None,
    };
    Some(code)
}

fn by_count_desc(a: &(&str, u64), b: &(&str, u64)) -> Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

/// All countries with data for the month, largest first, ranks from 1
#[must_use]
pub fn ranking(store: &DataStore, period: YearMonth) -> Vec<RankedCountry> {
    let mut rows: Vec<(&str, u64)> = store
        .records_for(period)
        .map(|r| (r.country.as_str(), r.count))
        .collect();
    rows.sort_by(by_count_desc);
    rank_rows(rows)
}

fn rank_rows(rows: Vec<(&str, u64)>) -> Vec<RankedCountry> {
    rows.into_iter()
        .enumerate()
        .map(|(i, (country, count))| RankedCountry {
            rank: i + 1,
            country: country.to_string(),
            iso_alpha3: iso_alpha3(country).map(str::to_string),
            count,
        })
        .collect()
}

/// Countries at or above `threshold`, re-ranked from 1
#[must_use]
pub fn above_threshold(ranking: &[RankedCountry], threshold: u64) -> Vec<RankedCountry> {
    let rows = ranking
        .iter()
        .filter(|r| r.count >= threshold)
        .map(|r| (r.country.as_str(), r.count))
        .collect();
    rank_rows(rows)
}

#[must_use]
pub fn tiers(ranking: &[RankedCountry]) -> ChoiceTiers {
    let names = |rows: &[RankedCountry]| -> Vec<String> {
        rows.iter().map(|r| r.country.clone()).collect()
    };
    let leaders = names(&ranking[..ranking.len().min(TIER_SIZE)]);
    let rising = if ranking.len() > TIER_SIZE {
        names(&ranking[TIER_SIZE..ranking.len().min(2 * TIER_SIZE)])
    } else {
        Vec::new()
    };
    // smallest first
    let hidden_gems = ranking
        .iter()
        .rev()
        .take(TIER_SIZE)
        .map(|r| r.country.clone())
        .collect();

    ChoiceTiers {
        leaders,
        rising,
        hidden_gems,
    }
}

/// Arrivals from `window` months before to `window` months after `period`
#[must_use]
pub fn window_trend(
    store: &DataStore,
    period: YearMonth,
    window: u32,
    countries: &[String],
) -> Vec<TrendSeries> {
    let window = i32::try_from(window).unwrap_or(i32::MAX);
    let from = period.offset(-window);
    let to = period.offset(window);

    countries
        .iter()
        .map(|country| TrendSeries {
            country: country.clone(),
            points: YearMonth::range_inclusive(from, to)
                .filter_map(|month| {
                    store.count(country, month).map(|count| TrendPoint {
                        period: month,
                        count,
                    })
                })
                .collect(),
        })
        .collect()
}

/// Trend series for the top five countries and the next ten
#[must_use]
pub fn trend_groups(
    store: &DataStore,
    ranking: &[RankedCountry],
    period: YearMonth,
    window: u32,
) -> (Vec<TrendSeries>, Vec<TrendSeries>) {
    let top: Vec<String> = ranking
        .iter()
        .take(TIER_SIZE)
        .map(|r| r.country.clone())
        .collect();
    let others: Vec<String> = ranking
        .iter()
        .skip(TIER_SIZE)
        .take(OTHERS_SIZE)
        .map(|r| r.country.clone())
        .collect();

    (
        window_trend(store, period, window, &top),
        window_trend(store, period, window, &others),
    )
}

/// Largest absolute increase over the previous month. January compares with
/// December of the previous year. `None` when either month has no data.
#[must_use]
pub fn top_growth(store: &DataStore, period: YearMonth) -> Option<GrowthLeader> {
    let previous_period = period.previous();

    let mut candidates: Vec<GrowthLeader> = store
        .records_for(period)
        .filter_map(|current| {
            let previous = store.count(&current.country, previous_period)?;
            let increase = i64::try_from(current.count).unwrap_or(i64::MAX)
                - i64::try_from(previous).unwrap_or(i64::MAX);
            #[allow(clippy::cast_precision_loss)]
            let rate_percent = if previous > 0 {
                increase as f64 / previous as f64 * 100.0
            } else {
                0.0
            };
            Some(GrowthLeader {
                country: current.country.clone(),
                previous,
                current: current.count,
                increase,
                rate_percent,
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.increase
            .cmp(&a.increase)
            .then_with(|| a.country.cmp(&b.country))
    });
    candidates.into_iter().next()
}

/// Among the given countries, the one whose arrivals grow most in `season`
#[must_use]
pub fn seasonal_tip(
    store: &DataStore,
    candidates: &[RankedCountry],
    season: Season,
) -> Option<SeasonalTip> {
    candidates
        .iter()
        .filter_map(|r| {
            store.growth(&r.country).map(|g| SeasonalTip {
                country: r.country.clone(),
                season,
                rate_percent: g.rate(season),
            })
        })
        .max_by(|a, b| {
            a.rate_percent
                .total_cmp(&b.rate_percent)
                .then_with(|| b.country.cmp(&a.country))
        })
}

/// Expected arrivals of one country in the selected month
#[must_use]
pub fn expected_visitors(store: &DataStore, country: &str, period: YearMonth) -> Option<u64> {
    store.count(country, period)
}
