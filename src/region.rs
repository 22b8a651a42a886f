//! Province and city/county/district extraction from Korean addresses

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Full and short province names. Longer alternatives come first so a full
/// name is never matched by its own short form.
static PROVINCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(서울특별시|부산광역시|대구광역시|인천광역시|광주광역시|대전광역시|울산광역시|세종특별자치시|제주특별자치도|전북특별자치도|강원특별자치도|경기도|강원도|충청북도|충청남도|전라북도|전라남도|경상북도|경상남도|서울|부산|대구|인천|광주|대전|울산|세종|제주|경기|강원|충북|충남|전북|전남|경북|경남)(\s|$)",
    )
    .expect("valid regex")
});

static DISTRICT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\S+?(?:시|군|구))(\s|$)").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Full province or metropolitan city name, empty when absent
    pub province: String,
    /// City, county or district, empty when absent
    pub district: String,
}

impl Region {
    /// Search prefix used for map queries, e.g. `경기도 수원시`
    #[must_use]
    pub fn query_prefix(&self) -> String {
        format!("{} {}", self.province, self.district)
            .trim()
            .to_string()
    }
}

fn normalize_province(name: &str) -> &'static str {
    match name {
        "서울특별시" | "서울" => "서울특별시",
        "부산광역시" | "부산" => "부산광역시",
        "대구광역시" | "대구" => "대구광역시",
        "인천광역시" | "인천" => "인천광역시",
        "광주광역시" | "광주" => "광주광역시",
        "대전광역시" | "대전" => "대전광역시",
        "울산광역시" | "울산" => "울산광역시",
        "세종특별자치시" | "세종" => "세종특별자치시",
        "제주특별자치도" | "제주" => "제주특별자치도",
        "경기도" | "경기" => "경기도",
        "강원특별자치도" | "강원도" | "강원" => "강원도",
        "충청북도" | "충북" => "충청북도",
        "충청남도" | "충남" => "충청남도",
        "전북특별자치도" | "전라북도" | "전북" => "전라북도",
        "전라남도" | "전남" => "전라남도",
        "경상북도" | "경북" => "경상북도",
        "경상남도" | "경남" => "경상남도",
        _ => "",
    }
}

/// Extract the province and the following city/county/district token.
///
/// Returns `None` when neither part is found.
#[must_use]
pub fn extract_region(address: &str) -> Option<Region> {
    let (province, rest) = match PROVINCE.captures(address) {
        Some(caps) => {
            let name = caps.get(1).map_or("", |m| m.as_str());
            let end = caps.get(0).map_or(0, |m| m.end());
            (normalize_province(name), &address[end..])
        }
        None => ("", address),
    };

    let district = DISTRICT
        .captures(rest)
        .and_then(|caps| caps.get(1))
        .map_or("", |m| m.as_str());

    if province.is_empty() && district.is_empty() {
        return None;
    }

    Some(Region {
        province: province.to_string(),
        district: district.to_string(),
    })
}
