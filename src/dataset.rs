//! CSV datasets: arrival history, combined forecast, seasonal growth and travel preferences
//!
//! Column names follow the published files (`국적지역, 년, 월, 입국자수` and friends)
//! so the combined dataset can be exchanged with the spreadsheets the operators use.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use tracing::{info, instrument, warn};

use crate::config::InboundAiConfig;
use crate::forecast::ForecastSelector;
use crate::models::{CountryProfile, SeasonalGrowth, VisitorRecord, YearMonth};
use crate::{InboundAiError, Result};

#[derive(Debug, Deserialize)]
struct VisitorRow {
    #[serde(rename = "국적지역")]
    country: String,
    #[serde(rename = "년")]
    year: i32,
    #[serde(rename = "월")]
    month: u32,
    /// Model output is written with decimals
    #[serde(rename = "입국자수")]
    count: f64,
}

#[derive(Debug, Serialize)]
struct VisitorRowOut<'a> {
    #[serde(rename = "국적지역")]
    country: &'a str,
    #[serde(rename = "년")]
    year: i32,
    #[serde(rename = "월")]
    month: u32,
    #[serde(rename = "입국자수")]
    count: u64,
}

#[derive(Debug, Deserialize)]
struct GrowthRow {
    #[serde(rename = "국적지역")]
    country: String,
    #[serde(rename = "봄철 증가율")]
    spring: f64,
    #[serde(rename = "여름철 증가율")]
    summer: f64,
    #[serde(rename = "가을철 증가율")]
    autumn: f64,
    #[serde(rename = "겨울철 증가율")]
    winter: f64,
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    #[serde(rename = "국가")]
    country: String,
    #[serde(rename = "언어")]
    language: String,
    #[serde(rename = "여행 성향")]
    travel_preference: String,
}

impl TryFrom<VisitorRow> for VisitorRecord {
    type Error = InboundAiError;

    fn try_from(row: VisitorRow) -> Result<Self> {
        let country = row.country.trim().to_string();
        if country.is_empty() {
            return Err(InboundAiError::validation("country name cannot be empty"));
        }
        let period = YearMonth::try_new(row.year, row.month)?;
        if !row.count.is_finite() || row.count < 0.0 {
            return Err(InboundAiError::validation(format!(
                "visitor count for {country} {period} must be a non-negative number, got {}",
                row.count
            )));
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let count = row.count.round() as u64;

        Ok(VisitorRecord {
            country,
            year: period.year,
            month: period.month,
            count,
        })
    }
}

/// Parse visitor records from CSV with the `국적지역, 년, 월, 입국자수` header
pub fn read_visitor_records<R: Read>(reader: R) -> Result<Vec<VisitorRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();
    for (line, row) in csv_reader.deserialize::<VisitorRow>().enumerate() {
        let record = VisitorRecord::try_from(row?).map_err(|e| {
            InboundAiError::data(format!("row {}: {e}", line + 2))
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Write visitor records as CSV, sorted by country then month
pub fn write_visitor_records<W: Write>(writer: W, records: &[VisitorRecord]) -> Result<()> {
    let mut sorted: Vec<&VisitorRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        a.country
            .cmp(&b.country)
            .then(a.period().cmp(&b.period()))
    });

    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in sorted {
        csv_writer.serialize(VisitorRowOut {
            country: &record.country,
            year: record.year,
            month: record.month,
            count: record.count,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_visitor_records(path: &Path) -> Result<Vec<VisitorRecord>> {
    let file = File::open(path).map_err(|e| {
        InboundAiError::data(format!("cannot open {}: {e}", path.display()))
    })?;
    let records = read_visitor_records(file)
        .map_err(|e| InboundAiError::data(format!("{}: {e}", path.display())))?;
    info!(count = records.len(), "Loaded visitor records");
    Ok(records)
}

#[instrument(skip_all, fields(path = %path.display(), count = records.len()))]
pub fn save_visitor_records(path: &Path, records: &[VisitorRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    write_visitor_records(file, records)?;
    info!("Wrote visitor records");
    Ok(())
}

/// Reject a record set containing the same `(country, year, month)` twice
pub fn validate_unique(records: &[VisitorRecord]) -> Result<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert((record.country.as_str(), record.period())) {
            return Err(InboundAiError::data(format!(
                "duplicate record for {} {}",
                record.country,
                record.period()
            )));
        }
    }
    Ok(())
}

pub fn read_seasonal_growth<R: Read>(reader: R) -> Result<Vec<SeasonalGrowth>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    csv_reader
        .deserialize::<GrowthRow>()
        .map(|row| {
            let row = row?;
            Ok(SeasonalGrowth {
                country: row.country,
                spring: row.spring,
                summer: row.summer,
                autumn: row.autumn,
                winter: row.winter,
            })
        })
        .collect()
}

pub fn read_profiles<R: Read>(reader: R) -> Result<Vec<CountryProfile>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    csv_reader
        .deserialize::<ProfileRow>()
        .map(|row| {
            let row = row?;
            Ok(CountryProfile {
                country: row.country,
                language: row.language,
                travel_preference: row.travel_preference,
            })
        })
        .collect()
}

/// Open an optional reference table; a missing file yields an empty table
fn load_optional<T>(path: &Path, parse: impl FnOnce(File) -> Result<Vec<T>>) -> Result<Vec<T>> {
    match File::open(path) {
        Ok(file) => parse(file).map_err(|e| InboundAiError::data(format!("{}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "Optional data file not found, continuing without it");
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// All datasets the pages read from, loaded once at start-up
#[derive(Debug, Default, Clone)]
pub struct DataStore {
    records: Vec<VisitorRecord>,
    index: HashMap<(String, YearMonth), u64>,
    growth: HashMap<String, SeasonalGrowth>,
    profiles: HashMap<String, CountryProfile>,
}

impl DataStore {
    pub fn new(
        records: Vec<VisitorRecord>,
        growth: Vec<SeasonalGrowth>,
        profiles: Vec<CountryProfile>,
    ) -> Result<Self> {
        validate_unique(&records)?;
        let index = records
            .iter()
            .map(|r| ((r.country.clone(), r.period()), r.count))
            .collect();
        Ok(Self {
            records,
            index,
            growth: growth.into_iter().map(|g| (g.country.clone(), g)).collect(),
            profiles: profiles.into_iter().map(|p| (p.country.clone(), p)).collect(),
        })
    }

    /// Load the combined dataset, running the forecast pipeline first when it
    /// does not exist yet
    #[instrument(skip_all)]
    pub fn load(config: &InboundAiConfig) -> Result<Self> {
        let data = &config.data;
        let records = if data.combined_path.exists() {
            load_visitor_records(&data.combined_path)?
        } else {
            info!(
                history = %data.history_path.display(),
                "Combined dataset missing, forecasting from history"
            );
            let history = load_visitor_records(&data.history_path)?;
            let run = ForecastSelector::new(config.forecast.clone()).build_combined(history)?;
            for (country, reason) in &run.skipped {
                warn!(country, %reason, "Country skipped by forecast");
            }
            save_visitor_records(&data.combined_path, &run.records)?;
            run.records
        };

        let growth = load_optional(&data.seasonal_growth_path, read_seasonal_growth)?;
        let profiles = load_optional(&data.travel_preference_path, read_profiles)?;

        Self::new(records, growth, profiles)
    }

    #[must_use]
    pub fn records(&self) -> &[VisitorRecord] {
        &self.records
    }

    /// Arrivals of every country in one month
    pub fn records_for(&self, period: YearMonth) -> impl Iterator<Item = &VisitorRecord> {
        self.records.iter().filter(move |r| r.period() == period)
    }

    /// All months of one country in chronological order
    #[must_use]
    pub fn series(&self, country: &str) -> Vec<&VisitorRecord> {
        let mut series: Vec<_> = self.records.iter().filter(|r| r.country == country).collect();
        series.sort_by_key(|r| r.period());
        series
    }

    #[must_use]
    pub fn count(&self, country: &str, period: YearMonth) -> Option<u64> {
        self.index.get(&(country.to_string(), period)).copied()
    }

    #[must_use]
    pub fn countries(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.country.as_str()).collect()
    }

    #[must_use]
    pub fn growth(&self, country: &str) -> Option<&SeasonalGrowth> {
        self.growth.get(country)
    }

    #[must_use]
    pub fn profile(&self, country: &str) -> Option<&CountryProfile> {
        self.profiles.get(country)
    }
}
