//! Monthly arrival forecasting
//!
//! Every country gets the seasonal model except the configured outlier, whose
//! post-pandemic recovery broke its seasonal pattern and which therefore uses the
//! cyclic month regressor. Both models train on history outside the excluded
//! pandemic years and need a minimum number of complete calendar years.

pub mod cyclic;
pub mod seasonal;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info, instrument, warn};

use crate::config::ForecastConfig;
use crate::models::{ForecastRecord, VisitorRecord, YearMonth};
use crate::{InboundAiError, Result};

use cyclic::CyclicRegressor;
use seasonal::SeasonalModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Seasonal,
    Cyclic,
}

/// Forecast for one country
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastOutcome {
    pub country: String,
    pub model: ModelKind,
    pub records: Vec<ForecastRecord>,
}

/// Result of forecasting every country in a history file
#[derive(Debug)]
pub struct CombinedRun {
    /// History followed by forecasts
    pub records: Vec<VisitorRecord>,
    pub outcomes: Vec<ForecastOutcome>,
    pub skipped: Vec<(String, InboundAiError)>,
}

/// Training view of one country's history
struct CountryHistory {
    /// Every observed month before the forecast start, excluded years included
    observed: BTreeMap<YearMonth, f64>,
    /// Observed months outside the excluded years
    training: Vec<(YearMonth, f64)>,
    full_years: Vec<i32>,
    historical_max: f64,
}

impl CountryHistory {
    fn new(country: &str, history: &[VisitorRecord], config: &ForecastConfig) -> Self {
        let start = config.start();
        let excluded: HashSet<i32> = config.excluded_years.iter().copied().collect();

        #[allow(clippy::cast_precision_loss)]
        let observed: BTreeMap<YearMonth, f64> = history
            .iter()
            .filter(|r| r.country == country && (1..=12).contains(&r.month))
            .filter(|r| r.period() < start)
            .map(|r| (r.period(), r.count as f64))
            .collect();

        let training: Vec<(YearMonth, f64)> = observed
            .iter()
            .filter(|(period, _)| !excluded.contains(&period.year))
            .map(|(period, value)| (*period, *value))
            .collect();

        let mut months_per_year: BTreeMap<i32, usize> = BTreeMap::new();
        for (period, _) in &training {
            *months_per_year.entry(period.year).or_default() += 1;
        }
        let full_years = months_per_year
            .into_iter()
            .filter(|(_, months)| *months == 12)
            .map(|(year, _)| year)
            .collect();

        let historical_max = observed.values().copied().fold(0.0, f64::max);

        Self {
            observed,
            training,
            full_years,
            historical_max,
        }
    }

    /// Value of the same calendar month in the latest observed year
    fn last_observed(&self, month: u32) -> Option<f64> {
        self.observed
            .iter()
            .rev()
            .find(|(period, _)| period.month == month)
            .map(|(_, value)| *value)
    }
}

pub struct ForecastSelector {
    config: ForecastConfig,
}

impl ForecastSelector {
    #[must_use]
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    #[must_use]
    pub fn model_for(&self, country: &str) -> ModelKind {
        if country == self.config.outlier_country {
            ModelKind::Cyclic
        } else {
            ModelKind::Seasonal
        }
    }

    /// Forecast `horizon_months` months for one country from its history
    #[instrument(skip(self, history), fields(model))]
    pub fn forecast(&self, country: &str, history: &[VisitorRecord]) -> Result<ForecastOutcome> {
        let config = &self.config;
        let data = CountryHistory::new(country, history, config);

        if data.full_years.len() < config.min_seasonal_cycles {
            return Err(InboundAiError::InsufficientHistory {
                country: country.to_string(),
                cycles: data.full_years.len(),
                required: config.min_seasonal_cycles,
            });
        }

        let model = self.model_for(country);
        tracing::Span::current().record("model", tracing::field::debug(&model));

        let months: Vec<YearMonth> =
            YearMonth::range_inclusive(config.start(), config.end()).collect();

        let (raw, ceiling) = match model {
            ModelKind::Seasonal => {
                let fitted = SeasonalModel::fit(
                    &data.training,
                    &data.full_years,
                    data.historical_max,
                    config,
                )?;
                debug!(cap = fitted.cap(), floor = fitted.floor(), "Fitted seasonal model");
                let predictions: Vec<f64> = months.iter().map(|m| fitted.predict(*m)).collect();
                (predictions, Some(fitted.cap()))
            }
            ModelKind::Cyclic => {
                let fitted = CyclicRegressor::fit(&data.training, config.recency_weight)?;
                let predictions: Vec<f64> = months.iter().map(|m| fitted.predict(m.month)).collect();
                (predictions, None)
            }
        };

        let blend = usize::try_from(config.boundary_blend_months).unwrap_or(0);
        let records = months
            .iter()
            .zip(raw)
            .enumerate()
            .map(|(i, (period, value))| {
                let value = if i < blend {
                    match data.last_observed(period.month) {
                        Some(observed) => blend_boundary(value, observed, i, blend),
                        None => value,
                    }
                } else {
                    value
                };
                ForecastRecord::new(country, *period, to_count(value, ceiling))
            })
            .collect();

        Ok(ForecastOutcome {
            country: country.to_string(),
            model,
            records,
        })
    }

    /// Forecast every country in the history, collecting the ones that cannot be forecast
    pub fn forecast_all(
        &self,
        history: &[VisitorRecord],
    ) -> (Vec<ForecastOutcome>, Vec<(String, InboundAiError)>) {
        let countries: BTreeSet<&str> = history.iter().map(|r| r.country.as_str()).collect();
        let mut outcomes = Vec::with_capacity(countries.len());
        let mut skipped = Vec::new();

        for country in countries {
            match self.forecast(country, history) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    warn!(country, error = %e, "Forecast skipped");
                    skipped.push((country.to_string(), e));
                }
            }
        }

        info!(
            forecast = outcomes.len(),
            skipped = skipped.len(),
            "Forecast run finished"
        );
        (outcomes, skipped)
    }

    /// History plus forecasts as one dataset. Forecast months already present in
    /// the history are dropped.
    pub fn build_combined(&self, history: Vec<VisitorRecord>) -> Result<CombinedRun> {
        crate::dataset::validate_unique(&history)?;
        let (outcomes, skipped) = self.forecast_all(&history);

        let known: HashSet<(String, YearMonth)> = history
            .iter()
            .map(|r| (r.country.clone(), r.period()))
            .collect();

        let mut records = history;
        for outcome in &outcomes {
            for forecast in &outcome.records {
                if known.contains(&(forecast.country.clone(), forecast.period())) {
                    debug!(country = %forecast.country, period = %forecast.period(), "Observed month kept over forecast");
                    continue;
                }
                records.push(forecast.clone().into());
            }
        }

        Ok(CombinedRun {
            records,
            outcomes,
            skipped,
        })
    }
}

/// Linear blend of the `i`-th of `n` boundary months toward the last observed year
fn blend_boundary(model: f64, observed: f64, i: usize, n: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let weight = (i + 1) as f64 / (n + 1) as f64;
    weight * model + (1.0 - weight) * observed
}

fn to_count(value: f64, ceiling: Option<f64>) -> u64 {
    let mut value = if value.is_finite() { value.max(0.0).round() } else { 0.0 };
    if let Some(cap) = ceiling {
        value = value.min(cap.floor());
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = value as u64;
    count
}
