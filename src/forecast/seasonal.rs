//! Seasonal model with a bounded logistic trend
//!
//! The series is split into twelve multiplicative month indices and a trend over
//! the deseasonalised values. The trend is a least-squares line turned into a
//! logistic curve between `floor` and `cap` that passes through the line's value
//! and slope at the last training month, so growth saturates instead of running
//! away over the two-year horizon.

use crate::config::ForecastConfig;
use crate::models::YearMonth;
use crate::{InboundAiError, Result};

/// Bounds for the logistic anchor share, keeps the logit finite
const MIN_SHARE: f64 = 0.01;
const MAX_SHARE: f64 = 0.99;

#[derive(Debug, Clone, PartialEq)]
enum Trend {
    Constant(f64),
    Logistic {
        floor: f64,
        capacity: f64,
        rate: f64,
        midpoint: f64,
    },
}

impl Trend {
    fn at(&self, t: f64) -> f64 {
        match *self {
            Trend::Constant(value) => value,
            Trend::Logistic {
                floor,
                capacity,
                rate,
                midpoint,
            } => floor + capacity / (1.0 + (-rate * (t - midpoint)).exp()),
        }
    }

    /// Logistic through `(t0, value)` with the given slope, bounded by `floor` and `cap`
    fn anchored(t0: f64, value: f64, slope: f64, floor: f64, cap: f64) -> Self {
        let capacity = cap - floor;
        if capacity <= f64::EPSILON * cap.abs().max(1.0) {
            return Trend::Constant(floor);
        }

        let share = ((value - floor) / capacity).clamp(MIN_SHARE, MAX_SHARE);
        let rate = slope / (capacity * share * (1.0 - share));
        if rate.abs() < 1e-12 {
            return Trend::Constant(floor + capacity * share);
        }

        let midpoint = t0 - (share / (1.0 - share)).ln() / rate;
        Trend::Logistic {
            floor,
            capacity,
            rate,
            midpoint,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeasonalModel {
    /// Multiplicative index per calendar month, mean 1
    indices: [f64; 12],
    trend: Trend,
    cap: f64,
    floor: f64,
}

impl SeasonalModel {
    /// Fit on training months; `full_years` lists the complete calendar years
    /// used for the seasonal indices
    pub fn fit(
        training: &[(YearMonth, f64)],
        full_years: &[i32],
        historical_max: f64,
        config: &ForecastConfig,
    ) -> Result<Self> {
        let Some(&(last_period, _)) = training.iter().max_by_key(|(period, _)| *period) else {
            return Err(InboundAiError::data("seasonal model needs training data"));
        };

        let indices = seasonal_indices(training, full_years);

        let points: Vec<(f64, f64)> = training
            .iter()
            .map(|(period, value)| {
                let index = indices[month_slot(period.month)];
                let deseasonalised = if index > 1e-9 { value / index } else { *value };
                (period.as_fractional_year(), deseasonalised)
            })
            .collect();
        let (intercept, slope) = least_squares_line(&points)?;

        let cap = config.cap_ratio * historical_max;
        let latest_year = last_period.year;
        let latest_min = training
            .iter()
            .filter(|(period, _)| period.year == latest_year)
            .map(|(_, value)| *value)
            .fold(f64::INFINITY, f64::min);
        let floor = (config.floor_factor * latest_min).min(cap);

        let t0 = last_period.as_fractional_year();
        let trend = Trend::anchored(t0, intercept + slope * t0, slope, floor, cap);

        Ok(Self {
            indices,
            trend,
            cap,
            floor,
        })
    }

    /// Prediction for one month, clamped to `[0, cap]`
    #[must_use]
    pub fn predict(&self, period: YearMonth) -> f64 {
        let trend = self.trend.at(period.as_fractional_year());
        (trend * self.indices[month_slot(period.month)]).clamp(0.0, self.cap)
    }

    #[must_use]
    pub fn cap(&self) -> f64 {
        self.cap
    }

    #[must_use]
    pub fn floor(&self) -> f64 {
        self.floor
    }

    #[must_use]
    pub fn indices(&self) -> &[f64; 12] {
        &self.indices
    }
}

fn month_slot(month: u32) -> usize {
    usize::try_from(month.clamp(1, 12) - 1).unwrap_or(0)
}

/// Average ratio of each month to its year's mean, normalised to mean 1
fn seasonal_indices(training: &[(YearMonth, f64)], full_years: &[i32]) -> [f64; 12] {
    let mut sums = [0.0; 12];
    let mut counts = [0usize; 12];

    for &year in full_years {
        let months: Vec<&(YearMonth, f64)> =
            training.iter().filter(|(period, _)| period.year == year).collect();
        #[allow(clippy::cast_precision_loss)]
        let mean = months.iter().map(|(_, v)| v).sum::<f64>() / months.len().max(1) as f64;
        if mean <= 0.0 {
            continue;
        }
        for (period, value) in months {
            let slot = month_slot(period.month);
            sums[slot] += value / mean;
            counts[slot] += 1;
        }
    }

    let mut indices = [1.0; 12];
    for slot in 0..12 {
        if counts[slot] > 0 {
            #[allow(clippy::cast_precision_loss)]
            let average = sums[slot] / counts[slot] as f64;
            indices[slot] = average;
        }
    }

    let mean = indices.iter().sum::<f64>() / 12.0;
    if mean > 0.0 {
        for index in &mut indices {
            *index /= mean;
        }
    }
    indices
}

/// Ordinary least squares `y = a + b x`, returns `(a, b)`
fn least_squares_line(points: &[(f64, f64)]) -> Result<(f64, f64)> {
    if points.len() < 2 {
        return Err(InboundAiError::data("trend fit needs at least two points"));
    }
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (sxx, sxy) = points.iter().fold((0.0, 0.0), |(sxx, sxy), (x, y)| {
        let dx = x - mean_x;
        (sxx + dx * dx, sxy + dx * (y - mean_y))
    });
    if sxx <= f64::EPSILON {
        return Err(InboundAiError::data("trend fit needs distinct months"));
    }

    let slope = sxy / sxx;
    Ok((mean_y - slope * mean_x, slope))
}
