//! Weighted harmonic regression on the calendar month
//!
//! Months are encoded as `sin/cos(2πm/12)` and `sin/cos(4πm/12)`, so December
//! and January are neighbours and the fitted curve is smooth across the year
//! end. Each training year is weighted `recency_weight^rank` with rank 0 for
//! the oldest year.

use std::collections::BTreeSet;
use std::f64::consts::PI;

use crate::models::YearMonth;
use crate::{InboundAiError, Result};

const FEATURES: usize = 5;

#[derive(Debug, Clone)]
pub struct CyclicRegressor {
    coefficients: [f64; FEATURES],
}

fn encode(month: u32) -> [f64; FEATURES] {
    let angle = 2.0 * PI * f64::from(month) / 12.0;
    [
        1.0,
        angle.sin(),
        angle.cos(),
        (2.0 * angle).sin(),
        (2.0 * angle).cos(),
    ]
}

impl CyclicRegressor {
    pub fn fit(training: &[(YearMonth, f64)], recency_weight: f64) -> Result<Self> {
        if training.is_empty() {
            return Err(InboundAiError::data("cyclic regressor needs training data"));
        }

        let years: Vec<i32> = training
            .iter()
            .map(|(period, _)| period.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        // normal equations: (XᵀWX) β = XᵀWy
        let mut gram = [[0.0; FEATURES]; FEATURES];
        let mut moment = [0.0; FEATURES];

        for (period, value) in training {
            let rank = years.iter().position(|y| *y == period.year).unwrap_or(0);
            let weight = recency_weight.powi(i32::try_from(rank).unwrap_or(i32::MAX));
            let x = encode(period.month);
            for i in 0..FEATURES {
                moment[i] += weight * x[i] * value;
                for j in 0..FEATURES {
                    gram[i][j] += weight * x[i] * x[j];
                }
            }
        }

        let coefficients = solve(gram, moment)?;
        Ok(Self { coefficients })
    }

    /// Prediction for a calendar month, clamped at zero
    #[must_use]
    pub fn predict(&self, month: u32) -> f64 {
        let x = encode(month);
        let value: f64 = self
            .coefficients
            .iter()
            .zip(x.iter())
            .map(|(b, x)| b * x)
            .sum();
        value.max(0.0)
    }
}

/// Gaussian elimination with partial pivoting
fn solve(mut a: [[f64; FEATURES]; FEATURES], mut b: [f64; FEATURES]) -> Result<[f64; FEATURES]> {
    let scale = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()))
        .max(1.0);

    for col in 0..FEATURES {
        let pivot = (col..FEATURES)
            .max_by(|&r1, &r2| a[r1][col].abs().total_cmp(&a[r2][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < 1e-10 * scale {
            return Err(InboundAiError::data(
                "cyclic regressor system is singular, not enough distinct months",
            ));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..FEATURES {
            let factor = a[row][col] / a[col][col];
            for k in col..FEATURES {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0; FEATURES];
    for row in (0..FEATURES).rev() {
        let tail: f64 = (row + 1..FEATURES).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}
