//! Synthetic retention observations.
//!
//! Draws noisy `(day, retention)` points around a chosen curve, for demos and
//! tests. Noise is multiplicative log-normal with a mean correction, so the
//! expected observation equals the curve value:
//!
//! ```text
//! y = f(d) · exp(σ·z - σ²/2),  z ~ N(0, 1)
//! ```
//!
//! and every draw is clamped into `(0, 100]`.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::domain::FamilyKind;
use crate::error::{ForecastError, ForecastResult};
use crate::models::Curve;

/// Smallest retention a sample can take.
const MIN_RETENTION: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct SampleConfig {
    pub family: FamilyKind,
    pub params: Vec<f64>,
    /// Observations span days `1..=max_day`.
    pub max_day: u32,
    /// Observations drawn per day.
    pub per_day: usize,
    /// Log-scale noise level.
    pub noise: f64,
    pub seed: u64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            family: FamilyKind::Exp,
            params: vec![45.0, 0.25, 5.0],
            max_day: 30,
            per_day: 3,
            noise: 0.1,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleStats {
    pub n_points: usize,
    pub day_min: f64,
    pub day_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleData {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub stats: SampleStats,
}

pub fn generate_sample(config: &SampleConfig) -> ForecastResult<SampleData> {
    let curve = Curve::from_params(config.family, &config.params).ok_or_else(|| {
        ForecastError::invalid_argument(format!(
            "{} takes {} parameters (got {})",
            config.family,
            config.family.param_len(),
            config.params.len()
        ))
    })?;
    if config.max_day < 2 {
        return Err(ForecastError::invalid_argument("sample max day must be >= 2"));
    }
    if config.per_day == 0 {
        return Err(ForecastError::invalid_argument("sample observations per day must be > 0"));
    }
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(ForecastError::invalid_argument("sample noise must be finite and >= 0"));
    }

    let mut rng = StdRng::seed_from_u64(sample_seed(config));
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| ForecastError::invalid_argument(format!("noise distribution error: {e}")))?;
    let sigma = config.noise;
    let mean_correction = 0.5 * sigma * sigma;

    let n = config.max_day as usize * config.per_day;
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);

    for day in 1..=config.max_day {
        let level = curve.eval(f64::from(day));
        let base = if level.is_finite() { level.max(MIN_RETENTION) } else { MIN_RETENTION };
        for _ in 0..config.per_day {
            let z: f64 = normal.sample(&mut rng);
            let obs = base * (sigma * z - mean_correction).exp();
            x.push(f64::from(day));
            y.push(obs.clamp(MIN_RETENTION, 100.0));
        }
    }

    let stats = compute_stats(&x, &y)
        .ok_or_else(|| ForecastError::invalid_argument("failed to compute sample stats"))?;
    Ok(SampleData { x, y, stats })
}

fn sample_seed(config: &SampleConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    config.family.hash(&mut hasher);
    for p in &config.params {
        p.to_bits().hash(&mut hasher);
    }
    config.max_day.hash(&mut hasher);
    config.per_day.hash(&mut hasher);
    config.noise.to_bits().hash(&mut hasher);
    config.seed.hash(&mut hasher);
    hasher.finish()
}

fn compute_stats(x: &[f64], y: &[f64]) -> Option<SampleStats> {
    let mut day_min = f64::INFINITY;
    let mut day_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;

    for (&d, &v) in x.iter().zip(y) {
        day_min = day_min.min(d);
        day_max = day_max.max(d);
        y_min = y_min.min(v);
        y_max = y_max.max(v);
    }

    if !day_min.is_finite() || !day_max.is_finite() || !y_min.is_finite() || !y_max.is_finite() {
        return None;
    }

    Some(SampleStats {
        n_points: x.len(),
        day_min,
        day_max,
        y_min,
        y_max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RetentionData;

    #[test]
    fn samples_are_reproducible_and_valid() {
        let config = SampleConfig::default();
        let a = generate_sample(&config).unwrap();
        let b = generate_sample(&config).unwrap();
        assert_eq!(a, b);

        assert_eq!(a.stats.n_points, 90);
        assert_eq!(a.stats.day_min, 1.0);
        assert_eq!(a.stats.day_max, 30.0);
        assert!(a.y.iter().all(|&v| v > 0.0 && v <= 100.0));
        assert!(RetentionData::new(a.x, a.y, None).is_ok());
    }

    #[test]
    fn different_seeds_give_different_draws() {
        let a = generate_sample(&SampleConfig::default()).unwrap();
        let b = generate_sample(&SampleConfig {
            seed: 7,
            ..SampleConfig::default()
        })
        .unwrap();
        assert_ne!(a.y, b.y);
    }

    #[test]
    fn zero_noise_reproduces_the_curve() {
        let config = SampleConfig {
            family: FamilyKind::Power,
            params: vec![40.0, 0.5],
            max_day: 4,
            per_day: 1,
            noise: 0.0,
            seed: 1,
        };
        let sample = generate_sample(&config).unwrap();
        let expected = [40.0, 40.0 / 2f64.sqrt(), 40.0 / 3f64.sqrt(), 20.0];
        for (got, want) in sample.y.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "got {got}, want {want}");
        }
    }

    #[test]
    fn rejects_bad_configs() {
        let bad = [
            SampleConfig {
                params: vec![1.0],
                ..SampleConfig::default()
            },
            SampleConfig {
                max_day: 1,
                ..SampleConfig::default()
            },
            SampleConfig {
                per_day: 0,
                ..SampleConfig::default()
            },
            SampleConfig {
                noise: -0.1,
                ..SampleConfig::default()
            },
        ];
        for config in bad {
            assert!(matches!(generate_sample(&config), Err(ForecastError::InvalidArgument(_))));
        }
    }
}
