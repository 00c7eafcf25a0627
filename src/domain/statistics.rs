use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::{Data, Distribution};
use std::cmp::Ordering;

/// Shared statistics utilities for sentiment/return analysis.
///
/// All functions return `None` instead of a number when the statistic is
/// undefined for the given input (too few points, zero variance).
pub struct Stats;

impl Stats {
    pub fn mean(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Sample standard deviation (n - 1).
    pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
        if values.len() < 2 {
            return None;
        }
        Data::new(values.to_vec()).std_dev()
    }

    /// True when every value is identical, i.e. the variance is exactly zero.
    ///
    /// Compared element-wise rather than through the computed variance, which
    /// can come out as a tiny positive number for constant non-integral inputs.
    pub fn is_constant(values: &[f64]) -> bool {
        match values.first() {
            Some(first) => values.iter().all(|v| v == first),
            None => true,
        }
    }

    /// Pearson correlation coefficient, clamped to [-1, 1].
    pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
        if x.len() != y.len() || x.len() < 2 || Self::is_constant(x) || Self::is_constant(y) {
            return None;
        }

        let mean_x = Self::mean(x)?;
        let mean_y = Self::mean(y)?;

        let mut cov = 0.0;
        let mut var_x = 0.0;
        let mut var_y = 0.0;

        for (xi, yi) in x.iter().zip(y.iter()) {
            let dx = xi - mean_x;
            let dy = yi - mean_y;
            cov += dx * dy;
            var_x += dx * dx;
            var_y += dy * dy;
        }

        if var_x <= 0.0 || var_y <= 0.0 {
            return None;
        }

        let r = cov / (var_x.sqrt() * var_y.sqrt());
        r.is_finite().then(|| r.clamp(-1.0, 1.0))
    }

    /// Spearman rank correlation: Pearson over average ranks.
    pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
        if x.len() != y.len() || x.len() < 2 {
            return None;
        }
        Self::pearson(&Self::ranks(x), &Self::ranks(y))
    }

    /// 1-based ranks; tied values share the average of their positions.
    pub fn ranks(values: &[f64]) -> Vec<f64> {
        let n = values.len();
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            values[a]
                .partial_cmp(&values[b])
                .unwrap_or(Ordering::Equal)
        });

        let mut ranks = vec![0.0; n];
        let mut i = 0;
        while i < n {
            let mut j = i + 1;
            while j < n && values[order[j]] == values[order[i]] {
                j += 1;
            }
            // Positions i..j (0-based) hold ranks i+1..=j
            let avg_rank = (i + 1 + j) as f64 / 2.0;
            for &idx in &order[i..j] {
                ranks[idx] = avg_rank;
            }
            i = j;
        }
        ranks
    }

    /// Two-sided p-value for a correlation coefficient under H0: rho = 0,
    /// using the t statistic with n - 2 degrees of freedom.
    pub fn correlation_p_value(r: f64, n: usize) -> Option<f64> {
        if n < 3 || !r.is_finite() {
            return None;
        }

        let r = r.clamp(-1.0, 1.0);
        let residual = 1.0 - r * r;
        if residual <= 0.0 {
            return Some(0.0);
        }

        let df = (n - 2) as f64;
        let t = r * (df / residual).sqrt();
        let dist = StudentsT::new(0.0, 1.0, df).ok()?;
        let p = 2.0 * (1.0 - dist.cdf(t.abs()));
        Some(p.clamp(0.0, 1.0))
    }
}
