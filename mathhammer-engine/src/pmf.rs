//! Discrete probability mass functions over non-negative integer outcomes.
//!
//! A [`Pmf`] is a dense vector where the index is the outcome value. Every
//! transform returns a new distribution; nothing is mutated in place.
//! Intermediate products scaled by a branch probability are allowed to sum to
//! less than one and are recombined with [`Pmf::flatten`].

use rustfft::FftPlanner;
use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::numbers::{div_ceil, usize_to_f64};

/// Default cut-off used when trimming the negligible upper tail for display.
pub const DEFAULT_TAIL_THRESHOLD: f64 = 1e-4;

/// Values below this fraction of the peak are FFT round-off and are zeroed.
const FFT_NOISE_FLOOR: f64 = 1e-15;

/// Discrete probability distribution indexed by outcome value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pmf {
    values: Vec<f64>,
}

impl Pmf {
    #[must_use]
    pub const fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Point mass at `n`.
    #[must_use]
    pub fn constant(n: usize) -> Self {
        let mut values = vec![0.0; n + 1];
        values[n] = 1.0;
        Self { values }
    }

    /// Uniform distribution over `1..=n`; index 0 carries no mass.
    #[must_use]
    pub fn dn(n: usize) -> Self {
        if n == 0 {
            return Self::constant(0);
        }
        let face = 1.0 / usize_to_f64(n);
        let mut values = Vec::with_capacity(n + 1);
        values.push(0.0);
        values.extend(std::iter::repeat_n(face, n));
        Self { values }
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Probability of `value`, zero outside the stored range.
    #[must_use]
    pub fn get(&self, value: usize) -> f64 {
        self.values.get(value).copied().unwrap_or(0.0)
    }

    /// Total probability mass held by this distribution.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Probability that the outcome is at least `value`.
    #[must_use]
    pub fn at_least(&self, value: usize) -> f64 {
        self.values.iter().skip(value).sum()
    }

    /// Multiply every probability by `factor` (branch weighting).
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        Self::new(self.values.iter().map(|p| p * factor).collect())
    }

    /// Pad with zero mass up to `length` entries.
    #[must_use]
    pub fn expand_to(&self, length: usize) -> Self {
        let mut values = self.values.clone();
        if values.len() < length {
            values.resize(length, 0.0);
        }
        Self { values }
    }

    /// Distribution of the sum of independent variables, computed as a
    /// polynomial product in the frequency domain.
    ///
    /// Convolving nothing yields the point mass at zero. Point masses only
    /// shift the result, so they never go through the transform.
    #[must_use]
    pub fn convolve_many<'a, I>(dists: I) -> Self
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let mut offset = 0;
        let mut spread: Vec<&Self> = Vec::new();
        for dist in dists {
            match dist.point_mass() {
                Some(at) => offset += at,
                None => spread.push(dist),
            }
        }
        let shifted = |pmf: Self| {
            let mut values = vec![0.0; offset];
            values.extend(pmf.values);
            Self { values }
        };
        match spread.as_slice() {
            [] => shifted(Self::constant(0)),
            [single] => shifted((*single).clone()),
            _ => shifted(Self::fft_convolve(&spread)),
        }
    }

    /// Index holding all the mass, if the distribution is a point mass.
    fn point_mass(&self) -> Option<usize> {
        let mut nonzero = self.values.iter().enumerate().filter(|(_, p)| **p != 0.0);
        match (nonzero.next(), nonzero.next()) {
            (Some((at, &p)), None) if (p - 1.0).abs() < f64::EPSILON => Some(at),
            _ => None,
        }
    }

    fn fft_convolve(dists: &[&Self]) -> Self {
        let result_len = 1 + dists
            .iter()
            .map(|dist| dist.len().saturating_sub(1))
            .sum::<usize>();

        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(result_len);
        let inverse = planner.plan_fft_inverse(result_len);

        let zero = Complex::new(0.0, 0.0);
        let mut product = vec![Complex::new(1.0, 0.0); result_len];
        let mut row = vec![zero; result_len];
        for dist in dists {
            row.fill(zero);
            for (slot, &p) in row.iter_mut().zip(dist.values.iter()) {
                *slot = Complex::new(p, 0.0);
            }
            forward.process(&mut row);
            for (acc, freq) in product.iter_mut().zip(row.iter()) {
                *acc = *acc * *freq;
            }
        }
        inverse.process(&mut product);

        let norm = usize_to_f64(result_len);
        let raw: Vec<f64> = product.iter().map(|c| c.re / norm).collect();
        let peak = raw.iter().fold(0.0_f64, |acc, p| acc.max(p.abs()));
        let floor = peak * FFT_NOISE_FLOOR;
        Self::new(
            raw.into_iter()
                .map(|p| if p < floor { 0.0 } else { p })
                .collect(),
        )
    }

    /// Elementwise sum of branch distributions.
    #[must_use]
    pub fn flatten<'a, I>(dists: I) -> Self
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let mut values: Vec<f64> = Vec::new();
        for dist in dists {
            if dist.len() > values.len() {
                values.resize(dist.len(), 0.0);
            }
            for (acc, p) in values.iter_mut().zip(dist.values.iter()) {
                *acc += p;
            }
        }
        Self { values }
    }

    /// Fold all mass above `value` into the bucket at `value`.
    #[must_use]
    pub fn ceiling(&self, value: usize) -> Self {
        if self.len() <= value.saturating_add(1) {
            return self.clone();
        }
        let mut values = self.values[..=value].to_vec();
        values[value] += self.values[value + 1..].iter().sum::<f64>();
        Self { values }
    }

    /// Drop trailing outcomes whose probability is below `threshold`.
    ///
    /// The remaining mass is not renormalized.
    #[must_use]
    pub fn trim_tail(&self, threshold: f64) -> Self {
        match self.values.iter().rposition(|&p| p >= threshold) {
            Some(last) => Self::new(self.values[..=last].to_vec()),
            None => Self::default(),
        }
    }

    /// Probability of at least each value: `P(X >= i)`.
    #[must_use]
    pub fn cumulative(&self) -> Self {
        let mut values = vec![0.0; self.len()];
        let mut acc = 0.0;
        for (slot, p) in values.iter_mut().zip(self.values.iter()).rev() {
            acc += p;
            *slot = acc;
        }
        Self { values }
    }

    /// Re-roll exactly `value`; the re-rolled mass is redistributed like a fresh roll.
    #[must_use]
    pub fn re_roll_value(&self, value: usize) -> Self {
        let Some(&rerolled) = self.values.get(value) else {
            return self.clone();
        };
        Self::new(
            self.values
                .iter()
                .enumerate()
                .map(|(i, &p)| {
                    let kept = if i == value { 0.0 } else { p };
                    kept + rerolled * p
                })
                .collect(),
        )
    }

    /// Re-roll every outcome strictly below `value`.
    #[must_use]
    pub fn re_roll_less_than(&self, value: usize) -> Self {
        let cutoff = value.min(self.len());
        let rerolled: f64 = self.values[..cutoff].iter().sum();
        Self::new(
            self.values
                .iter()
                .enumerate()
                .map(|(i, &p)| {
                    let kept = if i < cutoff { 0.0 } else { p };
                    kept + rerolled * p
                })
                .collect(),
        )
    }

    /// Collapse into `[fail, pass]` where pass means `value >= threshold`.
    #[must_use]
    pub fn convert_binomial(&self, threshold: usize) -> Self {
        let (below, above) = self.split_at(threshold);
        Self::new(vec![below, above])
    }

    /// Collapse into `[fail, pass]` where pass means `value < threshold`.
    ///
    /// Used for save and feel-no-pain rolls, where "pass" is the attacker's
    /// success: the defender's roll came in under the threshold.
    #[must_use]
    pub fn convert_binomial_less_than(&self, threshold: usize) -> Self {
        let (below, above) = self.split_at(threshold);
        Self::new(vec![above, below])
    }

    fn split_at(&self, threshold: usize) -> (f64, f64) {
        let cutoff = threshold.min(self.len());
        (
            self.values[..cutoff].iter().sum(),
            self.values[cutoff..].iter().sum(),
        )
    }

    #[must_use]
    pub fn mean(&self) -> f64 {
        self.values
            .iter()
            .enumerate()
            .map(|(x, p)| usize_to_f64(x) * p)
            .sum()
    }

    #[must_use]
    pub fn std(&self) -> f64 {
        let mean = self.mean();
        let second_moment: f64 = self
            .values
            .iter()
            .enumerate()
            .map(|(x, p)| {
                let x = usize_to_f64(x);
                x * x * p
            })
            .sum();
        (second_moment - mean * mean).max(0.0).sqrt()
    }

    /// Roll two and keep the highest.
    #[must_use]
    pub fn melta(&self) -> Self {
        Self::max_of_two(self, self)
    }

    /// Distribution of `max(X, Y)` for independent `X` and `Y`.
    #[must_use]
    pub fn max_of_two(first: &Self, second: &Self) -> Self {
        let length = first.len().max(second.len());
        let mut values = Vec::with_capacity(length);
        let mut first_below = 0.0;
        let mut second_below = 0.0;
        for value in 0..length {
            let a = first.get(value);
            let b = second.get(value);
            values.push(a * b + a * second_below + b * first_below);
            first_below += a;
            second_below += b;
        }
        Self { values }
    }

    /// Shift every outcome by `n`, clamping at zero.
    #[must_use]
    pub fn roll(&self, n: i32) -> Self {
        match n {
            0 => self.clone(),
            n if n > 0 => {
                let shift = usize::try_from(n).unwrap_or(0);
                let mut values = vec![0.0; shift];
                values.extend_from_slice(&self.values);
                Self { values }
            }
            n => {
                let shift = usize::try_from(n.unsigned_abs()).unwrap_or(usize::MAX);
                let split = (shift + 1).min(self.len());
                let mut values = vec![self.values[..split].iter().sum()];
                values.extend_from_slice(&self.values[split..]);
                Self { values }
            }
        }
    }

    /// Distribution of `ceil(X / divisor)`.
    #[must_use]
    pub fn div_min_one(&self, divisor: usize) -> Self {
        let mut values = vec![0.0; self.len()];
        for (i, p) in self.values.iter().enumerate() {
            values[div_ceil(i, divisor)] += p;
        }
        Self { values }
    }

    /// Raise every outcome below `min` up to `min`.
    #[must_use]
    pub fn min_value(&self, min: usize) -> Self {
        let split = (min + 1).min(self.len());
        let mut values = vec![0.0; min];
        values.push(self.values[..split].iter().sum());
        values.extend_from_slice(&self.values[split..]);
        Self { values }
    }

    /// Force `P(0) = 1 - P(X > 0)` so a scaled branch becomes a complete distribution.
    #[must_use]
    pub fn rectify_zero(&self) -> Self {
        let tail = self.values.get(1..).unwrap_or_default();
        let mut values = Vec::with_capacity(self.len().max(1));
        values.push(1.0 - tail.iter().sum::<f64>());
        values.extend_from_slice(tail);
        Self { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn assert_close(actual: &Pmf, expected: &[f64]) {
        assert_eq!(
            actual.len(),
            expected.len(),
            "length mismatch: {actual:?} vs {expected:?}"
        );
        for (a, e) in actual.values().iter().zip(expected) {
            assert!((a - e).abs() < EPS, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn constant_and_dn_shapes() {
        assert_eq!(Pmf::constant(2).values(), &[0.0, 0.0, 1.0]);
        let d6 = Pmf::dn(6);
        assert_eq!(d6.len(), 7);
        assert!(d6.get(0).abs() < EPS);
        assert!((d6.total() - 1.0).abs() < EPS);
        assert!((d6.mean() - 3.5).abs() < EPS);
    }

    #[test]
    fn convolving_point_masses_adds_them() {
        let sum = Pmf::convolve_many([&Pmf::constant(2), &Pmf::constant(3)]);
        assert_eq!(sum, Pmf::constant(5));
        let shifted = Pmf::convolve_many([&Pmf::constant(2), &Pmf::dn(3)]);
        assert_eq!(shifted, Pmf::dn(3).roll(2));
    }

    #[test]
    fn convolving_nothing_is_zero() {
        assert_eq!(Pmf::convolve_many(std::iter::empty()), Pmf::constant(0));
    }

    #[test]
    fn two_d6_is_triangular() {
        let d6 = Pmf::dn(6);
        let sum = Pmf::convolve_many([&d6, &d6]);
        assert_eq!(sum.len(), 13);
        assert!((sum.get(7) - 6.0 / 36.0).abs() < EPS);
        assert!((sum.get(2) - 1.0 / 36.0).abs() < EPS);
        assert!(sum.get(1).abs() < EPS);
        assert!((sum.mean() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn flatten_sums_branches_of_different_lengths() {
        let flat = Pmf::flatten([&Pmf::new(vec![0.25]), &Pmf::new(vec![0.25, 0.5])]);
        assert_close(&flat, &[0.5, 0.5]);
    }

    #[test]
    fn ceiling_folds_upper_mass() {
        let capped = Pmf::dn(6).ceiling(2);
        assert_close(&capped, &[0.0, 1.0 / 6.0, 5.0 / 6.0]);
        assert_eq!(Pmf::constant(1).ceiling(3), Pmf::constant(1));
    }

    #[test]
    fn trim_tail_drops_negligible_top_only() {
        let pmf = Pmf::new(vec![0.00001, 0.5, 0.49998, 0.00001]);
        assert_eq!(pmf.trim_tail(1e-4).len(), 3);
        assert!(Pmf::new(vec![1e-6]).trim_tail(1e-4).is_empty());
    }

    #[test]
    fn cumulative_is_at_least_series() {
        let cumulative = Pmf::dn(6).cumulative();
        assert!((cumulative.get(0) - 1.0).abs() < EPS);
        assert!((cumulative.get(1) - 1.0).abs() < EPS);
        assert!((cumulative.get(4) - 0.5).abs() < EPS);
        assert!((cumulative.get(6) - 1.0 / 6.0).abs() < EPS);
    }

    #[test]
    fn re_roll_ones_shifts_mass_upward() {
        let rerolled = Pmf::dn(6).re_roll_value(1);
        assert!((rerolled.get(1) - 1.0 / 36.0).abs() < EPS);
        assert!((rerolled.get(6) - 7.0 / 36.0).abs() < EPS);
        assert!((rerolled.total() - 1.0).abs() < EPS);
        assert_eq!(Pmf::constant(0).re_roll_value(1), Pmf::constant(0));
    }

    #[test]
    fn re_roll_less_than_zero_is_identity() {
        let d6 = Pmf::dn(6);
        assert_eq!(d6.re_roll_less_than(0), d6);
    }

    #[test]
    fn re_roll_failed_against_four_plus() {
        let rerolled = Pmf::dn(6).re_roll_less_than(4);
        let pass = rerolled.convert_binomial(4).get(1);
        assert!((pass - 0.75).abs() < EPS);
    }

    #[test]
    fn binomial_collapse_both_directions() {
        let d6 = Pmf::dn(6);
        assert_close(&d6.convert_binomial(4), &[0.5, 0.5]);
        assert_close(&d6.convert_binomial(5), &[4.0 / 6.0, 2.0 / 6.0]);
        assert_close(&d6.convert_binomial_less_than(5), &[2.0 / 6.0, 4.0 / 6.0]);
        assert_close(&d6.convert_binomial_less_than(7), &[0.0, 1.0]);
        assert_close(&d6.convert_binomial(1), &[0.0, 1.0]);
    }

    #[test]
    fn melta_favours_high_rolls() {
        let d6 = Pmf::dn(6);
        let melta = d6.melta();
        assert!(melta.get(6) > d6.get(6));
        assert!((melta.get(6) - 11.0 / 36.0).abs() < EPS);
        assert!((melta.total() - 1.0).abs() < EPS);
    }

    #[test]
    fn roll_shifts_and_clamps() {
        assert_close(&Pmf::constant(1).roll(2), &[0.0, 0.0, 0.0, 1.0]);
        let shifted = Pmf::dn(3).roll(-1);
        assert_close(&shifted, &[1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0]);
        assert_close(&Pmf::dn(3).roll(-5), &[1.0]);
        assert_eq!(Pmf::dn(3).roll(0), Pmf::dn(3));
    }

    #[test]
    fn halving_rounds_up() {
        let halved = Pmf::dn(6).div_min_one(2);
        assert_close(
            &halved,
            &[0.0, 2.0 / 6.0, 2.0 / 6.0, 2.0 / 6.0, 0.0, 0.0, 0.0],
        );
    }

    #[test]
    fn min_value_floors_low_rolls() {
        let floored = Pmf::dn(6).min_value(3);
        assert_close(
            &floored,
            &[0.0, 0.0, 0.0, 0.5, 1.0 / 6.0, 1.0 / 6.0, 1.0 / 6.0],
        );
    }

    #[test]
    fn rectify_zero_restores_completeness() {
        let rectified = Pmf::new(vec![0.1, 0.2, 0.1]).rectify_zero();
        assert_close(&rectified, &[0.7, 0.2, 0.1]);
        assert_close(&Pmf::default().rectify_zero(), &[1.0]);
    }

    #[test]
    fn std_of_point_mass_is_zero() {
        assert!(Pmf::constant(4).std().abs() < EPS);
        let d6 = Pmf::dn(6);
        assert!((d6.std() - (35.0_f64 / 12.0).sqrt()).abs() < 1e-9);
    }
}
