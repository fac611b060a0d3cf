// BSD 3-Clause License
//
// Copyright (c) 2025, BlackPortal ○
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this
//    list of conditions and the following disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice,
//    this list of conditions and the following disclaimer in the documentation
//    and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its
//    contributors may be used to endorse or promote products derived from
//    this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS"
// AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
// IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE
// FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
// DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER
// CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY,
// OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use log::{debug, warn};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::errors::{ModelError, SelectorError};
use crate::estimator::Transformer;

/// Univariate linear regression test between each feature and the target.
///
/// Returns `(f_statistic, p_values)`, one entry per column of `x`. Scores
/// are forced finite: a perfectly correlated feature scores `f64::MAX` with a
/// p-value of 0, and a constant feature (or constant target) scores 0 with a
/// p-value of 1.
pub fn f_regression(
    x: &Array2<f64>,
    y: &Array1<f64>,
) -> Result<(Array1<f64>, Array1<f64>), SelectorError> {
    let n_samples = x.nrows();
    if n_samples == 0 || x.ncols() == 0 {
        return Err(SelectorError::EmptyInput);
    }
    if n_samples != y.len() {
        return Err(SelectorError::DimensionMismatch { expected: n_samples, actual: y.len() });
    }

    let y_mean = y.sum() / n_samples as f64;
    let y_centered = y.mapv(|v| v - y_mean);
    let syy = y_centered.dot(&y_centered);
    let dof = n_samples as f64 - 2.0;

    let mut f_statistic = Array1::zeros(x.ncols());
    let mut p_values = Array1::zeros(x.ncols());
    for (j, column) in x.axis_iter(Axis(1)).enumerate() {
        let x_mean = column.sum() / n_samples as f64;
        let x_centered = column.mapv(|v| v - x_mean);
        let sxx = x_centered.dot(&x_centered);
        let corr = x_centered.dot(&y_centered) / (sxx * syy).sqrt();
        let corr_squared = corr * corr;
        let f = corr_squared / (1.0 - corr_squared) * dof;

        let (f, p) = if f.is_nan() {
            (0.0, 1.0)
        } else if f.is_infinite() {
            (f64::MAX, 0.0)
        } else {
            (f, f_survival(f, 1.0, dof))
        };
        f_statistic[j] = f;
        p_values[j] = p;
    }
    Ok((f_statistic, p_values))
}

/// Survival function of the F distribution with `(d1, d2)` degrees of freedom.
fn f_survival(f: f64, d1: f64, d2: f64) -> f64 {
    if d2 <= 0.0 {
        return 1.0;
    }
    if f <= 0.0 {
        return 1.0;
    }
    regularized_incomplete_beta(d2 / 2.0, d1 / 2.0, d2 / (d2 + d1 * f))
}

/// `I_x(a, b)` evaluated with the Lentz continued fraction.
fn regularized_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let ln_front =
        libm::lgamma(a + b) - libm::lgamma(a) - libm::lgamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();
    // The fraction converges fastest for x < (a + 1) / (a + b + 2).
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITERATIONS: usize = 300;
    const EPSILON: f64 = 1e-15;
    const TINY: f64 = 1e-300;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < TINY {
        d = TINY;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITERATIONS {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < EPSILON {
            break;
        }
    }
    h
}

/// Keeps the `k` features with the highest F-regression scores.
///
/// Ties are broken by column order, later columns first. The retained
/// columns keep their original relative order. When `k` exceeds the number
/// of features every feature is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectKBest {
    k: usize,
    scores: Option<Array1<f64>>,
    p_values: Option<Array1<f64>>,
    selected: Option<Vec<usize>>,
    n_features_in: Option<usize>,
}

impl SelectKBest {
    pub fn new(k: usize) -> Self {
        SelectKBest { k, scores: None, p_values: None, selected: None, n_features_in: None }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Changes `k` and discards any fitted state.
    pub fn set_k(&mut self, k: usize) {
        *self = SelectKBest::new(k);
    }

    pub fn scores(&self) -> Option<&Array1<f64>> {
        self.scores.as_ref()
    }

    pub fn p_values(&self) -> Option<&Array1<f64>> {
        self.p_values.as_ref()
    }

    /// Indices of the retained features, ascending.
    pub fn selected_indices(&self) -> Option<&[usize]> {
        self.selected.as_deref()
    }

    /// Boolean mask over the input features.
    pub fn support(&self) -> Option<Vec<bool>> {
        let selected = self.selected.as_ref()?;
        let n_features = self.n_features_in?;
        Some((0..n_features).map(|j| selected.contains(&j)).collect())
    }
}

impl Transformer<Array2<f64>> for SelectKBest {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
        if self.k == 0 {
            return Err(SelectorError::InvalidK.into());
        }
        let (scores, p_values) = f_regression(x, y)?;
        let n_features = x.ncols();

        let selected = if self.k >= n_features {
            if self.k > n_features {
                warn!(
                    "k={} is greater than n_features={}, all features will be kept",
                    self.k, n_features
                );
            }
            (0..n_features).collect()
        } else {
            // Stable ascending sort, keep the tail: equal scores favour later columns.
            let mut ranked: Vec<usize> = (0..n_features).collect();
            ranked.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));
            let mut chosen = ranked[n_features - self.k..].to_vec();
            chosen.sort_unstable();
            chosen
        };
        debug!("Selected features {:?} with scores {:?}", selected, scores);

        self.scores = Some(scores);
        self.p_values = Some(p_values);
        self.selected = Some(selected);
        self.n_features_in = Some(n_features);
        Ok(())
    }

    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        let selected = self.selected.as_ref().ok_or(SelectorError::NotFitted)?;
        let n_features = self.n_features_in.ok_or(SelectorError::NotFitted)?;
        if x.ncols() != n_features {
            return Err(SelectorError::DimensionMismatch { expected: n_features, actual: x.ncols() }
                .into());
        }
        Ok(x.select(Axis(1), selected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn f_regression_orders_by_linear_association() {
        let x = array![
            [1.0, 5.0, 0.3],
            [2.0, 3.0, -0.2],
            [3.0, 4.0, 0.1],
            [4.0, 1.0, 0.4],
            [5.0, 2.0, -0.1],
        ];
        let y = array![1.1, 1.9, 3.2, 3.9, 5.1];
        let (f, p) = f_regression(&x, &y).unwrap();

        assert!(f[0] > f[1] && f[1] > f[2], "unexpected scores {:?}", f);
        assert!(p[0] < p[1] && p[1] < p[2], "unexpected p-values {:?}", p);
        for &pv in p.iter() {
            assert!((0.0..=1.0).contains(&pv));
        }
    }

    #[test]
    fn f_regression_known_value() {
        // r = 0.8 with n = 5 gives F = 0.64 / 0.36 * 3.
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![2.0, 1.0, 4.0, 3.0, 5.0];
        let (f, p) = f_regression(&x, &y).unwrap();

        assert!((f[0] - 0.64 / 0.36 * 3.0).abs() < 1e-9, "F = {}", f[0]);
        // Two-sided p-value of the matching t-test with 3 degrees of freedom.
        assert!((p[0] - 0.104088).abs() < 1e-4, "p = {}", p[0]);
    }

    #[test]
    fn f_regression_forces_finite_scores() {
        let x = array![[1.0, 7.0], [2.0, 7.0], [3.0, 7.0]];
        let y = array![2.0, 4.0, 6.0];
        let (f, p) = f_regression(&x, &y).unwrap();

        assert_eq!(f[0], f64::MAX);
        assert_eq!(p[0], 0.0);
        assert_eq!(f[1], 0.0);
        assert_eq!(p[1], 1.0);
    }

    #[test]
    fn f_regression_input_validation() {
        let empty: Array2<f64> = Array2::zeros((0, 2));
        assert_eq!(f_regression(&empty, &Array1::zeros(0)), Err(SelectorError::EmptyInput));
        assert_eq!(
            f_regression(&array![[1.0], [2.0]], &array![1.0]),
            Err(SelectorError::DimensionMismatch { expected: 2, actual: 1 })
        );
    }

    #[test]
    fn select_k_best_keeps_top_features_in_order() {
        let x = array![
            [0.3, 1.0, 5.0],
            [-0.2, 2.0, 3.0],
            [0.1, 3.0, 4.0],
            [0.4, 4.0, 1.0],
            [-0.1, 5.0, 2.0],
        ];
        let y = array![1.1, 1.9, 3.2, 3.9, 5.1];
        let mut selector = SelectKBest::new(2);
        let out = selector.fit_transform(&x, &y).unwrap();

        assert_eq!(selector.selected_indices(), Some(&[1, 2][..]));
        assert_eq!(selector.support(), Some(vec![false, true, true]));
        assert_eq!(out, x.select(Axis(1), &[1, 2]));
    }

    #[test]
    fn select_k_best_ties_prefer_later_columns() {
        let x = array![[1.0, 1.0, 1.0], [2.0, 2.0, 2.0], [3.0, 3.0, 3.0], [4.0, 4.0, 4.5]];
        let y = array![1.0, 2.0, 3.0, 4.0];
        let mut selector = SelectKBest::new(1);
        selector.fit(&x, &y).unwrap();
        assert_eq!(selector.selected_indices(), Some(&[1][..]));
    }

    #[test]
    fn select_k_best_complementary_one_hot_pair() {
        // Automatic / Manual indicators of a two-valued category score identically.
        let automatic = array![1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0];
        let manual = automatic.mapv(|v| 1.0 - v);
        let mut x = Array2::zeros((8, 2));
        x.column_mut(0).assign(&automatic);
        x.column_mut(1).assign(&manual);
        let y = array![9.8, 5.6, 4.2, 11.3, 6.1, 10.7, 5.0, 8.9];

        let mut selector = SelectKBest::new(1);
        selector.fit(&x, &y).unwrap();

        let scores = selector.scores().unwrap();
        assert_eq!(scores[0], scores[1]);
        assert_eq!(selector.selected_indices(), Some(&[1][..]));
    }

    #[test]
    fn select_k_best_k_larger_than_features_keeps_all() {
        let x = array![[1.0, 0.0], [2.0, 1.0], [3.0, 0.0]];
        let y = array![1.0, 2.0, 3.0];
        let mut selector = SelectKBest::new(11);
        let out = selector.fit_transform(&x, &y).unwrap();
        assert_eq!(out, x);
    }

    #[test]
    fn select_k_best_errors() {
        let x = array![[1.0, 0.0], [2.0, 1.0], [3.0, 0.0]];
        let y = array![1.0, 2.0, 3.0];

        let mut zero = SelectKBest::new(0);
        assert!(matches!(zero.fit(&x, &y), Err(ModelError::Selector(SelectorError::InvalidK))));

        let unfitted = SelectKBest::new(1);
        assert!(matches!(
            unfitted.transform(&x),
            Err(ModelError::Selector(SelectorError::NotFitted))
        ));

        let mut selector = SelectKBest::new(1);
        selector.fit(&x, &y).unwrap();
        assert!(matches!(
            selector.transform(&array![[1.0, 2.0, 3.0]]),
            Err(ModelError::Selector(SelectorError::DimensionMismatch { expected: 2, actual: 3 }))
        ));
    }

    #[test]
    fn select_k_best_set_k_resets_state() {
        let x = array![[1.0, 0.0], [2.0, 1.0], [3.0, 0.0]];
        let y = array![1.0, 2.0, 3.0];
        let mut selector = SelectKBest::new(1);
        selector.fit(&x, &y).unwrap();
        selector.set_k(2);
        assert_eq!(selector.k(), 2);
        assert!(selector.selected_indices().is_none());
    }
}
