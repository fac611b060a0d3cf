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

use nalgebra::{DMatrix, DVector, SVD};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::estimator::Regressor;

pub struct LinearRegressionBuilder {
    fit_intercept: bool,
}

impl LinearRegressionBuilder {
    pub fn fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    pub fn build(self) -> LinearRegression {
        LinearRegression { coefficients: None, intercept: 0.0, fit_intercept: self.fit_intercept }
    }
}

/// Ordinary least-squares linear regression.
///
/// The system is solved through a singular value decomposition, so
/// rank-deficient inputs (for example one-hot columns together with an
/// intercept) yield the minimum-norm solution instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    coefficients: Option<Array1<f64>>,
    intercept: f64,
    fit_intercept: bool,
}

impl LinearRegression {
    pub fn new() -> LinearRegressionBuilder {
        LinearRegressionBuilder { fit_intercept: true }
    }

    pub fn fit_intercept(&self) -> bool {
        self.fit_intercept
    }

    /// Changes the intercept setting and discards any fitted state.
    pub fn set_fit_intercept(&mut self, fit_intercept: bool) {
        *self = LinearRegression::new().fit_intercept(fit_intercept).build();
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    fn solve_least_squares(x: &Array2<f64>, y: &Array1<f64>) -> Result<Array1<f64>, ModelError> {
        let (n_samples, n_features) = x.dim();
        let a = DMatrix::from_fn(n_samples, n_features, |i, j| x[[i, j]]);
        let b = DVector::from_iterator(n_samples, y.iter().copied());

        let svd = SVD::try_new(a, true, true, f64::EPSILON, 0)
            .ok_or_else(|| ModelError::Solver("SVD did not converge".to_string()))?;
        let max_singular = svd.singular_values.iter().copied().fold(0.0, f64::max);
        let rcond = f64::EPSILON * n_samples.max(n_features) as f64;
        let eps = (max_singular * rcond).max(f64::MIN_POSITIVE);

        let solution = svd.solve(&b, eps).map_err(|e| ModelError::Solver(e.to_string()))?;
        Ok(solution.iter().copied().collect())
    }
}

impl Regressor<Array2<f64>> for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
        if x.is_empty() || y.is_empty() {
            return Err(ModelError::EmptyInput);
        }
        if x.nrows() != y.len() {
            return Err(ModelError::DimensionMismatch { expected: x.nrows(), actual: y.len() });
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(ModelError::InvalidNumericValue);
        }

        let (coefficients, intercept) = if self.fit_intercept {
            let x_offset = x.mean_axis(Axis(0)).ok_or(ModelError::EmptyInput)?;
            let y_offset = y.mean().ok_or(ModelError::EmptyInput)?;
            let coefficients = Self::solve_least_squares(&(x - &x_offset), &(y - y_offset))?;
            let intercept = y_offset - x_offset.dot(&coefficients);
            (coefficients, intercept)
        } else {
            (Self::solve_least_squares(x, y)?, 0.0)
        };

        self.coefficients = Some(coefficients);
        self.intercept = intercept;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        let coefficients = self.coefficients.as_ref().ok_or(ModelError::NotFitted)?;
        if x.ncols() != coefficients.len() {
            return Err(ModelError::DimensionMismatch {
                expected: coefficients.len(),
                actual: x.ncols(),
            });
        }
        Ok(x.dot(coefficients) + self.intercept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1, Array2};

    #[test]
    fn linear_regression_fit_empty_input() {
        let mut model = LinearRegression::new().build();
        let x: Array2<f64> = Array2::zeros((0, 2));
        let y: Array1<f64> = Array1::zeros(0);
        assert!(matches!(model.fit(&x, &y), Err(ModelError::EmptyInput)));
    }

    #[test]
    fn linear_regression_fit_no_features() {
        let mut model = LinearRegression::new().build();
        let x: Array2<f64> = Array2::zeros((2, 0));
        let y = array![1.0, 2.0];
        assert!(matches!(model.fit(&x, &y), Err(ModelError::EmptyInput)));
    }

    #[test]
    fn linear_regression_fit_dimension_mismatch() {
        let mut model = LinearRegression::new().build();
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let y = array![1.0, 2.0, 3.0];
        assert!(matches!(
            model.fit(&x, &y),
            Err(ModelError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn linear_regression_fit_non_finite() {
        let mut model = LinearRegression::new().build();
        let x = array![[1.0], [f64::NAN]];
        let y = array![1.0, 2.0];
        assert!(matches!(model.fit(&x, &y), Err(ModelError::InvalidNumericValue)));
    }

    #[test]
    fn linear_regression_predict_not_fitted() {
        let model = LinearRegression::new().build();
        let x = array![[1.0, 2.0]];
        assert!(matches!(model.predict(&x), Err(ModelError::NotFitted)));
    }

    #[test]
    fn linear_regression_predict_dimension_mismatch() {
        let mut model = LinearRegression::new().build();
        let x_train = array![[1.0, 2.0], [3.0, 4.0], [5.0, 7.0]];
        let y_train = array![1.0, 2.0, 3.0];
        model.fit(&x_train, &y_train).unwrap();
        let x_test = array![[1.0, 2.0, 3.0]];
        assert!(matches!(
            model.predict(&x_test),
            Err(ModelError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn linear_regression_recovers_exact_coefficients() {
        let x = array![[1.0, 0.0], [2.0, 1.0], [3.0, 5.0], [4.0, 2.0], [5.0, 3.0]];
        let y = x.column(0).mapv(|v| 2.0 * v) - x.column(1).mapv(|v| 0.5 * v) + 3.0;
        let mut model = LinearRegression::new().fit_intercept(true).build();
        model.fit(&x, &y).unwrap();

        let coefficients = model.coefficients().unwrap();
        assert!((coefficients[0] - 2.0).abs() < 1e-10);
        assert!((coefficients[1] + 0.5).abs() < 1e-10);
        assert!((model.intercept() - 3.0).abs() < 1e-10);

        let predictions = model.predict(&x).unwrap();
        for (p, t) in predictions.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-9);
        }
    }

    #[test]
    fn linear_regression_without_intercept_passes_through_origin() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![2.0, 4.0, 7.0];
        let mut model = LinearRegression::new().fit_intercept(false).build();
        model.fit(&x, &y).unwrap();

        // argmin ||x w - y|| = (x'y) / (x'x) = 31 / 14
        assert_eq!(model.intercept(), 0.0);
        assert!((model.coefficients().unwrap()[0] - 31.0 / 14.0).abs() < 1e-12);
        assert!((model.predict(&array![[0.0]]).unwrap()[0]).abs() < 1e-12);
    }

    #[test]
    fn linear_regression_rank_deficient_min_norm() {
        // Two identical columns: the minimum-norm solution splits the weight evenly.
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0]];
        let y = array![2.0, 4.0, 6.0];
        let mut model = LinearRegression::new().fit_intercept(false).build();
        model.fit(&x, &y).unwrap();

        let coefficients = model.coefficients().unwrap();
        assert!((coefficients[0] - 1.0).abs() < 1e-10);
        assert!((coefficients[1] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn linear_regression_underdetermined_interpolates() {
        let x = array![[1.0, 0.0, 2.0], [0.0, 1.0, 1.0]];
        let y = array![3.0, -1.0];
        let mut model = LinearRegression::new().fit_intercept(false).build();
        model.fit(&x, &y).unwrap();

        let predictions = model.predict(&x).unwrap();
        assert!((predictions[0] - 3.0).abs() < 1e-10);
        assert!((predictions[1] + 1.0).abs() < 1e-10);
    }

    #[test]
    fn linear_regression_set_fit_intercept_resets() {
        let mut model = LinearRegression::new().build();
        model.fit(&array![[1.0], [2.0]], &array![1.0, 3.0]).unwrap();
        model.set_fit_intercept(false);
        assert!(!model.fit_intercept());
        assert!(model.coefficients().is_none());
    }
}
