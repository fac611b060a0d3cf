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

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::errors::ScalerError;

pub trait Scaler {
    fn fit(&mut self, x: &Array2<f64>) -> Result<(), ScalerError>;

    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, ScalerError>;

    fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, ScalerError>;

    fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>, ScalerError> {
        self.fit(x)?;
        self.transform(x)
    }
}

/// Rescales every column linearly to `[0, 1]` using the minimum and maximum
/// seen at fit time.
///
/// Values outside the fitted range are not clipped. A constant column gets a
/// scale of 1, so it maps to 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    data_min: Option<Array1<f64>>,
    data_max: Option<Array1<f64>>,
    scale: Option<Array1<f64>>,
    min: Option<Array1<f64>>,
}

impl MinMaxScaler {
    pub fn new() -> Self {
        MinMaxScaler { data_min: None, data_max: None, scale: None, min: None }
    }

    pub fn data_min(&self) -> Option<&Array1<f64>> {
        self.data_min.as_ref()
    }

    pub fn data_max(&self) -> Option<&Array1<f64>> {
        self.data_max.as_ref()
    }

    fn fitted(&self) -> Result<(&Array1<f64>, &Array1<f64>), ScalerError> {
        match (self.scale.as_ref(), self.min.as_ref()) {
            (Some(scale), Some(min)) => Ok((scale, min)),
            _ => Err(ScalerError::NotFitted),
        }
    }

    fn check_input(&self, x: &Array2<f64>, expected: usize) -> Result<(), ScalerError> {
        if x.nrows() == 0 {
            return Err(ScalerError::EmptyInput);
        }
        if x.ncols() != expected {
            return Err(ScalerError::DimensionMismatch { expected, actual: x.ncols() });
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(ScalerError::InvalidNumericValue);
        }
        Ok(())
    }
}

impl Scaler for MinMaxScaler {
    fn fit(&mut self, x: &Array2<f64>) -> Result<(), ScalerError> {
        if x.ncols() == 0 {
            return Err(ScalerError::NoFeatures);
        }
        self.check_input(x, x.ncols())?;

        let data_min = x.fold_axis(Axis(0), f64::INFINITY, |&acc, &v| acc.min(v));
        let data_max = x.fold_axis(Axis(0), f64::NEG_INFINITY, |&acc, &v| acc.max(v));
        let scale =
            (&data_max - &data_min).mapv(|range| if range == 0.0 { 1.0 } else { 1.0 / range });
        let min = -&data_min * &scale;

        self.data_min = Some(data_min);
        self.data_max = Some(data_max);
        self.scale = Some(scale);
        self.min = Some(min);
        Ok(())
    }

    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, ScalerError> {
        let (scale, min) = self.fitted()?;
        self.check_input(x, scale.len())?;
        Ok(x * scale + min)
    }

    fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, ScalerError> {
        let (scale, min) = self.fitted()?;
        self.check_input(x, scale.len())?;
        Ok((x - min) / scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_min_max_scaler_fit_transform() {
        let x = array![[1.0, 10.0], [3.0, 20.0], [5.0, 30.0]];
        let mut scaler = MinMaxScaler::new();
        let x_scaled = scaler.fit_transform(&x).unwrap();

        let expected = array![[0.0, 0.0], [0.5, 0.5], [1.0, 1.0]];
        for (s, e) in x_scaled.iter().zip(expected.iter()) {
            assert!((s - e).abs() < 1e-12, "Scaled value {} differs from {}", s, e);
        }
        assert_eq!(scaler.data_min(), Some(&array![1.0, 10.0]));
        assert_eq!(scaler.data_max(), Some(&array![5.0, 30.0]));
    }

    #[test]
    fn test_min_max_scaler_extrapolates() {
        let x = array![[0.0], [10.0]];
        let mut scaler = MinMaxScaler::new();
        scaler.fit(&x).unwrap();

        let outside = scaler.transform(&array![[-5.0], [20.0]]).unwrap();
        assert!((outside[[0, 0]] + 0.5).abs() < 1e-12);
        assert!((outside[[1, 0]] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_min_max_scaler_constant_column() {
        let x = array![[7.0, 1.0], [7.0, 2.0], [7.0, 3.0]];
        let mut scaler = MinMaxScaler::new();
        let x_scaled = scaler.fit_transform(&x).unwrap();

        assert_eq!(x_scaled.column(0), array![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_min_max_scaler_inverse_transform() {
        let x = array![[1.0, -2.0], [3.0, 4.0], [6.0, 0.5]];
        let mut scaler = MinMaxScaler::new();
        let x_scaled = scaler.fit_transform(&x).unwrap();
        let x_restored = scaler.inverse_transform(&x_scaled).unwrap();

        for (orig, restored) in x.iter().zip(x_restored.iter()) {
            assert!((orig - restored).abs() < 1e-10, "Restored value differs");
        }
    }

    #[test]
    fn test_min_max_scaler_errors() {
        let scaler = MinMaxScaler::new();
        assert_eq!(scaler.transform(&array![[1.0]]), Err(ScalerError::NotFitted));

        let mut scaler = MinMaxScaler::new();
        assert_eq!(scaler.fit(&Array2::zeros((0, 2))), Err(ScalerError::EmptyInput));
        assert_eq!(scaler.fit(&Array2::zeros((2, 0))), Err(ScalerError::NoFeatures));
        assert_eq!(scaler.fit(&array![[f64::NAN]]), Err(ScalerError::InvalidNumericValue));

        scaler.fit(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert_eq!(
            scaler.transform(&array![[1.0, 2.0, 3.0]]),
            Err(ScalerError::DimensionMismatch { expected: 2, actual: 3 })
        );
    }
}
