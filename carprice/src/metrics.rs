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

use ndarray::Array1;

use crate::errors::MetricError;

fn validate(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<(), MetricError> {
    if y_true.is_empty() || y_pred.is_empty() {
        return Err(MetricError::EmptyInput);
    }

    if y_true.len() != y_pred.len() {
        return Err(MetricError::DimensionMismatch { expected: y_true.len(), actual: y_pred.len() });
    }

    if y_true.iter().any(|&v| !v.is_finite()) || y_pred.iter().any(|&v| !v.is_finite()) {
        return Err(MetricError::InvalidNumericValue);
    }

    Ok(())
}

/// Coefficient of determination.
///
/// A constant `y_true` has no variance to explain: the score is 1.0 when the
/// predictions are exact and 0.0 otherwise.
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64, MetricError> {
    validate(y_true, y_pred)?;

    let mean = y_true.mean().ok_or(MetricError::EmptyInput)?;
    let ss_res: f64 = y_true.iter().zip(y_pred.iter()).map(|(t, p)| (t - p).powi(2)).sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}

pub fn mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64, MetricError> {
    validate(y_true, y_pred)?;
    let diff = y_true - y_pred;
    diff.mapv(|x| x * x).mean().ok_or(MetricError::EmptyInput)
}

pub fn mean_absolute_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64, MetricError> {
    validate(y_true, y_pred)?;
    let diff = y_true - y_pred;
    diff.mapv(f64::abs).mean().ok_or(MetricError::EmptyInput)
}

/// Median of `|y_true - y_pred|`; for an even count the two middle values
/// are averaged.
pub fn median_absolute_error(
    y_true: &Array1<f64>,
    y_pred: &Array1<f64>,
) -> Result<f64, MetricError> {
    validate(y_true, y_pred)?;

    let mut errors: Vec<f64> =
        y_true.iter().zip(y_pred.iter()).map(|(t, p)| (t - p).abs()).collect();
    errors.sort_by(|a, b| a.total_cmp(b));

    let mid = errors.len() / 2;
    if errors.len() % 2 == 0 {
        Ok((errors[mid - 1] + errors[mid]) / 2.0)
    } else {
        Ok(errors[mid])
    }
}
