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

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::data::Table;
use crate::errors::{EvaluationError, MetricError, PersistError};
use crate::estimator::Regressor;
use crate::metrics::{median_absolute_error, mean_squared_error, r2_score};

/// One line of the metrics report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub dataset: String,
    pub r2: f64,
    pub mse: f64,
    pub mad: f64,
}

impl MetricRecord {
    /// Scores `y_pred` against `y_true`. `mad` is the median absolute error.
    pub fn from_predictions(
        dataset: &str,
        y_true: &Array1<f64>,
        y_pred: &Array1<f64>,
    ) -> Result<Self, MetricError> {
        Ok(MetricRecord {
            kind: "metrics".to_string(),
            dataset: dataset.to_string(),
            r2: r2_score(y_true, y_pred)?,
            mse: mean_squared_error(y_true, y_pred)?,
            mad: median_absolute_error(y_true, y_pred)?,
        })
    }
}

pub fn evaluate<M: Regressor<Table>>(
    model: &M,
    x: &Table,
    y: &Array1<f64>,
    dataset: &str,
) -> Result<MetricRecord, EvaluationError> {
    let predictions = model.predict(x)?;
    let record = MetricRecord::from_predictions(dataset, y, &predictions)?;
    info!(
        "{} metrics: r2={:.4}, mse={:.4}, mad={:.4}",
        dataset, record.r2, record.mse, record.mad
    );
    Ok(record)
}

/// Writes one JSON object per line. An existing file is replaced.
pub fn save_metrics<P: AsRef<Path>>(records: &[MetricRecord], path: P) -> Result<(), PersistError> {
    let path = path.as_ref();
    let io_error = |source| PersistError::Io { path: path.display().to_string(), source };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n").map_err(io_error)?;
    }
    writer.flush().map_err(io_error)?;

    info!("Saved {} metric records to {}", records.len(), path.display());
    Ok(())
}
