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

use std::path::Path;

use log::info;
use ndarray::Array1;

use crate::config::TrainingConfig;
use crate::data::{add_vehicle_age, load_data, split_features_target, Table, ZipCsvLoader};
use crate::errors::{SearchError, TrainingError};
use crate::model_selection::GridSearchCV;
use crate::persistence::save_model;
use crate::pipeline::{Pipeline, PipelineParams};
use crate::reporting::{evaluate, save_metrics, MetricRecord};

/// Outcome of [`run_training`].
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub best_params: PipelineParams,
    /// Mean cross-validation score of `best_params`.
    pub best_score: f64,
    /// Train metrics first, then test metrics.
    pub metrics: Vec<MetricRecord>,
}

fn load_features_target(
    path: &Path,
    config: &TrainingConfig,
) -> Result<(Table, Array1<f64>), TrainingError> {
    let raw = load_data::<ZipCsvLoader, _>(path).map_err(|source| TrainingError::Load {
        path: path.display().to_string(),
        source,
    })?;
    let table = add_vehicle_age(&raw, config.reference_year())?;
    Ok(split_features_target(&table, config.target())?)
}

/// Loads both splits, searches the pipeline hyperparameters on the training
/// split, saves the fitted search and writes train and test metrics.
pub fn run_training(config: &TrainingConfig) -> Result<TrainingReport, TrainingError> {
    let (x_train, y_train) = load_features_target(config.train_path(), config)?;
    let (x_test, y_test) = load_features_target(config.test_path(), config)?;
    info!("Training rows: {}, test rows: {}", x_train.n_rows(), x_test.n_rows());

    let template = Pipeline::vehicle_price(PipelineParams::default());
    let mut search = GridSearchCV::new(template, config.param_grid())
        .with_cv(config.cv())
        .with_scoring(config.scoring())
        .with_n_jobs(config.n_jobs());
    search.fit(&x_train, &y_train)?;

    save_model(&search, config.model_path())?;

    let best = search.best_estimator().ok_or(SearchError::NotFitted)?;
    let metrics = vec![
        evaluate(best, &x_train, &y_train, "train")?,
        evaluate(best, &x_test, &y_test, "test")?,
    ];
    save_metrics(&metrics, config.metrics_path())?;

    Ok(TrainingReport {
        best_params: search.best_params().ok_or(SearchError::NotFitted)?,
        best_score: search.best_score().ok_or(SearchError::NotFitted)?,
        metrics,
    })
}
