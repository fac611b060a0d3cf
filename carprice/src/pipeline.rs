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

use std::fmt;

use log::debug;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::algorithms::LinearRegression;
use crate::compose::{ColumnStage, ColumnTransformer};
use crate::data::Table;
use crate::errors::{ModelError, SelectorError};
use crate::estimator::{Regressor, Transformer};
use crate::feature_selection::SelectKBest;

/// Categorical predictors, one-hot encoded.
pub const CATEGORICAL_COLUMNS: [&str; 3] = ["Fuel_Type", "Selling_type", "Transmission"];

/// Numeric predictors, min-max scaled.
pub const NUMERIC_COLUMNS: [&str; 4] = ["Selling_Price", "Driven_kms", "Owner", "Age"];

/// Hyperparameters tuned by the grid search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PipelineParams {
    /// Number of features kept by [`SelectKBest`].
    pub k: usize,
    pub fit_intercept: bool,
}

impl Default for PipelineParams {
    fn default() -> Self {
        PipelineParams { k: 10, fit_intercept: true }
    }
}

impl fmt::Display for PipelineParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "k={}, fit_intercept={}", self.k, self.fit_intercept)
    }
}

/// Column preprocessing, univariate feature selection and a linear model,
/// fitted in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    preprocessor: ColumnTransformer,
    selector: SelectKBest,
    regressor: LinearRegression,
}

impl Pipeline {
    pub fn new(
        preprocessor: ColumnTransformer,
        selector: SelectKBest,
        regressor: LinearRegression,
    ) -> Self {
        Pipeline { preprocessor, selector, regressor }
    }

    /// The vehicle price model: one-hot `cat` group, min-max `num` group,
    /// remaining columns dropped.
    pub fn vehicle_price(params: PipelineParams) -> Self {
        let preprocessor = ColumnTransformer::new()
            .with_stage("cat", ColumnStage::one_hot(CATEGORICAL_COLUMNS))
            .with_stage("num", ColumnStage::min_max(NUMERIC_COLUMNS));
        Pipeline::new(
            preprocessor,
            SelectKBest::new(params.k),
            LinearRegression::new().fit_intercept(params.fit_intercept).build(),
        )
    }

    pub fn params(&self) -> PipelineParams {
        PipelineParams { k: self.selector.k(), fit_intercept: self.regressor.fit_intercept() }
    }

    /// Replaces the hyperparameters. Fitted state of the affected stages is
    /// discarded.
    pub fn set_params(&mut self, params: PipelineParams) {
        self.selector.set_k(params.k);
        self.regressor.set_fit_intercept(params.fit_intercept);
    }

    pub fn preprocessor(&self) -> &ColumnTransformer {
        &self.preprocessor
    }

    pub fn selector(&self) -> &SelectKBest {
        &self.selector
    }

    pub fn regressor(&self) -> &LinearRegression {
        &self.regressor
    }

    /// Names of the features that reach the regressor.
    pub fn selected_feature_names(&self) -> Result<Vec<String>, ModelError> {
        let names = self.preprocessor.feature_names_out()?;
        let selected = self.selector.selected_indices().ok_or(SelectorError::NotFitted)?;
        Ok(selected.iter().map(|&j| names[j].clone()).collect())
    }
}

impl Regressor<Table> for Pipeline {
    fn fit(&mut self, x: &Table, y: &Array1<f64>) -> Result<(), ModelError> {
        if x.n_rows() != y.len() {
            return Err(ModelError::DimensionMismatch { expected: x.n_rows(), actual: y.len() });
        }
        let features = self.preprocessor.fit_transform(x, y)?;
        let selected = self.selector.fit_transform(&features, y)?;
        self.regressor.fit(&selected, y)?;
        debug!(
            "Fitted pipeline ({}) on {} rows, {} of {} features selected",
            self.params(),
            x.n_rows(),
            selected.ncols(),
            features.ncols()
        );
        Ok(())
    }

    fn predict(&self, x: &Table) -> Result<Array1<f64>, ModelError> {
        let features = self.preprocessor.transform(x)?;
        let selected = self.selector.transform(&features)?;
        self.regressor.predict(&selected)
    }
}
