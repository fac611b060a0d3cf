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

use std::path::{Path, PathBuf};

use crate::data::{REFERENCE_YEAR, TARGET_COLUMN};
use crate::model_selection::{KFold, ParamGrid, Scoring};

/// Configuration for a training run.
///
/// `TrainingConfig::default()` reproduces the standard layout under
/// `files/` and the standard search grid.
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    train_path: PathBuf,
    test_path: PathBuf,
    model_path: PathBuf,
    metrics_path: PathBuf,
    target: String,
    reference_year: i32,
    k_values: Vec<usize>,
    fit_intercept: Vec<bool>,
    n_splits: usize,
    shuffle: bool,
    random_state: Option<u64>,
    scoring: Scoring,
    n_jobs: Option<usize>,
}

impl TrainingConfig {
    pub fn new() -> Self {
        TrainingConfig {
            train_path: PathBuf::from("files/input/train_data.csv.zip"),
            test_path: PathBuf::from("files/input/test_data.csv.zip"),
            model_path: PathBuf::from("files/models/model.pkl.gz"),
            metrics_path: PathBuf::from("files/output/metrics.json"),
            target: TARGET_COLUMN.to_string(),
            reference_year: REFERENCE_YEAR,
            k_values: (4..=11).collect(),
            fit_intercept: vec![true, false],
            n_splits: 10,
            shuffle: false,
            random_state: None,
            scoring: Scoring::NegMeanAbsoluteError,
            n_jobs: None,
        }
    }

    /// Places every input and output file below `root`, keeping the
    /// standard relative layout.
    pub fn with_root<P: AsRef<Path>>(self, root: P) -> Self {
        let root = root.as_ref();
        TrainingConfig {
            train_path: root.join(&self.train_path),
            test_path: root.join(&self.test_path),
            model_path: root.join(&self.model_path),
            metrics_path: root.join(&self.metrics_path),
            ..self
        }
    }

    pub fn with_train_path(mut self, path: PathBuf) -> Self {
        self.train_path = path;
        self
    }

    pub fn with_test_path(mut self, path: PathBuf) -> Self {
        self.test_path = path;
        self
    }

    pub fn with_model_path(mut self, path: PathBuf) -> Self {
        self.model_path = path;
        self
    }

    pub fn with_metrics_path(mut self, path: PathBuf) -> Self {
        self.metrics_path = path;
        self
    }

    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = year;
        self
    }

    pub fn with_k_values(mut self, k_values: Vec<usize>) -> Self {
        self.k_values = k_values;
        self
    }

    pub fn with_fit_intercept(mut self, fit_intercept: Vec<bool>) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    pub fn with_n_splits(mut self, n_splits: usize) -> Self {
        self.n_splits = n_splits;
        self
    }

    /// Shuffles rows before splitting into folds, seeded when `random_state`
    /// is given.
    pub fn with_shuffle(mut self, shuffle: bool, random_state: Option<u64>) -> Self {
        self.shuffle = shuffle;
        self.random_state = random_state;
        self
    }

    pub fn with_scoring(mut self, scoring: Scoring) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_threads(mut self, n_jobs: usize) -> Self {
        self.n_jobs = Some(n_jobs.max(1));
        self
    }

    pub fn train_path(&self) -> &Path {
        &self.train_path
    }

    pub fn test_path(&self) -> &Path {
        &self.test_path
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn metrics_path(&self) -> &Path {
        &self.metrics_path
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    pub fn scoring(&self) -> Scoring {
        self.scoring
    }

    pub fn n_jobs(&self) -> Option<usize> {
        self.n_jobs
    }

    pub fn param_grid(&self) -> ParamGrid {
        ParamGrid::new(self.k_values.clone(), self.fit_intercept.clone())
    }

    pub fn cv(&self) -> KFold {
        let cv = KFold::new(self.n_splits).shuffle(self.shuffle);
        match self.random_state {
            Some(seed) => cv.random_state(seed),
            None => cv,
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self::new()
    }
}
