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

//! Cross-validated hyperparameter search over the vehicle price pipeline.
//!
//! Every `(candidate, fold)` pair is an independent task. Tasks run on a
//! rayon pool and their scores are gathered in task order, so the selected
//! candidate does not depend on the number of worker threads.

use log::{debug, info, warn};
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::Table;
use crate::errors::{MetricError, SearchError};
use crate::estimator::Regressor;
use crate::metrics::{mean_absolute_error, mean_squared_error, r2_score};
use crate::pipeline::{Pipeline, PipelineParams};

/// K-fold cross-validation splitter.
///
/// Without shuffling the folds are contiguous blocks in row order. The first
/// `n_samples % n_splits` folds hold one extra row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KFold {
    n_splits: usize,
    shuffle: bool,
    random_state: Option<u64>,
}

impl KFold {
    pub fn new(n_splits: usize) -> Self {
        KFold { n_splits, shuffle: false, random_state: None }
    }

    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Seed for the shuffling permutation. Ignored unless shuffling.
    pub fn random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Returns `(train, validation)` row indices for every fold.
    pub fn split(&self, n_samples: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>, SearchError> {
        if self.n_splits < 2 {
            return Err(SearchError::InvalidSplits(self.n_splits));
        }
        if n_samples < self.n_splits {
            return Err(SearchError::InsufficientSamples { n_samples, n_splits: self.n_splits });
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        if self.shuffle {
            let mut rng = match self.random_state {
                Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                None => ChaCha8Rng::seed_from_u64(rand::random()),
            };
            indices.shuffle(&mut rng);
        }

        let base = n_samples / self.n_splits;
        let extra = n_samples % self.n_splits;
        let mut folds = Vec::with_capacity(self.n_splits);
        let mut start = 0;
        for fold in 0..self.n_splits {
            let size = base + usize::from(fold < extra);
            let mut validation = indices[start..start + size].to_vec();
            let mut train: Vec<usize> =
                indices[..start].iter().chain(&indices[start + size..]).copied().collect();
            validation.sort_unstable();
            train.sort_unstable();
            folds.push((train, validation));
            start += size;
        }
        Ok(folds)
    }
}

/// Cartesian product of the tuned hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    k_values: Vec<usize>,
    fit_intercept: Vec<bool>,
}

impl ParamGrid {
    pub fn new(k_values: Vec<usize>, fit_intercept: Vec<bool>) -> Self {
        ParamGrid { k_values, fit_intercept }
    }

    /// Candidates with `fit_intercept` as the outer loop and `k` as the inner
    /// loop, both in the given order.
    pub fn candidates(&self) -> Vec<PipelineParams> {
        self.fit_intercept
            .iter()
            .flat_map(|&fit_intercept| {
                self.k_values.iter().map(move |&k| PipelineParams { k, fit_intercept })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.k_values.len() * self.fit_intercept.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ParamGrid {
    fn default() -> Self {
        ParamGrid::new((4..=11).collect(), vec![true, false])
    }
}

/// Validation score, greater is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Scoring {
    #[default]
    NegMeanAbsoluteError,
    NegMeanSquaredError,
    R2,
}

impl Scoring {
    pub fn score(&self, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64, MetricError> {
        match self {
            Scoring::NegMeanAbsoluteError => mean_absolute_error(y_true, y_pred).map(|v| -v),
            Scoring::NegMeanSquaredError => mean_squared_error(y_true, y_pred).map(|v| -v),
            Scoring::R2 => r2_score(y_true, y_pred),
        }
    }
}

/// Cross-validation outcome of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub params: PipelineParams,
    #[serde(with = "nan_as_null::vec")]
    pub fold_scores: Vec<f64>,
    #[serde(with = "nan_as_null")]
    pub mean_score: f64,
    #[serde(with = "nan_as_null")]
    pub std_score: f64,
    pub rank: usize,
}

/// Exhaustive search over a [`ParamGrid`] scored by k-fold cross-validation.
///
/// After `fit`, the best candidate is refit on the whole training set and
/// used by `predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSearchCV {
    estimator: Pipeline,
    param_grid: ParamGrid,
    cv: KFold,
    scoring: Scoring,
    n_jobs: Option<usize>,
    cv_results: Vec<CandidateResult>,
    best_index: Option<usize>,
    best_estimator: Option<Pipeline>,
}

struct FoldData {
    x_train: Table,
    y_train: Array1<f64>,
    x_val: Table,
    y_val: Array1<f64>,
}

impl GridSearchCV {
    pub fn new(estimator: Pipeline, param_grid: ParamGrid) -> Self {
        GridSearchCV {
            estimator,
            param_grid,
            cv: KFold::new(10),
            scoring: Scoring::default(),
            n_jobs: None,
            cv_results: Vec::new(),
            best_index: None,
            best_estimator: None,
        }
    }

    pub fn with_cv(mut self, cv: KFold) -> Self {
        self.cv = cv;
        self
    }

    pub fn with_scoring(mut self, scoring: Scoring) -> Self {
        self.scoring = scoring;
        self
    }

    /// Worker threads for the search. `None` uses one per available core.
    pub fn with_n_jobs(mut self, n_jobs: Option<usize>) -> Self {
        self.n_jobs = n_jobs;
        self
    }

    pub fn cv_results(&self) -> &[CandidateResult] {
        &self.cv_results
    }

    pub fn best_params(&self) -> Option<PipelineParams> {
        self.best_index.map(|i| self.cv_results[i].params)
    }

    pub fn best_score(&self) -> Option<f64> {
        self.best_index.map(|i| self.cv_results[i].mean_score)
    }

    pub fn best_estimator(&self) -> Option<&Pipeline> {
        self.best_estimator.as_ref()
    }

    pub fn fit(&mut self, x: &Table, y: &Array1<f64>) -> Result<(), SearchError> {
        if x.n_rows() != y.len() {
            return Err(SearchError::DimensionMismatch { expected: x.n_rows(), actual: y.len() });
        }
        let candidates = self.param_grid.candidates();
        if candidates.is_empty() {
            return Err(SearchError::EmptyGrid);
        }

        let folds = self
            .cv
            .split(x.n_rows())?
            .into_iter()
            .map(|(train, val)| -> Result<FoldData, SearchError> {
                Ok(FoldData {
                    x_train: x.take_rows(&train)?,
                    y_train: train.iter().map(|&i| y[i]).collect(),
                    x_val: x.take_rows(&val)?,
                    y_val: val.iter().map(|&i| y[i]).collect(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "Fitting {} folds for each of {} candidates, totalling {} fits",
            folds.len(),
            candidates.len(),
            folds.len() * candidates.len()
        );

        let tasks: Vec<(usize, usize)> = (0..candidates.len())
            .flat_map(|c| (0..folds.len()).map(move |f| (c, f)))
            .collect();
        let pool = rayon::ThreadPoolBuilder::new().num_threads(self.n_jobs.unwrap_or(0)).build()?;
        let scores: Vec<f64> = pool.install(|| {
            tasks
                .par_iter()
                .map(|&(c, f)| {
                    score_fold(&self.estimator, candidates[c], &folds[f], self.scoring, f)
                })
                .collect()
        });

        let means: Vec<f64> = scores.chunks(folds.len()).map(mean_or_nan).collect();
        let ranks = rank_candidates(&means);
        self.cv_results = candidates
            .iter()
            .zip(scores.chunks(folds.len()))
            .zip(means.iter().zip(ranks))
            .map(|((&params, fold_scores), (&mean_score, rank))| CandidateResult {
                params,
                fold_scores: fold_scores.to_vec(),
                mean_score,
                std_score: std_or_nan(fold_scores, mean_score),
                rank,
            })
            .collect();

        let best_index = if means.iter().all(|m| m.is_nan()) {
            warn!("All candidates failed to fit, falling back to the first candidate");
            0
        } else {
            ranks_first_best(&self.cv_results)
        };
        let best_params = candidates[best_index];
        info!("Best parameters {} with mean score {:.6}", best_params, means[best_index]);

        let mut best = self.estimator.clone();
        best.set_params(best_params);
        best.fit(x, y)?;

        self.best_index = Some(best_index);
        self.best_estimator = Some(best);
        Ok(())
    }

    pub fn predict(&self, x: &Table) -> Result<Array1<f64>, SearchError> {
        let best = self.best_estimator.as_ref().ok_or(SearchError::NotFitted)?;
        Ok(best.predict(x)?)
    }
}

fn score_fold(
    template: &Pipeline,
    params: PipelineParams,
    fold: &FoldData,
    scoring: Scoring,
    fold_index: usize,
) -> f64 {
    let mut estimator = template.clone();
    estimator.set_params(params);
    let outcome = estimator
        .fit(&fold.x_train, &fold.y_train)
        .and_then(|_| estimator.predict(&fold.x_val))
        .map_err(|e| e.to_string())
        .and_then(|pred| scoring.score(&fold.y_val, &pred).map_err(|e| e.to_string()));

    match outcome {
        Ok(score) => {
            debug!("[CV fold {}] {} score={:.6}", fold_index, params, score);
            score
        }
        Err(e) => {
            warn!("[CV fold {}] {} failed, scored as NaN: {}", fold_index, params, e);
            f64::NAN
        }
    }
}

fn mean_or_nan(scores: &[f64]) -> f64 {
    if scores.is_empty() || scores.iter().any(|s| s.is_nan()) {
        return f64::NAN;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

fn std_or_nan(scores: &[f64], mean: f64) -> f64 {
    if mean.is_nan() {
        return f64::NAN;
    }
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / scores.len() as f64;
    variance.sqrt()
}

/// Ranks mean scores descending, 1 being best. Equal means share the lowest
/// rank of their group and NaN means rank after every number.
fn rank_candidates(means: &[f64]) -> Vec<usize> {
    let n_valid = means.iter().filter(|m| !m.is_nan()).count();
    means
        .iter()
        .map(|&m| {
            if m.is_nan() {
                n_valid + 1
            } else {
                1 + means.iter().filter(|&&other| !other.is_nan() && other > m).count()
            }
        })
        .collect()
}

fn ranks_first_best(results: &[CandidateResult]) -> usize {
    results.iter().position(|r| r.rank == 1).unwrap_or(0)
}

/// JSON has no NaN; failed scores are written as `null` and read back as NaN.
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_none()
        } else {
            serializer.serialize_some(value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }

    pub mod vec {
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_seq(values.iter().map(|v| if v.is_nan() { None } else { Some(*v) }))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Vec<f64>, D::Error> {
            let values = Vec::<Option<f64>>::deserialize(deserializer)?;
            Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Synthetic vehicles where every category recurs often enough that each
    /// training fold sees all of them.
    fn vehicles(n: usize) -> (Table, Array1<f64>) {
        let fuel = ["Petrol", "Diesel", "CNG"];
        let seller = ["Dealer", "Individual"];
        let gearbox = ["Manual", "Manual", "Automatic", "Automatic"];

        let selling: Array1<f64> = (0..n).map(|i| 1.0 + (i * 37 % 17) as f64 * 0.6).collect();
        let kms: Array1<f64> = (0..n).map(|i| 5000.0 + (i * 53 % 23) as f64 * 2500.0).collect();
        let owner: Array1<f64> = (0..n).map(|i| if i % 7 == 3 { 1.0 } else { 0.0 }).collect();
        let age: Array1<f64> = (0..n).map(|i| 1.0 + (i * 11 % 13) as f64).collect();
        let y: Array1<f64> = (0..n)
            .map(|i| {
                1.4 * selling[i] - 0.00002 * kms[i] - 0.3 * age[i]
                    + if i % 3 == 1 { 1.5 } else { 0.0 }
                    + (i * 7 % 5) as f64 * 0.05
                    + 6.0
            })
            .collect();

        let table = Table::from_columns([
            ("Selling_Price", Column::Numeric(selling)),
            ("Driven_kms", Column::Numeric(kms)),
            ("Fuel_Type", Column::Categorical((0..n).map(|i| fuel[i % 3].to_string()).collect())),
            (
                "Selling_type",
                Column::Categorical((0..n).map(|i| seller[i % 2].to_string()).collect()),
            ),
            (
                "Transmission",
                Column::Categorical((0..n).map(|i| gearbox[i % 4].to_string()).collect()),
            ),
            ("Owner", Column::Numeric(owner)),
            ("Age", Column::Numeric(age)),
        ])
        .unwrap();
        (table, y)
    }

    fn search() -> GridSearchCV {
        GridSearchCV::new(
            Pipeline::vehicle_price(PipelineParams { k: 4, fit_intercept: true }),
            ParamGrid::default(),
        )
    }

    #[test]
    fn kfold_contiguous_folds() {
        let folds = KFold::new(3).split(10).unwrap();
        let validation: Vec<Vec<usize>> = folds.iter().map(|(_, v)| v.clone()).collect();
        assert_eq!(validation, vec![vec![0, 1, 2, 3], vec![4, 5, 6], vec![7, 8, 9]]);
        assert_eq!(folds[1].0, vec![0, 1, 2, 3, 7, 8, 9]);
    }

    #[test]
    fn kfold_rejects_bad_configuration() {
        assert!(matches!(
            KFold::new(10).split(5),
            Err(SearchError::InsufficientSamples { n_samples: 5, n_splits: 10 })
        ));
        assert!(matches!(
            KFold::new(10).split(0),
            Err(SearchError::InsufficientSamples { n_samples: 0, .. })
        ));
        assert!(matches!(KFold::new(1).split(5), Err(SearchError::InvalidSplits(1))));
    }

    #[test]
    fn kfold_seeded_shuffle_is_reproducible_partition() {
        let cv = KFold::new(4).shuffle(true).random_state(42);
        let first = cv.split(13).unwrap();
        assert_eq!(first, cv.split(13).unwrap());

        let mut seen: Vec<usize> = first.iter().flat_map(|(_, v)| v.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..13).collect::<Vec<_>>());
        for (train, validation) in &first {
            assert_eq!(train.len() + validation.len(), 13);
            assert!(train.iter().all(|i| !validation.contains(i)));
        }
    }

    #[test]
    fn param_grid_enumeration_order() {
        let candidates = ParamGrid::default().candidates();
        assert_eq!(candidates.len(), 16);
        assert_eq!(candidates[0], PipelineParams { k: 4, fit_intercept: true });
        assert_eq!(candidates[7], PipelineParams { k: 11, fit_intercept: true });
        assert_eq!(candidates[8], PipelineParams { k: 4, fit_intercept: false });
        assert_eq!(candidates[15], PipelineParams { k: 11, fit_intercept: false });
    }

    #[test]
    fn rank_candidates_min_rank_nan_last() {
        let ranks = rank_candidates(&[-1.0, f64::NAN, -0.5, -0.5, -2.0]);
        assert_eq!(ranks, vec![3, 5, 1, 1, 4]);
        assert_eq!(rank_candidates(&[f64::NAN, f64::NAN]), vec![1, 1]);
    }

    #[test]
    fn scoring_signs() {
        let y_true = ndarray::array![1.0, 2.0];
        let y_pred = ndarray::array![2.0, 4.0];
        assert_eq!(Scoring::NegMeanAbsoluteError.score(&y_true, &y_pred).unwrap(), -1.5);
        assert_eq!(Scoring::NegMeanSquaredError.score(&y_true, &y_pred).unwrap(), -2.5);
    }

    #[test]
    fn grid_search_selects_and_refits() {
        init_logger();
        let (x, y) = vehicles(40);
        let mut search = search();
        search.fit(&x, &y).unwrap();

        assert_eq!(search.cv_results().len(), 16);
        assert!(search.cv_results().iter().all(|r| r.fold_scores.len() == 10));
        assert!(search
            .cv_results()
            .iter()
            .all(|r| r.mean_score.is_finite() && r.mean_score <= 0.0));

        let best = search.best_params().unwrap();
        let best_score = search.best_score().unwrap();
        assert!(search.cv_results().iter().all(|r| r.mean_score <= best_score));
        assert_eq!(search.best_estimator().unwrap().params(), best);
        assert_eq!(search.predict(&x).unwrap().len(), 40);
    }

    #[test]
    fn grid_search_independent_of_n_jobs() {
        let (x, y) = vehicles(30);
        let mut sequential = search().with_n_jobs(Some(1));
        let mut parallel = search().with_n_jobs(Some(4));
        sequential.fit(&x, &y).unwrap();
        parallel.fit(&x, &y).unwrap();

        assert_eq!(sequential.best_params(), parallel.best_params());
        assert_eq!(sequential.cv_results(), parallel.cv_results());
        assert_eq!(sequential.best_estimator(), parallel.best_estimator());
    }

    #[test]
    fn grid_search_seeded_shuffle_is_reproducible() {
        let (x, y) = vehicles(30);
        let cv = KFold::new(5).shuffle(true).random_state(17);
        assert_ne!(cv.split(30).unwrap(), KFold::new(5).split(30).unwrap());

        let mut first = search().with_cv(cv).with_n_jobs(Some(3));
        let mut second = search().with_cv(cv).with_n_jobs(Some(1));
        first.fit(&x, &y).unwrap();
        second.fit(&x, &y).unwrap();

        assert_eq!(first.best_params(), second.best_params());
        assert_eq!(first.cv_results(), second.cv_results());
        assert_eq!(first.best_estimator(), second.best_estimator());
    }

    #[test]
    fn grid_search_too_few_rows() {
        let (x, y) = vehicles(5);
        let mut search = search();
        assert!(matches!(
            search.fit(&x, &y),
            Err(SearchError::InsufficientSamples { n_samples: 5, n_splits: 10 })
        ));
        assert!(search.best_estimator().is_none());
    }

    #[test]
    fn grid_search_empty_grid() {
        let (x, y) = vehicles(20);
        let mut search = GridSearchCV::new(
            Pipeline::vehicle_price(PipelineParams { k: 4, fit_intercept: true }),
            ParamGrid::new(vec![], vec![true]),
        );
        assert!(matches!(search.fit(&x, &y), Err(SearchError::EmptyGrid)));
    }

    #[test]
    fn grid_search_failed_folds_are_nan() {
        init_logger();
        let (x, y) = vehicles(10);
        // A category seen only in the first row makes that validation fold fail.
        let mut fuel = x.categorical("Fuel_Type").unwrap().to_vec();
        fuel[0] = "LPG".to_string();
        let mut x = x.drop_columns(&["Fuel_Type"]).unwrap();
        x.push_column("Fuel_Type", Column::Categorical(fuel)).unwrap();

        let mut search = search().with_cv(KFold::new(5));
        search.fit(&x, &y).unwrap();

        for result in search.cv_results() {
            assert!(result.fold_scores[0].is_nan());
            assert!(result.fold_scores[1..].iter().all(|s| s.is_finite()));
            assert!(result.mean_score.is_nan());
            assert_eq!(result.rank, 1);
        }
        assert_eq!(search.best_params(), Some(PipelineParams { k: 4, fit_intercept: true }));
        assert!(search.best_estimator().is_some());
    }

    #[test]
    fn predict_before_fit() {
        let (x, _) = vehicles(10);
        assert!(matches!(search().predict(&x), Err(SearchError::NotFitted)));
    }

    #[test]
    fn nan_scores_survive_json() {
        let result = CandidateResult {
            params: PipelineParams { k: 4, fit_intercept: true },
            fold_scores: vec![-1.0, f64::NAN],
            mean_score: f64::NAN,
            std_score: f64::NAN,
            rank: 1,
        };
        let json = serde_json::to_string(&result).unwrap();
        let restored: CandidateResult = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.fold_scores[0], -1.0);
        assert!(restored.fold_scores[1].is_nan());
        assert!(restored.mean_score.is_nan());
    }
}
