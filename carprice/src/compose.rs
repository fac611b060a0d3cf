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

use log::debug;
use ndarray::{concatenate, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::data::Table;
use crate::encoders::OneHotEncoder;
use crate::errors::{ModelError, ScalerError};
use crate::estimator::Transformer;
use crate::scalers::{MinMaxScaler, Scaler};

/// The transformer applied to one group of columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnStage {
    OneHot(OneHotEncoder),
    MinMax { columns: Vec<String>, scaler: MinMaxScaler },
}

impl ColumnStage {
    pub fn one_hot<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        ColumnStage::OneHot(OneHotEncoder::new(columns))
    }

    pub fn min_max<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        ColumnStage::MinMax {
            columns: columns.into_iter().map(Into::into).collect(),
            scaler: MinMaxScaler::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        match self {
            ColumnStage::OneHot(encoder) => encoder.columns(),
            ColumnStage::MinMax { columns, .. } => columns,
        }
    }

    fn feature_names_out(&self) -> Result<Vec<String>, ModelError> {
        match self {
            ColumnStage::OneHot(encoder) => Ok(encoder.feature_names_out()?),
            ColumnStage::MinMax { columns, scaler } => {
                if scaler.data_min().is_none() {
                    return Err(ScalerError::NotFitted.into());
                }
                Ok(columns.clone())
            }
        }
    }
}

impl Transformer<Table> for ColumnStage {
    fn fit(&mut self, x: &Table, y: &Array1<f64>) -> Result<(), ModelError> {
        match self {
            ColumnStage::OneHot(encoder) => encoder.fit(x, y),
            ColumnStage::MinMax { columns, scaler } => {
                Ok(scaler.fit(&x.numeric_matrix(columns)?)?)
            }
        }
    }

    fn transform(&self, x: &Table) -> Result<Array2<f64>, ModelError> {
        match self {
            ColumnStage::OneHot(encoder) => encoder.transform(x),
            ColumnStage::MinMax { columns, scaler } => {
                Ok(scaler.transform(&x.numeric_matrix(columns)?)?)
            }
        }
    }
}

/// Applies a named stage to each column group and concatenates the outputs
/// horizontally, in group order.
///
/// Columns that no group names are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransformer {
    transformers: Vec<(String, ColumnStage)>,
}

impl ColumnTransformer {
    pub fn new() -> Self {
        ColumnTransformer { transformers: Vec::new() }
    }

    pub fn with_stage(mut self, name: &str, stage: ColumnStage) -> Self {
        self.transformers.push((name.to_string(), stage));
        self
    }

    pub fn stages(&self) -> &[(String, ColumnStage)] {
        &self.transformers
    }

    /// Output names in the form `<stage>__<feature>`.
    pub fn feature_names_out(&self) -> Result<Vec<String>, ModelError> {
        let mut names = Vec::new();
        for (prefix, stage) in &self.transformers {
            let stage_names = stage.feature_names_out()?;
            names.extend(stage_names.into_iter().map(|n| format!("{}__{}", prefix, n)));
        }
        Ok(names)
    }
}

impl Default for ColumnTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl Transformer<Table> for ColumnTransformer {
    fn fit(&mut self, x: &Table, y: &Array1<f64>) -> Result<(), ModelError> {
        if x.is_empty() {
            return Err(ModelError::EmptyInput);
        }
        for (name, stage) in self.transformers.iter_mut() {
            stage.fit(x, y)?;
            debug!("Fitted column stage '{}' on {:?}", name, stage.columns());
        }
        Ok(())
    }

    fn transform(&self, x: &Table) -> Result<Array2<f64>, ModelError> {
        if self.transformers.is_empty() {
            return Ok(Array2::zeros((x.n_rows(), 0)));
        }
        let blocks = self
            .transformers
            .iter()
            .map(|(_, stage)| stage.transform(x))
            .collect::<Result<Vec<_>, _>>()?;
        let views: Vec<_> = blocks.iter().map(|b| b.view()).collect();
        Ok(concatenate(Axis(1), &views)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use ndarray::array;

    fn table() -> Table {
        Table::from_columns([
            ("Selling_Price", Column::Numeric(array![1.0, 3.0, 5.0])),
            (
                "Transmission",
                Column::Categorical(vec!["Manual".into(), "Automatic".into(), "Manual".into()]),
            ),
            ("Owner", Column::Numeric(array![0.0, 1.0, 0.0])),
            ("Ignored", Column::Categorical(vec!["a".into(), "b".into(), "c".into()])),
        ])
        .unwrap()
    }

    fn transformer() -> ColumnTransformer {
        ColumnTransformer::new()
            .with_stage("cat", ColumnStage::one_hot(["Transmission"]))
            .with_stage("num", ColumnStage::min_max(["Selling_Price", "Owner"]))
    }

    #[test]
    fn column_transformer_concatenates_groups() {
        let mut ct = transformer();
        let y = Array1::zeros(3);
        let out = ct.fit_transform(&table(), &y).unwrap();

        let expected = array![
            [0.0, 1.0, 0.0, 0.0],
            [1.0, 0.0, 0.5, 1.0],
            [0.0, 1.0, 1.0, 0.0],
        ];
        assert_eq!(out.dim(), (3, 4));
        for (o, e) in out.iter().zip(expected.iter()) {
            assert!((o - e).abs() < 1e-12);
        }
    }

    #[test]
    fn column_transformer_feature_names() {
        let mut ct = transformer();
        assert!(ct.feature_names_out().is_err());
        ct.fit(&table(), &Array1::zeros(3)).unwrap();
        assert_eq!(
            ct.feature_names_out().unwrap(),
            vec![
                "cat__Transmission_Automatic",
                "cat__Transmission_Manual",
                "num__Selling_Price",
                "num__Owner",
            ]
        );
    }

    #[test]
    fn column_transformer_missing_column() {
        let mut ct = ColumnTransformer::new().with_stage("num", ColumnStage::min_max(["Age"]));
        let result = ct.fit(&table(), &Array1::zeros(3));
        assert!(matches!(result, Err(ModelError::Data(_))));
    }

    #[test]
    fn column_transformer_uses_fit_time_parameters() {
        let mut ct = transformer();
        ct.fit(&table(), &Array1::zeros(3)).unwrap();

        let later = Table::from_columns([
            ("Selling_Price", Column::Numeric(array![9.0])),
            ("Transmission", Column::Categorical(vec!["Automatic".into()])),
            ("Owner", Column::Numeric(array![3.0])),
        ])
        .unwrap();
        let out = ct.transform(&later).unwrap();
        assert_eq!(out, array![[1.0, 0.0, 2.0, 3.0]]);
    }
}
