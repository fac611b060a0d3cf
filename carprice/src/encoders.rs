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

use std::collections::BTreeSet;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::data::Table;
use crate::errors::{EncoderError, ModelError};
use crate::estimator::Transformer;

/// One-hot encodes categorical columns of a [`Table`].
///
/// Categories are the sorted distinct values observed at fit time, one
/// indicator column per category. A value not seen during fit is an error
/// at transform time; it is never silently encoded as all zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    columns: Vec<String>,
    categories: Option<Vec<Vec<String>>>,
}

impl OneHotEncoder {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        OneHotEncoder { columns: columns.into_iter().map(Into::into).collect(), categories: None }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Fitted categories, one sorted list per input column.
    pub fn categories(&self) -> Option<&[Vec<String>]> {
        self.categories.as_deref()
    }

    /// Output names in the form `<column>_<category>`.
    pub fn feature_names_out(&self) -> Result<Vec<String>, EncoderError> {
        let categories = self.categories.as_ref().ok_or(EncoderError::NotFitted)?;
        Ok(self
            .columns
            .iter()
            .zip(categories)
            .flat_map(|(column, cats)| cats.iter().map(move |cat| format!("{}_{}", column, cat)))
            .collect())
    }

    pub fn n_features_out(&self) -> Option<usize> {
        self.categories.as_ref().map(|cats| cats.iter().map(Vec::len).sum())
    }
}

impl Transformer<Table> for OneHotEncoder {
    fn fit(&mut self, x: &Table, _y: &Array1<f64>) -> Result<(), ModelError> {
        if x.is_empty() {
            return Err(EncoderError::EmptyInput.into());
        }
        let mut categories = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let distinct: BTreeSet<&String> = x.categorical(column)?.iter().collect();
            categories.push(distinct.into_iter().cloned().collect());
        }
        self.categories = Some(categories);
        Ok(())
    }

    fn transform(&self, x: &Table) -> Result<Array2<f64>, ModelError> {
        let categories = self.categories.as_ref().ok_or(EncoderError::NotFitted)?;
        let n_out = categories.iter().map(Vec::len).sum();
        let mut encoded = Array2::zeros((x.n_rows(), n_out));

        let mut offset = 0;
        for (column, cats) in self.columns.iter().zip(categories) {
            for (row, value) in x.categorical(column)?.iter().enumerate() {
                let position = cats.binary_search(value).map_err(|_| {
                    EncoderError::UnknownCategory { column: column.clone(), value: value.clone() }
                })?;
                encoded[[row, offset + position]] = 1.0;
            }
            offset += cats.len();
        }
        Ok(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use ndarray::array;

    fn vehicles() -> Table {
        Table::from_columns([
            (
                "Fuel_Type",
                Column::Categorical(vec![
                    "Petrol".into(),
                    "Diesel".into(),
                    "CNG".into(),
                    "Petrol".into(),
                ]),
            ),
            (
                "Transmission",
                Column::Categorical(vec![
                    "Manual".into(),
                    "Automatic".into(),
                    "Manual".into(),
                    "Manual".into(),
                ]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn one_hot_sorted_categories() {
        let table = vehicles();
        let mut encoder = OneHotEncoder::new(["Fuel_Type", "Transmission"]);
        let encoded = encoder.fit_transform(&table, &Array1::zeros(4)).unwrap();

        assert_eq!(
            encoder.categories().unwrap(),
            &[
                vec!["CNG".to_string(), "Diesel".into(), "Petrol".into()],
                vec!["Automatic".to_string(), "Manual".into()],
            ]
        );
        let expected = array![
            [0.0, 0.0, 1.0, 0.0, 1.0],
            [0.0, 1.0, 0.0, 1.0, 0.0],
            [1.0, 0.0, 0.0, 0.0, 1.0],
            [0.0, 0.0, 1.0, 0.0, 1.0],
        ];
        assert_eq!(encoded, expected);
    }

    #[test]
    fn one_hot_feature_names() {
        let mut encoder = OneHotEncoder::new(["Transmission"]);
        assert!(matches!(encoder.feature_names_out(), Err(EncoderError::NotFitted)));

        encoder.fit(&vehicles(), &Array1::zeros(4)).unwrap();
        assert_eq!(
            encoder.feature_names_out().unwrap(),
            vec!["Transmission_Automatic".to_string(), "Transmission_Manual".to_string()]
        );
        assert_eq!(encoder.n_features_out(), Some(2));
    }

    #[test]
    fn one_hot_unknown_category_fails() {
        let mut encoder = OneHotEncoder::new(["Fuel_Type"]);
        encoder.fit(&vehicles(), &Array1::zeros(4)).unwrap();

        let unseen =
            Table::from_columns([("Fuel_Type", Column::Categorical(vec!["Electric".into()]))])
                .unwrap();
        let result = encoder.transform(&unseen);
        assert!(matches!(
            result,
            Err(ModelError::Encoder(EncoderError::UnknownCategory { ref column, ref value }))
                if column == "Fuel_Type" && value == "Electric"
        ));
    }

    #[test]
    fn one_hot_not_fitted() {
        let encoder = OneHotEncoder::new(["Fuel_Type"]);
        let result = encoder.transform(&vehicles());
        assert!(matches!(result, Err(ModelError::Encoder(EncoderError::NotFitted))));
    }

    #[test]
    fn one_hot_rejects_numeric_column() {
        let table = Table::from_columns([("Owner", Column::Numeric(array![0.0, 1.0]))]).unwrap();
        let mut encoder = OneHotEncoder::new(["Owner"]);
        let result = encoder.fit(&table, &Array1::zeros(2));
        assert!(matches!(result, Err(ModelError::Data(_))));
    }
}
