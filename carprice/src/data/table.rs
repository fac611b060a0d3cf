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

use ndarray::{Array1, Array2};

use super::error::DataError;

/// A single named column of a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Array1<f64>),
    Categorical(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(values) => values.len(),
            Column::Categorical(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Numeric(_))
    }

    fn take(&self, indices: &[usize]) -> Column {
        match self {
            Column::Numeric(values) => {
                Column::Numeric(indices.iter().map(|&i| values[i]).collect())
            }
            Column::Categorical(values) => {
                Column::Categorical(indices.iter().map(|&i| values[i].clone()).collect())
            }
        }
    }
}

/// Column-oriented table with unique column names and equal column lengths.
///
/// Column order is preserved: it is the order of the CSV header for loaded
/// tables, and new columns are appended at the end.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
}

impl Table {
    pub fn new() -> Self {
        Table { names: Vec::new(), columns: Vec::new() }
    }

    /// Assembles a table from already validated parts: unique names and
    /// equally long columns.
    pub(crate) fn from_parts(names: Vec<String>, columns: Vec<Column>) -> Self {
        debug_assert_eq!(names.len(), columns.len());
        Table { names, columns }
    }

    /// Builds a table from `(name, column)` pairs.
    pub fn from_columns<S: Into<String>>(
        columns: impl IntoIterator<Item = (S, Column)>,
    ) -> Result<Self, DataError> {
        let mut table = Table::new();
        for (name, column) in columns {
            table.push_column(name, column)?;
        }
        Ok(table)
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Result<&Column, DataError> {
        self.position(name)
            .map(|idx| &self.columns[idx])
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    }

    pub fn numeric(&self, name: &str) -> Result<&Array1<f64>, DataError> {
        match self.column(name)? {
            Column::Numeric(values) => Ok(values),
            Column::Categorical(_) => Err(DataError::NotNumeric(name.to_string())),
        }
    }

    pub fn categorical(&self, name: &str) -> Result<&[String], DataError> {
        match self.column(name)? {
            Column::Categorical(values) => Ok(values),
            Column::Numeric(_) => Err(DataError::NotCategorical(name.to_string())),
        }
    }

    /// Appends a column. Fails on a duplicate name or a length that differs
    /// from the existing columns.
    pub fn push_column<S: Into<String>>(
        &mut self,
        name: S,
        column: Column,
    ) -> Result<(), DataError> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(DataError::DuplicateColumn(name));
        }
        if !self.columns.is_empty() && column.len() != self.n_rows() {
            return Err(DataError::LengthMismatch {
                column: name,
                actual: column.len(),
                expected: self.n_rows(),
            });
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    /// Returns a copy of the table without the named columns. Every name must
    /// exist.
    pub fn drop_columns(&self, names: &[&str]) -> Result<Table, DataError> {
        for name in names {
            if !self.has_column(name) {
                return Err(DataError::MissingColumn(name.to_string()));
            }
        }
        let (names, columns) = self
            .names
            .iter()
            .zip(self.columns.iter())
            .filter(|(name, _)| !names.contains(&name.as_str()))
            .map(|(name, column)| (name.clone(), column.clone()))
            .unzip();
        Ok(Table { names, columns })
    }

    /// Returns the rows at `indices`, in that order.
    pub fn take_rows(&self, indices: &[usize]) -> Result<Table, DataError> {
        let n_rows = self.n_rows();
        if let Some(&index) = indices.iter().find(|&&i| i >= n_rows) {
            return Err(DataError::RowOutOfBounds { index, n_rows });
        }
        Ok(Table {
            names: self.names.clone(),
            columns: self.columns.iter().map(|column| column.take(indices)).collect(),
        })
    }

    /// Stacks the named numeric columns into a `(n_rows, names.len())` matrix.
    pub fn numeric_matrix(&self, names: &[String]) -> Result<Array2<f64>, DataError> {
        let mut matrix = Array2::zeros((self.n_rows(), names.len()));
        for (j, name) in names.iter().enumerate() {
            matrix.column_mut(j).assign(self.numeric(name)?);
        }
        Ok(matrix)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}
