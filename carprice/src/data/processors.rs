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
use ndarray::Array1;

use super::error::DataError;
use super::table::{Column, Table};

/// Reference year used to derive vehicle age. Fixed so runs are reproducible.
pub const REFERENCE_YEAR: i32 = 2021;

pub const YEAR_COLUMN: &str = "Year";
pub const AGE_COLUMN: &str = "Age";
pub const NAME_COLUMN: &str = "Car_Name";
pub const TARGET_COLUMN: &str = "Present_Price";

/// Derives `Age = reference_year - Year` and drops the `Year` and `Car_Name`
/// columns. `Age` is appended as the last column.
pub fn add_vehicle_age(table: &Table, reference_year: i32) -> Result<Table, DataError> {
    let years = table.numeric(YEAR_COLUMN)?;
    let age: Array1<f64> = years.mapv(|year| f64::from(reference_year) - year);

    let mut transformed = table.drop_columns(&[YEAR_COLUMN, NAME_COLUMN])?;
    transformed.push_column(AGE_COLUMN, Column::Numeric(age))?;
    debug!(
        "Derived '{}' from '{}' (reference year {}), {} columns remain",
        AGE_COLUMN,
        YEAR_COLUMN,
        reference_year,
        transformed.n_cols()
    );
    Ok(transformed)
}

/// Separates the numeric `target` column from the remaining feature columns.
pub fn split_features_target(
    table: &Table,
    target: &str,
) -> Result<(Table, Array1<f64>), DataError> {
    let y = table.numeric(target)?.clone();
    let x = table.drop_columns(&[target])?;
    Ok((x, y))
}
