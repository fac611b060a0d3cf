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

use crate::data::error::CsvError;
use crate::data::table::{Column, Table};
use crate::data::DataLoader;
use log::debug;
use ndarray::Array1;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Loads a plain CSV file whose first row is a header.
pub struct CsvHeadersLoader;

/// Parses headered CSV text into a [`Table`].
///
/// A column is numeric when every field parses as `f64`; otherwise every
/// field is kept as a trimmed string.
pub(crate) fn read_csv_table<R: Read>(reader: R) -> Result<Table, CsvError> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).flexible(true).from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::MissingHeader);
    }
    for (i, header) in headers.iter().enumerate() {
        if headers[..i].contains(header) {
            return Err(CsvError::DuplicateHeader(header.clone()));
        }
    }

    let mut fields: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        if record.len() != headers.len() {
            return Err(CsvError::InconsistentColumns {
                row: i + 1,
                actual: record.len(),
                expected: headers.len(),
            });
        }
        for (col, field) in record.iter().enumerate() {
            fields[col].push(field.trim().to_string());
        }
    }

    let n_rows = fields[0].len();
    if n_rows == 0 {
        return Err(CsvError::EmptyFile);
    }

    let columns: Vec<Column> = fields.into_iter().map(infer_column).collect();
    for (name, column) in headers.iter().zip(columns.iter()) {
        let kind = if column.is_numeric() { "numeric" } else { "categorical" };
        debug!("column '{}' parsed as {}", name, kind);
    }
    Ok(Table::from_parts(headers, columns))
}

fn infer_column(values: Vec<String>) -> Column {
    let parsed: Result<Array1<f64>, _> = values.iter().map(|v| v.parse::<f64>()).collect();
    match parsed {
        Ok(numbers) => Column::Numeric(numbers),
        Err(_) => Column::Categorical(values),
    }
}

impl DataLoader for CsvHeadersLoader {
    type Error = CsvError;

    fn load<P: AsRef<Path>>(path: P) -> Result<Table, CsvError> {
        let file = File::open(path.as_ref())?;
        read_csv_table(file)
    }
}
