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

use crate::data::csv::read_csv_table;
use crate::data::error::CsvError;
use crate::data::table::Table;
use crate::data::DataLoader;
use log::info;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use zip::ZipArchive;

/// Loads the first member of a zip archive as a headered CSV file.
///
/// "First" is the first entry of the archive's central directory; member
/// names are not sorted.
pub struct ZipCsvLoader;

impl DataLoader for ZipCsvLoader {
    type Error = CsvError;

    fn load<P: AsRef<Path>>(path: P) -> Result<Table, CsvError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;
        if archive.is_empty() {
            return Err(CsvError::EmptyArchive);
        }

        let member = archive.by_index(0)?;
        info!("Reading '{}' from {}", member.name(), path.display());
        let table = read_csv_table(member)?;
        info!("Loaded {} rows and {} columns", table.n_rows(), table.n_cols());
        Ok(table)
    }
}
