use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    #[error("Column '{0}' not found")]
    MissingColumn(String),

    #[error("Column '{0}' is defined more than once")]
    DuplicateColumn(String),

    #[error("Column '{0}' is not numeric")]
    NotNumeric(String),

    #[error("Column '{0}' is not categorical")]
    NotCategorical(String),

    #[error("Column '{column}' has {actual} rows, expected {expected}")]
    LengthMismatch { column: String, actual: usize, expected: usize },

    #[error("Row index {index} out of bounds for table with {n_rows} rows")]
    RowOutOfBounds { index: usize, n_rows: usize },
}

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("Failed to open file: {0}")]
    FileOpen(#[from] std::io::Error),

    #[error("CSV file is empty")]
    EmptyFile,

    #[error("CSV header is missing or empty")]
    MissingHeader,

    #[error("Duplicate header '{0}'")]
    DuplicateHeader(String),

    #[error("Inconsistent column count: row {row} has {actual} columns, expected {expected}")]
    InconsistentColumns { row: usize, actual: usize, expected: usize },

    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),

    #[error("Failed to read zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Zip archive contains no members")]
    EmptyArchive,
}
