use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Catalog is empty")]
    EmptyCatalog,

    #[error("None of the declared feature columns are present in the catalog")]
    NoFeatureColumns,

    #[error("Duplicate item id: {0}")]
    DuplicateItem(u64),

    #[error("Unknown item id: {0}")]
    UnknownItem(u64),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Feature columns do not match the scaling model: expected [{expected}], got [{actual}]")]
    ColumnOrderMismatch { expected: String, actual: String },

    #[error("Requested {requested} matches but only {available} clusters exist")]
    TooManyMatches { requested: usize, available: usize },

    #[error("Clustering error: {0}")]
    Clustering(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
