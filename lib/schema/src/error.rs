use thiserror::Error;

pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors raised while resolving mapping tables and profiles
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Profile must be a JSON object, got {0}")]
    ProfileNotObject(String),

    #[error("Unsupported value for profile field '{0}'")]
    UnsupportedValue(String),
}
