use thiserror::Error;

/// Errors that can occur while parsing or evaluating a visibility condition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConditionError {
    #[error("Unexpected character '{found}' at offset {offset} in condition '{text}'")]
    UnexpectedCharacter {
        text: String,
        found: char,
        offset: usize,
    },

    #[error("Unterminated string literal in condition '{0}'")]
    UnterminatedString(String),

    #[error("Unexpected token '{found}' in condition '{text}': expected {expected}")]
    UnexpectedToken {
        text: String,
        found: String,
        expected: String,
    },

    #[error("Identifier '{0}' is not a literal and cannot be compared")]
    UnresolvedIdentifier(String),

    #[error("Operator '{operator}' requires numeric operands, but found '{found}'")]
    NotANumber { operator: String, found: String },
}

/// Errors raised while turning a block definition into renderer props.
#[derive(Error, Debug, Clone)]
pub enum BlockError {
    #[error("Block of type '{block_type}' has invalid props: {message}")]
    InvalidProps { block_type: String, message: String },
}

/// Errors produced by an I/O rules engine.
#[derive(Error, Debug, Clone)]
pub enum IoRulesError {
    #[error("I/O rule {index} is malformed: {message}")]
    MalformedRule { index: usize, message: String },

    #[error("I/O rule {index} has an invalid repeat count '{count}'")]
    InvalidCount { index: usize, count: String },
}

/// Errors returned by a [`RuntimeDataSource`](crate::runtime::RuntimeDataSource).
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    #[error("Runtime request to '{endpoint}' failed: {message}")]
    Transport { endpoint: String, message: String },

    #[error("Runtime request to '{endpoint}' returned status {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Runtime response from '{endpoint}' could not be decoded: {message}")]
    Decode { endpoint: String, message: String },

    #[error("Runtime request to '{endpoint}' timed out after {millis} ms")]
    Timeout { endpoint: String, millis: u64 },
}

/// Errors that can occur while loading the engine configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    JsonParseError(String),
}

/// Errors that can occur while loading a node metadata catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Could not read catalog file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog JSON: {0}")]
    JsonParseError(String),
}
