use thiserror::Error;

pub type SinkResult<T> = Result<T, SinkError>;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("unable to parse line as JSON: {line}")]
    MalformedLine { line: String },
    #[error("line is missing required key `{key}`: {line}")]
    MissingKey { key: &'static str, line: String },
    #[error("a record for stream `{0}` was encountered before a corresponding schema")]
    UnknownStream(String),
    #[error("invalid schema for stream `{stream}`: {message}")]
    InvalidSchema { stream: String, message: String },
    #[error("record does not match the schema for stream `{stream}`: {message}")]
    Validation { stream: String, message: String },
}

impl SinkError {
    pub fn malformed(line: impl Into<String>) -> Self {
        Self::MalformedLine { line: line.into() }
    }

    pub fn missing_key(key: &'static str, line: impl Into<String>) -> Self {
        Self::MissingKey {
            key,
            line: line.into(),
        }
    }
}
