use crate::error::{SinkError, SinkResult};
use jsonschema::{Draft, Validator};
use serde_json::Value;
use std::collections::HashMap;

pub struct StreamSchema {
    pub schema: Value,
    pub key_properties: Vec<String>,
    validator: Validator,
}

#[derive(Default)]
pub struct SchemaRegistry {
    streams: HashMap<String, StreamSchema>,
}

impl SchemaRegistry {
    // Repeat SCHEMA messages for the same stream overwrite the prior entry.
    pub fn register(
        &mut self,
        stream: &str,
        schema: Value,
        key_properties: Vec<String>,
    ) -> SinkResult<()> {
        let validator = jsonschema::options()
            .with_draft(Draft::Draft4)
            .build(&schema)
            .map_err(|error| SinkError::InvalidSchema {
                stream: stream.to_string(),
                message: error.to_string(),
            })?;

        self.streams.insert(
            stream.to_string(),
            StreamSchema {
                schema,
                key_properties,
                validator,
            },
        );
        Ok(())
    }

    pub fn contains(&self, stream: &str) -> bool {
        self.streams.contains_key(stream)
    }

    pub fn key_properties(&self, stream: &str) -> Option<&[String]> {
        self.streams
            .get(stream)
            .map(|entry| entry.key_properties.as_slice())
    }

    pub fn validate(&self, stream: &str, record: &Value) -> SinkResult<()> {
        let entry = self
            .streams
            .get(stream)
            .ok_or_else(|| SinkError::UnknownStream(stream.to_string()))?;

        entry
            .validator
            .validate(record)
            .map_err(|error| SinkError::Validation {
                stream: stream.to_string(),
                message: error.to_string(),
            })
    }
}
