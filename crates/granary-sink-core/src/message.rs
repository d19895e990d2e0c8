use crate::error::{SinkError, SinkResult};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Schema {
        stream: String,
        schema: Value,
        key_properties: Vec<String>,
    },
    Record {
        stream: String,
        record: Value,
    },
    State {
        value: Value,
    },
    Unknown {
        message_type: String,
    },
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn require_stream(fields: &Map<String, Value>, line: &str) -> SinkResult<String> {
    fields
        .get("stream")
        .map(value_to_string)
        .ok_or_else(|| SinkError::missing_key("stream", line))
}

fn require_key_properties(fields: &Map<String, Value>, line: &str) -> SinkResult<Vec<String>> {
    match fields.get("key_properties") {
        None => Err(SinkError::missing_key("key_properties", line)),
        Some(Value::Array(items)) => Ok(items.iter().map(value_to_string).collect()),
        Some(_) => Err(SinkError::malformed(line)),
    }
}

pub fn parse_line(line: &str) -> SinkResult<Message> {
    let value: Value =
        serde_json::from_str(line).map_err(|_| SinkError::malformed(line))?;
    let Value::Object(fields) = value else {
        return Err(SinkError::malformed(line));
    };

    let message_type = fields
        .get("type")
        .map(value_to_string)
        .ok_or_else(|| SinkError::missing_key("type", line))?;

    match message_type.as_str() {
        "SCHEMA" => {
            let stream = require_stream(&fields, line)?;
            let schema = fields
                .get("schema")
                .cloned()
                .ok_or_else(|| SinkError::missing_key("schema", line))?;
            let key_properties = require_key_properties(&fields, line)?;
            Ok(Message::Schema {
                stream,
                schema,
                key_properties,
            })
        }
        "RECORD" => {
            let stream = require_stream(&fields, line)?;
            let record = fields
                .get("record")
                .cloned()
                .ok_or_else(|| SinkError::missing_key("record", line))?;
            Ok(Message::Record { stream, record })
        }
        "STATE" => {
            let value = fields
                .get("value")
                .cloned()
                .ok_or_else(|| SinkError::missing_key("value", line))?;
            Ok(Message::State { value })
        }
        other => Ok(Message::Unknown {
            message_type: other.to_string(),
        }),
    }
}
