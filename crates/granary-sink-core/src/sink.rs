use crate::batch::BatchStore;
use crate::flatten::flatten;
use crate::flush::flush_stream;
use crate::message::{parse_line, Message};
use crate::schema::SchemaRegistry;
use crate::trigger::{evaluate, FlushDecision};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use granary_config::AppConfig;
use granary_gcs::GcsClient;
use serde_json::Value;
use std::io::{BufRead, Write};
use tracing::{debug, warn};

// Drives the whole run: one input line is fully handled (parsed, validated,
// flattened, appended, possibly flushed) before the next is read. Returns the
// final checkpoint, which is only non-None when no record followed the last
// STATE message.
pub async fn persist_lines<R: BufRead>(
    config: &AppConfig,
    client: &GcsClient,
    input: R,
) -> Result<Option<Value>> {
    let mut registry = SchemaRegistry::default();
    let mut store = BatchStore::new()?;
    let mut state: Option<Value> = None;
    let mut previous_stream: Option<String> = None;

    // Fixed once per run, so every batch of a stream lands under the same
    // timestamp folder.
    let run_timestamp = config
        .append_timestamp_folder
        .then(|| Utc::now().format("%Y%m%dT%H%M%S").to_string());

    for line in input.lines() {
        let line = line.context("failed to read input line")?;
        if line.trim().is_empty() {
            continue;
        }

        match parse_line(&line)? {
            Message::Schema {
                stream,
                schema,
                key_properties,
            } => {
                registry.register(&stream, schema, key_properties)?;
            }
            Message::Record { stream, record } => {
                registry.validate(&stream, &record)?;

                let Value::Object(fields) = &record else {
                    bail!("record for stream `{stream}` is not an object: {record}");
                };
                let flattened = flatten(fields);
                let count = store.append(&stream, &flattened)?;

                let decision = evaluate(
                    count,
                    config.sync_batch,
                    config.sync_if_stream_changes,
                    previous_stream.as_deref(),
                    &stream,
                );

                if let FlushDecision::Flush {
                    stream: target,
                    reason,
                } = decision
                {
                    debug!("flushing stream {target}: {}", reason.as_str());
                    let flushed = match store.batch_mut(&target) {
                        Some(batch) => {
                            flush_stream(client, config, &target, batch, run_timestamp.as_deref())
                                .await?
                        }
                        None => false,
                    };
                    if flushed {
                        store.advance(&target);
                    }
                }

                // A buffered record is not yet durable, so the pending
                // checkpoint no longer holds.
                state = None;
                previous_stream = Some(stream);
            }
            Message::State { value } => {
                debug!("setting state to {value}");
                state = Some(value);
            }
            Message::Unknown { message_type } => {
                warn!("unknown message type {message_type} in message {line}");
            }
        }
    }

    // End of input: drain every non-empty buffer at its current sequence.
    for stream in store.stream_names() {
        if let Some(batch) = store.batch_mut(&stream) {
            flush_stream(client, config, &stream, batch, run_timestamp.as_deref()).await?;
        }
    }

    Ok(state)
}

pub fn emit_state(state: Option<&Value>, out: &mut impl Write) -> Result<()> {
    if let Some(state) = state {
        let line = serde_json::to_string(state).context("failed to encode state")?;
        debug!("emitting state {line}");
        writeln!(out, "{line}").context("failed to write state line")?;
        out.flush().context("failed to flush state output")?;
    }
    Ok(())
}
