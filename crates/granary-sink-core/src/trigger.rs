#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    BatchSize,
    StreamChange,
}

impl FlushReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BatchSize => "batch size reached",
            Self::StreamChange => "stream boundary crossed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushDecision {
    Skip,
    Flush { stream: String, reason: FlushReason },
}

// Pure decision over the counters for the record just appended. At most one
// flush per incoming record; the batch-size trigger wins when both apply.
pub fn evaluate(
    record_count: u64,
    sync_batch: Option<u64>,
    sync_if_stream_changes: bool,
    previous_stream: Option<&str>,
    current_stream: &str,
) -> FlushDecision {
    if let Some(batch_size) = sync_batch {
        if batch_size > 0 && record_count % batch_size == 0 {
            return FlushDecision::Flush {
                stream: current_stream.to_string(),
                reason: FlushReason::BatchSize,
            };
        }
    }

    if sync_if_stream_changes {
        if let Some(previous) = previous_stream {
            if previous != current_stream {
                return FlushDecision::Flush {
                    stream: previous.to_string(),
                    reason: FlushReason::StreamChange,
                };
            }
        }
    }

    FlushDecision::Skip
}
