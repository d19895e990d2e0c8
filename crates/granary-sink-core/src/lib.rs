pub mod batch;
pub mod error;
pub mod flatten;
mod flush;
pub mod message;
pub mod schema;
pub mod sink;
pub mod trigger;

pub use error::{SinkError, SinkResult};
pub use sink::{emit_state, persist_lines};
