//! Monitoring call tracer
//!
//! Builds a hierarchical trace of one EVM transaction from the callbacks the
//! host interpreter emits: every call frame entered, every LOG emitted and
//! every revert or fault encountered. Storage context and code address are
//! tracked separately so delegated calls report the storage they actually
//! write to.

pub mod error;
pub mod hooks;
pub mod memory;
pub mod opcodes;
pub mod tracer;
pub mod tree;
pub mod types;

pub use error::TracerError;
pub use hooks::{ExecutionHooks, OpScope, TxReceipt};
pub use tracer::MonitoringTracer;
pub use tree::{ActionId, ActionNode, ActionTree};
pub use types::{Action, Call, CallKind, Event, LogKind, Revert, RevertKind, TracerConfig};

#[cfg(test)]
#[allow(clippy::expect_used, clippy::indexing_slicing)]
mod tests;
