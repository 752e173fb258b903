//! Error types for the monitoring tracer.
//!
//! Only host protocol violations are errors. Reverts and faults of the traced
//! execution are recorded in the tree instead.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TracerError {
    #[error("{callback} called with no transaction being traced")]
    NoActiveTransaction { callback: &'static str },

    #[error("transaction start received while a trace is still held, reset the tracer first")]
    TransactionInProgress,

    #[error("{callback} called after the transaction end")]
    TransactionClosed { callback: &'static str },

    #[error("frame exit received with no open frame below the root")]
    UnbalancedExit,

    #[error("transaction end received with {open} frame(s) still open")]
    UnclosedFrames { open: usize },

    #[error("memory capture of {requested} bytes exceeds the {max} byte limit")]
    CaptureTooLarge { requested: usize, max: usize },

    #[error("cursor does not point to an open call frame")]
    CursorLost,
}
