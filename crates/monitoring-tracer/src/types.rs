//! Core data types for the monitoring tracer.

use std::fmt;

use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use serde::{Deserialize, Serialize, Serializer};

use crate::memory::to_hex;
use crate::opcodes;

/// Largest LOG/REVERT payload captured by default (16 MiB).
pub const DEFAULT_MAX_CAPTURE_SIZE: usize = 16 * 1024 * 1024;

/// Tracer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracerConfig {
    /// Upper bound on the byte length of LOG data and REVERT reasons.
    /// A larger requested size fails the callback with
    /// [`TracerError::CaptureTooLarge`](crate::TracerError::CaptureTooLarge).
    pub max_capture_size: usize,
    /// Record implicit VM halts (out of gas, invalid opcode, ...) as `panic`
    /// reverts.
    pub record_faults: bool,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            max_capture_size: DEFAULT_MAX_CAPTURE_SIZE,
            record_faults: true,
        }
    }
}

/// Kind of a call frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// The transaction itself (tree root).
    InitialCall,
    Call,
    DelegateCall,
    StaticCall,
    /// Any other frame-opening opcode reported by the host.
    Unknown(u8),
}

impl CallKind {
    /// Map the opcode byte the host reports on frame enter.
    pub fn from_opcode(opcode: u8) -> Self {
        match opcode {
            opcodes::CALL => Self::Call,
            opcodes::DELEGATECALL => Self::DelegateCall,
            opcodes::STATICCALL => Self::StaticCall,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitialCall => f.write_str("initial_call"),
            Self::Call => f.write_str("call"),
            Self::DelegateCall => f.write_str("delegatecall"),
            Self::StaticCall => f.write_str("staticcall"),
            Self::Unknown(opcode) => write!(f, "unknown {opcode}"),
        }
    }
}

impl Serialize for CallKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// LOG0..LOG4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    Log0,
    Log1,
    Log2,
    Log3,
    Log4,
}

impl LogKind {
    pub fn from_opcode(opcode: u8) -> Option<Self> {
        match opcode {
            opcodes::LOG0 => Some(Self::Log0),
            opcodes::LOG1 => Some(Self::Log1),
            opcodes::LOG2 => Some(Self::Log2),
            opcodes::LOG3 => Some(Self::Log3),
            opcodes::LOG4 => Some(Self::Log4),
            _ => None,
        }
    }

    /// Number of topic words the opcode pops after offset and size.
    pub fn topic_count(self) -> usize {
        match self {
            Self::Log0 => 0,
            Self::Log1 => 1,
            Self::Log2 => 2,
            Self::Log3 => 3,
            Self::Log4 => 4,
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "log{}", self.topic_count())
    }
}

impl Serialize for LogKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Why a frame stopped abnormally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RevertKind {
    /// Explicit REVERT instruction.
    Revert,
    /// Implicit VM halt: out of gas, invalid opcode, stack under/overflow...
    Panic,
}

impl fmt::Display for RevertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Revert => f.write_str("revert"),
            Self::Panic => f.write_str("panic"),
        }
    }
}

/// A call frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub kind: CallKind,
    pub from: Address,
    pub to: Address,
    pub input: Bytes,
    pub input_hex: String,
    pub value: U256,
    /// `0x` followed by the minimal-width hex of `value`.
    pub value_hex: String,
    /// Set once, when the frame exits (root: at transaction end).
    pub output: Option<Bytes>,
    pub output_hex: Option<String>,
    /// Address whose storage this frame executes against.
    pub context: Address,
    /// Address whose bytecode executes.
    pub code: Address,
    /// Context handed to frames opened by this one.
    pub forwarded_context: Address,
    /// Code address handed to frames opened by this one.
    pub forwarded_code: Address,
}

impl Call {
    /// Root frame of a transaction. A contract creation has no recipient and
    /// is traced against the zero address.
    pub fn initial(sender: Address, recipient: Option<Address>, payload: &[u8], value: U256) -> Self {
        let to = recipient.unwrap_or_default();
        let input = Bytes::copy_from_slice(payload);
        Self {
            kind: CallKind::InitialCall,
            from: sender,
            to,
            input_hex: to_hex(&input),
            input,
            value,
            value_hex: format_value(value),
            output: None,
            output_hex: None,
            context: Address::zero(),
            code: Address::zero(),
            forwarded_context: to,
            forwarded_code: to,
        }
    }

    /// A frame opened from a frame that forwards `inherited` as its
    /// `(context, code)`. A delegated call keeps forwarding the caller's
    /// storage while running the callee's code.
    pub fn nested(
        kind: CallKind,
        from: Address,
        to: Address,
        input: &[u8],
        value: U256,
        inherited: (Address, Address),
    ) -> Self {
        let (context, code) = inherited;
        let forwarded_context = match kind {
            CallKind::DelegateCall => from,
            _ => to,
        };
        let input = Bytes::copy_from_slice(input);
        Self {
            kind,
            from,
            to,
            input_hex: to_hex(&input),
            input,
            value,
            value_hex: format_value(value),
            output: None,
            output_hex: None,
            context,
            code,
            forwarded_context,
            forwarded_code: to,
        }
    }

    /// `(context, code)` assigned to frames, events and reverts under this one.
    pub fn forwarded(&self) -> (Address, Address) {
        (self.forwarded_context, self.forwarded_code)
    }

    pub(crate) fn set_output(&mut self, output: &[u8]) {
        let output = Bytes::copy_from_slice(output);
        self.output_hex = Some(to_hex(&output));
        self.output = Some(output);
    }
}

/// A LOGn emitted by a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: LogKind,
    pub data: Bytes,
    pub data_hex: String,
    pub topics: Vec<H256>,
    /// Contract executing the LOG instruction.
    pub from: Address,
    pub context: Address,
    pub code: Address,
}

/// An explicit REVERT or an implicit VM halt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revert {
    pub kind: RevertKind,
    /// Revert reason. Always empty for [`RevertKind::Panic`].
    pub data: Bytes,
    pub data_hex: String,
    pub from: Address,
    pub context: Address,
    pub code: Address,
}

/// Payload of a node in the action tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Call(Call),
    Event(Event),
    Revert(Revert),
}

impl Action {
    /// Type tag: `call`, `event` or `revert`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Call(_) => "call",
            Self::Event(_) => "event",
            Self::Revert(_) => "revert",
        }
    }

    pub fn from(&self) -> Address {
        match self {
            Self::Call(call) => call.from,
            Self::Event(event) => event.from,
            Self::Revert(revert) => revert.from,
        }
    }

    pub fn context(&self) -> Address {
        match self {
            Self::Call(call) => call.context,
            Self::Event(event) => event.context,
            Self::Revert(revert) => revert.context,
        }
    }

    pub fn code(&self) -> Address {
        match self {
            Self::Call(call) => call.code,
            Self::Event(event) => event.code,
            Self::Revert(revert) => revert.code,
        }
    }

    pub fn as_call(&self) -> Option<&Call> {
        match self {
            Self::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_event(&self) -> Option<&Event> {
        match self {
            Self::Event(event) => Some(event),
            _ => None,
        }
    }

    pub fn as_revert(&self) -> Option<&Revert> {
        match self {
            Self::Revert(revert) => Some(revert),
            _ => None,
        }
    }
}

fn format_value(value: U256) -> String {
    format!("0x{value:x}")
}
