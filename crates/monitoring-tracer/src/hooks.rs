//! Callback set the host interpreter drives during a transaction.
//!
//! The host calls these in execution order on the thread running the
//! transaction. Enter/exit pairs are well nested. Every slice argument is
//! borrowed from host-owned buffers that may be reused once the callback
//! returns, so implementors copy whatever they retain.

use std::error::Error;

use ethereum_types::{Address, U256};

use crate::error::TracerError;

/// Interpreter state visible to per-instruction callbacks.
#[derive(Debug, Clone, Copy)]
pub struct OpScope<'a> {
    /// Contract whose code is executing.
    pub address: Address,
    /// Stack snapshot, bottom to top. The last element is the top.
    pub stack: &'a [U256],
    /// Memory snapshot of the current frame.
    pub memory: &'a [u8],
}

/// Outcome of the transaction as reported by the host at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TxReceipt {
    pub success: bool,
    pub gas_used: u64,
}

pub trait ExecutionHooks {
    /// The transaction starts. `recipient` is `None` for contract creation.
    fn on_tx_start(
        &mut self,
        sender: Address,
        recipient: Option<Address>,
        value: Option<U256>,
        payload: &[u8],
    ) -> Result<(), TracerError>;

    /// A new frame is entered. `kind` is the opcode byte that opened it.
    #[allow(clippy::too_many_arguments)]
    fn on_enter(
        &mut self,
        depth: usize,
        kind: u8,
        from: Address,
        to: Address,
        input: &[u8],
        gas: u64,
        value: Option<U256>,
    ) -> Result<(), TracerError>;

    /// Called before each instruction executes.
    #[allow(clippy::too_many_arguments)]
    fn on_opcode(
        &mut self,
        pc: u64,
        opcode: u8,
        gas: u64,
        cost: u64,
        scope: &OpScope<'_>,
        return_data: &[u8],
        depth: usize,
        err: Option<&dyn Error>,
    ) -> Result<(), TracerError>;

    /// The current frame returns, normally or not.
    fn on_exit(
        &mut self,
        depth: usize,
        output: &[u8],
        gas_used: u64,
        err: Option<&dyn Error>,
        reverted: bool,
    ) -> Result<(), TracerError>;

    /// Execution of the current frame halted abnormally at `opcode`.
    #[allow(clippy::too_many_arguments)]
    fn on_fault(
        &mut self,
        pc: u64,
        opcode: u8,
        gas: u64,
        cost: u64,
        scope: &OpScope<'_>,
        depth: usize,
        err: Option<&dyn Error>,
    ) -> Result<(), TracerError>;

    /// The transaction is finished.
    fn on_tx_end(
        &mut self,
        receipt: Option<&TxReceipt>,
        err: Option<&dyn Error>,
    ) -> Result<(), TracerError>;
}
