//! [`ExecutionHooks`] implementation that builds an [`ActionTree`].

use std::error::Error;

use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use tracing::{debug, error, trace};

use crate::error::TracerError;
use crate::hooks::{ExecutionHooks, OpScope, TxReceipt};
use crate::memory::{narrow_word, read_padded, stack_hash_from_top, stack_word_from_top, to_hex};
use crate::opcodes;
use crate::tree::{ActionId, ActionTree};
use crate::types::{Action, Call, CallKind, Event, LogKind, Revert, RevertKind, TracerConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TraceState {
    /// No transaction; the tree is empty.
    Idle,
    /// Transaction running, `cursor` is the innermost open frame.
    Open { cursor: ActionId },
    /// Transaction finished; the tree is complete until [`MonitoringTracer::reset`].
    /// The cursor rests at the root.
    Closed,
}

/// Builds the call/event/revert tree of one transaction at a time.
///
/// The tracer is reused across transactions: call [`MonitoringTracer::reset`]
/// (or [`MonitoringTracer::take_trace`]) after consuming a finished trace.
#[derive(Debug)]
pub struct MonitoringTracer {
    config: TracerConfig,
    tree: ActionTree,
    state: TraceState,
}

impl Default for MonitoringTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitoringTracer {
    pub fn new() -> Self {
        Self::with_config(TracerConfig::default())
    }

    pub fn with_config(config: TracerConfig) -> Self {
        Self {
            config,
            tree: ActionTree::default(),
            state: TraceState::Idle,
        }
    }

    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    /// The tree under construction, or the finished one after transaction end.
    pub fn trace(&self) -> Option<&ActionTree> {
        match self.state {
            TraceState::Idle => None,
            TraceState::Open { .. } | TraceState::Closed => Some(&self.tree),
        }
    }

    /// Move the finished tree out, leaving the tracer idle.
    ///
    /// Returns `None` unless the transaction has ended.
    pub fn take_trace(&mut self) -> Option<ActionTree> {
        if self.state != TraceState::Closed {
            return None;
        }
        self.state = TraceState::Idle;
        Some(std::mem::take(&mut self.tree))
    }

    /// Innermost open frame while a transaction is running, the root once it
    /// has ended.
    pub fn cursor(&self) -> Option<ActionId> {
        match self.state {
            TraceState::Open { cursor } => Some(cursor),
            TraceState::Closed => Some(ActionId::ROOT),
            TraceState::Idle => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == TraceState::Idle
    }

    pub fn is_closed(&self) -> bool {
        self.state == TraceState::Closed
    }

    /// Discard the current tree and cursor.
    pub fn reset(&mut self) {
        if self.state != TraceState::Idle {
            debug!(nodes = self.tree.len(), "Discarding trace");
        }
        self.tree.clear();
        self.state = TraceState::Idle;
    }

    fn open_cursor(&self, callback: &'static str) -> Result<ActionId, TracerError> {
        match self.state {
            TraceState::Open { cursor } => Ok(cursor),
            TraceState::Idle => Err(violation(TracerError::NoActiveTransaction { callback })),
            TraceState::Closed => Err(violation(TracerError::TransactionClosed { callback })),
        }
    }

    /// `(context, code)` the cursor frame forwards to anything created under it.
    fn inherited(&self, cursor: ActionId) -> Result<(Address, Address), TracerError> {
        self.tree
            .action(cursor)
            .and_then(Action::as_call)
            .map(Call::forwarded)
            .ok_or_else(|| violation(TracerError::CursorLost))
    }

    fn push(&mut self, cursor: ActionId, action: Action) -> Result<ActionId, TracerError> {
        let type_name = action.type_name();
        let id = self
            .tree
            .push_child(cursor, action)
            .ok_or_else(|| violation(TracerError::CursorLost))?;
        trace!(node = id.index(), parent = cursor.index(), kind = type_name, "Recorded action");
        Ok(id)
    }

    /// Read `size` bytes at `offset` from the top two stack words.
    ///
    /// A stack with fewer than two words reads as offset 0, size 0. A size
    /// above `max_capture_size` is rejected rather than truncated.
    fn capture_memory(&self, scope: &OpScope<'_>) -> Result<Bytes, TracerError> {
        let (offset, size) = match (
            stack_word_from_top(scope.stack, 0),
            stack_word_from_top(scope.stack, 1),
        ) {
            (Some(offset), Some(size)) => (narrow_word(offset), narrow_word(size)),
            _ => (0, 0),
        };
        let max = self.config.max_capture_size;
        if size > max {
            return Err(violation(TracerError::CaptureTooLarge {
                requested: size,
                max,
            }));
        }
        Ok(Bytes::from(read_padded(scope.memory, offset, size)))
    }

    fn record_log(
        &mut self,
        cursor: ActionId,
        kind: LogKind,
        scope: &OpScope<'_>,
    ) -> Result<(), TracerError> {
        let data = self.capture_memory(scope)?;
        // LOG stack: [offset, size, topic0, topic1, ...]
        let topics: Vec<H256> = (0..kind.topic_count())
            .filter_map(|i| stack_hash_from_top(scope.stack, i.saturating_add(2)))
            .collect();
        let (context, code) = self.inherited(cursor)?;
        self.push(
            cursor,
            Action::Event(Event {
                kind,
                data_hex: to_hex(&data),
                data,
                topics,
                from: scope.address,
                context,
                code,
            }),
        )?;
        Ok(())
    }

    fn record_revert(
        &mut self,
        cursor: ActionId,
        kind: RevertKind,
        data: Bytes,
        from: Address,
    ) -> Result<(), TracerError> {
        let (context, code) = self.inherited(cursor)?;
        self.push(
            cursor,
            Action::Revert(Revert {
                kind,
                data_hex: to_hex(&data),
                data,
                from,
                context,
                code,
            }),
        )?;
        Ok(())
    }
}

impl ExecutionHooks for MonitoringTracer {
    fn on_tx_start(
        &mut self,
        sender: Address,
        recipient: Option<Address>,
        value: Option<U256>,
        payload: &[u8],
    ) -> Result<(), TracerError> {
        if self.state != TraceState::Idle {
            return Err(violation(TracerError::TransactionInProgress));
        }
        let root = Call::initial(sender, recipient, payload, value.unwrap_or_default());
        debug!(
            from = ?root.from,
            to = ?root.to,
            value = %root.value_hex,
            input_len = payload.len(),
            "Tracing transaction"
        );
        self.tree.reset_root(root);
        self.state = TraceState::Open {
            cursor: ActionId::ROOT,
        };
        Ok(())
    }

    fn on_enter(
        &mut self,
        depth: usize,
        kind: u8,
        from: Address,
        to: Address,
        input: &[u8],
        _gas: u64,
        value: Option<U256>,
    ) -> Result<(), TracerError> {
        let cursor = self.open_cursor("on_enter")?;
        let kind = CallKind::from_opcode(kind);
        let call = Call::nested(
            kind,
            from,
            to,
            input,
            value.unwrap_or_default(),
            self.inherited(cursor)?,
        );
        trace!(%kind, ?from, ?to, host_depth = depth, "Entering frame");
        let id = self.push(cursor, Action::Call(call))?;
        self.state = TraceState::Open { cursor: id };
        Ok(())
    }

    fn on_opcode(
        &mut self,
        _pc: u64,
        opcode: u8,
        _gas: u64,
        _cost: u64,
        scope: &OpScope<'_>,
        _return_data: &[u8],
        _depth: usize,
        _err: Option<&dyn Error>,
    ) -> Result<(), TracerError> {
        let cursor = self.open_cursor("on_opcode")?;
        if let Some(kind) = LogKind::from_opcode(opcode) {
            self.record_log(cursor, kind, scope)?;
        } else if opcode == opcodes::REVERT {
            let data = self.capture_memory(scope)?;
            self.record_revert(cursor, RevertKind::Revert, data, scope.address)?;
        }
        Ok(())
    }

    fn on_exit(
        &mut self,
        depth: usize,
        output: &[u8],
        gas_used: u64,
        err: Option<&dyn Error>,
        reverted: bool,
    ) -> Result<(), TracerError> {
        let cursor = self.open_cursor("on_exit")?;
        if cursor == ActionId::ROOT {
            return Err(violation(TracerError::UnbalancedExit));
        }
        let parent = self
            .tree
            .parent(cursor)
            .ok_or_else(|| violation(TracerError::CursorLost))?;
        self.tree
            .call_mut(cursor)
            .ok_or_else(|| violation(TracerError::CursorLost))?
            .set_output(output);
        trace!(
            host_depth = depth,
            output_len = output.len(),
            gas_used,
            reverted,
            err = err.map(tracing::field::display),
            "Exiting frame"
        );
        self.state = TraceState::Open { cursor: parent };
        Ok(())
    }

    fn on_fault(
        &mut self,
        pc: u64,
        opcode: u8,
        _gas: u64,
        _cost: u64,
        scope: &OpScope<'_>,
        _depth: usize,
        err: Option<&dyn Error>,
    ) -> Result<(), TracerError> {
        let cursor = self.open_cursor("on_fault")?;
        // An explicit REVERT was already recorded by on_opcode.
        if opcode == opcodes::REVERT || !self.config.record_faults {
            return Ok(());
        }
        trace!(pc, opcode, err = err.map(tracing::field::display), "Frame faulted");
        self.record_revert(cursor, RevertKind::Panic, Bytes::new(), scope.address)
    }

    fn on_tx_end(
        &mut self,
        receipt: Option<&TxReceipt>,
        err: Option<&dyn Error>,
    ) -> Result<(), TracerError> {
        let cursor = self.open_cursor("on_tx_end")?;
        if cursor != ActionId::ROOT {
            let open = self.tree.depth(cursor).unwrap_or_default();
            return Err(violation(TracerError::UnclosedFrames { open }));
        }

        // The transaction's output is the output of the first frame it opened.
        // A plain value transfer opens none and keeps an empty output.
        let output = self
            .tree
            .children(ActionId::ROOT)
            .iter()
            .find_map(|id| self.tree.action(*id).and_then(Action::as_call))
            .and_then(|call| call.output.clone())
            .unwrap_or_default();
        self.tree
            .call_mut(ActionId::ROOT)
            .ok_or_else(|| violation(TracerError::CursorLost))?
            .set_output(&output);

        debug!(
            nodes = self.tree.len(),
            success = receipt.map(|r| r.success),
            gas_used = receipt.map(|r| r.gas_used),
            err = err.map(tracing::field::display),
            "Transaction traced"
        );
        self.state = TraceState::Closed;
        Ok(())
    }
}

fn violation(err: TracerError) -> TracerError {
    error!(%err, "Host protocol violation");
    err
}
