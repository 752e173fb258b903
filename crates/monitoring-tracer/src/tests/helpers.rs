//! Shared test helpers: a minimal scripted host driving the tracer.

use std::error::Error;
use std::fmt;

use ethereum_types::{Address, U256};

use crate::hooks::{ExecutionHooks, OpScope};
use crate::tracer::MonitoringTracer;

pub const SENDER: u64 = 0x100;
pub const CONTRACT: u64 = 0x42;

pub fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

/// Route tracer logs to the test output. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

#[derive(Debug)]
pub struct HostError(pub &'static str);

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Error for HostError {}

/// Stack snapshot (bottom to top) as seen right before a LOG or REVERT:
/// `offset` on top, then `size`, then the topics in order.
pub fn log_stack(offset: u64, size: u64, topics: &[U256]) -> Vec<U256> {
    let mut stack: Vec<U256> = topics.iter().rev().copied().collect();
    stack.push(U256::from(size));
    stack.push(U256::from(offset));
    stack
}

pub fn start(tracer: &mut MonitoringTracer, to: u64) {
    tracer
        .on_tx_start(addr(SENDER), Some(addr(to)), None, &[])
        .expect("tx start");
}

pub fn enter(tracer: &mut MonitoringTracer, kind: u8, from: u64, to: u64) {
    tracer
        .on_enter(0, kind, addr(from), addr(to), &[], 100_000, None)
        .expect("enter");
}

pub fn exit(tracer: &mut MonitoringTracer, output: &[u8]) {
    tracer
        .on_exit(0, output, 21_000, None, false)
        .expect("exit");
}

pub fn end(tracer: &mut MonitoringTracer) {
    tracer.on_tx_end(None, None).expect("tx end");
}

pub fn step(tracer: &mut MonitoringTracer, opcode: u8, address: u64, stack: &[U256], memory: &[u8]) {
    let scope = OpScope {
        address: addr(address),
        stack,
        memory,
    };
    tracer
        .on_opcode(0, opcode, 1_000_000, 3, &scope, &[], 0, None)
        .expect("opcode");
}

pub fn fault(tracer: &mut MonitoringTracer, opcode: u8, address: u64) {
    let scope = OpScope {
        address: addr(address),
        stack: &[],
        memory: &[],
    };
    let err = HostError("out of gas");
    tracer
        .on_fault(7, opcode, 0, 3, &scope, 0, Some(&err))
        .expect("fault");
}
