//! LOG decoding: memory extraction with zero-fill and topic reads.

use ethereum_types::{H256, U256};

use super::helpers::{CONTRACT, addr, enter, init_tracing, log_stack, start, step};
use crate::error::TracerError;
use crate::hooks::{ExecutionHooks, OpScope};
use crate::opcodes::{CALL, LOG0, LOG2, LOG4, REVERT};
use crate::tracer::MonitoringTracer;
use crate::tree::ActionId;
use crate::types::{Event, LogKind, TracerConfig};

fn only_event(tracer: &MonitoringTracer) -> Event {
    let tree = tracer.trace().expect("trace");
    let mut events = tree.events();
    let (_, event) = events.next().expect("an event");
    assert!(events.next().is_none(), "exactly one event expected");
    event.clone()
}

fn topic(n: u64) -> U256 {
    U256::from(n)
}

fn tracer_in_frame() -> MonitoringTracer {
    let mut tracer = MonitoringTracer::new();
    start(&mut tracer, CONTRACT);
    enter(&mut tracer, CALL, 0x1, CONTRACT);
    tracer
}

#[test]
fn log2_reading_past_memory_end_is_zero_filled() {
    init_tracing();
    let mut tracer = tracer_in_frame();
    let memory: Vec<u8> = (1u8..=32).collect();
    let stack = log_stack(0, 64, &[topic(0xaa), topic(0xbb)]);
    step(&mut tracer, LOG2, CONTRACT, &stack, &memory);

    let event = only_event(&tracer);
    assert_eq!(event.kind, LogKind::Log2);
    assert_eq!(event.data.len(), 64);
    assert_eq!(&event.data[..32], memory.as_slice());
    assert!(event.data[32..].iter().all(|b| *b == 0));
    assert_eq!(
        event.topics,
        vec![
            H256::from_low_u64_be(0xaa),
            H256::from_low_u64_be(0xbb)
        ]
    );
    assert_eq!(event.from, addr(CONTRACT));
}

#[test]
fn log_data_hex_matches_bytes() {
    let mut tracer = tracer_in_frame();
    let memory = vec![0xde, 0xad, 0xbe, 0xef];
    let stack = log_stack(1, 2, &[]);
    step(&mut tracer, LOG0, CONTRACT, &stack, &memory);

    let event = only_event(&tracer);
    assert_eq!(event.kind, LogKind::Log0);
    assert_eq!(event.data.as_ref(), &[0xad, 0xbe]);
    assert_eq!(event.data_hex, "0xadbe");
    assert!(event.topics.is_empty());
}

#[test]
fn offset_beyond_memory_reads_zeroes() {
    let mut tracer = tracer_in_frame();
    let memory = vec![0xffu8; 16];
    let stack = log_stack(16, 8, &[]);
    step(&mut tracer, LOG0, CONTRACT, &stack, &memory);

    let event = only_event(&tracer);
    assert_eq!(event.data.as_ref(), &[0u8; 8]);
}

#[test]
fn unrepresentable_offset_reads_zeroes() {
    let mut tracer = tracer_in_frame();
    let stack = vec![U256::from(4u64), U256::MAX];
    step(&mut tracer, LOG0, CONTRACT, &stack, &[0xff; 64]);

    let event = only_event(&tracer);
    assert_eq!(event.data.as_ref(), &[0u8; 4]);
}

#[test]
fn missing_topic_slots_are_skipped() {
    let mut tracer = tracer_in_frame();
    // LOG4 with only two topics below offset/size.
    let stack = log_stack(0, 0, &[topic(1), topic(2)]);
    step(&mut tracer, LOG4, CONTRACT, &stack, &[]);

    let event = only_event(&tracer);
    assert_eq!(event.kind, LogKind::Log4);
    assert_eq!(
        event.topics,
        vec![H256::from_low_u64_be(1), H256::from_low_u64_be(2)]
    );
}

#[test]
fn short_stack_defaults_offset_and_size_to_zero() {
    let mut tracer = tracer_in_frame();
    let stack = vec![U256::from(32u64)];
    step(&mut tracer, LOG2, CONTRACT, &stack, &[1, 2, 3]);

    let event = only_event(&tracer);
    assert!(event.data.is_empty());
    assert_eq!(event.data_hex, "0x");
    assert!(event.topics.is_empty());
}

fn small_capture_tracer() -> MonitoringTracer {
    let mut tracer = MonitoringTracer::with_config(TracerConfig {
        max_capture_size: 8,
        ..TracerConfig::default()
    });
    start(&mut tracer, CONTRACT);
    tracer
}

#[test]
fn oversized_log_is_rejected_without_recording() {
    init_tracing();
    let mut tracer = small_capture_tracer();
    let before = tracer.trace().cloned().expect("trace");
    let stack = log_stack(0, 16, &[]);
    let scope = OpScope {
        address: addr(CONTRACT),
        stack: &stack,
        memory: &[1u8; 32],
    };

    let err = tracer
        .on_opcode(0, LOG0, 1_000_000, 3, &scope, &[], 0, None)
        .expect_err("size above the capture limit");
    assert_eq!(
        err,
        TracerError::CaptureTooLarge {
            requested: 16,
            max: 8
        }
    );
    assert_eq!(tracer.trace(), Some(&before), "tree must be unchanged");
    assert_eq!(tracer.cursor(), Some(ActionId::ROOT));
}

#[test]
fn oversized_revert_is_rejected() {
    let mut tracer = small_capture_tracer();
    let stack = log_stack(0, 9, &[]);
    let scope = OpScope {
        address: addr(CONTRACT),
        stack: &stack,
        memory: &[],
    };

    let err = tracer
        .on_opcode(0, REVERT, 1_000_000, 0, &scope, &[], 0, None)
        .expect_err("size above the capture limit");
    assert!(matches!(err, TracerError::CaptureTooLarge { requested: 9, .. }));
    assert_eq!(tracer.trace().map(|tree| tree.len()), Some(1));
}

#[test]
fn capture_at_the_limit_is_full_length() {
    let mut tracer = small_capture_tracer();
    step(&mut tracer, LOG0, CONTRACT, &log_stack(0, 8, &[]), &[7u8; 4]);

    let event = only_event(&tracer);
    assert_eq!(event.data.len(), 8);
    assert_eq!(event.data.as_ref(), &[7, 7, 7, 7, 0, 0, 0, 0]);
}

#[test]
fn memory_snapshot_is_copied() {
    let mut tracer = tracer_in_frame();
    let mut memory = vec![0x11u8; 4];
    let stack = log_stack(0, 4, &[]);
    step(&mut tracer, LOG0, CONTRACT, &stack, &memory);
    // Host reuses its buffer after the callback.
    memory.fill(0x22);

    let event = only_event(&tracer);
    assert_eq!(event.data.as_ref(), &[0x11; 4]);
}

#[test]
fn other_opcodes_record_nothing() {
    let mut tracer = tracer_in_frame();
    let stack = log_stack(0, 4, &[topic(1)]);
    for opcode in [0x00u8, 0x01, 0x52, 0x9f, 0xa5, 0xf3] {
        step(&mut tracer, opcode, CONTRACT, &stack, &[1, 2, 3, 4]);
    }
    let tree = tracer.trace().expect("trace");
    assert_eq!(tree.len(), 2, "only root and the entered frame");
}

#[test]
fn event_is_a_child_of_the_cursor() {
    let mut tracer = tracer_in_frame();
    let frame = tracer.cursor().expect("frame open");
    step(&mut tracer, LOG0, CONTRACT, &log_stack(0, 0, &[]), &[]);

    let tree = tracer.trace().expect("trace");
    let children = tree.children(frame);
    assert_eq!(children.len(), 1);
    let event_id = children[0];
    assert_eq!(tree.parent(event_id), Some(frame));
    assert_eq!(tree.depth(event_id), Some(2));
    assert_eq!(tracer.cursor(), Some(frame), "LOG must not move the cursor");
}
