//! Recursive nested slices wrapped in an outer loop, exercising repeated
//! interning of event names and debug-annotation args at some depth.
//!
//! Grounded in `examples/original_source/examples/test_big_trace.c`, scaled
//! down from that file's 10,000 iterations / 50-deep recursion (which exists
//! to stress a production tracer, not to demonstrate the API) to a size that
//! still produces a multi-level trace and runs instantly.

use pftrace::{EventType, Writer};

const NUM_ITERATIONS: u64 = 20;
const MAX_DEPTH: u32 = 5;

fn simulate_work(writer: &mut Writer, timestamp: &mut u64, depth: u32, max_depth: u32) {
    if depth > max_depth {
        return;
    }

    *timestamp += 100;
    writer
        .begin_packet()
        .set_timestamp(*timestamp)
        .set_trusted_packet_sequence_id(1)
        .begin_track_event()
        .set_type(EventType::SliceBegin)
        .set_track_uuid(101)
        .set_name(&format!("Depth_{depth}"))
        .add_arg_int("depth", depth as i64)
        .add_arg_double("load_factor", depth as f64 / max_depth as f64)
        .end()
        .end();

    simulate_work(writer, timestamp, depth + 1, max_depth);

    *timestamp += 200;
    writer
        .begin_packet()
        .set_timestamp(*timestamp)
        .set_trusted_packet_sequence_id(1)
        .begin_track_event()
        .set_type(EventType::SliceEnd)
        .set_track_uuid(101)
        .end()
        .end();
}

fn main() {
    tracing_subscriber::fmt::init();

    let mut timestamp: u64 = 1_000_000_000;
    println!("Generating trace 'big_trace.perfetto-trace'...");
    let mut writer = Writer::create("big_trace.perfetto-trace").expect("failed to init writer");

    writer.write_clock_snapshot(timestamp);
    writer.write_process_track_descriptor(100, 1234, "StressTestProcess");
    writer.write_thread_track_descriptor(101, 100, 1234, 5678, "WorkerThread");

    for i in 0..NUM_ITERATIONS {
        timestamp += 100;
        writer
            .begin_packet()
            .set_timestamp(timestamp)
            .set_trusted_packet_sequence_id(1)
            .begin_track_event()
            .set_type(EventType::SliceBegin)
            .set_track_uuid(101)
            .set_name(&format!("Loop_{i}"))
            .set_log_message("Starting loop iteration")
            .end()
            .end();

        simulate_work(&mut writer, &mut timestamp, 1, MAX_DEPTH);

        timestamp += 50;
        writer
            .begin_packet()
            .set_timestamp(timestamp)
            .set_trusted_packet_sequence_id(1)
            .begin_track_event()
            .set_type(EventType::SliceEnd)
            .set_track_uuid(101)
            .end()
            .end();
    }

    writer.finish().expect("writer reported a latched error");
    println!(
        "Done. total time simulated: {} ns",
        timestamp - 1_000_000_000
    );
}
