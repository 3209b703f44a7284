//! Process/thread metadata, a clock snapshot, and a flow correlation
//! between a request's start and its completion on a worker thread.
//!
//! Grounded in `examples/original_source/examples/test_flow.c` and
//! `test_high_level.c`.

use pftrace::{EventType, Writer};

fn main() {
    tracing_subscriber::fmt::init();

    println!("Initializing flow trace...");
    let mut writer = Writer::create("flow.perfetto-trace").expect("failed to init writer");

    writer.write_process_track_descriptor(100, 5000, "Renderer");
    writer.write_thread_track_descriptor(101, 100, 5000, 5001, "MainThread");
    writer.write_clock_snapshot(10_000);

    writer
        .begin_packet()
        .set_timestamp(10_000)
        .begin_track_event()
        .set_type(EventType::SliceBegin)
        .set_track_uuid(101)
        .set_name("RequestStart")
        .add_flow_id(999)
        .end()
        .end();

    writer
        .begin_packet()
        .set_timestamp(20_000)
        .begin_track_event()
        .set_type(EventType::SliceEnd)
        .set_track_uuid(101)
        .set_name("RequestEnd")
        .add_terminating_flow_id(999)
        .set_task_execution("src/rpc.rs", "complete_request", 123)
        .end()
        .end();

    writer.finish().expect("writer reported a latched error");
    println!("Done. Output: flow.perfetto-trace");
}
