use tendril_core::{
    GrowthEngine, JsonLinesSink, Point, RecordingSink, RenderWorker, Segment, WalkConfig,
};

fn config(seed: u64) -> WalkConfig {
    WalkConfig {
        num_walks: 3,
        origin: Point::new(0.0, 0.0),
        step_size: 10.0,
        max_attempts: Some(1_000),
        seed,
    }
}

#[test]
fn worker_receives_every_accepted_segment_in_tick_order() {
    let engine = GrowthEngine::try_new(config(17)).unwrap();
    let worker = RenderWorker::spawn(RecordingSink::default()).unwrap();

    let mut expected: Vec<Segment> = Vec::new();
    for _ in 0..60 {
        let accepted = engine.tick().accepted_segments();
        expected.extend_from_slice(&accepted);
        assert!(worker.draw(accepted));
    }
    let sink = worker.finish().unwrap();

    let drawn: Vec<Segment> = sink.segments().copied().collect();
    assert_eq!(drawn, expected);
    assert_eq!(drawn.len(), engine.index_len());
}

#[test]
fn redraw_replaces_output_with_full_snapshot() {
    let engine = GrowthEngine::try_new(config(3)).unwrap();
    let worker = RenderWorker::spawn(RecordingSink::default()).unwrap();
    for _ in 0..20 {
        worker.draw(engine.tick().accepted_segments());
    }
    let snapshot = engine.snapshot();
    worker.redraw_all(snapshot.segments());
    let sink = worker.finish().unwrap();

    assert_eq!(sink.redraws, 1);
    assert_eq!(sink.batches.len(), 1);
    assert_eq!(sink.segments().count(), snapshot.segment_count());
}

#[test]
fn json_lines_output_round_trips_through_the_worker() {
    let engine = GrowthEngine::try_new(config(5)).unwrap();
    let worker = RenderWorker::spawn(JsonLinesSink::new(Vec::new())).unwrap();
    for _ in 0..5 {
        worker.draw(engine.tick().accepted_segments());
    }
    let sink = worker.finish().unwrap();
    assert_eq!(sink.failures(), 0);
    let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();

    let mut total = 0;
    for line in text.lines() {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        let segments: Vec<Segment> = serde_json::from_value(value["segments"].clone()).unwrap();
        total += segments.len();
    }
    assert_eq!(total, engine.index_len());
}
