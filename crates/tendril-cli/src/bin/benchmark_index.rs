use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use std::f64::consts::TAU;
use std::time::Instant;
use tendril_core::{intersects, GrowthEngine, IndexedSegment, Segment, SpatialIndex, WalkConfig};

/// Same acceptance rule as the engine, scanning every stored segment.
fn blocked_brute_force(stored: &[IndexedSegment], candidate: &Segment) -> bool {
    let head = candidate.start();
    stored
        .iter()
        .filter(|s| !s.segment.has_endpoint(head))
        .any(|s| intersects(&s.segment, candidate))
}

fn blocked_indexed(index: &SpatialIndex, candidate: &Segment) -> bool {
    let head = candidate.start();
    index
        .segments_near(candidate)
        .filter(|s| !s.segment.has_endpoint(head))
        .any(|s| intersects(&s.segment, candidate))
}

fn main() {
    let config = WalkConfig {
        num_walks: 8,
        seed: 42,
        ..WalkConfig::default()
    };
    let ticks = 2_000;
    let probes = 20_000;
    println!(
        "Benchmarking with {} walks, {} ticks, {} probe candidates",
        config.num_walks, ticks, probes
    );

    let engine = match GrowthEngine::try_new(config.clone()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("invalid config: {e}");
            std::process::exit(1);
        }
    };
    let start = Instant::now();
    let mut stuck = 0;
    for _ in 0..ticks {
        stuck += engine.tick().stuck_walks().count();
    }
    let grow = start.elapsed();
    println!("Grew {} segments in {:?} ({} stuck events)", engine.index_len(), grow, stuck);
    println!("Avg time per tick: {:?}", grow / ticks as u32);

    let stored = engine.indexed_segments();
    let mut index = SpatialIndex::new(config.step_size);
    for s in &stored {
        index.insert(s.id, s.segment);
    }

    // Probe from random stored endpoints so most candidates land in dense areas.
    let mut rng = ChaCha12Rng::seed_from_u64(config.seed);
    let candidates: Vec<Segment> = (0..probes)
        .map(|_| {
            let anchor = stored[rng.random_range(0..stored.len())].segment.end();
            Segment::from_polar(anchor, rng.random_range(0.0..TAU), config.step_size)
        })
        .collect();

    let start = Instant::now();
    let indexed: Vec<bool> = candidates.iter().map(|c| blocked_indexed(&index, c)).collect();
    let indexed_time = start.elapsed();

    let start = Instant::now();
    let brute: Vec<bool> = candidates
        .iter()
        .map(|c| blocked_brute_force(&stored, c))
        .collect();
    let brute_time = start.elapsed();

    let disagreements = indexed.iter().zip(&brute).filter(|(a, b)| a != b).count();
    let blocked = indexed.iter().filter(|&&b| b).count();
    println!("Bucket index: {:?} ({} of {} blocked)", indexed_time, blocked, probes);
    println!("Brute force:  {:?}", brute_time);
    println!(
        "Speedup: {:.1}x, disagreements: {}",
        brute_time.as_secs_f64() / indexed_time.as_secs_f64().max(f64::EPSILON),
        disagreements
    );
}
