use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tendril_core::{GrowthEngine, JsonLinesSink, RenderWorker, WalkConfig};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "tendril", about = "Grow self-avoiding random walks and stream the accepted segments")]
struct Args {
    /// JSON file with a WalkConfig; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    walks: Option<usize>,

    #[arg(long, allow_hyphen_values = true)]
    origin_x: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    origin_y: Option<f64>,

    #[arg(long)]
    step_size: Option<f64>,

    /// Resample bound per walk per tick
    #[arg(long, conflicts_with = "unbounded")]
    max_attempts: Option<u64>,

    /// Retry forever instead of reporting stuck walks
    #[arg(long)]
    unbounded: bool,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value_t = 1000)]
    ticks: usize,

    /// Pause between ticks
    #[arg(long, default_value_t = 0)]
    interval_ms: u64,

    /// Emit a full redraw every N ticks (0 disables)
    #[arg(long, default_value_t = 0)]
    redraw_every: usize,

    /// JSON-lines destination for drawn batches; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the final engine snapshot as JSON
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Check every pair of accepted segments for crossings after the run
    #[arg(long)]
    verify: bool,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}

fn load_config(args: &Args) -> Result<WalkConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open config {}", path.display()))?;
            serde_json::from_reader(file)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => WalkConfig::default(),
    };
    if let Some(walks) = args.walks {
        config.num_walks = walks;
    }
    if let Some(x) = args.origin_x {
        config.origin.x = x;
    }
    if let Some(y) = args.origin_y {
        config.origin.y = y;
    }
    if let Some(step_size) = args.step_size {
        config.step_size = step_size;
    }
    if let Some(max_attempts) = args.max_attempts {
        config.max_attempts = Some(max_attempts);
    }
    if args.unbounded {
        config.max_attempts = None;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    Ok(config)
}

fn open_output(path: Option<&PathBuf>) -> Result<Box<dyn Write + Send>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

/// Flush the render output, failing if any batch was lost along the way.
fn close_output<W: Write + Send>(sink: JsonLinesSink<W>) -> Result<()> {
    let (batches, failures) = (sink.batches(), sink.failures());
    sink.into_inner().context("failed to flush render output")?;
    if failures > 0 {
        bail!("{failures} of {batches} render batches could not be written");
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = load_config(&args)?;
    let engine = GrowthEngine::try_new(config).context("invalid walk configuration")?;
    let worker = RenderWorker::spawn(JsonLinesSink::new(open_output(args.output.as_ref())?))?;
    let interval = Duration::from_millis(args.interval_ms);

    let start = Instant::now();
    let mut stuck_events = 0usize;
    for step in 1..=args.ticks {
        let tick_start = Instant::now();
        let report = engine.tick();
        for walk in report.stuck_walks() {
            stuck_events += 1;
            warn!(tick = report.tick, walk, "walk stuck this tick");
        }
        if !worker.draw(report.accepted_segments()) {
            bail!("render worker stopped unexpectedly");
        }
        if args.redraw_every > 0 && step % args.redraw_every == 0 {
            worker.redraw_all(engine.snapshot().segments());
        }
        if let Some(rest) = interval.checked_sub(tick_start.elapsed()) {
            thread::sleep(rest);
        }
    }

    close_output(worker.finish()?)?;

    info!(
        ticks = args.ticks,
        segments = engine.index_len(),
        stuck_events,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "run complete"
    );

    if let Some(path) = &args.snapshot {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &engine.snapshot())
            .context("failed to write snapshot")?;
        writer.flush().context("failed to write snapshot")?;
    }

    if args.verify {
        let crossings = engine.audit();
        if !crossings.is_empty() {
            bail!(
                "{} crossing segment pairs found, first: {:?}",
                crossings.len(),
                crossings[0]
            );
        }
        info!(segments = engine.index_len(), "verified: no crossing segments");
    }
    Ok(())
}
