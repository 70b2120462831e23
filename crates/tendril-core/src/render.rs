use crate::geometry::Segment;
use serde::Serialize;
use std::io::{self, Write};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::warn;

/// Consumer of accepted segments. Runs on the render worker's thread.
pub trait RenderSink: Send {
    /// Draw `segments` on top of what has already been drawn.
    fn draw(&mut self, segments: &[Segment]);

    /// Clear prior output, then draw the full segment set.
    fn redraw_all(&mut self, segments: &[Segment]);
}

#[derive(Clone, Debug, PartialEq)]
pub enum RenderCommand {
    Draw(Vec<Segment>),
    RedrawAll(Vec<Segment>),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to spawn render worker: {0}")]
    Spawn(#[from] io::Error),
    #[error("render worker panicked")]
    WorkerPanicked,
}

/// Owns a sink on a dedicated thread. Submitting never waits for drawing.
pub struct RenderWorker<S: RenderSink + 'static> {
    sender: Sender<RenderCommand>,
    handle: JoinHandle<S>,
}

impl<S: RenderSink + 'static> RenderWorker<S> {
    pub fn spawn(mut sink: S) -> Result<Self, RenderError> {
        let (sender, receiver) = mpsc::channel::<RenderCommand>();
        let handle = thread::Builder::new()
            .name("tendril-render".into())
            .spawn(move || {
                for command in receiver {
                    match command {
                        RenderCommand::Draw(segments) => sink.draw(&segments),
                        RenderCommand::RedrawAll(segments) => sink.redraw_all(&segments),
                    }
                }
                sink
            })?;
        Ok(Self { sender, handle })
    }

    /// Queue a command. Returns `false` if the worker has already exited.
    pub fn submit(&self, command: RenderCommand) -> bool {
        self.sender.send(command).is_ok()
    }

    pub fn draw(&self, segments: Vec<Segment>) -> bool {
        if segments.is_empty() {
            return true;
        }
        self.submit(RenderCommand::Draw(segments))
    }

    pub fn redraw_all(&self, segments: Vec<Segment>) -> bool {
        self.submit(RenderCommand::RedrawAll(segments))
    }

    /// Drain pending commands, stop the worker, and hand the sink back.
    pub fn finish(self) -> Result<S, RenderError> {
        let Self { sender, handle } = self;
        drop(sender);
        handle.join().map_err(|_| RenderError::WorkerPanicked)
    }
}

/// Keeps every batch in memory.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    pub batches: Vec<Vec<Segment>>,
    pub redraws: usize,
}

impl RecordingSink {
    pub fn segments(&self) -> impl Iterator<Item = &Segment> + '_ {
        self.batches.iter().flatten()
    }
}

impl RenderSink for RecordingSink {
    fn draw(&mut self, segments: &[Segment]) {
        self.batches.push(segments.to_vec());
    }

    fn redraw_all(&mut self, segments: &[Segment]) {
        self.batches.clear();
        self.redraws += 1;
        self.batches.push(segments.to_vec());
    }
}

#[derive(Serialize)]
struct BatchRecord<'a> {
    batch: u64,
    clear: bool,
    segments: &'a [Segment],
}

/// Writes one JSON object per batch, one batch per line.
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
    batches: u64,
    failures: u64,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            batches: 0,
            failures: 0,
        }
    }

    pub fn batches(&self) -> u64 {
        self.batches
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn into_inner(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn write_batch(&mut self, segments: &[Segment], clear: bool) {
        let record = BatchRecord {
            batch: self.batches,
            clear,
            segments,
        };
        self.batches += 1;
        let written = serde_json::to_writer(&mut self.writer, &record)
            .map_err(io::Error::from)
            .and_then(|()| self.writer.write_all(b"\n"));
        if let Err(err) = written {
            self.failures += 1;
            warn!(batch = record.batch, error = %err, "failed to write render batch");
        }
    }
}

impl<W: Write + Send> RenderSink for JsonLinesSink<W> {
    fn draw(&mut self, segments: &[Segment]) {
        self.write_batch(segments, false);
    }

    fn redraw_all(&mut self, segments: &[Segment]) {
        self.write_batch(segments, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(x: f64) -> Segment {
        Segment::from_coords(x, 0.0, x + 1.0, 0.0)
    }

    #[test]
    fn worker_delivers_batches_in_order() {
        let worker = RenderWorker::spawn(RecordingSink::default()).unwrap();
        assert!(worker.draw(vec![seg(0.0)]));
        assert!(worker.draw(vec![seg(1.0), seg(2.0)]));
        assert!(worker.draw(Vec::new()), "empty batches are skipped");
        let sink = worker.finish().unwrap();
        assert_eq!(sink.batches, vec![vec![seg(0.0)], vec![seg(1.0), seg(2.0)]]);
    }

    #[test]
    fn redraw_all_clears_previous_batches() {
        let worker = RenderWorker::spawn(RecordingSink::default()).unwrap();
        worker.draw(vec![seg(0.0)]);
        worker.redraw_all(vec![seg(5.0), seg(6.0)]);
        let sink = worker.finish().unwrap();
        assert_eq!(sink.redraws, 1);
        assert_eq!(sink.segments().count(), 2);
    }

    #[test]
    fn json_lines_sink_writes_one_line_per_batch() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.draw(&[seg(0.0)]);
        sink.redraw_all(&[seg(1.0), seg(2.0)]);
        assert_eq!(sink.batches(), 2);
        assert_eq!(sink.failures(), 0);

        let bytes = sink.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["clear"], false);
        assert_eq!(lines[1]["clear"], true);
        assert_eq!(lines[1]["segments"].as_array().unwrap().len(), 2);
        assert_eq!(lines[0]["segments"][0]["start"]["x"], 0.0);
    }
}
