use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use tendril_core::{GrowthEngine, Point, Segment, WalkConfig};

/// `(x1, y1, x2, y2)`
type Line = (f64, f64, f64, f64);

fn to_line(segment: &Segment) -> Line {
    let (start, end) = (segment.start(), segment.end());
    (start.x, start.y, end.x, end.y)
}

/// Python handle on a growth engine.
#[pyclass(name = "Engine")]
struct PyEngine {
    inner: GrowthEngine,
}

#[pymethods]
impl PyEngine {
    #[new]
    #[pyo3(signature = (num_walks, origin_x, origin_y, step_size, seed=None, max_attempts=None))]
    fn new(
        num_walks: usize,
        origin_x: f64,
        origin_y: f64,
        step_size: f64,
        seed: Option<u64>,
        max_attempts: Option<u64>,
    ) -> PyResult<Self> {
        let defaults = WalkConfig::default();
        let config = WalkConfig {
            num_walks,
            origin: Point::new(origin_x, origin_y),
            step_size,
            max_attempts: max_attempts.or(defaults.max_attempts),
            seed: seed.unwrap_or(defaults.seed),
        };
        GrowthEngine::try_new(config)
            .map(|inner| Self { inner })
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    /// One entry per walk: the accepted step, or `None` if the walk was stuck.
    fn tick(&self) -> Vec<Option<Line>> {
        self.inner
            .tick()
            .outcomes
            .iter()
            .map(|outcome| outcome.segment().as_ref().map(to_line))
            .collect()
    }

    /// Every accepted segment, walk by walk.
    fn segments(&self) -> Vec<Line> {
        self.inner
            .snapshot()
            .walks
            .iter()
            .flat_map(|walk| walk.segments().iter().map(to_line))
            .collect()
    }

    fn crossing_count(&self) -> usize {
        self.inner.audit().len()
    }

    #[getter]
    fn tick_count(&self) -> u64 {
        self.inner.tick_count()
    }
}

#[pyfunction]
fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(version, m)?)?;
    m.add_class::<PyEngine>()?;
    Ok(())
}
