use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A directed line from `start` to `end`. Immutable once built; the atomic step of a walk.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    start: Point,
    end: Point,
}

impl Segment {
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Shorthand used heavily in tests and obstacle seeding.
    pub const fn from_coords(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(Point::new(x1, y1), Point::new(x2, y2))
    }

    /// Segment of `length` leaving `head` at `angle` radians.
    pub fn from_polar(head: Point, angle: f64, length: f64) -> Self {
        let end = Point::new(head.x + angle.cos() * length, head.y + angle.sin() * length);
        Self::new(head, end)
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    pub fn midpoint(&self) -> Point {
        Point::new(
            (self.start.x + self.end.x) / 2.0,
            (self.start.y + self.end.y) / 2.0,
        )
    }

    /// `end - start`.
    pub fn direction(&self) -> [f64; 2] {
        [self.end.x - self.start.x, self.end.y - self.start.y]
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    pub fn is_finite(&self) -> bool {
        self.start.is_finite() && self.end.is_finite()
    }

    /// Exact comparison: true when `point` is one of this segment's two endpoints.
    pub fn has_endpoint(&self, point: Point) -> bool {
        self.start == point || self.end == point
    }

    pub fn shares_endpoint(&self, other: &Segment) -> bool {
        self.has_endpoint(other.start) || self.has_endpoint(other.end)
    }

    pub fn intersects(&self, other: &Segment) -> bool {
        intersects(self, other)
    }
}

/// Whether two segments cross.
///
/// Solves the two line equations with Cramer's rule and then checks that the
/// solution lies inside the closed bounding interval of both segments on both
/// axes. An exactly-zero determinant (parallel or collinear lines) never
/// intersects. Shared endpoints satisfy the closed-interval check and report
/// `true`; callers that extend a path must keep the segment they continue from
/// out of the comparison.
pub fn intersects(a: &Segment, b: &Segment) -> bool {
    let (x1, y1, x2, y2) = (a.start.x, a.start.y, a.end.x, a.end.y);
    let (a1, b1, a2, b2) = (b.start.x, b.start.y, b.end.x, b.end.y);
    let dx = x1 - x2;
    let dy = y1 - y2;
    let da = a1 - a2;
    let db = b1 - b2;

    // [dy -dx] [x]   [x2*y1 - x1*y2]
    // [db -da].[y] = [a2*b1 - a1*b2]
    let det = dx * db - dy * da;
    if det == 0.0 {
        return false;
    }
    // c1 is negated relative to the right-hand side above so both numerators share a sign.
    let c1 = x1 * y2 - x2 * y1;
    let c2 = a2 * b1 - a1 * b2;
    let x = (da * c1 + dx * c2) / det;
    // y is needed on its own for the vertical-line case.
    let y = (db * c1 + dy * c2) / det;

    is_between(x, x1, x2) && is_between(x, a1, a2) && is_between(y, y1, y2) && is_between(y, b1, b2)
}

/// Closed-interval membership, independent of bound order.
pub fn is_between(value: f64, bound_a: f64, bound_b: f64) -> bool {
    let (lo, hi) = if bound_b < bound_a {
        (bound_b, bound_a)
    } else {
        (bound_a, bound_b)
    };
    lo <= value && value <= hi
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn perpendicular_segments_cross() {
        let a = Segment::from_coords(0.0, 0.0, 10.0, 0.0);
        let b = Segment::from_coords(5.0, -5.0, 5.0, 5.0);
        assert!(intersects(&a, &b));
        assert!(intersects(&b, &a));
    }

    #[test]
    fn parallel_segments_never_cross() {
        let a = Segment::from_coords(0.0, 0.0, 10.0, 0.0);
        let b = Segment::from_coords(0.0, 1.0, 10.0, 1.0);
        assert!(!intersects(&a, &b));
    }

    #[test]
    fn collinear_overlap_is_treated_as_parallel() {
        let a = Segment::from_coords(0.0, 0.0, 10.0, 0.0);
        let b = Segment::from_coords(5.0, 0.0, 15.0, 0.0);
        assert!(!intersects(&a, &b), "det == 0 path covers collinear overlap");
    }

    #[test]
    fn lines_crossing_outside_both_segments_do_not_intersect() {
        let a = Segment::from_coords(0.0, 0.0, 1.0, 1.0);
        let b = Segment::from_coords(10.0, 0.0, 9.0, 1.0);
        assert!(!intersects(&a, &b));
    }

    #[test]
    fn crossing_outside_only_one_segment_does_not_intersect() {
        let a = Segment::from_coords(0.0, 0.0, 10.0, 0.0);
        let b = Segment::from_coords(5.0, 1.0, 5.0, 3.0);
        assert!(!intersects(&a, &b));
    }

    #[test]
    fn touching_at_an_endpoint_counts_as_intersection() {
        let a = Segment::from_coords(0.0, 0.0, 10.0, 0.0);
        let b = Segment::from_coords(5.0, 0.0, 5.0, 5.0);
        assert!(intersects(&a, &b), "closed interval includes T-junctions");

        let c = Segment::from_coords(10.0, 0.0, 10.0, 10.0);
        assert!(intersects(&a, &c), "shared corner endpoint");
    }

    #[test]
    fn vertical_candidate_crosses_diagonal() {
        let diagonal = Segment::from_coords(500.0, 500.0, 514.14, 514.14);
        let vertical = Segment::from_coords(510.0, 500.0, 510.0, 520.0);
        assert!(intersects(&diagonal, &vertical));
        assert!(intersects(&vertical, &diagonal));
    }

    #[test]
    fn zero_length_segment_never_intersects() {
        let point = Segment::from_coords(5.0, 0.0, 5.0, 0.0);
        let a = Segment::from_coords(0.0, 0.0, 10.0, 0.0);
        assert!(!intersects(&a, &point));
    }

    #[test]
    fn polar_construction_has_requested_length_and_origin() {
        let head = Point::new(500.0, 500.0);
        let s = Segment::from_polar(head, 1.234, 20.0);
        assert_eq!(s.start(), head);
        assert!((s.length() - 20.0).abs() < 1e-9);

        let up = Segment::from_polar(Point::new(0.0, 0.0), FRAC_PI_2, 2.0);
        assert!(up.end().x.abs() < 1e-12);
        assert!((up.end().y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn derived_properties() {
        let s = Segment::from_coords(2.0, 4.0, 6.0, 10.0);
        assert_eq!(s.midpoint(), Point::new(4.0, 7.0));
        assert_eq!(s.direction(), [4.0, 6.0]);
        assert!(s.has_endpoint(Point::new(6.0, 10.0)));
        assert!(!s.has_endpoint(Point::new(4.0, 7.0)));
    }

    #[test]
    fn is_between_is_closed_and_order_independent() {
        assert!(is_between(1.0, 1.0, 2.0));
        assert!(is_between(2.0, 1.0, 2.0));
        assert!(is_between(1.5, 2.0, 1.0));
        assert!(!is_between(2.0001, 2.0, 1.0));
    }

    fn coord() -> impl Strategy<Value = f64> {
        -1000.0f64..1000.0
    }

    fn segment() -> impl Strategy<Value = Segment> {
        (coord(), coord(), coord(), coord())
            .prop_map(|(x1, y1, x2, y2)| Segment::from_coords(x1, y1, x2, y2))
    }

    proptest! {
        #[test]
        fn intersection_is_symmetric(a in segment(), b in segment()) {
            prop_assert_eq!(intersects(&a, &b), intersects(&b, &a));
        }

        #[test]
        fn intersection_is_deterministic(a in segment(), b in segment()) {
            let first = intersects(&a, &b);
            for _ in 0..4 {
                prop_assert_eq!(intersects(&a, &b), first);
            }
        }
    }
}
