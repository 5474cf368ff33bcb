//! Parameter ranges for ray queries.
//!
//! Hits are accepted strictly inside the interval: a root equal to `min` is a
//! self-intersection and a root equal to `max` lies on or past the light.

/// Open interval (min, max) over the ray parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    /// Lower bound, exclusive
    pub min: f64,
    /// Upper bound, exclusive
    pub max: f64,
}

impl Interval {
    /// Create a new interval with given min and max values
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Check if the interval surrounds the given value (exclusive bounds)
    pub fn surrounds(&self, x: f64) -> bool {
        self.min < x && x < self.max
    }

    /// Same interval with the upper bound pulled in to `max`.
    pub fn with_max(self, max: f64) -> Self {
        Self { max, ..self }
    }
}
