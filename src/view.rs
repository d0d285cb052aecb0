//! Data ranges reported by series bounds.

/// Numeric range with inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
}

impl Range {
    /// Create a new range, swapping bounds if needed.
    pub fn new(mut min: f64, mut max: f64) -> Self {
        if min > max {
            std::mem::swap(&mut min, &mut max);
        }
        Self { min, max }
    }

    /// Widen the range to cover `value`. Non-finite values are ignored.
    pub fn grow(&mut self, value: f64) {
        if value.is_finite() {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
    }

    /// Smallest range covering both, or `None` if either has a non-finite
    /// bound.
    pub fn union(a: Self, b: Self) -> Option<Self> {
        let bounds = [a.min, a.max, b.min, b.max];
        if bounds.iter().any(|bound| !bound.is_finite()) {
            return None;
        }
        Some(Self::new(a.min.min(b.min), a.max.max(b.max)))
    }
}

/// Data ranges on both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// X axis range.
    pub x: Range,
    /// Y axis range.
    pub y: Range,
}

impl Viewport {
    /// Create a viewport from X and Y ranges.
    pub fn new(x: Range, y: Range) -> Self {
        Self { x, y }
    }

    /// Union two viewports axis by axis.
    pub fn union(a: Self, b: Self) -> Option<Self> {
        Some(Self {
            x: Range::union(a.x, b.x)?,
            y: Range::union(a.y, b.y)?,
        })
    }

    /// Grow an optional viewport so it covers a point.
    ///
    /// Points with a non-finite coordinate are skipped.
    pub(crate) fn include(bounds: Option<Self>, x: f64, y: f64) -> Option<Self> {
        if !x.is_finite() || !y.is_finite() {
            return bounds;
        }
        match bounds {
            None => Some(Self::new(Range::new(x, x), Range::new(y, y))),
            Some(mut bounds) => {
                bounds.x.grow(x);
                bounds.y.grow(y);
                Some(bounds)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_skips_non_finite_points() {
        let bounds = Viewport::include(None, 1.0, 2.0);
        let bounds = Viewport::include(bounds, f64::NAN, 10.0);
        let bounds = Viewport::include(bounds, -1.0, 4.0).unwrap();
        assert_eq!(bounds.x, Range::new(-1.0, 1.0));
        assert_eq!(bounds.y, Range::new(2.0, 4.0));
    }

    #[test]
    fn range_new_swaps_reversed_bounds() {
        let range = Range::new(3.0, -1.0);
        assert_eq!((range.min, range.max), (-1.0, 3.0));
    }

    #[test]
    fn union_rejects_non_finite_bounds() {
        let a = Range::new(0.0, 1.0);
        assert_eq!(Range::union(a, Range::new(-2.0, 0.5)), Some(Range::new(-2.0, 1.0)));
        assert_eq!(Range::union(a, Range::new(0.0, f64::INFINITY)), None);
    }
}
