//! Series storage and the element-level operations on it.
//!
//! [`SeriesData`] is the unsynchronized half of a series: two equal-length
//! sequences plus the X mode. Every operation validates its arguments before
//! writing, so a failed call leaves the data as it was. The one exception is
//! [`SeriesData::set_model`], which always discards the previous content.

use std::collections::VecDeque;
use std::fmt;
use std::iter::FusedIterator;
use std::str::FromStr;

use crate::error::SeriesError;
use crate::geom::Point;
use crate::view::Viewport;

/// Layout of a flat model passed to [`SeriesData::set_model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArrayFormat {
    /// Values are Y values; X is the element index.
    YValsOnly,
    /// Values alternate `x, y, x, y, ...`.
    XyValsInterleaved,
}

impl ArrayFormat {
    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::YValsOnly => "y_vals_only",
            Self::XyValsInterleaved => "xy_vals_interleaved",
        }
    }
}

impl fmt::Display for ArrayFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArrayFormat {
    type Err = SeriesError;

    /// Parse a format name, ignoring case and treating `-` like `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "y_vals_only" | "y_only" => Ok(Self::YValsOnly),
            "xy_vals_interleaved" | "xy_interleaved" => Ok(Self::XyValsInterleaved),
            _ => Err(SeriesError::InvalidFormat(s.to_string())),
        }
    }
}

/// Mode of the X axis data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XMode {
    /// X values are implicit indices.
    Index,
    /// X values are explicitly stored.
    Explicit,
}

/// Stored X values.
///
/// Implicit mode is sticky: only [`SeriesData::set_model`] with interleaved
/// input brings explicit values back.
#[derive(Debug, Clone, PartialEq)]
pub enum XValues {
    /// No X values are stored; the X value of element `i` is `i`.
    Implicit,
    /// One X value per Y value.
    Explicit(VecDeque<f64>),
}

impl XValues {
    /// Access the stored values, if any.
    pub fn as_explicit(&self) -> Option<&VecDeque<f64>> {
        match self {
            Self::Implicit => None,
            Self::Explicit(values) => Some(values),
        }
    }

    /// Mode matching these values.
    pub fn mode(&self) -> XMode {
        match self {
            Self::Implicit => XMode::Index,
            Self::Explicit(_) => XMode::Explicit,
        }
    }
}

/// Ordered (x, y) pairs with an optional title.
///
/// This type does no locking; [`XySeries`](crate::XySeries) wraps it in a
/// reader/writer lock for shared use.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesData {
    title: Option<String>,
    x: XValues,
    y: VecDeque<f64>,
    generation: u64,
}

impl Default for SeriesData {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SeriesData {
    /// Create empty data in explicit X mode.
    pub fn new(title: Option<String>) -> Self {
        Self::with_capacity(title, 0)
    }

    /// Create empty data in explicit X mode with room for `capacity` pairs.
    pub fn with_capacity(title: Option<String>, capacity: usize) -> Self {
        Self {
            title,
            x: XValues::Explicit(VecDeque::with_capacity(capacity)),
            y: VecDeque::with_capacity(capacity),
            generation: 0,
        }
    }

    /// Build data from a flat model in the given format.
    ///
    /// Odd-sized interleaved input fails with
    /// [`SeriesError::OddLengthInterleaved`], the same error
    /// [`SeriesData::set_model`] reports.
    pub fn from_model<I, T>(
        model: I,
        format: ArrayFormat,
        title: Option<String>,
    ) -> Result<Self, SeriesError>
    where
        I: IntoIterator<Item = T>,
        T: Into<f64>,
    {
        let mut data = Self::new(title);
        data.set_model(Some(model), format)?;
        Ok(data)
    }

    /// Build data from paired X and Y sequences of equal length.
    pub fn from_xy_vals<X, Y, T, U>(x: X, y: Y, title: Option<String>) -> Result<Self, SeriesError>
    where
        X: IntoIterator<Item = T>,
        Y: IntoIterator<Item = U>,
        T: Into<f64>,
        U: Into<f64>,
    {
        let x: VecDeque<f64> = x.into_iter().map(Into::into).collect();
        let y: VecDeque<f64> = y.into_iter().map(Into::into).collect();
        if x.len() != y.len() {
            return Err(SeriesError::LengthMismatch {
                x_len: x.len(),
                y_len: y.len(),
            });
        }
        Ok(Self {
            title,
            x: XValues::Explicit(x),
            y,
            generation: 0,
        })
    }

    /// Replace the whole content with a flat model.
    ///
    /// The previous content is always discarded and X switches to implicit
    /// mode. Interleaved input restores explicit X values; odd-sized
    /// interleaved input leaves the data empty and returns
    /// [`SeriesError::OddLengthInterleaved`]. A `None` or empty model yields
    /// empty data.
    pub fn set_model<I, T>(
        &mut self,
        model: Option<I>,
        format: ArrayFormat,
    ) -> Result<(), SeriesError>
    where
        I: IntoIterator<Item = T>,
        T: Into<f64>,
    {
        let model: Vec<f64> = model
            .map(|model| model.into_iter().map(Into::into).collect())
            .unwrap_or_default();

        self.x = XValues::Implicit;
        self.y.clear();
        self.bump();

        if model.is_empty() {
            tracing::debug!(%format, "series model cleared");
            return Ok(());
        }

        match format {
            ArrayFormat::YValsOnly => {
                self.y.extend(model);
            }
            ArrayFormat::XyValsInterleaved => {
                if model.len() % 2 != 0 {
                    return Err(SeriesError::OddLengthInterleaved { len: model.len() });
                }
                let pairs = model.len() / 2;
                let mut x = VecDeque::with_capacity(pairs);
                self.y.reserve(pairs);
                for pair in model.chunks_exact(2) {
                    x.push_back(pair[0]);
                    self.y.push_back(pair[1]);
                }
                self.x = XValues::Explicit(x);
            }
        }
        tracing::debug!(%format, len = self.y.len(), "series model replaced");
        Ok(())
    }

    /// Drop stored X values and use element indices instead.
    pub fn use_implicit_x_vals(&mut self) {
        if let XValues::Explicit(values) = &self.x {
            tracing::debug!(discarded = values.len(), "switching series to implicit x");
        }
        self.x = XValues::Implicit;
        self.bump();
    }

    /// Set the X value at `index`.
    ///
    /// Fails with [`SeriesError::IndexOutOfRange`] in implicit mode.
    pub fn set_x(&mut self, value: impl Into<f64>, index: usize) -> Result<(), SeriesError> {
        *self.x_slot(index)? = value.into();
        self.bump();
        Ok(())
    }

    /// Set the Y value at `index`.
    pub fn set_y(&mut self, value: impl Into<f64>, index: usize) -> Result<(), SeriesError> {
        *self.y_slot(index)? = value.into();
        self.bump();
        Ok(())
    }

    /// Set both values at `index`.
    ///
    /// Both slots are checked before either is written.
    pub fn set_xy(
        &mut self,
        x: impl Into<f64>,
        y: impl Into<f64>,
        index: usize,
    ) -> Result<(), SeriesError> {
        self.y_slot(index)?;
        self.x_slot(index)?;
        *self.y_slot(index)? = y.into();
        *self.x_slot(index)? = x.into();
        self.bump();
        Ok(())
    }

    /// Prepend a pair. In implicit mode only `y` is stored.
    pub fn add_first(&mut self, x: impl Into<f64>, y: impl Into<f64>) {
        if let XValues::Explicit(values) = &mut self.x {
            values.push_front(x.into());
        }
        self.y.push_front(y.into());
        self.bump();
    }

    /// Append a pair. In implicit mode only `y` is stored.
    pub fn add_last(&mut self, x: impl Into<f64>, y: impl Into<f64>) {
        if let XValues::Explicit(values) = &mut self.x {
            values.push_back(x.into());
        }
        self.y.push_back(y.into());
        self.bump();
    }

    /// Remove and return the first pair.
    ///
    /// In implicit mode the returned X is `0`, the vacated index.
    pub fn remove_first(&mut self) -> Result<Point, SeriesError> {
        if self.y.is_empty() {
            return Err(SeriesError::EmptySeries);
        }
        let x = match &mut self.x {
            XValues::Implicit => 0.0,
            XValues::Explicit(values) => values.pop_front().ok_or(SeriesError::EmptySeries)?,
        };
        let y = self.y.pop_front().ok_or(SeriesError::EmptySeries)?;
        self.bump();
        Ok(Point::new(x, y))
    }

    /// Remove and return the last pair.
    ///
    /// In implicit mode the returned X is `size() - 1`, the vacated index.
    pub fn remove_last(&mut self) -> Result<Point, SeriesError> {
        let last = self.y.len().checked_sub(1).ok_or(SeriesError::EmptySeries)?;
        let x = match &mut self.x {
            XValues::Implicit => last as f64,
            XValues::Explicit(values) => values.pop_back().ok_or(SeriesError::EmptySeries)?,
        };
        let y = self.y.pop_back().ok_or(SeriesError::EmptySeries)?;
        self.bump();
        Ok(Point::new(x, y))
    }

    /// Access the title.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Replace the title.
    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title;
        self.bump();
    }

    /// Remove all pairs. The X mode is kept.
    pub fn clear(&mut self) {
        if let XValues::Explicit(values) = &mut self.x {
            values.clear();
        }
        tracing::debug!(removed = self.y.len(), "series cleared");
        self.y.clear();
        self.bump();
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.y.len()
    }

    /// Check if there are no pairs.
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// X value at `index`; the index itself in implicit mode.
    ///
    /// Bounds are checked against the series length in both modes.
    pub fn x(&self, index: usize) -> Result<f64, SeriesError> {
        match &self.x {
            XValues::Implicit if index < self.y.len() => Ok(index as f64),
            XValues::Implicit => Err(SeriesError::IndexOutOfRange {
                index,
                len: self.y.len(),
            }),
            XValues::Explicit(values) => {
                values
                    .get(index)
                    .copied()
                    .ok_or(SeriesError::IndexOutOfRange {
                        index,
                        len: values.len(),
                    })
            }
        }
    }

    /// Y value at `index`.
    pub fn y(&self, index: usize) -> Result<f64, SeriesError> {
        self.y
            .get(index)
            .copied()
            .ok_or(SeriesError::IndexOutOfRange {
                index,
                len: self.y.len(),
            })
    }

    /// Reserve room for `additional` more pairs.
    pub fn reserve(&mut self, additional: usize) {
        if let XValues::Explicit(values) = &mut self.x {
            values.reserve(additional);
        }
        self.y.reserve(additional);
    }

    /// Access the X mode.
    pub fn x_mode(&self) -> XMode {
        self.x.mode()
    }

    /// Stored X values, or `None` in implicit mode.
    pub fn x_values(&self) -> Option<&VecDeque<f64>> {
        self.x.as_explicit()
    }

    /// Stored Y values.
    pub fn y_values(&self) -> &VecDeque<f64> {
        &self.y
    }

    /// Iterate pairs in order, with implicit X resolved to the index.
    pub fn points(&self) -> Points<'_> {
        Points {
            data: self,
            index: 0,
        }
    }

    /// Bounds covering all finite pairs.
    pub fn bounds(&self) -> Option<Viewport> {
        self.points()
            .fold(None, |bounds, point| Viewport::include(bounds, point.x, point.y))
    }

    /// Mutation counter, bumped by every write.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn x_slot(&mut self, index: usize) -> Result<&mut f64, SeriesError> {
        match &mut self.x {
            XValues::Implicit => Err(SeriesError::IndexOutOfRange { index, len: 0 }),
            XValues::Explicit(values) => {
                let len = values.len();
                values
                    .get_mut(index)
                    .ok_or(SeriesError::IndexOutOfRange { index, len })
            }
        }
    }

    fn y_slot(&mut self, index: usize) -> Result<&mut f64, SeriesError> {
        let len = self.y.len();
        self.y
            .get_mut(index)
            .ok_or(SeriesError::IndexOutOfRange { index, len })
    }

    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

/// Iterator over the pairs of a [`SeriesData`].
#[derive(Debug, Clone)]
pub struct Points<'a> {
    data: &'a SeriesData,
    index: usize,
}

impl Iterator for Points<'_> {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        let y = *self.data.y.get(self.index)?;
        let x = match &self.data.x {
            XValues::Implicit => self.index as f64,
            XValues::Explicit(values) => *values.get(self.index)?,
        };
        self.index += 1;
        Some(Point::new(x, y))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.data.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Points<'_> {}

impl FusedIterator for Points<'_> {}
