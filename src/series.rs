//! Thread-safe series shared between data producers and renderers.
//!
//! [`XySeries`] guards a [`SeriesData`] with one fair reader/writer lock.
//! Every mutator holds the write lock for its whole duration; a renderer
//! brackets its pass with [`XySeries::begin_read`] and [`ReadScope::end`] (or
//! simply drops the scope), so the size and every index valid at scope entry
//! stay valid until the scope is released.
//!
//! The title lives inside the same lock as the data, so readers never see a
//! title update that is newer than the data they observed.

use std::collections::VecDeque;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::datasource::{ArrayFormat, Points, SeriesData, XMode};
use crate::error::SeriesError;
use crate::geom::Point;
use crate::view::Viewport;

/// Read access to an ordered (x, y) series.
///
/// This is what a renderer iterates: `size()` pairs, addressed by index.
pub trait XySeriesSource {
    /// Series title, if any.
    fn title(&self) -> Option<&str>;

    /// Number of pairs.
    fn size(&self) -> usize;

    /// X value at `index`.
    fn x(&self, index: usize) -> Result<f64, SeriesError>;

    /// Y value at `index`.
    fn y(&self, index: usize) -> Result<f64, SeriesError>;
}

impl XySeriesSource for SeriesData {
    fn title(&self) -> Option<&str> {
        SeriesData::title(self)
    }

    fn size(&self) -> usize {
        self.len()
    }

    fn x(&self, index: usize) -> Result<f64, SeriesError> {
        SeriesData::x(self, index)
    }

    fn y(&self, index: usize) -> Result<f64, SeriesError> {
        SeriesData::y(self, index)
    }
}

/// Ordered (x, y) series safe to mutate while other threads render it.
///
/// Share it behind an [`Arc`](std::sync::Arc). Locks are released fairly:
/// the next queued reader or writer is handed the lock in arrival order, so
/// neither a stream of redraws nor a stream of updates can starve the other.
#[derive(Debug, Default)]
pub struct XySeries {
    inner: RwLock<SeriesData>,
}

impl XySeries {
    /// Create an empty series with explicit X values.
    pub fn new(title: impl Into<String>) -> Self {
        Self::from_data(SeriesData::new(Some(title.into())))
    }

    /// Build a series from a flat model.
    ///
    /// Odd-sized interleaved input fails with
    /// [`SeriesError::OddLengthInterleaved`], as it does for
    /// [`XySeries::set_model`].
    pub fn from_model<I, T>(
        model: I,
        format: ArrayFormat,
        title: impl Into<String>,
    ) -> Result<Self, SeriesError>
    where
        I: IntoIterator<Item = T>,
        T: Into<f64>,
    {
        SeriesData::from_model(model, format, Some(title.into())).map(Self::from_data)
    }

    /// Build a series from paired X and Y values of equal length.
    pub fn from_xy_vals<X, Y, T, U>(
        x: X,
        y: Y,
        title: impl Into<String>,
    ) -> Result<Self, SeriesError>
    where
        X: IntoIterator<Item = T>,
        Y: IntoIterator<Item = U>,
        T: Into<f64>,
        U: Into<f64>,
    {
        SeriesData::from_xy_vals(x, y, Some(title.into())).map(Self::from_data)
    }

    /// Wrap existing data.
    pub fn from_data(data: SeriesData) -> Self {
        Self {
            inner: RwLock::new(data),
        }
    }

    /// Start configuring a series.
    pub fn builder() -> SeriesBuilder {
        SeriesBuilder::default()
    }

    /// Replace the whole content. See [`SeriesData::set_model`].
    ///
    /// `None` empties the series.
    pub fn set_model<I, T>(&self, model: Option<I>, format: ArrayFormat) -> Result<(), SeriesError>
    where
        I: IntoIterator<Item = T>,
        T: Into<f64>,
    {
        // Collect before taking the lock.
        let model: Option<Vec<f64>> =
            model.map(|model| model.into_iter().map(Into::into).collect());
        self.write("set_model", |data| data.set_model(model, format))
    }

    /// Drop stored X values and use element indices instead.
    pub fn use_implicit_x_vals(&self) {
        self.write("use_implicit_x_vals", SeriesData::use_implicit_x_vals)
    }

    /// Set the X value at `index`. Fails in implicit mode.
    pub fn set_x(&self, value: impl Into<f64>, index: usize) -> Result<(), SeriesError> {
        let value = value.into();
        self.write("set_x", |data| data.set_x(value, index))
    }

    /// Set the Y value at `index`.
    pub fn set_y(&self, value: impl Into<f64>, index: usize) -> Result<(), SeriesError> {
        let value = value.into();
        self.write("set_y", |data| data.set_y(value, index))
    }

    /// Set both values at `index` under one write lock.
    pub fn set_xy(
        &self,
        x: impl Into<f64>,
        y: impl Into<f64>,
        index: usize,
    ) -> Result<(), SeriesError> {
        let (x, y) = (x.into(), y.into());
        self.write("set_xy", |data| data.set_xy(x, y, index))
    }

    /// Prepend a pair.
    pub fn add_first(&self, x: impl Into<f64>, y: impl Into<f64>) {
        let (x, y) = (x.into(), y.into());
        self.write("add_first", |data| data.add_first(x, y))
    }

    /// Append a pair.
    pub fn add_last(&self, x: impl Into<f64>, y: impl Into<f64>) {
        let (x, y) = (x.into(), y.into());
        self.write("add_last", |data| data.add_last(x, y))
    }

    /// Remove and return the first pair.
    pub fn remove_first(&self) -> Result<Point, SeriesError> {
        self.write("remove_first", SeriesData::remove_first)
    }

    /// Remove and return the last pair.
    pub fn remove_last(&self) -> Result<Point, SeriesError> {
        self.write("remove_last", SeriesData::remove_last)
    }

    /// Replace the title.
    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        self.write("set_title", |data| data.set_title(Some(title)))
    }

    /// Remove the title.
    pub fn clear_title(&self) {
        self.write("clear_title", |data| data.set_title(None))
    }

    /// Remove all pairs. The X mode is kept.
    pub fn clear(&self) {
        self.write("clear", SeriesData::clear)
    }

    /// Current title.
    pub fn title(&self) -> Option<String> {
        self.read(|data| data.title().map(str::to_owned))
    }

    /// Number of pairs.
    pub fn size(&self) -> usize {
        self.read(SeriesData::len)
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.size()
    }

    /// Check if there are no pairs.
    pub fn is_empty(&self) -> bool {
        self.read(SeriesData::is_empty)
    }

    /// X value at `index`.
    ///
    /// Each call takes its own read lock; iterate inside a [`ReadScope`] to
    /// get values consistent with one `size()`.
    pub fn x(&self, index: usize) -> Result<f64, SeriesError> {
        self.read(|data| data.x(index))
    }

    /// Y value at `index`.
    pub fn y(&self, index: usize) -> Result<f64, SeriesError> {
        self.read(|data| data.y(index))
    }

    /// Access the X mode.
    pub fn x_mode(&self) -> XMode {
        self.read(SeriesData::x_mode)
    }

    /// Copy of the stored X values, or `None` in implicit mode.
    pub fn x_values(&self) -> Option<Vec<f64>> {
        self.read(|data| data.x_values().map(|values| values.iter().copied().collect()))
    }

    /// Copy of the stored Y values.
    pub fn y_values(&self) -> Vec<f64> {
        self.read(|data| data.y_values().iter().copied().collect())
    }

    /// Bounds covering all finite pairs.
    pub fn bounds(&self) -> Option<Viewport> {
        self.read(SeriesData::bounds)
    }

    /// Mutation counter, bumped by every write.
    pub fn generation(&self) -> u64 {
        self.read(SeriesData::generation)
    }

    /// Consistent copy of title and values.
    pub fn snapshot(&self) -> SeriesSnapshot {
        self.read(|data| SeriesSnapshot {
            title: data.title().map(str::to_owned),
            x: data
                .x_values()
                .map(|values| values.iter().copied().collect()),
            y: data.y_values().iter().copied().collect(),
        })
    }

    /// Enter a read scope for a rendering pass.
    ///
    /// Writers block until the scope is ended or dropped. While holding the
    /// scope, read through it rather than through the series: a second read
    /// lock taken behind a queued writer waits for that writer.
    pub fn begin_read(&self) -> ReadScope<'_> {
        let guard = self.inner.read();
        tracing::trace!(size = guard.len(), "read scope entered");
        ReadScope { guard }
    }

    /// Run `f` inside a read scope, releasing it however `f` returns.
    pub fn with_read<R>(&self, f: impl FnOnce(&ReadScope<'_>) -> R) -> R {
        let scope = self.begin_read();
        let result = f(&scope);
        scope.end();
        result
    }

    fn write<R>(&self, op: &'static str, f: impl FnOnce(&mut SeriesData) -> R) -> R {
        let mut guard = self.inner.write();
        let result = f(&mut guard);
        tracing::trace!(op, size = guard.len(), generation = guard.generation(), "series updated");
        RwLockWriteGuard::unlock_fair(guard);
        result
    }

    fn read<R>(&self, f: impl FnOnce(&SeriesData) -> R) -> R {
        let guard = self.inner.read();
        let result = f(&guard);
        RwLockReadGuard::unlock_fair(guard);
        result
    }
}

impl From<SeriesData> for XySeries {
    fn from(data: SeriesData) -> Self {
        Self::from_data(data)
    }
}

/// Shared access to a series for the length of a rendering pass.
///
/// Returned by [`XySeries::begin_read`]. While it is alive no writer can
/// change the series, so `size()` and every index below it stay stable.
/// Dropping the scope releases it as well; [`ReadScope::end`] additionally
/// hands the lock to the next waiter fairly.
#[derive(Debug)]
#[must_use = "the read lock is released as soon as the scope is dropped"]
pub struct ReadScope<'a> {
    guard: RwLockReadGuard<'a, SeriesData>,
}

impl ReadScope<'_> {
    /// Leave the scope.
    pub fn end(self) {
        tracing::trace!("read scope ended");
        RwLockReadGuard::unlock_fair(self.guard);
    }

    /// Access the underlying data.
    pub fn data(&self) -> &SeriesData {
        &self.guard
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.guard.len()
    }

    /// Check if there are no pairs.
    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }

    /// Access the X mode.
    pub fn x_mode(&self) -> XMode {
        self.guard.x_mode()
    }

    /// Stored X values, or `None` in implicit mode.
    ///
    /// The borrow ends with the scope, so the values cannot be read after
    /// the lock is released.
    pub fn x_values(&self) -> Option<&VecDeque<f64>> {
        self.guard.x_values()
    }

    /// Stored Y values.
    pub fn y_values(&self) -> &VecDeque<f64> {
        self.guard.y_values()
    }

    /// Iterate pairs in order.
    pub fn points(&self) -> Points<'_> {
        self.guard.points()
    }

    /// Bounds covering all finite pairs.
    pub fn bounds(&self) -> Option<Viewport> {
        self.guard.bounds()
    }

    /// Mutation counter at scope entry.
    pub fn generation(&self) -> u64 {
        self.guard.generation()
    }
}

impl XySeriesSource for ReadScope<'_> {
    fn title(&self) -> Option<&str> {
        self.guard.title()
    }

    fn size(&self) -> usize {
        self.guard.len()
    }

    fn x(&self, index: usize) -> Result<f64, SeriesError> {
        self.guard.x(index)
    }

    fn y(&self, index: usize) -> Result<f64, SeriesError> {
        self.guard.y(index)
    }
}

/// Owned copy of a series taken under one read lock.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeriesSnapshot {
    /// Series title.
    pub title: Option<String>,
    /// X values, `None` in implicit mode.
    pub x: Option<Vec<f64>>,
    /// Y values.
    pub y: Vec<f64>,
}

impl TryFrom<SeriesSnapshot> for XySeries {
    type Error = SeriesError;

    fn try_from(snapshot: SeriesSnapshot) -> Result<Self, Self::Error> {
        let data = match snapshot.x {
            Some(x) => SeriesData::from_xy_vals(x, snapshot.y, snapshot.title)?,
            None => SeriesData::from_model(snapshot.y, ArrayFormat::YValsOnly, snapshot.title)?,
        };
        Ok(Self::from_data(data))
    }
}

#[derive(Debug, Default)]
enum BuilderContent {
    #[default]
    Empty,
    Model(Vec<f64>, ArrayFormat),
    Pairs {
        x: Option<Vec<f64>>,
        y: Option<Vec<f64>>,
    },
}

/// Builder for configuring a series before construction.
///
/// Content is either a flat model or explicit X/Y values; whichever was set
/// last wins.
#[derive(Debug, Default)]
pub struct SeriesBuilder {
    title: Option<String>,
    capacity: usize,
    content: BuilderContent,
}

impl SeriesBuilder {
    /// Set the series title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Reserve room for at least `capacity` pairs.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Use a flat model as initial content.
    pub fn model<I, T>(mut self, model: I, format: ArrayFormat) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<f64>,
    {
        self.content = BuilderContent::Model(model.into_iter().map(Into::into).collect(), format);
        self
    }

    /// Set explicit X values. Requires [`SeriesBuilder::y_vals`] as well.
    pub fn x_vals<I, T>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<f64>,
    {
        let values = Some(values.into_iter().map(Into::into).collect());
        self.content = match self.content {
            BuilderContent::Pairs { y, .. } => BuilderContent::Pairs { x: values, y },
            _ => BuilderContent::Pairs { x: values, y: None },
        };
        self
    }

    /// Set Y values. Requires [`SeriesBuilder::x_vals`] as well.
    pub fn y_vals<I, T>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<f64>,
    {
        let values = Some(values.into_iter().map(Into::into).collect());
        self.content = match self.content {
            BuilderContent::Pairs { x, .. } => BuilderContent::Pairs { x, y: values },
            _ => BuilderContent::Pairs { x: None, y: values },
        };
        self
    }

    /// Build the series.
    ///
    /// Fails with [`SeriesError::NullArgument`] when only one of X and Y
    /// values was given.
    pub fn build(self) -> Result<XySeries, SeriesError> {
        let mut data = match self.content {
            BuilderContent::Empty => SeriesData::with_capacity(self.title, self.capacity),
            BuilderContent::Model(model, format) => {
                SeriesData::from_model(model, format, self.title)?
            }
            BuilderContent::Pairs {
                x: Some(x),
                y: Some(y),
            } => SeriesData::from_xy_vals(x, y, self.title)?,
            BuilderContent::Pairs { .. } => return Err(SeriesError::NullArgument),
        };
        data.reserve(self.capacity.saturating_sub(data.len()));
        Ok(XySeries::from_data(data))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn paired_construction_and_set_xy() {
        let series = XySeries::from_xy_vals([1, 2, 3], [10, 20, 30], "t").unwrap();
        assert_eq!(series.size(), 3);
        assert_eq!(series.x(1), Ok(2.0));
        assert_eq!(series.y(1), Ok(20.0));

        series.set_xy(99, 88, 1).unwrap();
        assert_eq!(series.x(1), Ok(99.0));
        assert_eq!(series.y(1), Ok(88.0));
    }

    #[test]
    fn add_then_remove_last_round_trips() {
        let series = XySeries::from_xy_vals([0.0], [1.0], "rt").unwrap();
        series.add_last(4.5, -2.0);
        assert_eq!(series.remove_last(), Ok(Point::new(4.5, -2.0)));
        assert_eq!(series.size(), 1);
    }

    #[test]
    fn implicit_mode_reports_indices() {
        let series = XySeries::from_xy_vals([7.0, 8.0, 9.0], [1.0, 2.0, 3.0], "s").unwrap();
        series.use_implicit_x_vals();
        assert_eq!(series.x_mode(), XMode::Index);
        assert_eq!(series.x_values(), None);
        for i in 0..series.size() {
            assert_eq!(series.x(i), Ok(i as f64));
        }
        assert!(matches!(
            series.set_x(1.0, 0),
            Err(SeriesError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn remove_from_empty_series_fails() {
        let series = XySeries::new("empty");
        assert_eq!(series.remove_first(), Err(SeriesError::EmptySeries));
        assert_eq!(series.remove_last(), Err(SeriesError::EmptySeries));
    }

    #[test]
    fn title_updates_are_visible() {
        let series = XySeries::new("before");
        series.set_title("after");
        assert_eq!(series.title().as_deref(), Some("after"));
        series.clear_title();
        assert_eq!(series.title(), None);
    }

    #[test]
    fn builder_requires_both_value_sequences() {
        let result = XySeries::builder().title("b").x_vals([1.0]).build();
        assert_eq!(result.unwrap_err(), SeriesError::NullArgument);

        let series = XySeries::builder()
            .title("b")
            .capacity(16)
            .x_vals([1.0, 2.0])
            .y_vals([3.0, 4.0])
            .build()
            .unwrap();
        assert_eq!(series.size(), 2);
        assert_eq!(series.title().as_deref(), Some("b"));
    }

    #[test]
    fn builder_last_content_wins() {
        let series = XySeries::builder()
            .x_vals([1.0])
            .model([1.0, 2.0, 3.0], ArrayFormat::YValsOnly)
            .build()
            .unwrap();
        assert_eq!(series.size(), 3);
        assert_eq!(series.x_mode(), XMode::Index);
    }

    #[test]
    fn snapshot_restores_series() {
        let series = XySeries::from_model([1.0, 2.0], ArrayFormat::YValsOnly, "snap").unwrap();
        let snapshot = series.snapshot();
        assert_eq!(snapshot.x, None);
        let restored = XySeries::try_from(snapshot.clone()).unwrap();
        assert_eq!(restored.snapshot(), snapshot);
    }

    #[test]
    fn generation_tracks_successful_writes() {
        let series = XySeries::new("g");
        let start = series.generation();
        series.add_last(1.0, 1.0);
        assert!(series.set_y(0.0, 5).is_err());
        assert_eq!(series.generation(), start.wrapping_add(1));
    }

    #[test]
    fn read_scope_blocks_writers_until_released() {
        let series = Arc::new(XySeries::from_xy_vals([0.0], [0.0], "lock").unwrap());
        let written = Arc::new(AtomicBool::new(false));

        let scope = series.begin_read();
        let writer = {
            let series = Arc::clone(&series);
            let written = Arc::clone(&written);
            thread::spawn(move || {
                series.add_last(1.0, 1.0);
                written.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!written.load(Ordering::SeqCst));
        assert_eq!(scope.size(), 1);
        scope.end();

        writer.join().unwrap();
        assert!(written.load(Ordering::SeqCst));
        assert_eq!(series.size(), 2);
    }

    #[test]
    fn with_read_releases_on_error() {
        let series = XySeries::new("err");
        let result: Result<f64, SeriesError> = series.with_read(|scope| scope.y(0));
        assert_eq!(
            result,
            Err(SeriesError::IndexOutOfRange { index: 0, len: 0 })
        );
        series.add_last(1.0, 2.0);
        assert_eq!(series.size(), 1);
    }

    #[test]
    fn concurrent_readers_see_stable_scopes() {
        let series = Arc::new(
            XySeries::from_model(0..64, ArrayFormat::YValsOnly, "stress").unwrap(),
        );
        let mut handles = Vec::new();

        for writer in 0..2 {
            let series = Arc::clone(&series);
            handles.push(thread::spawn(move || {
                for i in 0..500 {
                    series.add_last(i, writer);
                    if i % 3 == 0 {
                        series.add_first(-i, writer);
                    }
                    let _ = series.remove_first();
                    if i % 50 == 0 {
                        series.set_model(Some(0..32), ArrayFormat::YValsOnly).unwrap();
                    }
                }
            }));
        }

        for _ in 0..4 {
            let series = Arc::clone(&series);
            handles.push(thread::spawn(move || {
                for _ in 0..200 {
                    let scope = series.begin_read();
                    let size = scope.size();
                    let generation = scope.generation();
                    for i in 0..size {
                        assert_eq!(scope.x(i), Ok(i as f64));
                        assert!(scope.y(i).is_ok());
                    }
                    assert_eq!(scope.points().count(), size);
                    assert_eq!(scope.size(), size);
                    assert_eq!(scope.generation(), generation);
                    scope.end();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
