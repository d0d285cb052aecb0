//! Draw passes over a set of shared series.
//!
//! A [`Plot`] does no drawing itself. It hands each series to a caller
//! supplied callback inside a read scope, which is entered right before the
//! callback and released right after it, whether the callback succeeds or
//! fails.

use std::sync::Arc;

use crate::series::{ReadScope, XySeries};
use crate::view::Viewport;

/// Ordered collection of series drawn together.
#[derive(Debug, Clone, Default)]
pub struct Plot {
    title: Option<String>,
    series: Vec<Arc<XySeries>>,
}

impl Plot {
    /// Create an empty plot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building a plot with custom configuration.
    pub fn builder() -> PlotBuilder {
        PlotBuilder::default()
    }

    /// Access the plot title.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Access all series.
    pub fn series(&self) -> &[Arc<XySeries>] {
        &self.series
    }

    /// Add a series shared with its producer.
    pub fn add_series(&mut self, series: Arc<XySeries>) {
        self.series.push(series);
    }

    /// Remove a series, matched by identity. Returns whether it was present.
    pub fn remove_series(&mut self, series: &Arc<XySeries>) -> bool {
        let before = self.series.len();
        self.series.retain(|existing| !Arc::ptr_eq(existing, series));
        self.series.len() != before
    }

    /// Current generation of every series, in draw order.
    ///
    /// Compare with the value from the previous pass to skip unchanged data.
    pub fn generations(&self) -> Vec<u64> {
        self.series.iter().map(|series| series.generation()).collect()
    }

    /// Compute bounds across all series.
    pub fn data_bounds(&self) -> Option<Viewport> {
        let mut bounds: Option<Viewport> = None;
        for series in &self.series {
            if let Some(next) = series.bounds() {
                bounds = Some(match bounds {
                    None => next,
                    Some(existing) => Viewport::union(existing, next)?,
                });
            }
        }
        bounds
    }

    /// Run one draw pass.
    ///
    /// `draw` is called once per series, in order, with the series index and
    /// a read scope. Only one series is locked at a time. The first error
    /// stops the pass and is returned after that series' scope is released.
    ///
    /// Read through the scope inside `draw`. Calling methods of the series
    /// being drawn (for example `plot.series()[index].size()`) takes a second
    /// read lock, which waits behind any queued writer and never returns.
    pub fn draw<E>(
        &self,
        mut draw: impl FnMut(usize, &ReadScope<'_>) -> Result<(), E>,
    ) -> Result<(), E>
    where
        E: std::fmt::Display,
    {
        let span = tracing::debug_span!("draw_pass", series = self.series.len());
        let _enter = span.enter();
        for (index, series) in self.series.iter().enumerate() {
            let scope = series.begin_read();
            let result = draw(index, &scope);
            scope.end();
            if let Err(err) = result {
                tracing::warn!(index, %err, "draw callback failed");
                return Err(err);
            }
        }
        Ok(())
    }
}

/// Builder for configuring a plot before construction.
#[derive(Debug, Default)]
pub struct PlotBuilder {
    title: Option<String>,
    series: Vec<Arc<XySeries>>,
}

impl PlotBuilder {
    /// Set the plot title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Add a series to the plot.
    pub fn series(mut self, series: Arc<XySeries>) -> Self {
        self.series.push(series);
        self
    }

    /// Build the plot.
    pub fn build(self) -> Plot {
        Plot {
            title: self.title,
            series: self.series,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::ArrayFormat;
    use crate::error::SeriesError;
    use crate::series::XySeriesSource;

    fn two_series_plot() -> (Plot, Arc<XySeries>, Arc<XySeries>) {
        let a = Arc::new(XySeries::from_model([1.0, 2.0], ArrayFormat::YValsOnly, "a").unwrap());
        let b = Arc::new(XySeries::from_xy_vals([-3.0], [9.0], "b").unwrap());
        let plot = Plot::builder()
            .title("p")
            .series(Arc::clone(&a))
            .series(Arc::clone(&b))
            .build();
        (plot, a, b)
    }

    #[test]
    fn draw_visits_every_series_in_order() {
        let (plot, _, _) = two_series_plot();
        let mut seen = Vec::new();
        plot.draw(|index, scope| {
            seen.push((index, scope.title().map(str::to_owned), scope.size()));
            Ok::<_, SeriesError>(())
        })
        .unwrap();
        assert_eq!(
            seen,
            vec![(0, Some("a".to_string()), 2), (1, Some("b".to_string()), 1)]
        );
    }

    #[test]
    fn failed_draw_releases_the_series() {
        let (plot, a, b) = two_series_plot();
        let result = plot.draw(|_, scope| scope.y(5).map(|_| ()));
        assert_eq!(
            result,
            Err(SeriesError::IndexOutOfRange { index: 5, len: 2 })
        );
        a.add_last(0.0, 3.0);
        b.clear();
        assert_eq!(a.size(), 3);
        assert!(b.is_empty());
    }

    #[test]
    fn bounds_union_all_series() {
        let (plot, _, _) = two_series_plot();
        let bounds = plot.data_bounds().unwrap();
        assert_eq!((bounds.x.min, bounds.x.max), (-3.0, 1.0));
        assert_eq!((bounds.y.min, bounds.y.max), (1.0, 9.0));
    }

    #[test]
    fn remove_series_matches_identity() {
        let (mut plot, a, _) = two_series_plot();
        let stranger = Arc::new(XySeries::new("a"));
        assert!(!plot.remove_series(&stranger));
        assert!(plot.remove_series(&a));
        assert_eq!(plot.series().len(), 1);
        assert_eq!(plot.generations().len(), 1);
    }
}
