//! liveplot_series is the data model behind live charts.
//! It stores ordered (x, y) pairs that a producer thread mutates while a
//! render thread reads them inside a lock-guarded scope.

#![forbid(unsafe_code)]

pub mod datasource;
pub mod error;
pub mod geom;
pub mod plot;
pub mod series;
pub mod view;

pub use datasource::{ArrayFormat, Points, SeriesData, XMode, XValues};
pub use error::SeriesError;
pub use geom::Point;
pub use plot::{Plot, PlotBuilder};
pub use series::{ReadScope, SeriesBuilder, SeriesSnapshot, XySeries, XySeriesSource};
pub use view::{Range, Viewport};
