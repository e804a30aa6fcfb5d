mod chart;

pub use chart::{Chart, ChartError, ChartMeta, ChartResponse, ChartResult, Indicators, Quote};
