//! Request middleware that is not provided by `tower-http`.

pub mod metrics;

pub use self::metrics::track_metrics;
