//! HTTP middleware.

pub mod timing;

pub use timing::{timing_layer, SlowRequestThreshold};
