//! Trade-log analytics: normalization, strategy filtering, statistics and
//! the derived views (equity curve, recent events, PnL distribution).

pub mod normalize;
pub mod filter;
pub mod stats;
pub mod curve;
pub mod distribution;
pub mod snapshot;

pub use normalize::*;
pub use filter::*;
pub use stats::*;
pub use curve::*;
pub use distribution::*;
pub use snapshot::*;
