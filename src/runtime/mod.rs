//! Running specifications against a fact source.
//!
//! `source` defines the suspending capability the rest of this module is
//! built against; `runner` evaluates a specification into projected
//! rows; `inverter` derives, from a specification, the inverted
//! specifications that re-derive its givens from a newly-written fact;
//! `feed` decomposes a specification into the narrow triggers a storage
//! layer watches for incremental delivery, and caches them.

pub mod feed;
pub mod inverter;
pub mod runner;
pub mod source;
pub mod value;

pub use feed::{decompose_feeds, Feed, FeedCache};
pub use inverter::{invert, Inversion};
pub use runner::run;
pub use source::FactSource;
pub use value::Value;
