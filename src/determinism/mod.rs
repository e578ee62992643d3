//! Deterministic building blocks shared by the rest of the crate.
//!
//! Everything under this module is pure, synchronous, and allocation-only
//! — no system clock, no randomness, no I/O. Higher layers (the
//! specification runner, the feed cache) build their guarantees on top
//! of these primitives.

pub mod hashing;
pub mod stable_sort;
