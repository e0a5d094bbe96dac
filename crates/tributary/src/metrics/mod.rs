//! Metric events emitted by the reader.

pub mod events;
