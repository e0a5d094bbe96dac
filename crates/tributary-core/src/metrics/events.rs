//! The event trait behind [`crate::emit!`].
//!
//! Each event struct represents a measurable occurrence. Implementations
//! record the matching `metrics` counter, gauge or histogram and usually a
//! `trace!` line with the same fields.

/// Trait for internal events that can be emitted as metrics.
pub trait InternalEvent {
    /// Emit this event as a metric.
    fn emit(self);
}
