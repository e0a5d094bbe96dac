//! Metrics plumbing shared by the tributary crates.
//!
//! Crates define their own event structs and implement
//! [`events::InternalEvent`] for them; the [`emit!`] macro records them.

pub mod events;

/// Macro for emitting metric events.
///
/// ```ignore
/// use tributary_core::emit;
///
/// emit!(RowsRead { count: 100, group: "orders".into() });
/// ```
#[macro_export]
macro_rules! emit {
    ($event:expr) => {
        <_ as $crate::metrics::events::InternalEvent>::emit($event)
    };
}

pub use emit;
