//! Debounced per-key operation scheduling

pub mod keyed;


pub use keyed::{DispatchFn, KeyedScheduler};
