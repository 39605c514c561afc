//! Rate counting, aggregation and report formatting.
//!
//! Producers count into a [`CounterTable`]; the [`Aggregator`] turns the
//! counts into per-second rates once per interval and the [`Reporter`]
//! formats each resulting [`Cycle`] into report lines.

pub mod aggregator;
pub mod counter;
pub mod fps_counter;
pub mod reporter;
pub mod table;

pub use aggregator::{Aggregator, Cycle};
pub use counter::{Counter, CounterHandle, CounterView};
pub use fps_counter::FpsCounter;
pub use reporter::Reporter;
pub use table::CounterTable;
