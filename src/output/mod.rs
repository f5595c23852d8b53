mod events;
mod summary;

pub use events::{ClientEvent, EventStream};
pub use summary::{write_summary, SummaryReport};
