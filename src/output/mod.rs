//! Output module for progress events and run summaries
//!
//! This module handles:
//! - The job event stream workers report transitions on
//! - Printing the merged entry list
//! - Printing crawl and download tallies

mod events;
pub mod stats;

pub use events::{
    consume_events, emit, event_channel, EventSink, EventStream, EventTally, JobEvent, JobKind,
};
pub use stats::{format_size, print_crawl_summary, print_download_summary, print_entries};
