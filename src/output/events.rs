//! Job event stream
//!
//! Workers never print. Each job transition is sent as a `JobEvent` over an
//! unbounded channel to a single consumer, which owns all display state.

use crate::state::JobState;
use std::fmt;
use tokio::sync::mpsc;

/// Which pool a job belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Crawl,
    Download,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Crawl => write!(f, "page"),
            Self::Download => write!(f, "entry"),
        }
    }
}

/// One job transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobEvent {
    pub kind: JobKind,
    /// Page number for crawl jobs, entry index for download jobs
    pub id: usize,
    pub state: JobState,
}

impl JobEvent {
    pub fn new(kind: JobKind, id: usize, state: JobState) -> Self {
        Self { kind, id, state }
    }
}

pub type EventSink = mpsc::UnboundedSender<JobEvent>;
pub type EventStream = mpsc::UnboundedReceiver<JobEvent>;

/// Creates a sink/stream pair for job events
pub fn event_channel() -> (EventSink, EventStream) {
    mpsc::unbounded_channel()
}

/// Sends an event if a sink is attached
///
/// A closed channel only means nobody is listening any more.
pub fn emit(sink: Option<&EventSink>, event: JobEvent) {
    if let Some(sink) = sink {
        let _ = sink.send(event);
    }
}

/// Counts observed by the event consumer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventTally {
    pub dispatched: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl EventTally {
    pub fn record(&mut self, state: &JobState) {
        match state {
            JobState::Dispatched => self.dispatched += 1,
            JobState::Succeeded => self.succeeded += 1,
            JobState::Failed(_) => self.failed += 1,
        }
    }
}

/// Drains the stream until every sink is dropped, logging each transition
pub async fn consume_events(mut stream: EventStream) -> EventTally {
    let mut tally = EventTally::default();

    while let Some(event) = stream.recv().await {
        tally.record(&event.state);
        match &event.state {
            JobState::Dispatched => {
                tracing::debug!("{} {} dispatched", event.kind, event.id);
            }
            JobState::Succeeded => {
                tracing::info!(
                    "{} {} done ({} ok, {} failed)",
                    event.kind,
                    event.id,
                    tally.succeeded,
                    tally.failed
                );
            }
            JobState::Failed(reason) => {
                tracing::warn!(
                    "{} {} failed: {} ({} ok, {} failed)",
                    event.kind,
                    event.id,
                    reason,
                    tally.succeeded,
                    tally.failed
                );
            }
        }
    }

    tally
}
