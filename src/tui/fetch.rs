//! Background fetches for the TUI.
//!
//! Each of the three flows (locations, metrics, data) carries its own
//! generation counter. Issuing a request bumps the counter; a response is
//! applied only if its generation is still the latest issued for its flow.
//! Jobs run on the rayon global pool and report back over a channel that the
//! event loop drains between key presses.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use crate::data::AnalyticsSource;
use crate::domain::{AnalyticsPayload, DataQuery, HousingType, MetricCatalog};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFlow {
    Locations,
    Metrics,
    Data,
}

impl FetchFlow {
    fn index(self) -> usize {
        match self {
            FetchFlow::Locations => 0,
            FetchFlow::Metrics => 1,
            FetchFlow::Data => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FetchFlow::Locations => "locations",
            FetchFlow::Metrics => "metrics",
            FetchFlow::Data => "data",
        }
    }
}

/// Latest issued and latest settled generation per flow.
#[derive(Debug, Default, Clone)]
pub struct RequestTracker {
    issued: [u64; 3],
    settled: [u64; 3],
}

impl RequestTracker {
    /// Start a new request for `flow`; every earlier one becomes stale.
    pub fn issue(&mut self, flow: FetchFlow) -> u64 {
        let slot = &mut self.issued[flow.index()];
        *slot += 1;
        *slot
    }

    pub fn is_current(&self, flow: FetchFlow, generation: u64) -> bool {
        self.issued[flow.index()] == generation
    }

    /// Record a response. Returns `false` for stale generations.
    pub fn settle(&mut self, flow: FetchFlow, generation: u64) -> bool {
        if !self.is_current(flow, generation) {
            return false;
        }
        self.settled[flow.index()] = generation;
        true
    }

    /// A request for `flow` has been issued and its response not yet applied.
    pub fn is_pending(&self, flow: FetchFlow) -> bool {
        self.issued[flow.index()] != self.settled[flow.index()]
    }
}

#[derive(Debug)]
pub enum FetchOutcome {
    Locations {
        housing_type: HousingType,
        result: Result<Vec<String>, AppError>,
    },
    Metrics(Result<MetricCatalog, AppError>),
    Data {
        query: DataQuery,
        result: Result<AnalyticsPayload, AppError>,
    },
}

impl FetchOutcome {
    pub fn flow(&self) -> FetchFlow {
        match self {
            FetchOutcome::Locations { .. } => FetchFlow::Locations,
            FetchOutcome::Metrics(_) => FetchFlow::Metrics,
            FetchOutcome::Data { .. } => FetchFlow::Data,
        }
    }
}

struct Response {
    generation: u64,
    outcome: FetchOutcome,
}

pub struct Fetcher {
    source: Arc<dyn AnalyticsSource>,
    tracker: RequestTracker,
    tx: Sender<Response>,
    rx: Receiver<Response>,
    stale: u64,
}

impl Fetcher {
    pub fn new(source: Arc<dyn AnalyticsSource>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            tracker: RequestTracker::default(),
            tx,
            rx,
            stale: 0,
        }
    }

    pub fn describe_source(&self) -> String {
        self.source.describe()
    }

    pub fn is_pending(&self, flow: FetchFlow) -> bool {
        self.tracker.is_pending(flow)
    }

    /// Number of responses dropped because a newer request had been issued.
    pub fn stale_count(&self) -> u64 {
        self.stale
    }

    pub fn request_locations(&mut self, housing_type: HousingType) -> u64 {
        self.spawn(FetchFlow::Locations, move |source| FetchOutcome::Locations {
            housing_type,
            result: source.fetch_locations(housing_type),
        })
    }

    pub fn request_metrics(&mut self) -> u64 {
        self.spawn(FetchFlow::Metrics, |source| {
            FetchOutcome::Metrics(source.fetch_metrics())
        })
    }

    pub fn request_data(&mut self, query: DataQuery) -> u64 {
        self.spawn(FetchFlow::Data, move |source| {
            let result = source.fetch_payload(&query);
            FetchOutcome::Data { query, result }
        })
    }

    /// Invalidate whatever is in flight for `flow` without issuing a new request.
    pub fn cancel(&mut self, flow: FetchFlow) {
        let generation = self.tracker.issue(flow);
        self.tracker.settle(flow, generation);
    }

    /// Drain finished jobs, returning only current responses in arrival order.
    pub fn poll(&mut self) -> Vec<FetchOutcome> {
        let mut out = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(response) => {
                    let flow = response.outcome.flow();
                    if self.tracker.settle(flow, response.generation) {
                        out.push(response.outcome);
                    } else {
                        self.stale += 1;
                        log::warn!(
                            "discarding stale {} response (generation {})",
                            flow.name(),
                            response.generation
                        );
                    }
                }
                // The fetcher holds a sender, so the channel never disconnects.
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        out
    }

    fn spawn<F>(&mut self, flow: FetchFlow, job: F) -> u64
    where
        F: FnOnce(&dyn AnalyticsSource) -> FetchOutcome + Send + 'static,
    {
        let generation = self.tracker.issue(flow);
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        rayon::spawn(move || {
            let outcome = job(source.as_ref());
            // The receiver is gone only when the TUI has exited.
            let _ = tx.send(Response { generation, outcome });
        });
        generation
    }
}
