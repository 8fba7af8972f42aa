pub mod backend;

use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::query::QueryKey;

pub use backend::{
    Backend, BackendSetupError, FetchResult, HttpBackend, HttpOptions, Row, TransportError,
};

struct Completion {
    sequence: u64,
    key: QueryKey,
    result: Result<FetchResult, TransportError>,
}

/// A response that survived the staleness check.
#[derive(Debug)]
pub enum FetchOutcome {
    Accepted {
        sequence: u64,
        key: QueryKey,
        result: FetchResult,
    },
    Failed {
        sequence: u64,
        key: QueryKey,
        error: TransportError,
    },
}

impl FetchOutcome {
    pub fn sequence(&self) -> u64 {
        match self {
            Self::Accepted { sequence, .. } | Self::Failed { sequence, .. } => *sequence,
        }
    }

    pub fn key(&self) -> &QueryKey {
        match self {
            Self::Accepted { key, .. } | Self::Failed { key, .. } => key,
        }
    }
}

/// Issues page requests and hands back responses in arrival order, dropping
/// any response older than one already processed.
///
/// In-flight requests are never cancelled. Everything runs on the caller's
/// task: `issue` only queues the request future, and it is polled from
/// `next_outcome`.
pub struct FetchCoordinator<B> {
    backend: Rc<B>,
    next_sequence: u64,
    latest_processed: Option<u64>,
    discarded: u64,
    in_flight: FuturesUnordered<LocalBoxFuture<'static, Completion>>,
}

impl<B: Backend + 'static> FetchCoordinator<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Rc::new(backend),
            next_sequence: 0,
            latest_processed: None,
            discarded: 0,
            in_flight: FuturesUnordered::new(),
        }
    }

    pub fn issue(&mut self, key: QueryKey) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        info!(sequence, key = %key, "issuing page request");

        let backend = Rc::clone(&self.backend);
        self.in_flight.push(Box::pin(async move {
            let result = backend.fetch_page(&key).await;
            Completion {
                sequence,
                key,
                result,
            }
        }));
        sequence
    }

    /// Waits for the next non-stale response. Returns `None` once nothing is
    /// left in flight.
    pub async fn next_outcome(&mut self) -> Option<FetchOutcome> {
        while let Some(completion) = self.in_flight.next().await {
            if let Some(outcome) = self.process(completion) {
                return Some(outcome);
            }
        }
        None
    }

    fn process(&mut self, completion: Completion) -> Option<FetchOutcome> {
        let Completion {
            sequence,
            key,
            result,
        } = completion;

        if let Some(latest) = self.latest_processed {
            if sequence < latest {
                self.discarded += 1;
                debug!(sequence, latest, key = %key, "discarding stale response");
                return None;
            }
        }
        self.latest_processed = Some(sequence);

        match result {
            Ok(result) => {
                info!(
                    sequence,
                    rows = result.rows.len(),
                    total = result.total_count,
                    "page received"
                );
                Some(FetchOutcome::Accepted {
                    sequence,
                    key,
                    result,
                })
            }
            Err(error) => {
                warn!(sequence, key = %key, "page request failed: {error}");
                Some(FetchOutcome::Failed {
                    sequence,
                    key,
                    error,
                })
            }
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn requests_issued(&self) -> u64 {
        self.next_sequence
    }

    pub fn latest_issued(&self) -> Option<u64> {
        self.next_sequence.checked_sub(1)
    }

    pub fn latest_processed(&self) -> Option<u64> {
        self.latest_processed
    }

    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}

impl<B> Drop for FetchCoordinator<B> {
    fn drop(&mut self) {
        if !self.in_flight.is_empty() {
            debug!(
                orphaned = self.in_flight.len(),
                "dropping unanswered page requests"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryState;
    use crate::tests::{assert_pending, ScriptedBackend};

    fn key_for_page(page: usize) -> QueryKey {
        QueryState::default().with_page(page).key()
    }

    #[tokio::test]
    async fn sequence_numbers_start_at_zero_and_increase() {
        let mut coordinator = FetchCoordinator::new(ScriptedBackend::default());
        assert_eq!(coordinator.latest_issued(), None);
        assert_eq!(coordinator.issue(key_for_page(0)), 0);
        assert_eq!(coordinator.issue(key_for_page(1)), 1);
        assert_eq!(coordinator.issue(key_for_page(0)), 2);
        assert_eq!(coordinator.latest_issued(), Some(2));
        assert_eq!(coordinator.requests_issued(), 3);
        assert_eq!(coordinator.in_flight(), 3);
    }

    #[tokio::test]
    async fn late_response_from_older_request_is_discarded() {
        let backend = ScriptedBackend::default();
        let mut coordinator = FetchCoordinator::new(backend.clone());
        for page in 0..5 {
            coordinator.issue(key_for_page(page));
        }
        assert_pending(coordinator.next_outcome());
        assert_eq!(backend.calls().len(), 5);

        backend.respond_ok(&key_for_page(4), 50);
        backend.respond_ok(&key_for_page(3), 50);

        let first = coordinator.next_outcome().await.unwrap();
        assert_eq!(first.sequence(), 4);
        assert_eq!(first.key(), &key_for_page(4));

        backend.respond_ok(&key_for_page(0), 50);
        backend.respond_err(&key_for_page(1), 503);
        backend.respond_ok(&key_for_page(2), 50);
        assert!(coordinator.next_outcome().await.is_none());
        assert_eq!(coordinator.discarded(), 4);
        assert_eq!(coordinator.latest_processed(), Some(4));
    }

    #[tokio::test]
    async fn newer_responses_are_accepted_in_arrival_order() {
        let backend = ScriptedBackend::default();
        let mut coordinator = FetchCoordinator::new(backend.clone());
        coordinator.issue(key_for_page(0));
        coordinator.issue(key_for_page(1));
        assert_pending(coordinator.next_outcome());

        backend.respond_ok(&key_for_page(0), 20);
        let outcome = coordinator.next_outcome().await.unwrap();
        assert_eq!(outcome.sequence(), 0);

        backend.respond_err(&key_for_page(1), 500);
        match coordinator.next_outcome().await.unwrap() {
            FetchOutcome::Failed { sequence, error, .. } => {
                assert_eq!(sequence, 1);
                assert!(matches!(error, TransportError::Status { status: 500, .. }));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(coordinator.discarded(), 0);
    }

    #[tokio::test]
    async fn idle_coordinator_has_no_outcome() {
        let mut coordinator = FetchCoordinator::new(ScriptedBackend::default());
        assert!(coordinator.next_outcome().await.is_none());
    }
}
