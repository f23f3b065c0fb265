//! Async task queue for ticket issuance.
//!
//! The HTTP path enqueues `(event_id, user_id)` pairs and returns
//! immediately; a pool of workers drains the channel and drives the
//! issuance engine. Delivery is at-least-once: transient engine failures
//! are retried a bounded number of times, then logged as permanently
//! failed. Business outcomes (`SoldOut`, `EventNotFound`) are terminal and
//! never retried. No ordering is guaranteed, per event or otherwise; the
//! engine's row lock is the sole capacity-correctness mechanism.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::services::ticket::{IssueOutcome, Issuer};
use crate::utils::error::AppError;

const RETRY_BASE_DELAY_MS: u64 = 100;

#[derive(Debug, Clone, Copy)]
pub struct IssueRequest {
    pub event_id: Uuid,
    pub user_id: Uuid,
}

/// Clonable producer handle held in app state.
#[derive(Clone)]
pub struct TicketQueue {
    tx: mpsc::Sender<IssueRequest>,
}

impl TicketQueue {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<IssueRequest>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Non-blocking enqueue; a full queue is surfaced to the caller as a
    /// retryable 503 rather than stalling the request path.
    pub fn enqueue(&self, request: IssueRequest) -> Result<(), AppError> {
        self.tx.try_send(request).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                AppError::Unavailable("Ticket queue is full, try again later".to_string())
            }
            mpsc::error::TrySendError::Closed(_) => {
                AppError::Internal("Ticket queue is closed".to_string())
            }
        })
    }
}

/// Spawns `workers` tasks draining the shared receiver.
pub fn spawn_issue_workers(
    workers: usize,
    issuer: Arc<dyn Issuer>,
    rx: mpsc::Receiver<IssueRequest>,
    max_retries: u32,
) -> Vec<JoinHandle<()>> {
    let rx = Arc::new(Mutex::new(rx));
    (0..workers)
        .map(|worker| {
            let issuer = Arc::clone(&issuer);
            let rx = Arc::clone(&rx);
            tokio::spawn(async move {
                loop {
                    let request = { rx.lock().await.recv().await };
                    match request {
                        Some(request) => process(&*issuer, request, max_retries).await,
                        None => {
                            tracing::debug!(worker, "Ticket queue closed, worker exiting");
                            break;
                        }
                    }
                }
            })
        })
        .collect()
}

async fn process(issuer: &dyn Issuer, request: IssueRequest, max_retries: u32) {
    for attempt in 0..=max_retries {
        match issuer.issue(request.event_id, request.user_id).await {
            Ok(IssueOutcome::Issued(ticket)) => {
                tracing::info!(
                    event_id = %request.event_id,
                    ticket_id = %ticket.id,
                    "Queued issuance completed"
                );
                return;
            }
            Ok(IssueOutcome::SoldOut) => {
                tracing::info!(
                    event_id = %request.event_id,
                    user_id = %request.user_id,
                    "Event sold out"
                );
                return;
            }
            Ok(IssueOutcome::EventNotFound) => {
                tracing::warn!(event_id = %request.event_id, "Queued issuance for unknown event");
                return;
            }
            Err(e) if attempt < max_retries => {
                let delay = Duration::from_millis(RETRY_BASE_DELAY_MS << attempt);
                tracing::warn!(
                    event_id = %request.event_id,
                    attempt,
                    error = %e,
                    "Issuance failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                // Terminal failure is not delivered back to the original caller
                tracing::error!(
                    event_id = %request.event_id,
                    user_id = %request.user_id,
                    error = %e,
                    "Issuance permanently failed after retries"
                );
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventTicket;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn dummy_ticket(event_id: Uuid, user_id: Uuid) -> EventTicket {
        EventTicket {
            id: Uuid::new_v4(),
            event_id,
            user_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// In-memory engine enforcing capacity atomically, standing in for the
    /// row-locked PostgreSQL transaction.
    struct FakeEngine {
        capacity: u32,
        issued: Mutex<u32>,
        sold_out: AtomicU32,
        calls: AtomicU32,
    }

    impl FakeEngine {
        fn with_capacity(capacity: u32) -> Self {
            Self {
                capacity,
                issued: Mutex::new(0),
                sold_out: AtomicU32::new(0),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Issuer for FakeEngine {
        async fn issue(&self, event_id: Uuid, user_id: Uuid) -> Result<IssueOutcome, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut issued = self.issued.lock().await;
            if *issued < self.capacity {
                *issued += 1;
                Ok(IssueOutcome::Issued(dummy_ticket(event_id, user_id)))
            } else {
                self.sold_out.fetch_add(1, Ordering::SeqCst);
                Ok(IssueOutcome::SoldOut)
            }
        }
    }

    /// Fails with a transient error a fixed number of times, then issues.
    struct FlakyEngine {
        failures_left: AtomicU32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Issuer for FlakyEngine {
        async fn issue(&self, event_id: Uuid, user_id: Uuid) -> Result<IssueOutcome, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                Err(AppError::Internal("transient".to_string()))
            } else {
                Ok(IssueOutcome::Issued(dummy_ticket(event_id, user_id)))
            }
        }
    }

    #[tokio::test]
    async fn test_capacity_never_exceeded_under_concurrency() {
        const CAPACITY: u32 = 5;
        const REQUESTS: u32 = 20;

        let engine = Arc::new(FakeEngine::with_capacity(CAPACITY));
        let (queue, rx) = TicketQueue::new(REQUESTS as usize);
        let handles = spawn_issue_workers(4, engine.clone() as Arc<dyn Issuer>, rx, 0);

        let event_id = Uuid::new_v4();
        for _ in 0..REQUESTS {
            queue
                .enqueue(IssueRequest {
                    event_id,
                    user_id: Uuid::new_v4(),
                })
                .unwrap();
        }

        drop(queue);
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*engine.issued.lock().await, CAPACITY);
        assert_eq!(engine.sold_out.load(Ordering::SeqCst), REQUESTS - CAPACITY);
    }

    #[tokio::test]
    async fn test_capacity_one_two_requesters() {
        let engine = Arc::new(FakeEngine::with_capacity(1));
        let (queue, rx) = TicketQueue::new(8);
        let handles = spawn_issue_workers(2, engine.clone() as Arc<dyn Issuer>, rx, 0);

        let event_id = Uuid::new_v4();
        for _ in 0..2 {
            queue
                .enqueue(IssueRequest {
                    event_id,
                    user_id: Uuid::new_v4(),
                })
                .unwrap();
        }

        drop(queue);
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*engine.issued.lock().await, 1);
        assert_eq!(engine.sold_out.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_capacity_zero_sold_out_first_attempt() {
        let engine = Arc::new(FakeEngine::with_capacity(0));
        let (queue, rx) = TicketQueue::new(1);
        let handles = spawn_issue_workers(1, engine.clone() as Arc<dyn Issuer>, rx, 3);

        queue
            .enqueue(IssueRequest {
                event_id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
            })
            .unwrap();

        drop(queue);
        for handle in handles {
            handle.await.unwrap();
        }

        // Sold out is terminal: exactly one engine call despite retries allowed
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
        assert_eq!(engine.sold_out.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_retried_until_success() {
        let engine = Arc::new(FlakyEngine {
            failures_left: AtomicU32::new(2),
            calls: AtomicU32::new(0),
        });
        let (queue, rx) = TicketQueue::new(1);
        let handles = spawn_issue_workers(1, engine.clone() as Arc<dyn Issuer>, rx, 3);

        queue
            .enqueue(IssueRequest {
                event_id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
            })
            .unwrap();

        drop(queue);
        for handle in handles {
            handle.await.unwrap();
        }

        // 2 failures + 1 success
        assert_eq!(engine.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_give_up() {
        let engine = Arc::new(FlakyEngine {
            failures_left: AtomicU32::new(u32::MAX),
            calls: AtomicU32::new(0),
        });
        let (queue, rx) = TicketQueue::new(1);
        let handles = spawn_issue_workers(1, engine.clone() as Arc<dyn Issuer>, rx, 2);

        queue
            .enqueue(IssueRequest {
                event_id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
            })
            .unwrap();

        drop(queue);
        for handle in handles {
            handle.await.unwrap();
        }

        // Initial attempt + 2 retries, then permanent failure
        assert_eq!(engine.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_full_queue_rejects_enqueue() {
        let (queue, _rx) = TicketQueue::new(1);
        let request = IssueRequest {
            event_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
        };

        queue.enqueue(request).unwrap();
        let err = queue.enqueue(request).unwrap_err();
        assert!(matches!(err, AppError::Unavailable(_)));
    }
}
