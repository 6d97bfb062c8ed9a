use std::sync::Arc;
use std::time::Duration;

use log::*;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::Backoff;
use crate::rp::RemoteClient;
use crate::session::Session;
use crate::status::{StatusResponse, AUTHENTICATION_FAILED};
use crate::transaction::Transaction;

/// How often a new QR frame is published.
pub const QR_FRAME_INTERVAL: Duration = Duration::from_secs(1);

/// Progress of a watched order.
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// The order is still pending; `message` is the current hint text.
    Pending { message: String },
    /// Next QR frame of a cross-device order.
    QrFrame { index: usize, data: String },
    /// Terminal outcome. Always the last event on the channel.
    Finished(StatusResponse),
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Delay between collect calls while the order is pending.
    pub interval: Duration,
    /// Retry policy for transport errors.
    pub backoff: Backoff,
    /// Capacity of the event channel.
    pub capacity: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            backoff: Backoff::default(),
            capacity: 16,
        }
    }
}

/// Handle to a background task watching one order.
///
/// `next` yields `None` once the task has stopped, either after [`PollEvent::Finished`]
/// or after cancellation. Dropping the handle cancels the task.
pub struct Poller {
    events: mpsc::Receiver<PollEvent>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Poller {
    pub async fn next(&mut self) -> Option<PollEvent> {
        self.events.recv().await
    }

    /// Stop polling. An in-flight collect call is allowed to complete.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<C: RemoteClient + 'static> Session<C> {
    /// Watch the order behind `key` until it completes, fails or is cancelled.
    pub fn watch(self: &Arc<Self>, key: &str, config: PollerConfig) -> Poller {
        let (tx, events) = mpsc::channel(config.capacity.max(1));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            Arc::clone(self),
            key.to_string(),
            config,
            tx,
            cancel.clone(),
        ));

        Poller {
            events,
            cancel,
            handle,
        }
    }
}

async fn run<C: RemoteClient + 'static>(
    session: Arc<Session<C>>,
    key: String,
    config: PollerConfig,
    tx: mpsc::Sender<PollEvent>,
    cancel: CancellationToken,
) {
    let frames_cancel = cancel.child_token();
    let frames = session
        .transaction(&key)
        .filter(|transaction| transaction.is_cross_device())
        .map(|transaction| {
            tokio::spawn(publish_frames(
                transaction,
                tx.clone(),
                frames_cancel.clone(),
            ))
        });

    let finished = collect_until_terminal(&session, &key, &config, &tx, &cancel).await;

    frames_cancel.cancel();
    if let Some(frames) = frames {
        if let Err(e) = frames.await {
            warn!("QR frame publisher stopped abnormally: {}", e);
        }
    }

    match finished {
        Some(response) => {
            debug!("Watched BankID order finished with {:?}", response.status);
            // The receiver may already be gone.
            let _ = tx.send(PollEvent::Finished(response)).await;
        }
        None => debug!("Stopped watching BankID order"),
    }
}

async fn collect_until_terminal<C: RemoteClient + 'static>(
    session: &Session<C>,
    key: &str,
    config: &PollerConfig,
    tx: &mpsc::Sender<PollEvent>,
    cancel: &CancellationToken,
) -> Option<StatusResponse> {
    let mut retries = 0;
    loop {
        if cancel.is_cancelled() {
            return None;
        }

        let delay = match session.status(key).await {
            Ok(response) if response.is_terminal() => return Some(response),
            Ok(response) => {
                retries = 0;
                let event = PollEvent::Pending {
                    message: response.message,
                };
                tokio::select! {
                    _ = cancel.cancelled() => return None,
                    sent = tx.send(event) => {
                        if sent.is_err() {
                            return None;
                        }
                    }
                }
                config.interval
            }
            Err(e) if e.is_transport() => match config.backoff.next_delay(retries) {
                Some(delay) => {
                    retries += 1;
                    warn!("Collect failed, retrying in {:?}: {}", delay, e);
                    delay
                }
                None => {
                    error!("Giving up on BankID order after {} retries: {}", retries, e);
                    return Some(StatusResponse::failed(AUTHENTICATION_FAILED));
                }
            },
            Err(e) => {
                error!("Collect failed: {}", e);
                return Some(StatusResponse::failed(AUTHENTICATION_FAILED));
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => return None,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

/// Publish each frame of the sequence once, one per [`QR_FRAME_INTERVAL`].
async fn publish_frames(
    transaction: Arc<Transaction>,
    tx: mpsc::Sender<PollEvent>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(QR_FRAME_INTERVAL);
    for (index, data) in transaction.code_sequence.iter().enumerate() {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }
        let event = PollEvent::QrFrame {
            index,
            data: data.clone(),
        };
        tokio::select! {
            _ = cancel.cancelled() => return,
            sent = tx.send(event) => {
                if sent.is_err() {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hint::HintCode;
    use crate::provider::StartRequest;
    use crate::rp::CollectStatus;
    use crate::session::tests::MockRemote;
    use crate::session::SessionConfig;
    use crate::status::Status;
    use tokio::time::Instant;

    async fn started(same_device: bool) -> (Arc<Session<MockRemote>>, String) {
        let session = Arc::new(Session::new(MockRemote::new(), SessionConfig::default()));
        let key = session
            .start(StartRequest {
                same_device,
                is_mobile: false,
                user_ip: "1.2.3.4".to_string(),
                message_for_user: String::new(),
            })
            .await
            .unwrap()
            .transaction_key
            .unwrap();
        (session, key)
    }

    async fn drain(poller: &mut Poller) -> Vec<PollEvent> {
        let mut events = Vec::new();
        while let Some(event) = poller.next().await {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn test_publishes_frames_then_finishes() {
        let (session, key) = started(false).await;
        let sequence = session.transaction(&key).unwrap().code_sequence.clone();
        let mut poller = session.watch(&key, PollerConfig::default());

        let mut frames = Vec::new();
        while frames.len() < 3 {
            match poller.next().await.unwrap() {
                PollEvent::QrFrame { index, data } => frames.push((index, data, Instant::now())),
                PollEvent::Pending { message } => {
                    assert_eq!(message, "Trying to start your BankID app.")
                }
                PollEvent::Finished(response) => panic!("finished early: {:?}", response),
            }
        }
        for (i, (index, data, _)) in frames.iter().enumerate() {
            assert_eq!(*index, i);
            assert_eq!(data, &sequence[i]);
        }
        assert_eq!(frames[1].2 - frames[0].2, QR_FRAME_INTERVAL);
        assert_eq!(frames[2].2 - frames[1].2, QR_FRAME_INTERVAL);

        session
            .client()
            .set_status(CollectStatus::Complete, HintCode::Unknown);
        let events = drain(&mut poller).await;
        match events.last() {
            Some(PollEvent::Finished(response)) => assert_eq!(response.status, Status::Complete),
            other => panic!("expected a finished event, got {:?}", other),
        }
        assert!(poller.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_device_publishes_no_frames() {
        let (session, key) = started(true).await;
        let mut poller = session.watch(&key, PollerConfig::default());

        assert_eq!(
            poller.next().await,
            Some(PollEvent::Pending {
                message: "Trying to start your BankID app.".to_string()
            })
        );
        session
            .client()
            .set_status(CollectStatus::Failed, HintCode::UserCancel);

        let events = drain(&mut poller).await;
        assert!(events
            .iter()
            .all(|event| !matches!(event, PollEvent::QrFrame { .. })));
        assert_eq!(
            events.last(),
            Some(&PollEvent::Finished(StatusResponse::failed("Action cancelled.")))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_errors_are_retried_then_fail() {
        let (session, key) = started(true).await;
        *session.client().collect_fails.lock().unwrap() = 10;
        let config = PollerConfig {
            backoff: Backoff::new(2),
            ..Default::default()
        };

        let begin = Instant::now();
        let mut poller = session.watch(&key, config);
        let events = drain(&mut poller).await;

        assert_eq!(
            events,
            vec![PollEvent::Finished(StatusResponse::failed(
                AUTHENTICATION_FAILED
            ))]
        );
        assert_eq!(*session.client().collect_calls.lock().unwrap(), 3);
        // 1s then 2s of backoff.
        assert_eq!(Instant::now() - begin, Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transport_error() {
        let (session, key) = started(true).await;
        *session.client().collect_fails.lock().unwrap() = 1;
        session
            .client()
            .set_status(CollectStatus::Complete, HintCode::Unknown);

        let mut poller = session.watch(&key, PollerConfig::default());
        let events = drain(&mut poller).await;

        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            PollEvent::Finished(response) if response.status == Status::Complete
        ));
        assert_eq!(*session.client().collect_calls.lock().unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_key_finishes_immediately() {
        let (session, _) = started(true).await;
        let mut poller = session.watch("missing", PollerConfig::default());

        assert_eq!(
            poller.next().await,
            Some(PollEvent::Finished(StatusResponse::not_found()))
        );
        assert!(poller.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_closes_channel_without_finishing() {
        let (session, key) = started(false).await;
        let mut poller = session.watch(&key, PollerConfig::default());

        assert!(poller.next().await.is_some());
        poller.cancel();

        let events = drain(&mut poller).await;
        assert!(events
            .iter()
            .all(|event| !matches!(event, PollEvent::Finished(_))));
        // Give the task a chance to observe the closed channel.
        tokio::task::yield_now().await;
        assert!(poller.is_finished());
    }
}
