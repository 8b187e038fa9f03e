use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use shared_models::DomainEvent;

/// Hands domain events to whatever delivers notifications.
///
/// Dispatch never fails from the caller's point of view: by the time an event
/// exists its mutation is already persisted, so delivery problems are logged
/// and dropped.
pub trait NotificationDispatcher: Send + Sync {
    fn dispatch(&self, event: DomainEvent);

    fn dispatch_all(&self, events: Vec<DomainEvent>) {
        for event in events {
            self.dispatch(event);
        }
    }
}

/// Writes every event to the log and nothing else.
#[derive(Debug, Default, Clone)]
pub struct LogDispatcher;

impl NotificationDispatcher for LogDispatcher {
    fn dispatch(&self, event: DomainEvent) {
        log_event(&event);
    }
}

/// Queues events on a bounded channel drained by a separate consumer.
#[derive(Debug, Clone)]
pub struct ChannelDispatcher {
    sender: Sender<DomainEvent>,
}

impl ChannelDispatcher {
    pub fn new(capacity: usize) -> (Self, Receiver<DomainEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl NotificationDispatcher for ChannelDispatcher {
    fn dispatch(&self, event: DomainEvent) {
        let name = event.name();
        match self.sender.try_send(event) {
            Ok(()) => debug!("Queued {} notification", name),
            Err(TrySendError::Full(dropped)) => {
                warn!("Notification queue full, dropping {} for {}", name, dropped.subject_id());
            }
            Err(TrySendError::Closed(dropped)) => {
                warn!("Notification consumer gone, dropping {} for {}", name, dropped.subject_id());
            }
        }
    }
}

/// Drain `receiver` into the log until every sender is dropped.
pub fn spawn_log_consumer(mut receiver: Receiver<DomainEvent>) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut delivered = 0;
        while let Some(event) = receiver.recv().await {
            log_event(&event);
            delivered += 1;
        }
        debug!("Notification consumer stopped after {} events", delivered);
        delivered
    })
}

fn log_event(event: &DomainEvent) {
    let payload = serde_json::to_string(event).unwrap_or_default();
    info!(event = event.name(), subject = %event.subject_id(), %payload, "notification");
}
