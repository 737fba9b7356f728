//! Volume change notifications.
//!
//! The device calls back on a thread it owns whenever any process changes the
//! endpoint's volume or mute state. The callback only pushes a
//! `VolumeNotification` into bounded per-subscriber queues, so no subscriber
//! code ever runs on the OS thread.

use parking_lot::Mutex;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use uuid::Uuid;

/// Default queue depth for each subscriber.
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 32;

/// Snapshot delivered with every volume change.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeNotification {
    /// Context GUID passed by whoever made the change (nil when none was given)
    pub event_context: Uuid,

    pub muted: bool,

    /// Master volume as scalar (0.0 to 1.0)
    pub master_volume: f32,

    /// Per-channel scalar volumes, one entry per endpoint channel
    pub channel_volumes: Vec<f32>,
}

/// Fan-out point between the device callback and any number of listeners.
#[derive(Debug)]
pub struct VolumeNotifier {
    subscribers: Mutex<Vec<SyncSender<VolumeNotification>>>,
    capacity: usize,
}

impl VolumeNotifier {
    /// Create a notifier whose subscriber queues hold `capacity` notifications.
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            capacity: capacity.max(1),
        }
    }

    /// Add a listener. Dropping the receiver unsubscribes it.
    pub fn subscribe(&self) -> Receiver<VolumeNotification> {
        let (sender, receiver) = sync_channel(self.capacity);
        self.subscribers.lock().push(sender);
        receiver
    }

    /// Deliver a notification to every live subscriber without blocking.
    ///
    /// Returns the number of subscribers that received it.
    pub fn publish(&self, notification: VolumeNotification) -> usize {
        let mut subscribers = self.subscribers.lock();
        let mut delivered = 0;

        subscribers.retain(|sender| match sender.try_send(notification.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                tracing::debug!("volume notification dropped, subscriber queue full");
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });

        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl Default for VolumeNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_CAPACITY)
    }
}
