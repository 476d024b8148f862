//! Broadcast hubs behind the two event streams: the audience stream every
//! client may follow and the presenter stream that carries phase changes to
//! the single admin console.

use tokio::sync::{Mutex, broadcast};

use crate::dto::sse::ServerEvent;

/// Event-stream sub-state carved out from [`AppState`](super::AppState).
pub struct SseState {
    audience: EventHub,
    presenter: PresenterChannel,
}

impl SseState {
    /// Build both hubs with their broadcast capacities.
    pub fn new(audience_capacity: usize, presenter_capacity: usize) -> Self {
        Self {
            audience: EventHub::new(audience_capacity),
            presenter: PresenterChannel::new(presenter_capacity),
        }
    }

    /// Hub relaying store changes to every audience subscriber.
    pub fn audience(&self) -> &EventHub {
        &self.audience
    }

    /// Presenter-side channel, bundling its hub with the admin token slot.
    pub fn presenter(&self) -> &PresenterChannel {
        &self.presenter
    }
}

/// The presenter stream and the token that keeps it single-subscriber.
pub struct PresenterChannel {
    hub: EventHub,
    token: Mutex<Option<String>>,
}

impl PresenterChannel {
    fn new(capacity: usize) -> Self {
        Self {
            hub: EventHub::new(capacity),
            token: Mutex::new(None),
        }
    }

    /// Hub carrying phase changes and the token handshake.
    pub fn hub(&self) -> &EventHub {
        &self.hub
    }

    /// Slot holding the admin token while a presenter console is connected.
    /// `None` means the next `/sse/admin` subscriber may claim the stream.
    pub fn token(&self) -> &Mutex<Option<String>> {
        &self.token
    }
}

/// Fan-out wrapper over a Tokio broadcast channel of [`ServerEvent`]s.
pub struct EventHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl EventHub {
    /// Create a hub with the given backlog capacity. Subscribers that fall
    /// further behind than `capacity` events see a lag error and skip ahead.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a subscriber that receives events sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Deliver an event to every current subscriber. A hub without
    /// subscribers drops the event.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}
