// src/web/relay.rs
//! In-process fan-out of freshly sent chat messages to open event streams

use rocket::tokio::sync::broadcast;

use crate::app_log;
use crate::models::Message;

const RELAY_CAPACITY: usize = 256;

pub struct MessageRelay {
    sender: broadcast::Sender<Message>,
}

impl MessageRelay {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(RELAY_CAPACITY);
        Self { sender }
    }

    /// Deliver to whoever is listening; nobody listening is not an error
    pub fn publish(&self, message: &Message) {
        match self.sender.send(message.clone()) {
            Ok(listeners) => app_log!(debug, "Relayed message {} to {} stream(s)", message.id, listeners),
            Err(_) => app_log!(trace, "No open streams for message {}", message.id),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.sender.subscribe()
    }
}

impl Default for MessageRelay {
    fn default() -> Self {
        Self::new()
    }
}
