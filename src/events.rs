use anyhow::Result;
use ratatui::crossterm::event::KeyEvent;
use tokio::sync::mpsc;

use crate::extensions::{InstallRequest, InstallResult};

/// All possible events in the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Keyboard input events
    KeyInput(KeyEvent),

    /// Window size changed (width, height)
    Resize(u16, u16),

    /// Completion of one PTY read; empty means the shell is gone
    PtyOutput(Vec<u8>),

    /// Completion of an extension install
    InstallFinished(InstallResult),

    /// Application lifecycle
    Quit,
}

/// Side effects the controller asks the runtime to perform after handling
/// an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Schedule the next single PTY read
    ReadPty,

    /// Launch an installer subprocess
    Install(InstallRequest),

    /// Leave the event loop
    Quit,
}

/// Single-consumer event channel feeding the controller
pub struct EventBus {
    sender: mpsc::UnboundedSender<AppEvent>,
    receiver: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self { sender, receiver }
    }

    /// Get a sender for publishing events
    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.sender.clone()
    }

    /// Publish an event
    pub fn publish(&self, event: AppEvent) -> Result<()> {
        self.sender.send(event)?;
        Ok(())
    }

    /// Wait for the next event
    pub async fn next(&mut self) -> Option<AppEvent> {
        self.receiver.recv().await
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_are_delivered_in_order() {
        let mut bus = EventBus::new();
        let sender = bus.sender();
        sender.send(AppEvent::PtyOutput(b"a".to_vec())).unwrap();
        bus.publish(AppEvent::PtyOutput(b"b".to_vec())).unwrap();
        bus.publish(AppEvent::Quit).unwrap();

        assert_eq!(bus.next().await, Some(AppEvent::PtyOutput(b"a".to_vec())));
        assert_eq!(bus.next().await, Some(AppEvent::PtyOutput(b"b".to_vec())));
        assert_eq!(bus.next().await, Some(AppEvent::Quit));
    }
}
