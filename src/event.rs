use std::time::Duration;

use color_eyre::eyre::{eyre, OptionExt};
use crossterm::event::{
    Event as CrosstermEvent, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;
use tracing::error;

use crate::FormResult;

/// Mouse actions as seen by widgets.
///
/// Terminals only report presses and releases, [`MouseTracker`] derives clicks
/// from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    Move,
    LeftDown,
    LeftUp,
    LeftClick,
    RightDown,
    RightUp,
    Drag,
    ScrollUp,
    ScrollDown,
    Other,
}

/// Turns raw crossterm mouse events into [`MouseAction`]s.
#[derive(Debug, Default)]
pub struct MouseTracker {
    left_down_at: Option<(u16, u16)>,
}

impl MouseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the actions for `event` in the order they should be delivered.
    /// A left release on the cell of the preceding left press is followed by a
    /// [`MouseAction::LeftClick`].
    pub fn translate(&mut self, event: &MouseEvent) -> Vec<MouseAction> {
        let position = (event.column, event.row);
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.left_down_at = Some(position);
                vec![MouseAction::LeftDown]
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if self.left_down_at.take() == Some(position) {
                    vec![MouseAction::LeftUp, MouseAction::LeftClick]
                } else {
                    vec![MouseAction::LeftUp]
                }
            }
            MouseEventKind::Down(MouseButton::Right) => vec![MouseAction::RightDown],
            MouseEventKind::Up(MouseButton::Right) => vec![MouseAction::RightUp],
            MouseEventKind::Drag(_) => vec![MouseAction::Drag],
            MouseEventKind::Moved => vec![MouseAction::Move],
            MouseEventKind::ScrollUp => vec![MouseAction::ScrollUp],
            MouseEventKind::ScrollDown => vec![MouseAction::ScrollDown],
            _ => vec![MouseAction::Other],
        }
    }
}

/// Terminal events.
#[derive(Debug, Clone)]
pub enum Event {
    /// Terminal tick.
    Tick,
    Key(KeyEvent),
    Mouse(MouseEvent),
    Paste(String),
    Resize(u16, u16),
}

/// Terminal event handler.
#[derive(Debug)]
pub struct EventHandler {
    /// Event receiver channel.
    receiver: mpsc::UnboundedReceiver<Event>,
    /// Event handler thread.
    handler: tokio::task::JoinHandle<()>,
}

impl EventHandler {
    /// Constructs a new instance of [`EventHandler`] ticking every `tick_rate`
    /// milliseconds.
    pub fn new(tick_rate: u64) -> Self {
        let tick_rate = Duration::from_millis(tick_rate);
        let (sender, receiver) = mpsc::unbounded_channel();
        let handler = tokio::spawn(async move {
            let mut reader = crossterm::event::EventStream::new();
            let mut tick = tokio::time::interval(tick_rate);
            loop {
                let tick_delay = tick.tick();
                let crossterm_event = reader.next().fuse();
                tokio::select! {
                    _ = sender.closed() => {
                        break;
                    }
                    _ = tick_delay => {
                        if sender.send(Event::Tick).is_err() {
                            break;
                        }
                    }
                    Some(Ok(evt)) = crossterm_event => {
                        let event = match evt {
                            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                                Some(Event::Key(key))
                            }
                            CrosstermEvent::Mouse(mouse) => Some(Event::Mouse(mouse)),
                            CrosstermEvent::Paste(text) => Some(Event::Paste(text)),
                            CrosstermEvent::Resize(x, y) => Some(Event::Resize(x, y)),
                            _ => None,
                        };
                        if let Some(event) = event {
                            if let Err(err) = sender.send(event) {
                                error!("Event channel closed: {err}");
                                break;
                            }
                        }
                    }
                };
            }
        });
        Self { receiver, handler }
    }

    /// Receives the next event from the handler thread.
    pub async fn next(&mut self) -> FormResult<Event> {
        self.receiver
            .recv()
            .await
            .ok_or_eyre("Event channel closed unexpectedly")
    }

    /// Stops the handler thread.
    pub fn stop(&self) -> FormResult<()> {
        if self.handler.is_finished() {
            return Err(eyre!("Event handler already stopped"));
        }
        self.handler.abort();
        Ok(())
    }
}
