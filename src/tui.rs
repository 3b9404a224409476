use std::{io, panic};

use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use formscroll::event::EventHandler;
use formscroll::FormResult;
use ratatui::backend::Backend;
use ratatui::Terminal;

use crate::app::App;
use crate::ui;

/// Representation of a terminal user interface.
///
/// It is responsible for setting up the terminal, initializing the interface
/// and handling the draw events.
#[derive(Debug)]
pub struct Tui<B: Backend> {
    terminal: Terminal<B>,
    pub events: EventHandler,
}

impl<B: Backend> Tui<B> {
    pub fn new(terminal: Terminal<B>, events: EventHandler) -> Self {
        Self { terminal, events }
    }

    /// Enables raw mode, mouse capture and bracketed paste, and restores the
    /// terminal on panic.
    pub fn init(&mut self) -> FormResult<()> {
        terminal::enable_raw_mode()?;
        crossterm::execute!(
            io::stdout(),
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableBracketedPaste
        )?;

        let panic_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic| {
            if let Err(err) = reset() {
                eprintln!("Failed to reset the terminal: {err}");
            }
            panic_hook(panic);
        }));

        self.terminal.hide_cursor()?;
        self.terminal.clear()?;
        Ok(())
    }

    pub fn draw(&mut self, app: &mut App) -> FormResult<()> {
        self.terminal.draw(|frame| ui::render(app, frame))?;
        Ok(())
    }

    pub fn exit(&mut self) -> FormResult<()> {
        reset()?;
        self.terminal.show_cursor()?;
        self.events.stop()?;
        Ok(())
    }
}

fn reset() -> FormResult<()> {
    terminal::disable_raw_mode()?;
    crossterm::execute!(
        io::stdout(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    Ok(())
}
