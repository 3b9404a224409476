use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use ratatui::layout::Position;
use tracing::trace;

use crate::app::App;

pub fn handle_key_events(key_event: KeyEvent, app: &mut App) {
    match key_event.code {
        KeyCode::Char('c') | KeyCode::Char('C') if key_event.modifiers == KeyModifiers::CONTROL => {
            app.quit();
        }
        _ => {
            if !app.form.handle_key(key_event) {
                trace!(?key_event, "key not used by the form");
            }
        }
    }
    app.process_actions();
}

pub fn handle_mouse_events(mouse_event: MouseEvent, app: &mut App) {
    let position = Position::new(mouse_event.column, mouse_event.row);
    for action in app.mouse.translate(&mouse_event) {
        app.form.handle_mouse(action, position);
    }
    app.process_actions();
}

pub fn handle_paste_event(text: &str, app: &mut App) {
    app.form.handle_paste(text);
    app.process_actions();
}
