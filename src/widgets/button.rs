use std::fmt;

use crossterm::event::{KeyCode, KeyEvent};
use focusable::Focus;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Position, Rect};
use ratatui::style::Style;
use ratatui::widgets::WidgetRef;

use super::form_item::{KeyOutcome, MouseOutcome};
use crate::config::Theme;
use crate::event::MouseAction;
use crate::markup::parse_line;

/// A form button. Selecting it runs its callback.
#[derive(Focus)]
pub struct Button {
    pub is_focused: bool,
    label: String,
    area: Rect,
    disabled: bool,
    style: Style,
    activated_style: Style,
    disabled_style: Style,
    on_selected: Option<Box<dyn FnMut()>>,
}

impl fmt::Debug for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Button")
            .field("is_focused", &self.is_focused)
            .field("label", &self.label)
            .field("area", &self.area)
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

impl Button {
    pub fn new(label: &str) -> Self {
        let theme = Theme::default();
        Self {
            is_focused: false,
            label: label.to_string(),
            area: Rect::default(),
            disabled: false,
            style: theme.button_style(),
            activated_style: theme.button_activated_style(),
            disabled_style: theme.button_disabled_style(),
            on_selected: None,
        }
    }

    pub fn on_selected(mut self, on_selected: impl FnMut() + 'static) -> Self {
        self.on_selected = Some(Box::new(on_selected));
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: &str) -> &mut Self {
        self.label = label.to_string();
        self
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_disabled(&mut self, disabled: bool) -> &mut Self {
        self.disabled = disabled;
        self
    }

    pub fn set_style(&mut self, style: Style) -> &mut Self {
        self.style = style;
        self
    }

    pub fn set_activated_style(&mut self, style: Style) -> &mut Self {
        self.activated_style = style;
        self
    }

    pub fn set_disabled_style(&mut self, style: Style) -> &mut Self {
        self.disabled_style = style;
        self
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn set_area(&mut self, area: Rect) {
        self.area = area;
    }

    fn select(&mut self) {
        if let Some(on_selected) = self.on_selected.as_mut() {
            on_selected();
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if self.disabled {
            return KeyOutcome::Ignored;
        }
        match key.code {
            KeyCode::Enter => {
                self.select();
                KeyOutcome::Consumed
            }
            KeyCode::Tab
            | KeyCode::BackTab
            | KeyCode::Esc
            | KeyCode::Up
            | KeyCode::Down
            | KeyCode::Left
            | KeyCode::Right => KeyOutcome::Finished(key.code),
            _ => KeyOutcome::Ignored,
        }
    }

    pub fn handle_mouse(&mut self, action: MouseAction, position: Position) -> MouseOutcome {
        if self.disabled || !self.area.contains(position) {
            return MouseOutcome::Ignored;
        }
        match action {
            MouseAction::LeftDown => MouseOutcome::Focus,
            MouseAction::LeftClick => {
                self.select();
                MouseOutcome::Consumed
            }
            _ => MouseOutcome::Ignored,
        }
    }
}

impl WidgetRef for Button {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let area = area.intersection(buf.area);
        if area.is_empty() {
            return;
        }
        let style = if self.disabled {
            self.disabled_style
        } else if self.is_focused {
            self.activated_style
        } else {
            self.style
        };
        buf.set_style(area, style);
        parse_line(&self.label, style)
            .alignment(Alignment::Center)
            .render_ref(area, buf);
    }
}
