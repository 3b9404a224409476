use std::any::Any;
use std::fmt;

use crossterm::event::{KeyCode, KeyEvent};
use focusable::Focus;
use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Style, Stylize};
use ratatui::text::Span;
use ratatui::widgets::WidgetRef;

use super::form_item::{
    finish_key, render_label, FormAttributes, FormItem, KeyOutcome, MouseOutcome,
};
use crate::event::MouseAction;

#[derive(Focus)]
pub struct Checkbox {
    pub is_focused: bool,
    pub label: String,
    pub is_checked: bool,
    attributes: FormAttributes,
    area: Rect,
    changed: Option<Box<dyn FnMut(bool)>>,
}

impl fmt::Debug for Checkbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Checkbox")
            .field("is_focused", &self.is_focused)
            .field("label", &self.label)
            .field("is_checked", &self.is_checked)
            .finish_non_exhaustive()
    }
}

impl Checkbox {
    pub fn new(label: &str, is_checked: bool) -> Self {
        Self {
            is_focused: false,
            label: label.to_string(),
            is_checked,
            attributes: FormAttributes::default(),
            area: Rect::default(),
            changed: None,
        }
    }

    pub fn on_changed(mut self, changed: impl FnMut(bool) + 'static) -> Self {
        self.changed = Some(Box::new(changed));
        self
    }

    pub fn toggle(&mut self) {
        self.is_checked = !self.is_checked;
        if let Some(changed) = self.changed.as_mut() {
            changed(self.is_checked);
        }
    }

    pub fn is_checked(&self) -> bool {
        self.is_checked
    }
}

impl FormItem for Checkbox {
    fn label(&self) -> &str {
        &self.label
    }

    fn field_width(&self) -> u16 {
        1
    }

    fn set_form_attributes(&mut self, attributes: FormAttributes) {
        self.attributes = attributes;
    }

    fn area(&self) -> Rect {
        self.area
    }

    fn set_area(&mut self, area: Rect) {
        self.area = area;
    }

    fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.toggle();
                KeyOutcome::Consumed
            }
            _ => finish_key(&key).unwrap_or(KeyOutcome::Ignored),
        }
    }

    fn handle_mouse(&mut self, action: MouseAction, position: Position) -> MouseOutcome {
        if !self.area.contains(position) {
            return MouseOutcome::Ignored;
        }
        match action {
            MouseAction::LeftDown => MouseOutcome::Focus,
            MouseAction::LeftClick => {
                self.toggle();
                MouseOutcome::Consumed
            }
            _ => MouseOutcome::Ignored,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl WidgetRef for Checkbox {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let area = area.intersection(buf.area);
        if area.is_empty() {
            return;
        }
        let field = render_label(&self.label, &self.attributes, area, buf);
        let style = if self.is_focused {
            Style::new()
                .fg(self.attributes.field_background_color)
                .bg(self.attributes.field_text_color)
                .bold()
        } else {
            Style::new()
                .fg(self.attributes.field_text_color)
                .bg(self.attributes.field_background_color)
        };
        let mark = if self.is_checked { "X" } else { " " };
        Span::styled(mark, style).render_ref(field, buf);
    }
}
