use std::any::Any;
use std::fmt;

use crossterm::event::{KeyCode, KeyEvent};
use focusable::Focus;
use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::WidgetRef;
use unicode_width::UnicodeWidthStr;

use super::form_item::{
    finish_key, render_label, FormAttributes, FormItem, KeyOutcome, MouseOutcome,
};
use crate::event::MouseAction;
use crate::markup::strip_tags;

type SelectedFn = Box<dyn FnMut(&str, usize)>;

/// A field selecting one of several options from a list that opens below it.
#[derive(Focus)]
pub struct DropDown {
    pub is_focused: bool,
    label: String,
    options: Vec<String>,
    current: Option<usize>,
    /// Highlighted row while the list is open.
    highlighted: usize,
    is_open: bool,
    attributes: FormAttributes,
    area: Rect,
    selected: Option<SelectedFn>,
}

impl fmt::Debug for DropDown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropDown")
            .field("is_focused", &self.is_focused)
            .field("label", &self.label)
            .field("options", &self.options)
            .field("current", &self.current)
            .field("is_open", &self.is_open)
            .finish_non_exhaustive()
    }
}

impl DropDown {
    /// `current` may be `None` when nothing is selected yet.
    pub fn new(label: &str, options: Vec<String>, current: Option<usize>) -> Self {
        let current = current.filter(|&index| index < options.len());
        Self {
            is_focused: false,
            label: label.to_string(),
            options,
            current,
            highlighted: current.unwrap_or(0),
            is_open: false,
            attributes: FormAttributes::default(),
            area: Rect::default(),
            selected: None,
        }
    }

    pub fn on_selected(mut self, selected: impl FnMut(&str, usize) + 'static) -> Self {
        self.selected = Some(Box::new(selected));
        self
    }

    /// The selected option and its index.
    pub fn current_option(&self) -> Option<(usize, &str)> {
        self.current
            .map(|index| (index, self.options[index].as_str()))
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    fn open(&mut self) {
        if self.options.is_empty() {
            return;
        }
        self.is_open = true;
        self.highlighted = self.current.unwrap_or(0);
    }

    fn select(&mut self, index: usize) {
        self.is_open = false;
        self.current = Some(index);
        if let Some(selected) = self.selected.as_mut() {
            selected(&self.options[index], index);
        }
    }

    /// Widest option, which is also the width of the field.
    fn options_width(&self) -> u16 {
        self.options
            .iter()
            .map(|option| strip_tags(option).width())
            .max()
            .unwrap_or(0) as u16
    }

    fn field_area(&self) -> Rect {
        let label_width = self.attributes.label_width.min(self.area.width);
        Rect {
            x: self.area.x + label_width,
            width: (self.options_width() + 2).min(self.area.width - label_width),
            height: 1,
            ..self.area
        }
    }

    /// Rows of the open list, directly below the field.
    fn list_area(&self) -> Rect {
        let field = self.field_area();
        Rect {
            y: field.y.saturating_add(1),
            height: self.options.len() as u16,
            ..field
        }
    }
}

impl FormItem for DropDown {
    fn label(&self) -> &str {
        &self.label
    }

    fn field_width(&self) -> u16 {
        self.options_width() + 2
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
        if self.is_open {
            match key.code {
                KeyCode::Up => self.highlighted = self.highlighted.saturating_sub(1),
                KeyCode::Down => {
                    self.highlighted = (self.highlighted + 1).min(self.options.len() - 1)
                }
                KeyCode::Home => self.highlighted = 0,
                KeyCode::End => self.highlighted = self.options.len() - 1,
                KeyCode::Enter | KeyCode::Char(' ') => self.select(self.highlighted),
                KeyCode::Esc => self.is_open = false,
                _ => return KeyOutcome::Ignored,
            }
            return KeyOutcome::Consumed;
        }
        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Down => {
                self.open();
                KeyOutcome::Consumed
            }
            _ => finish_key(&key).unwrap_or(KeyOutcome::Ignored),
        }
    }

    fn handle_mouse(&mut self, action: MouseAction, position: Position) -> MouseOutcome {
        if self.is_open && self.list_area().contains(position) {
            let index = usize::from(position.y - self.list_area().y);
            return match action {
                MouseAction::LeftClick => {
                    self.select(index);
                    MouseOutcome::Consumed
                }
                MouseAction::Move | MouseAction::LeftDown | MouseAction::LeftUp => {
                    self.highlighted = index;
                    MouseOutcome::Consumed
                }
                _ => MouseOutcome::Ignored,
            };
        }
        if !self.area.contains(position) {
            if self.is_open && action == MouseAction::LeftDown {
                self.is_open = false;
            }
            return MouseOutcome::Ignored;
        }
        match action {
            MouseAction::LeftDown => {
                if self.is_open {
                    self.is_open = false;
                } else {
                    self.open();
                }
                MouseOutcome::Focus
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

impl WidgetRef for DropDown {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let area = area.intersection(buf.area);
        if area.is_empty() {
            return;
        }
        let field = render_label(&self.label, &self.attributes, area, buf);
        let field = Rect {
            width: (self.options_width() + 2).min(field.width),
            height: 1,
            ..field
        };
        let style = Style::new()
            .fg(self.attributes.field_text_color)
            .bg(self.attributes.field_background_color);
        let field_style = if self.is_focused && !self.is_open {
            style.reversed()
        } else {
            style
        };
        buf.set_style(field, field_style);
        let text = self
            .current
            .map(|index| strip_tags(&self.options[index]))
            .unwrap_or_default();
        Line::from(vec![
            Span::styled(text, field_style),
            Span::raw(" "),
            Span::styled("▼", field_style.dim()),
        ])
        .render_ref(field, buf);

        if self.is_open {
            // The list draws over whatever is below, clipped to the buffer.
            let list = Rect {
                y: field.y.saturating_add(1),
                height: self.options.len() as u16,
                ..field
            }
            .intersection(buf.area);
            for (i, option) in self.options.iter().enumerate().take(usize::from(list.height)) {
                let row_style = if i == self.highlighted {
                    style.reversed()
                } else {
                    style
                };
                let row = Rect {
                    y: list.y + i as u16,
                    height: 1,
                    ..list
                };
                buf.set_style(row, row_style);
                Span::styled(strip_tags(option), row_style).render_ref(row, buf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crossterm::event::KeyModifiers;

    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn titles() -> Vec<String> {
        ["Mr.", "Ms.", "Dr."].map(String::from).to_vec()
    }

    #[test]
    fn test_select_with_keys() {
        let picked = Rc::new(RefCell::new(None));
        let sink = picked.clone();
        let mut dropdown = DropDown::new("Title", titles(), Some(0))
            .on_selected(move |option, index| *sink.borrow_mut() = Some((option.to_string(), index)));
        assert_eq!(dropdown.handle_key(key(KeyCode::Tab)), KeyOutcome::Finished(KeyCode::Tab));
        assert_eq!(dropdown.handle_key(key(KeyCode::Enter)), KeyOutcome::Consumed);
        assert!(dropdown.is_open());
        dropdown.handle_key(key(KeyCode::Down));
        dropdown.handle_key(key(KeyCode::Down));
        dropdown.handle_key(key(KeyCode::Down));
        // Tab does nothing while open.
        assert_eq!(dropdown.handle_key(key(KeyCode::Tab)), KeyOutcome::Ignored);
        dropdown.handle_key(key(KeyCode::Enter));
        assert!(!dropdown.is_open());
        assert_eq!(dropdown.current_option(), Some((2, "Dr.")));
        assert_eq!(*picked.borrow(), Some(("Dr.".to_string(), 2)));
    }

    #[test]
    fn test_escape_closes_without_selecting() {
        let mut dropdown = DropDown::new("Title", titles(), None);
        assert_eq!(dropdown.current_option(), None);
        dropdown.handle_key(key(KeyCode::Down));
        dropdown.handle_key(key(KeyCode::Down));
        assert_eq!(dropdown.handle_key(key(KeyCode::Esc)), KeyOutcome::Consumed);
        assert!(!dropdown.is_open());
        assert_eq!(dropdown.current_option(), None);
    }

    #[test]
    fn test_mouse_selection() {
        let mut dropdown = DropDown::new("Title", titles(), Some(0));
        dropdown.set_form_attributes(FormAttributes {
            label_width: 6,
            ..FormAttributes::default()
        });
        dropdown.set_area(Rect::new(0, 0, 20, 1));
        assert_eq!(
            dropdown.handle_mouse(MouseAction::LeftDown, Position::new(7, 0)),
            MouseOutcome::Focus
        );
        assert!(dropdown.is_open());
        assert_eq!(
            dropdown.handle_mouse(MouseAction::LeftClick, Position::new(7, 2)),
            MouseOutcome::Consumed
        );
        assert_eq!(dropdown.current_option(), Some((1, "Ms.")));
    }

    #[test]
    fn test_out_of_range_initial_option() {
        let dropdown = DropDown::new("Title", titles(), Some(9));
        assert_eq!(dropdown.current_option(), None);
    }
}
