use std::any::Any;
use std::fmt;

use crossterm::event::{Event as CrosstermEvent, KeyCode, KeyEvent};
use focusable::Focus;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Style, Stylize};
use ratatui::text::Span;
use ratatui::widgets::WidgetRef;
use tui_input::backend::crossterm::EventHandler;
use tui_input::{Input, InputRequest};

use super::form_item::{
    field_extent, finish_key, render_label, FormAttributes, FormItem, KeyOutcome,
};

type AcceptFn = Box<dyn Fn(&str, char) -> bool>;
type ChangedFn = Box<dyn FnMut(&str)>;

/// Single line text input, optionally masking what is typed.
#[derive(Focus)]
pub struct InputField {
    pub is_focused: bool,
    label: String,
    input: Input,
    field_width: u16,
    mask: Option<char>,
    attributes: FormAttributes,
    area: Rect,
    accept: Option<AcceptFn>,
    changed: Option<ChangedFn>,
}

impl fmt::Debug for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputField")
            .field("is_focused", &self.is_focused)
            .field("label", &self.label)
            .field("value", &self.input.value())
            .field("field_width", &self.field_width)
            .field("mask", &self.mask)
            .finish_non_exhaustive()
    }
}

impl InputField {
    pub fn new(label: &str, value: &str, field_width: u16) -> Self {
        Self {
            is_focused: false,
            label: label.to_string(),
            input: Input::new(value.to_string()),
            field_width,
            mask: None,
            attributes: FormAttributes::default(),
            area: Rect::default(),
            accept: None,
            changed: None,
        }
    }

    /// An input field showing `mask` in place of every character.
    pub fn password(label: &str, value: &str, field_width: u16, mask: char) -> Self {
        Self::new(label, value, field_width).mask(mask)
    }

    pub fn mask(mut self, mask: char) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Edits producing a text `accept` rejects are undone. It receives the new
    /// text and the last typed character.
    pub fn accept(mut self, accept: impl Fn(&str, char) -> bool + 'static) -> Self {
        self.accept = Some(Box::new(accept));
        self
    }

    pub fn on_changed(mut self, changed: impl FnMut(&str) + 'static) -> Self {
        self.changed = Some(Box::new(changed));
        self
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn set_value(&mut self, value: &str) {
        self.input = Input::new(value.to_string());
    }

    fn commit(&mut self, candidate: Input, last_char: Option<char>) -> bool {
        if candidate.value() == self.input.value() {
            self.input = candidate;
            return true;
        }
        if let (Some(accept), Some(c)) = (self.accept.as_ref(), last_char) {
            if !accept(candidate.value(), c) {
                return false;
            }
        }
        self.input = candidate;
        if let Some(changed) = self.changed.as_mut() {
            changed(self.input.value());
        }
        true
    }

    fn display_value(&self) -> String {
        match self.mask {
            Some(mask) => std::iter::repeat(mask)
                .take(self.input.value().chars().count())
                .collect(),
            None => self.input.value().to_string(),
        }
    }
}

impl FormItem for InputField {
    fn label(&self) -> &str {
        &self.label
    }

    fn field_width(&self) -> u16 {
        self.field_width
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
        if key.code == KeyCode::Enter {
            return KeyOutcome::Finished(KeyCode::Enter);
        }
        if let Some(outcome) = finish_key(&key) {
            return outcome;
        }
        let mut candidate = self.input.clone();
        if candidate.handle_event(&CrosstermEvent::Key(key)).is_none() {
            return KeyOutcome::Ignored;
        }
        let last_char = match key.code {
            KeyCode::Char(c) => Some(c),
            _ => None,
        };
        self.commit(candidate, last_char);
        KeyOutcome::Consumed
    }

    fn handle_paste(&mut self, text: &str) -> bool {
        let mut candidate = self.input.clone();
        for c in text.chars().filter(|c| !c.is_control()) {
            candidate.handle(InputRequest::InsertChar(c));
        }
        self.commit(candidate, text.chars().last())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl WidgetRef for InputField {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let area = area.intersection(buf.area);
        if area.is_empty() {
            return;
        }
        let field = render_label(&self.label, &self.attributes, area, buf);
        let field = Rect {
            width: field_extent(self.field_width, field.width),
            height: 1,
            ..field
        };
        if field.is_empty() {
            return;
        }
        let style = Style::new()
            .fg(self.attributes.field_text_color)
            .bg(self.attributes.field_background_color);
        buf.set_style(field, style);

        // Keep one cell for the cursor.
        let width = field.width.saturating_sub(1) as usize;
        let scroll = self.input.visual_scroll(width);
        let value: String = self.display_value().chars().skip(scroll).collect();
        Span::styled(value, style).render_ref(field, buf);

        if self.is_focused {
            let cursor = self.input.visual_cursor().saturating_sub(scroll) as u16;
            if cursor < field.width {
                buf[(field.x + cursor, field.y)].set_style(Style::new().reversed());
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

    #[test]
    fn test_typing_and_finishing() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let mut field = InputField::new("Name", "", 20)
            .on_changed(move |text| log.borrow_mut().push(text.to_string()));
        assert_eq!(field.handle_key(key(KeyCode::Char('h'))), KeyOutcome::Consumed);
        assert_eq!(field.handle_key(key(KeyCode::Char('i'))), KeyOutcome::Consumed);
        assert_eq!(field.value(), "hi");
        assert_eq!(*seen.borrow(), vec!["h".to_string(), "hi".to_string()]);
        assert_eq!(
            field.handle_key(key(KeyCode::Enter)),
            KeyOutcome::Finished(KeyCode::Enter)
        );
        assert_eq!(field.handle_key(key(KeyCode::Tab)), KeyOutcome::Finished(KeyCode::Tab));
    }

    #[test]
    fn test_acceptance_rejects() {
        let mut field = InputField::new("Age", "", 5).accept(|_, c| c.is_ascii_digit());
        field.handle_key(key(KeyCode::Char('4')));
        field.handle_key(key(KeyCode::Char('x')));
        field.handle_key(key(KeyCode::Char('2')));
        assert_eq!(field.value(), "42");
        field.handle_key(key(KeyCode::Backspace));
        assert_eq!(field.value(), "4");
    }

    #[test]
    fn test_paste() {
        let mut field = InputField::new("Name", "ab", 10);
        assert!(field.handle_paste("cd\n"));
        assert_eq!(field.value(), "abcd");
    }

    #[test]
    fn test_password_is_masked() {
        let mut field = InputField::password("Password", "secret", 10, '*');
        field.set_form_attributes(FormAttributes {
            label_width: 9,
            ..FormAttributes::default()
        });
        let mut buf = Buffer::empty(Rect::new(0, 0, 25, 1));
        field.render_ref(buf.area, &mut buf);
        let line: String = (0..25).map(|x| buf[(x, 0)].symbol().to_string()).collect();
        assert_eq!(line, "Password ******          ");
    }
}
