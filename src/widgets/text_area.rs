use std::any::Any;
use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use focusable::Focus;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Style, Stylize};
use ratatui::text::Line;
use ratatui::widgets::WidgetRef;
use unicode_width::UnicodeWidthChar;

use super::form_item::{
    field_extent, finish_key, render_label, FormAttributes, FormItem, KeyOutcome,
    DEFAULT_FIELD_HEIGHT,
};

/// Multi-line text input.
#[derive(Focus)]
pub struct TextArea {
    pub is_focused: bool,
    label: String,
    lines: Vec<Vec<char>>,
    /// Cursor as (row, column in chars).
    cursor: (usize, usize),
    /// First visible row.
    top: usize,
    field_width: u16,
    field_height: u16,
    /// Maximum number of characters, line breaks included. 0 is unlimited.
    max_length: usize,
    attributes: FormAttributes,
    area: Rect,
    changed: Option<Box<dyn FnMut(&str)>>,
}

impl fmt::Debug for TextArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextArea")
            .field("is_focused", &self.is_focused)
            .field("label", &self.label)
            .field("text", &self.text())
            .field("cursor", &self.cursor)
            .field("max_length", &self.max_length)
            .finish_non_exhaustive()
    }
}

impl TextArea {
    pub fn new(label: &str, field_width: u16, field_height: u16) -> Self {
        Self {
            is_focused: false,
            label: label.to_string(),
            lines: vec![Vec::new()],
            cursor: (0, 0),
            top: 0,
            field_width,
            field_height: if field_height == 0 {
                DEFAULT_FIELD_HEIGHT
            } else {
                field_height
            },
            max_length: 0,
            attributes: FormAttributes::default(),
            area: Rect::default(),
            changed: None,
        }
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn on_changed(mut self, changed: impl FnMut(&str) + 'static) -> Self {
        self.changed = Some(Box::new(changed));
        self
    }

    /// Replaces the text and moves the cursor to its end.
    pub fn set_text(&mut self, text: &str) {
        self.lines = text.split('\n').map(|line| line.chars().collect()).collect();
        let row = self.lines.len() - 1;
        self.cursor = (row, self.lines[row].len());
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn len(&self) -> usize {
        self.lines.iter().map(Vec::len).sum::<usize>() + self.lines.len() - 1
    }

    fn has_room(&self) -> bool {
        self.max_length == 0 || self.len() < self.max_length
    }

    fn insert(&mut self, c: char) -> bool {
        if !self.has_room() {
            return false;
        }
        let (row, col) = self.cursor;
        if c == '\n' {
            let rest = self.lines[row].split_off(col);
            self.lines.insert(row + 1, rest);
            self.cursor = (row + 1, 0);
        } else {
            self.lines[row].insert(col, c);
            self.cursor = (row, col + 1);
        }
        true
    }

    fn backspace(&mut self) -> bool {
        let (row, col) = self.cursor;
        if col > 0 {
            self.lines[row].remove(col - 1);
            self.cursor = (row, col - 1);
        } else if row > 0 {
            let line = self.lines.remove(row);
            let prev = &mut self.lines[row - 1];
            self.cursor = (row - 1, prev.len());
            prev.extend(line);
        } else {
            return false;
        }
        true
    }

    fn delete(&mut self) -> bool {
        let (row, col) = self.cursor;
        if col < self.lines[row].len() {
            self.lines[row].remove(col);
        } else if row + 1 < self.lines.len() {
            let next = self.lines.remove(row + 1);
            self.lines[row].extend(next);
        } else {
            return false;
        }
        true
    }

    fn move_cursor(&mut self, code: KeyCode) {
        let (row, col) = self.cursor;
        self.cursor = match code {
            KeyCode::Left if col > 0 => (row, col - 1),
            KeyCode::Left if row > 0 => (row - 1, self.lines[row - 1].len()),
            KeyCode::Right if col < self.lines[row].len() => (row, col + 1),
            KeyCode::Right if row + 1 < self.lines.len() => (row + 1, 0),
            KeyCode::Up if row > 0 => (row - 1, col.min(self.lines[row - 1].len())),
            KeyCode::Down if row + 1 < self.lines.len() => {
                (row + 1, col.min(self.lines[row + 1].len()))
            }
            KeyCode::Home => (row, 0),
            KeyCode::End => (row, self.lines[row].len()),
            _ => (row, col),
        };
    }

    fn notify(&mut self) {
        if self.changed.is_some() {
            let text = self.text();
            if let Some(changed) = self.changed.as_mut() {
                changed(&text);
            }
        }
    }

    fn scroll_to_cursor(&mut self) {
        let height = usize::from(self.field_height.max(1));
        let row = self.cursor.0;
        if row < self.top {
            self.top = row;
        } else if row >= self.top + height {
            self.top = row + 1 - height;
        }
    }
}

impl FormItem for TextArea {
    fn label(&self) -> &str {
        &self.label
    }

    fn field_width(&self) -> u16 {
        self.field_width
    }

    fn field_height(&self) -> u16 {
        self.field_height
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
        if let Some(outcome) = finish_key(&key) {
            return outcome;
        }
        let changed = match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => self.insert(c),
            KeyCode::Enter => self.insert('\n'),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left
            | KeyCode::Right
            | KeyCode::Up
            | KeyCode::Down
            | KeyCode::Home
            | KeyCode::End => {
                self.move_cursor(key.code);
                false
            }
            _ => return KeyOutcome::Ignored,
        };
        if changed {
            self.notify();
        }
        self.scroll_to_cursor();
        KeyOutcome::Consumed
    }

    fn handle_paste(&mut self, text: &str) -> bool {
        let mut changed = false;
        for c in text.chars().filter(|&c| c == '\n' || !c.is_control()) {
            if !self.insert(c) {
                break;
            }
            changed = true;
        }
        if changed {
            self.notify();
            self.scroll_to_cursor();
        }
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl WidgetRef for TextArea {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let area = area.intersection(buf.area);
        if area.is_empty() {
            return;
        }
        let field = render_label(&self.label, &self.attributes, area, buf);
        let field = Rect {
            width: field_extent(self.field_width, field.width),
            ..field
        };
        if field.is_empty() {
            return;
        }
        let style = Style::new()
            .fg(self.attributes.field_text_color)
            .bg(self.attributes.field_background_color);
        buf.set_style(field, style);

        let width = usize::from(field.width);
        let (cursor_row, cursor_col) = self.cursor;
        let cursor_x: usize = self.lines[cursor_row][..cursor_col]
            .iter()
            .map(|c| c.width().unwrap_or(0))
            .sum();
        // Scroll horizontally so the cursor stays inside the field.
        let left = (cursor_x + 1).saturating_sub(width);

        for (i, line) in self
            .lines
            .iter()
            .enumerate()
            .skip(self.top)
            .take(usize::from(field.height))
        {
            let y = field.y + (i - self.top) as u16;
            let mut x = 0;
            let visible: String = line
                .iter()
                .filter(|c| {
                    let start = x;
                    x += c.width().unwrap_or(0);
                    start >= left
                })
                .collect();
            let row = Rect {
                y,
                height: 1,
                ..field
            };
            Line::styled(visible, style).render_ref(row, buf);
            if self.is_focused && i == cursor_row && cursor_x - left < width {
                buf[(field.x + (cursor_x - left) as u16, y)].set_style(Style::new().reversed());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(area: &mut TextArea, s: &str) {
        for c in s.chars() {
            let code = if c == '\n' { KeyCode::Enter } else { KeyCode::Char(c) };
            area.handle_key(key(code));
        }
    }

    #[test]
    fn test_editing() {
        let mut area = TextArea::new("Address", 20, 3);
        type_str(&mut area, "ab\ncd");
        assert_eq!(area.text(), "ab\ncd");
        area.handle_key(key(KeyCode::Up));
        area.handle_key(key(KeyCode::Backspace));
        assert_eq!(area.text(), "a\ncd");
        area.handle_key(key(KeyCode::End));
        area.handle_key(key(KeyCode::Delete));
        assert_eq!(area.text(), "acd");
        area.handle_key(key(KeyCode::Home));
        area.handle_key(key(KeyCode::Backspace));
        assert_eq!(area.text(), "acd");
    }

    #[test]
    fn test_max_length_and_changed() {
        let seen = Rc::new(RefCell::new(String::new()));
        let last = seen.clone();
        let mut area = TextArea::new("Address", 20, 3)
            .max_length(4)
            .on_changed(move |text| *last.borrow_mut() = text.to_string());
        type_str(&mut area, "a\nbcdef");
        assert_eq!(area.text(), "a\nbc");
        assert_eq!(*seen.borrow(), "a\nbc");
        assert!(area.handle_paste("zz"));
        assert_eq!(area.text(), "a\nbc");
    }

    #[test]
    fn test_finish_keys() {
        let mut area = TextArea::new("Address", 20, 0);
        assert_eq!(area.field_height(), DEFAULT_FIELD_HEIGHT);
        assert_eq!(area.handle_key(key(KeyCode::Tab)), KeyOutcome::Finished(KeyCode::Tab));
        // Enter is a line break here.
        assert_eq!(area.handle_key(key(KeyCode::Enter)), KeyOutcome::Consumed);
    }

    #[test]
    fn test_scrolls_to_cursor() {
        let mut area = TextArea::new("", 10, 2).with_text("1\n2\n3\n4");
        area.scroll_to_cursor();
        assert_eq!(area.top, 2);
        let mut buf = Buffer::empty(Rect::new(0, 0, 10, 2));
        area.render_ref(buf.area, &mut buf);
        assert_eq!(buf[(0, 0)].symbol(), "3");
        assert_eq!(buf[(0, 1)].symbol(), "4");
    }
}
