use std::any::Any;

use crossterm::event::{KeyCode, KeyEvent};
use focusable::Focus;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::WidgetRef;

use unicode_width::UnicodeWidthChar;

use super::form_item::{field_extent, render_label, FormAttributes, FormItem, KeyOutcome};
use crate::markup::{parse_line, strip_tags};

/// Read-only text shown next to a label.
///
/// Only scrollable views take the focus, everything else is passed over.
#[derive(Debug, Clone, Focus)]
pub struct TextView {
    pub is_focused: bool,
    pub label: String,
    pub text: String,
    field_width: u16,
    field_height: u16,
    dynamic_colors: bool,
    scrollable: bool,
    scroll: u16,
    attributes: FormAttributes,
    area: Rect,
}

impl TextView {
    pub fn new(label: &str, text: &str) -> Self {
        Self {
            is_focused: false,
            label: label.to_string(),
            text: text.to_string(),
            field_width: 0,
            field_height: 0,
            dynamic_colors: false,
            scrollable: false,
            scroll: 0,
            attributes: FormAttributes::default(),
            area: Rect::default(),
        }
    }

    pub fn size(mut self, field_width: u16, field_height: u16) -> Self {
        self.field_width = field_width;
        self.field_height = field_height;
        self
    }

    /// Interpret style tags in the text instead of stripping them.
    pub fn dynamic_colors(mut self, dynamic_colors: bool) -> Self {
        self.dynamic_colors = dynamic_colors;
        self
    }

    pub fn scrollable(mut self, scrollable: bool) -> Self {
        self.scrollable = scrollable;
        self
    }

    fn field_area(&self) -> Rect {
        let label_width = self.attributes.label_width.min(self.area.width);
        Rect {
            x: self.area.x + label_width,
            width: field_extent(self.field_width, self.area.width - label_width),
            ..self.area
        }
    }

    /// The text broken into rows of at most `width` columns. Plain text wraps
    /// on words, colored text on characters.
    fn wrapped(&self, width: u16, style: Style) -> Vec<Line<'static>> {
        let width = usize::from(width.max(1));
        self.text
            .lines()
            .flat_map(|line| {
                if self.dynamic_colors {
                    wrap_chars(parse_line(line, style), width)
                } else {
                    let plain = strip_tags(line);
                    if plain.is_empty() {
                        return vec![Line::default()];
                    }
                    textwrap::wrap(&plain, textwrap::Options::new(width))
                        .into_iter()
                        .map(|l| Line::styled(l.into_owned(), style))
                        .collect()
                }
            })
            .collect()
    }

    fn max_scroll(&self) -> u16 {
        let field = self.field_area();
        let lines = self.wrapped(field.width, Style::new()).len() as u16;
        lines.saturating_sub(field.height)
    }
}

impl FormItem for TextView {
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

    fn accepts_focus(&self) -> bool {
        self.scrollable
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        let page = self.field_area().height.max(1);
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll += 1,
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(page),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(page),
            KeyCode::Home | KeyCode::Char('g') => self.scroll = 0,
            KeyCode::End | KeyCode::Char('G') => self.scroll = u16::MAX,
            KeyCode::Enter | KeyCode::Tab | KeyCode::BackTab | KeyCode::Esc => {
                return KeyOutcome::Finished(key.code)
            }
            _ => return KeyOutcome::Ignored,
        }
        self.scroll = self.scroll.min(self.max_scroll());
        KeyOutcome::Consumed
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl WidgetRef for TextView {
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
        let style = Style::new()
            .fg(self.attributes.field_text_color)
            .bg(self.attributes.background_color);
        buf.set_style(field, style);
        for (row, line) in self
            .wrapped(field.width, style)
            .into_iter()
            .skip(usize::from(self.scroll))
            .take(usize::from(field.height))
            .enumerate()
        {
            let row_area = Rect {
                y: field.y + row as u16,
                height: 1,
                ..field
            };
            line.render_ref(row_area, buf);
        }
    }
}

fn wrap_chars(line: Line<'static>, width: usize) -> Vec<Line<'static>> {
    let mut rows = Vec::new();
    let mut row = Line::default();
    let mut used = 0;
    for span in line.spans {
        for c in span.content.chars() {
            let w = c.width().unwrap_or(0);
            if used + w > width && used > 0 {
                rows.push(std::mem::take(&mut row));
                used = 0;
            }
            match row.spans.last_mut() {
                Some(last) if last.style == span.style => last.content.to_mut().push(c),
                _ => row.spans.push(Span::styled(c.to_string(), span.style)),
            }
            used += w;
        }
    }
    rows.push(row);
    rows
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;

    use super::*;

    fn row(buf: &Buffer, y: u16) -> String {
        (buf.area.x..buf.area.right())
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_focus_rules() {
        let view = TextView::new("Notes", "x");
        assert!(view.is_read_only());
        assert!(!view.accepts_focus());
        assert!(view.scrollable(true).accepts_focus());
    }

    #[test]
    fn test_wraps_and_scrolls() {
        let mut view = TextView::new("N", "one two three four").size(0, 2).scrollable(true);
        view.set_form_attributes(FormAttributes {
            label_width: 2,
            ..FormAttributes::default()
        });
        view.set_area(Rect::new(0, 0, 11, 2));
        let mut buf = Buffer::empty(Rect::new(0, 0, 11, 2));
        view.render_ref(view.area(), &mut buf);
        assert_eq!(row(&buf, 0), "N one two  ");
        assert_eq!(row(&buf, 1), "  three    ");

        let down = KeyEvent::new(KeyCode::Down, KeyModifiers::NONE);
        assert_eq!(view.handle_key(down), KeyOutcome::Consumed);
        assert_eq!(view.handle_key(down), KeyOutcome::Consumed);
        // Three wrapped lines in two rows.
        assert_eq!(view.scroll, 1);
        let mut buf = Buffer::empty(Rect::new(0, 0, 11, 2));
        view.render_ref(view.area(), &mut buf);
        assert_eq!(row(&buf, 0), "N three    ");
        assert_eq!(row(&buf, 1), "  four     ");
    }

    #[test]
    fn test_dynamic_colors() {
        let mut view = TextView::new("", "[red]hot").dynamic_colors(true);
        view.set_form_attributes(FormAttributes::default());
        let mut buf = Buffer::empty(Rect::new(0, 0, 5, 1));
        view.render_ref(buf.area, &mut buf);
        assert_eq!(row(&buf, 0), "hot  ");
        assert_eq!(buf[(0, 0)].fg, ratatui::style::Color::Red);

        let view = TextView::new("", "[red]hot");
        let mut buf = Buffer::empty(Rect::new(0, 0, 5, 1));
        view.render_ref(buf.area, &mut buf);
        assert_eq!(row(&buf, 0), "hot  ");
    }

    #[test]
    fn test_wrap_chars_keeps_styles() {
        let style = Style::new().fg(ratatui::style::Color::Green);
        let rows = wrap_chars(parse_line("ab[green]cde", Style::new()), 3);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].spans.len(), 2);
        assert_eq!(rows[0].spans[1].content, "c");
        assert_eq!(rows[0].spans[1].style, style);
        assert_eq!(rows[1].spans[0].content, "de");
    }
}
