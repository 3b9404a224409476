use std::any::Any;
use std::fmt::Debug;

use crossterm::event::{KeyCode, KeyEvent};
use focusable::Focus;
use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::WidgetRef;

use crate::event::MouseAction;
use crate::markup::parse_line;

/// Field width used by horizontal layouts when an item asks for "as wide as
/// possible".
pub const DEFAULT_FIELD_WIDTH: u16 = 10;
/// Field height used when an item does not declare one.
pub const DEFAULT_FIELD_HEIGHT: u16 = 1;

/// Visual attributes a form pushes onto its items before drawing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormAttributes {
    /// Columns reserved for the label, including the separating space.
    pub label_width: u16,
    pub label_color: Color,
    pub background_color: Color,
    pub field_text_color: Color,
    pub field_background_color: Color,
}

impl Default for FormAttributes {
    fn default() -> Self {
        Self {
            label_width: 0,
            label_color: Color::Yellow,
            background_color: Color::Reset,
            field_text_color: Color::White,
            field_background_color: Color::Blue,
        }
    }
}

/// What a widget did with a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    Consumed,
    /// The widget is done, focus should move on according to the key.
    Finished(KeyCode),
}

/// What a widget did with a mouse action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseOutcome {
    Ignored,
    Consumed,
    /// Consumed, and the widget wants the focus.
    Focus,
}

/// A widget that can be laid out by a [`ScrollableForm`].
///
/// [`ScrollableForm`]: super::scrollable_form::ScrollableForm
pub trait FormItem: Debug + WidgetRef + Focus + Any {
    fn label(&self) -> &str;

    /// Width of the field next to the label, 0 extends it as far as possible.
    fn field_width(&self) -> u16;

    /// Height of the field, 0 means [`DEFAULT_FIELD_HEIGHT`].
    fn field_height(&self) -> u16 {
        DEFAULT_FIELD_HEIGHT
    }

    fn set_form_attributes(&mut self, attributes: FormAttributes);

    /// Screen area the item was last placed at.
    fn area(&self) -> Rect;

    fn set_area(&mut self, area: Rect);

    /// Items refusing focus are passed over when a form delegates focus.
    fn accepts_focus(&self) -> bool {
        true
    }

    /// Read-only items are skipped by the scroll affordances and never
    /// receive mouse presses from a form.
    fn is_read_only(&self) -> bool {
        false
    }

    fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome;

    fn handle_mouse(&mut self, action: MouseAction, position: Position) -> MouseOutcome {
        if action == MouseAction::LeftDown && self.area().contains(position) {
            MouseOutcome::Focus
        } else {
            MouseOutcome::Ignored
        }
    }

    /// Returns whether the text was taken.
    fn handle_paste(&mut self, _text: &str) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn boxed(self) -> Box<dyn FormItem>
    where
        Self: 'static + Sized,
    {
        Box::new(self)
    }
}

/// Finishes on the keys every item treats as "leave this field".
pub(crate) fn finish_key(key: &KeyEvent) -> Option<KeyOutcome> {
    match key.code {
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Esc => Some(KeyOutcome::Finished(key.code)),
        _ => None,
    }
}

/// Splits an item area into its label and field parts.
pub(crate) fn split_label(area: Rect, label_width: u16) -> (Rect, Rect) {
    let label_width = label_width.min(area.width);
    let label = Rect {
        width: label_width,
        ..area
    };
    let field = Rect {
        x: area.x + label_width,
        width: area.width - label_width,
        ..area
    };
    (label, field)
}

/// Draws a label (style tags allowed) into the label part of an item and
/// returns the field part.
pub(crate) fn render_label(
    label: &str,
    attributes: &FormAttributes,
    area: Rect,
    buf: &mut Buffer,
) -> Rect {
    let (label_area, field_area) = split_label(area, attributes.label_width);
    let style = Style::new()
        .fg(attributes.label_color)
        .bg(attributes.background_color);
    buf.set_style(label_area, style);
    parse_line(label, style).render_ref(label_area, buf);
    field_area
}

/// Clamps a requested field width to what is available, 0 takes everything.
pub(crate) fn field_extent(requested: u16, available: u16) -> u16 {
    if requested == 0 {
        available
    } else {
        requested.min(available)
    }
}
