use std::fmt;

use crossterm::event::KeyEvent;
use focusable::Focus;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Position, Rect};
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::WidgetRef;

use super::form_item::{KeyOutcome, MouseOutcome};
use crate::config::Theme;
use crate::event::MouseAction;
use crate::markup::strip_tags;

/// A button that can be clicked but never holds the focus.
///
/// Asking it to take the focus should focus its target instead, see
/// [`NonFocusableButton::focus_target`]. `T` is whatever handle the host uses
/// to address that target.
pub struct NonFocusableButton<T = ()> {
    label: String,
    area: Rect,
    disabled: bool,
    style: Style,
    disabled_style: Style,
    focusable: Option<T>,
    /// Set by [`Focus::focus`] until the host takes the request.
    focus_requested: bool,
    on_click: Option<Box<dyn FnMut()>>,
}

impl<T: fmt::Debug> fmt::Debug for NonFocusableButton<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NonFocusableButton")
            .field("label", &self.label)
            .field("area", &self.area)
            .field("disabled", &self.disabled)
            .field("focusable", &self.focusable)
            .field("focus_requested", &self.focus_requested)
            .finish_non_exhaustive()
    }
}

impl<T> NonFocusableButton<T> {
    pub fn new(label: &str, theme: &Theme) -> Self {
        Self {
            label: label.to_string(),
            area: Rect::default(),
            disabled: false,
            style: theme.button_style(),
            disabled_style: theme.button_disabled_style(),
            focusable: None,
            focus_requested: false,
            on_click: None,
        }
    }

    /// Sets the element that receives the focus in place of this button.
    pub fn set_focusable(&mut self, target: T) -> &mut Self {
        self.focusable = Some(target);
        self
    }

    /// The element to focus whenever this button is asked to take the focus.
    pub fn focus_target(&self) -> Option<&T> {
        self.focusable.as_ref()
    }

    /// The target of a focus request made since the last call, if any. The
    /// host moves the focus there.
    pub fn take_focus_request(&mut self) -> Option<&T> {
        if !std::mem::take(&mut self.focus_requested) {
            return None;
        }
        self.focusable.as_ref()
    }

    /// Runs on a left click inside the button.
    pub fn set_click(&mut self, on_click: impl FnMut() + 'static) -> &mut Self {
        self.on_click = Some(Box::new(on_click));
        self
    }

    pub fn label(&self) -> &str {
        &self.label
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

    /// A press inside the button asks for the focus, a left click runs the
    /// click callback. Both are consumed even while disabled.
    pub fn handle_mouse(&mut self, action: MouseAction, position: Position) -> MouseOutcome {
        if !self.area.contains(position) {
            return MouseOutcome::Ignored;
        }
        match action {
            MouseAction::LeftDown => return MouseOutcome::Focus,
            MouseAction::LeftClick => {}
            _ => return MouseOutcome::Ignored,
        }
        if let Some(on_click) = self.on_click.as_mut() {
            on_click();
        }
        MouseOutcome::Consumed
    }

    /// Keys never reach a button that cannot hold the focus.
    pub fn handle_key(&mut self, _key: KeyEvent) -> KeyOutcome {
        KeyOutcome::Ignored
    }

    pub fn handle_paste(&mut self, _text: &str) -> bool {
        false
    }
}

impl<T> Focus for NonFocusableButton<T> {
    fn is_focused(&self) -> bool {
        false
    }

    /// Never takes the focus. The request is recorded for the host, see
    /// [`NonFocusableButton::take_focus_request`].
    fn focus(&mut self) {
        self.focus_requested = self.focusable.is_some();
    }

    fn blur(&mut self) {}
}

impl<T> WidgetRef for NonFocusableButton<T> {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let area = area.intersection(buf.area);
        if area.is_empty() {
            return;
        }
        let style = if self.disabled {
            self.disabled_style
        } else {
            self.style
        };
        buf.set_style(area, style);
        Line::styled(strip_tags(&self.label), style)
            .alignment(Alignment::Center)
            .render_ref(area, buf);
    }
}
