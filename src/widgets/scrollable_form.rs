use std::fmt;

use crossterm::event::{KeyCode, KeyEvent};
use focusable::Focus;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Padding, Widget, WidgetRef};
use tracing::{debug, trace};

use super::button::Button;
use super::checkbox::Checkbox;
use super::dropdown::DropDown;
use super::form_item::{FormAttributes, FormItem, KeyOutcome, MouseOutcome};
use super::image::Image;
use super::input_field::InputField;
use super::layout::{self, ButtonMetrics, ItemMetrics, LayoutParams, Placement};
use super::non_focusable_button::NonFocusableButton;
use super::text_area::TextArea;
use super::text_view::TextView;
use crate::config::{FormConfig, Theme};
use crate::event::MouseAction;
use crate::markup::tagged_width;

const DEFAULT_MASK: char = '*';
const SCROLL_UP_LABEL: &str = "↑";
const SCROLL_DOWN_LABEL: &str = "↓";

/// Where focus goes after an element finished with a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Navigation {
    /// Hand the focus to `focused_element`.
    Delegate,
    /// The cancel callback ran.
    Cancelled,
    Stay,
}

/// One of the two arrow buttons in the right corners of a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollButton {
    Up,
    Down,
}

/// A form of labelled items followed by buttons, scrolled so that the focused
/// element is always visible.
///
/// Elements are addressed by a single index: items first, then buttons.
/// Read-only items such as text views are skipped by the scroll affordances,
/// items refusing focus are passed over in the direction of the last key.
pub struct ScrollableForm {
    items: Vec<Box<dyn FormItem>>,
    buttons: Vec<Button>,
    /// Items run left to right instead of top to bottom.
    horizontal: bool,
    buttons_align: Alignment,
    item_padding: u16,
    /// Element that has or most recently had the focus.
    focused_element: usize,
    label_color: Color,
    background_color: Color,
    field_text_color: Color,
    field_background_color: Color,
    button_style: Style,
    button_activated_style: Style,
    button_disabled_style: Style,
    /// Key replayed when an item refuses the focus.
    last_finished_key: Option<KeyCode>,
    /// Runs when an element finishes with Esc.
    cancel: Option<Box<dyn FnMut()>>,
    block: Block<'static>,
    /// Outer rect of the last draw.
    area: Rect,
    /// Set when the form holds the focus itself because no element took it.
    has_focus: bool,
    /// Arrows pinned to the right corners, stepping through elements.
    up_scroll_button: NonFocusableButton,
    down_scroll_button: NonFocusableButton,
}

impl fmt::Debug for ScrollableForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollableForm")
            .field("items", &self.items)
            .field("buttons", &self.buttons)
            .field("horizontal", &self.horizontal)
            .field("focused_element", &self.focused_element)
            .field("last_finished_key", &self.last_finished_key)
            .field("has_focus", &self.has_focus)
            .finish_non_exhaustive()
    }
}

impl Default for ScrollableForm {
    fn default() -> Self {
        Self::new(&Theme::default())
    }
}

impl ScrollableForm {
    /// An empty vertical form colored after `theme`.
    pub fn new(theme: &Theme) -> Self {
        let mut up_scroll_button = NonFocusableButton::new(SCROLL_UP_LABEL, theme);
        up_scroll_button.set_focusable(()).set_disabled(true);
        let mut down_scroll_button = NonFocusableButton::new(SCROLL_DOWN_LABEL, theme);
        down_scroll_button.set_focusable(());
        Self {
            items: Vec::new(),
            buttons: Vec::new(),
            horizontal: false,
            buttons_align: Alignment::Left,
            item_padding: 1,
            focused_element: 0,
            label_color: theme.label_color,
            background_color: theme.background_color,
            field_text_color: theme.field_text_color,
            field_background_color: theme.field_background_color,
            button_style: theme.button_style(),
            button_activated_style: theme.button_activated_style(),
            button_disabled_style: theme.button_disabled_style(),
            last_finished_key: Some(KeyCode::Tab),
            cancel: None,
            block: Block::default().padding(Padding::uniform(1)),
            area: Rect::default(),
            has_focus: false,
            up_scroll_button,
            down_scroll_button,
        }
    }

    /// A form with the theme and layout options of `config`.
    pub fn from_config(config: &FormConfig) -> Self {
        let mut form = Self::new(&config.theme);
        form.set_horizontal(config.layout.horizontal)
            .set_item_padding(config.layout.item_padding)
            .set_buttons_align(config.layout.buttons_align.into());
        form
    }

    /// Empty rows between items, or empty cells in horizontal layouts.
    pub fn set_item_padding(&mut self, padding: u16) -> &mut Self {
        self.item_padding = padding;
        self
    }

    /// Lays items out left to right, wrapping into rows.
    pub fn set_horizontal(&mut self, horizontal: bool) -> &mut Self {
        self.horizontal = horizontal;
        self
    }

    /// Where the button row sits in vertical layouts.
    pub fn set_buttons_align(&mut self, align: Alignment) -> &mut Self {
        self.buttons_align = align;
        self
    }

    /// Text color of item labels.
    pub fn set_label_color(&mut self, color: Color) -> &mut Self {
        self.label_color = color;
        self
    }

    /// Fills the form area and label columns.
    pub fn set_background_color(&mut self, color: Color) -> &mut Self {
        self.background_color = color;
        self
    }

    /// Text color inside input fields.
    pub fn set_field_text_color(&mut self, color: Color) -> &mut Self {
        self.field_text_color = color;
        self
    }

    /// Background of input fields.
    pub fn set_field_background_color(&mut self, color: Color) -> &mut Self {
        self.field_background_color = color;
        self
    }

    /// Background of buttons, and text of the focused one.
    pub fn set_button_background_color(&mut self, color: Color) -> &mut Self {
        self.button_style = self.button_style.bg(color);
        self.button_activated_style = self.button_activated_style.fg(color);
        self
    }

    /// Text of buttons, and background of the focused one.
    pub fn set_button_text_color(&mut self, color: Color) -> &mut Self {
        self.button_style = self.button_style.fg(color);
        self.button_activated_style = self.button_activated_style.bg(color);
        self
    }

    /// Style of buttons without the focus.
    pub fn set_button_style(&mut self, style: Style) -> &mut Self {
        self.button_style = style;
        self
    }

    /// Style of the focused button.
    pub fn set_button_activated_style(&mut self, style: Style) -> &mut Self {
        self.button_activated_style = style;
        self
    }

    /// Style of disabled buttons.
    pub fn set_button_disabled_style(&mut self, style: Style) -> &mut Self {
        self.button_disabled_style = style;
        self
    }

    /// Replaces the frame drawn around the form. Items are laid out inside it.
    pub fn set_block(&mut self, block: Block<'static>) -> &mut Self {
        self.block = block;
        self
    }

    /// Adds a title to the frame.
    pub fn set_title(&mut self, title: impl Into<Line<'static>>) -> &mut Self {
        let title: Line<'static> = title.into();
        self.block = self.block.clone().title(title);
        self
    }

    /// Called when an element finishes with Esc. Without it Esc moves the
    /// focus back to the first element.
    pub fn set_cancel_fn(&mut self, cancel: impl FnMut() + 'static) -> &mut Self {
        self.cancel = Some(Box::new(cancel));
        self
    }

    pub fn add_text_area(
        &mut self,
        label: &str,
        text: &str,
        field_width: u16,
        field_height: u16,
        max_length: usize,
    ) -> &mut Self {
        let area = TextArea::new(label, field_width, field_height)
            .max_length(max_length)
            .with_text(text);
        self.add_form_item(area.boxed())
    }

    pub fn add_text_view(
        &mut self,
        label: &str,
        text: &str,
        field_width: u16,
        field_height: u16,
        dynamic_colors: bool,
        scrollable: bool,
    ) -> &mut Self {
        let view = TextView::new(label, text)
            .size(field_width, field_height)
            .dynamic_colors(dynamic_colors)
            .scrollable(scrollable);
        self.add_form_item(view.boxed())
    }

    pub fn add_input_field(&mut self, label: &str, value: &str, field_width: u16) -> &mut Self {
        self.add_form_item(InputField::new(label, value, field_width).boxed())
    }

    /// Adds an input field hiding its value behind `mask`, `*` by default.
    pub fn add_password_field(
        &mut self,
        label: &str,
        value: &str,
        field_width: u16,
        mask: Option<char>,
    ) -> &mut Self {
        let mask = mask.unwrap_or(DEFAULT_MASK);
        self.add_form_item(InputField::password(label, value, field_width, mask).boxed())
    }

    pub fn add_drop_down(
        &mut self,
        label: &str,
        options: &[&str],
        initial_option: Option<usize>,
    ) -> &mut Self {
        let options = options.iter().map(|option| option.to_string()).collect();
        self.add_form_item(DropDown::new(label, options, initial_option).boxed())
    }

    pub fn add_checkbox(&mut self, label: &str, checked: bool) -> &mut Self {
        self.add_form_item(Checkbox::new(label, checked).boxed())
    }

    pub fn add_image(
        &mut self,
        label: &str,
        pixels: Vec<Vec<Color>>,
        field_width: u16,
        field_height: u16,
    ) -> &mut Self {
        self.add_form_item(Image::new(label, pixels).size(field_width, field_height).boxed())
    }

    pub fn add_form_item(&mut self, item: Box<dyn FormItem>) -> &mut Self {
        self.items.push(item);
        self
    }

    /// Inserts an item before `index`, or appends it when `index` is past the end.
    pub fn insert_form_item(&mut self, index: usize, item: Box<dyn FormItem>) -> &mut Self {
        let index = index.min(self.items.len());
        self.items.insert(index, item);
        self
    }

    pub fn add_button(&mut self, label: &str, selected: impl FnMut() + 'static) -> &mut Self {
        self.add_button_widget(Button::new(label).on_selected(selected))
    }

    pub fn add_button_widget(&mut self, button: Button) -> &mut Self {
        self.buttons.push(button);
        self
    }

    pub fn button(&self, index: usize) -> Option<&Button> {
        self.buttons.get(index)
    }

    pub fn button_mut(&mut self, index: usize) -> Option<&mut Button> {
        self.buttons.get_mut(index)
    }

    pub fn remove_button(&mut self, index: usize) -> Option<Button> {
        if index >= self.buttons.len() {
            return None;
        }
        let button = self.buttons.remove(index);
        self.clamp_focused_element();
        Some(button)
    }

    pub fn button_count(&self) -> usize {
        self.buttons.len()
    }

    pub fn button_index(&self, label: &str) -> Option<usize> {
        self.buttons.iter().position(|button| button.label() == label)
    }

    pub fn clear_buttons(&mut self) -> &mut Self {
        self.buttons.clear();
        self.clamp_focused_element();
        self
    }

    /// Removes all items, and buttons too when `include_buttons` is set.
    pub fn clear(&mut self, include_buttons: bool) -> &mut Self {
        self.items.clear();
        if include_buttons {
            self.buttons.clear();
        }
        self.focused_element = 0;
        self
    }

    pub fn form_item(&self, index: usize) -> Option<&dyn FormItem> {
        self.items.get(index).map(|item| item.as_ref())
    }

    pub fn form_item_mut(&mut self, index: usize) -> Option<&mut dyn FormItem> {
        match self.items.get_mut(index) {
            Some(item) => Some(item.as_mut()),
            None => None,
        }
    }

    pub fn remove_form_item(&mut self, index: usize) -> Option<Box<dyn FormItem>> {
        if index >= self.items.len() {
            return None;
        }
        let item = self.items.remove(index);
        self.clamp_focused_element();
        Some(item)
    }

    pub fn form_item_count(&self) -> usize {
        self.items.len()
    }

    pub fn form_item_by_label(&self, label: &str) -> Option<&dyn FormItem> {
        self.form_item_index(label).and_then(|index| self.form_item(index))
    }

    pub fn form_item_index(&self, label: &str) -> Option<usize> {
        self.items.iter().position(|item| item.label() == label)
    }

    /// Index of the focused item and of the focused button. At most one is set.
    pub fn focused_item_index(&self) -> (Option<usize>, Option<usize>) {
        match self.focus_index() {
            Some(index) if index < self.items.len() => (Some(index), None),
            Some(index) => (None, Some(index - self.items.len())),
            None => (None, None),
        }
    }

    pub fn focused_element(&self) -> usize {
        self.focused_element
    }

    pub fn up_scroll_button(&self) -> &NonFocusableButton {
        &self.up_scroll_button
    }

    pub fn down_scroll_button(&self) -> &NonFocusableButton {
        &self.down_scroll_button
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    fn element_count(&self) -> usize {
        self.items.len() + self.buttons.len()
    }

    fn clamp_focused_element(&mut self) {
        let total = self.element_count();
        if self.focused_element >= total {
            self.focused_element = total.saturating_sub(1);
        }
    }

    /// Index of the element holding the focus, if any.
    fn focus_index(&self) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.is_focused())
            .or_else(|| {
                self.buttons
                    .iter()
                    .position(|button| button.is_focused())
                    .map(|index| index + self.items.len())
            })
    }

    fn focus_element(&mut self, index: usize) {
        let items = self.items.len();
        if let Some(item) = self.items.get_mut(index) {
            item.focus();
        } else if let Some(button) = self.buttons.get_mut(index - items) {
            button.focus();
        } else {
            return;
        }
        self.has_focus = false;
    }

    fn blur_element(&mut self, index: usize) {
        let items = self.items.len();
        if let Some(item) = self.items.get_mut(index) {
            item.blur();
        } else if let Some(button) = self.buttons.get_mut(index - items) {
            button.blur();
        }
    }

    fn blur_children(&mut self) {
        self.items.iter_mut().for_each(|item| item.blur());
        self.buttons.iter_mut().for_each(|button| button.blur());
    }

    /// Moves the focus to a child, the first one when `index` is out of range.
    pub fn set_focus(&mut self, index: usize) -> &mut Self {
        let future = if index < self.element_count() { index } else { 0 };
        let current = self.focus_index();
        debug!(?current, future, "set focus");
        self.focused_element = future;
        if current == Some(future) {
            return self;
        }
        if let Some(current) = current {
            self.blur_element(current);
        }
        let refuses_focus = self
            .items
            .get(future)
            .is_some_and(|item| !item.accepts_focus());
        if refuses_focus {
            self.delegate_focus();
        } else {
            self.focus_element(future);
        }
        self
    }

    /// Focuses the next element that is not read-only. The down affordance is
    /// disabled once the last element is reached.
    pub fn step_forward(&mut self) {
        let total = self.element_count();
        let mut next = self.focused_element + 1;
        loop {
            trace!(next, total, "step forward");
            if next > 0 {
                self.up_scroll_button.set_disabled(false);
            }
            if next + 1 >= total {
                self.down_scroll_button.set_disabled(true);
            }
            if next >= total {
                return;
            }
            if self.items.get(next).is_some_and(|item| item.is_read_only()) {
                next += 1;
                continue;
            }
            self.set_focus(next);
            return;
        }
    }

    /// Focuses the previous element that is not read-only. The up affordance
    /// is disabled once the first element is reached.
    pub fn step_backward(&mut self) {
        let Some(mut previous) = self.focused_element.checked_sub(1) else {
            return;
        };
        loop {
            trace!(previous, "step backward");
            if previous == 0 {
                self.up_scroll_button.set_disabled(true);
            }
            self.down_scroll_button.set_disabled(false);
            if self.items.get(previous).is_some_and(|item| item.is_read_only()) {
                match previous.checked_sub(1) {
                    Some(index) => {
                        previous = index;
                        continue;
                    }
                    None => return,
                }
            }
            self.set_focus(previous);
            return;
        }
    }

    /// Gives the focus to `focused_element`, or to the first element after it
    /// that takes it. Disabled buttons are skipped. When no element takes the
    /// focus the form keeps it.
    fn delegate_focus(&mut self) {
        let total = self.element_count();
        for _ in 0..=total {
            if self.focused_element >= total {
                self.focused_element = 0;
            }
            let items = self.items.len();
            let mut target = None;
            for index in 0..self.buttons.len() {
                if self.focused_element != items + index {
                    continue;
                }
                if self.buttons[index].is_disabled() {
                    self.focused_element += 1;
                    if self.focused_element >= total {
                        self.focused_element = 0;
                    }
                    continue;
                }
                target = Some(self.focused_element);
            }
            if target.is_none() && self.focused_element < items {
                target = Some(self.focused_element);
            }

            match target {
                Some(index) if index < items && !self.items[index].accepts_focus() => {
                    // Passed over as if it finished with an unknown key.
                    trace!(index, "item refuses focus");
                    let Some(key) = self.record_finished_key(None) else {
                        break;
                    };
                    match self.navigate(key) {
                        Navigation::Delegate => continue,
                        Navigation::Cancelled => return,
                        Navigation::Stay => break,
                    }
                }
                Some(index) => {
                    self.blur_children();
                    self.focus_element(index);
                    return;
                }
                None => break,
            }
        }
        debug!("no element takes the focus");
        self.blur_children();
        self.has_focus = true;
    }

    /// Remembers `key` as the last finishing key. `None` stands for an
    /// indeterminate key and replays the remembered one.
    fn record_finished_key(&mut self, key: Option<KeyCode>) -> Option<KeyCode> {
        match key {
            Some(key) => {
                self.last_finished_key = Some(key);
                Some(key)
            }
            None => self.last_finished_key,
        }
    }

    fn navigate(&mut self, key: KeyCode) -> Navigation {
        match key {
            KeyCode::Tab | KeyCode::Enter => {
                self.focused_element += 1;
                Navigation::Delegate
            }
            KeyCode::BackTab => {
                self.focused_element = match self.focused_element.checked_sub(1) {
                    Some(index) => index,
                    None => self.element_count().saturating_sub(1),
                };
                Navigation::Delegate
            }
            KeyCode::Esc => match self.cancel.as_mut() {
                Some(cancel) => {
                    debug!("form cancelled");
                    cancel();
                    Navigation::Cancelled
                }
                None => {
                    self.focused_element = 0;
                    Navigation::Delegate
                }
            },
            _ => Navigation::Stay,
        }
    }

    fn finish(&mut self, key: KeyCode) {
        let Some(key) = self.record_finished_key(Some(key)) else {
            return;
        };
        if self.navigate(key) == Navigation::Delegate {
            self.delegate_focus();
        }
    }

    /// Passes a key to the focused element. Returns whether it was used.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let Some(index) = self.focus_index() else {
            return false;
        };
        self.focused_element = index;
        let items = self.items.len();
        let outcome = match self.items.get_mut(index) {
            Some(item) => item.handle_key(key),
            None => self.buttons[index - items].handle_key(key),
        };
        match outcome {
            KeyOutcome::Ignored => false,
            KeyOutcome::Consumed => true,
            KeyOutcome::Finished(code) => {
                self.finish(code);
                true
            }
        }
    }

    /// Offers a mouse action to items, buttons and the scroll affordances in
    /// that order. Returns whether one of them used it.
    pub fn handle_mouse(&mut self, action: MouseAction, position: Position) -> bool {
        let consumed = self.route_mouse(action, position);
        if consumed {
            if let Some(index) = self.focus_index() {
                self.focused_element = index;
            }
        }
        consumed
    }

    fn route_mouse(&mut self, action: MouseAction, position: Position) -> bool {
        for index in 0..self.items.len() {
            let item = &mut self.items[index];
            if action == MouseAction::LeftDown && item.is_read_only() {
                continue;
            }
            match item.handle_mouse(action, position) {
                MouseOutcome::Ignored => {}
                MouseOutcome::Consumed => return true,
                MouseOutcome::Focus => {
                    self.focus_child(index);
                    return true;
                }
            }
        }
        let items = self.items.len();
        for index in 0..self.buttons.len() {
            match self.buttons[index].handle_mouse(action, position) {
                MouseOutcome::Ignored => {}
                MouseOutcome::Consumed => return true,
                MouseOutcome::Focus => {
                    self.focus_child(items + index);
                    return true;
                }
            }
        }
        for which in [ScrollButton::Up, ScrollButton::Down] {
            match self.scroll_button_mut(which).handle_mouse(action, position) {
                MouseOutcome::Ignored => continue,
                MouseOutcome::Focus => self.focus_scroll_button(which),
                MouseOutcome::Consumed if which == ScrollButton::Up => self.step_backward(),
                MouseOutcome::Consumed => self.step_forward(),
            }
            return true;
        }
        if action == MouseAction::LeftDown && self.area.contains(position) {
            self.delegate_focus();
            return true;
        }
        false
    }

    fn scroll_button_mut(&mut self, which: ScrollButton) -> &mut NonFocusableButton {
        match which {
            ScrollButton::Up => &mut self.up_scroll_button,
            ScrollButton::Down => &mut self.down_scroll_button,
        }
    }

    /// Asks a scroll button for the focus. The button never takes it and
    /// redirects the request to the form, which delegates it to the most
    /// recently focused element.
    pub fn focus_scroll_button(&mut self, which: ScrollButton) {
        let button = self.scroll_button_mut(which);
        button.focus();
        if button.take_focus_request().is_some() {
            trace!(?which, "scroll button focus redirected");
            self.delegate_focus();
        }
    }

    fn focus_child(&mut self, index: usize) {
        self.blur_children();
        self.focus_element(index);
        self.focused_element = index;
    }

    /// Passes pasted text to the focused element.
    pub fn handle_paste(&mut self, text: &str) -> bool {
        self.focus_index()
            .and_then(|index| self.items.get_mut(index))
            .is_some_and(|item| item.handle_paste(text))
    }

    /// Lays out and draws the form. Placements are stored on the children for
    /// mouse hit testing.
    pub fn draw(&mut self, area: Rect, buf: &mut Buffer) {
        self.area = area;
        buf.set_style(area, Style::new().bg(self.background_color));
        self.block.render_ref(area, buf);
        let inner = self.block.inner(area);
        if let Some(index) = self.focus_index() {
            self.focused_element = index;
        }

        let item_metrics: Vec<ItemMetrics> = self
            .items
            .iter()
            .map(|item| ItemMetrics {
                label_width: tagged_width(item.label()) as i32,
                field_width: i32::from(item.field_width()),
                field_height: i32::from(item.field_height()),
                focused: item.is_focused(),
            })
            .collect();
        let button_metrics: Vec<ButtonMetrics> = self
            .buttons
            .iter()
            .map(|button| ButtonMetrics {
                label_width: tagged_width(button.label()) as i32,
                focused: button.is_focused(),
            })
            .collect();
        let params = LayoutParams {
            area: inner,
            horizontal: self.horizontal,
            item_padding: i32::from(self.item_padding),
            buttons_align: self.buttons_align,
        };
        let layout = layout::compute(&params, &item_metrics, &button_metrics);
        trace!(offset = layout.offset, ?inner, "form layout");

        let top = i32::from(inner.y);
        let bottom = i32::from(inner.bottom());
        let background = Style::new().bg(self.background_color);
        let mut focused_item = None;
        for (index, item) in self.items.iter_mut().enumerate() {
            item.set_form_attributes(FormAttributes {
                label_width: layout.label_widths[index].max(0) as u16,
                label_color: self.label_color,
                background_color: self.background_color,
                field_text_color: self.field_text_color,
                field_background_color: self.field_background_color,
            });
            let placement = layout.items[index].scrolled(layout.offset);
            let clipped = placement
                .is_visible(top, bottom)
                .then(|| placement.clip(inner))
                .flatten();
            let Some(item_area) = clipped else {
                item.set_area(Rect::default());
                continue;
            };
            item.set_area(item_area);
            if item.is_focused() {
                // Drawn last so that open lists stay on top.
                focused_item = Some((index, placement));
                continue;
            }
            render_placed(&**item, placement, item_area, background, buf);
        }

        for (index, button) in self.buttons.iter_mut().enumerate() {
            button
                .set_style(self.button_style)
                .set_activated_style(self.button_activated_style)
                .set_disabled_style(self.button_disabled_style);
            let clipped = layout.buttons[index]
                .map(|placement| placement.scrolled(layout.offset))
                .filter(|placement| placement.is_visible(top, bottom))
                .and_then(|placement| placement.clip(inner));
            let Some(button_area) = clipped else {
                button.set_area(Rect::default());
                continue;
            };
            button.set_area(button_area);
            button.render_ref(button_area, buf);
        }

        if let Some((index, placement)) = focused_item {
            let item = &self.items[index];
            render_placed(&**item, placement, item.area(), background, buf);
        }

        if area.is_empty() {
            return;
        }
        let right = area.right() - 1;
        self.up_scroll_button.set_area(Rect::new(right, area.y, 1, 1));
        self.down_scroll_button
            .set_area(Rect::new(right, area.bottom() - 1, 1, 1));
        self.up_scroll_button
            .render_ref(self.up_scroll_button.area(), buf);
        self.down_scroll_button
            .render_ref(self.down_scroll_button.area(), buf);
    }
}

/// Draws `item` at its scrolled `placement`, keeping only the cells inside
/// `visible`. An item cut by the band is drawn off screen first so its rows
/// keep their positions.
fn render_placed(
    item: &dyn FormItem,
    placement: Placement,
    visible: Rect,
    background: Style,
    buf: &mut Buffer,
) {
    if placement.rect() == Some(visible) {
        item.render_ref(visible, buf);
        return;
    }
    let (Ok(width), Ok(height)) = (
        u16::try_from(placement.width),
        u16::try_from(placement.height),
    ) else {
        return;
    };
    let mut scratch = Buffer::empty(Rect::new(0, 0, width, height));
    scratch.set_style(scratch.area, background);
    item.render_ref(scratch.area, &mut scratch);
    for y in visible.top()..visible.bottom() {
        for x in visible.left()..visible.right() {
            let from = Position::new(
                (i32::from(x) - placement.x) as u16,
                (i32::from(y) - placement.y) as u16,
            );
            if scratch.area.contains(from) {
                buf[(x, y)] = scratch[from].clone();
            }
        }
    }
}

impl Focus for ScrollableForm {
    fn is_focused(&self) -> bool {
        self.has_focus || self.focus_index().is_some()
    }

    /// Delegates the focus to the most recently focused element.
    fn focus(&mut self) {
        self.delegate_focus();
    }

    fn blur(&mut self) {
        self.blur_children();
        self.has_focus = false;
    }
}

impl Widget for &mut ScrollableForm {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.draw(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use crossterm::event::KeyModifiers;

    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn input(form: &ScrollableForm, index: usize) -> &InputField {
        form.form_item(index)
            .and_then(|item| item.as_any().downcast_ref::<InputField>())
            .unwrap()
    }

    /// First, Notes (text view), Last, then Save and Cancel.
    fn contact_form() -> ScrollableForm {
        let mut form = ScrollableForm::default();
        form.add_input_field("First", "", 10)
            .add_text_view("Notes", "read only", 0, 1, false, false)
            .add_input_field("Last", "", 10)
            .add_button("Save", || {})
            .add_button("Cancel", || {});
        form
    }

    fn focused_count(form: &ScrollableForm) -> usize {
        form.items.iter().filter(|item| item.is_focused()).count()
            + form.buttons.iter().filter(|button| button.is_focused()).count()
    }

    fn row(buf: &Buffer, y: u16) -> String {
        (buf.area.x..buf.area.right())
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_step_forward_skips_text_views() {
        let mut form = contact_form();
        form.focus();
        assert_eq!(form.focused_item_index(), (Some(0), None));
        assert!(form.up_scroll_button().is_disabled());
        assert!(!form.down_scroll_button().is_disabled());

        form.step_forward();
        assert_eq!(form.focused_item_index(), (Some(2), None));
        assert!(!form.up_scroll_button().is_disabled());

        form.step_forward();
        assert_eq!(form.focused_item_index(), (None, Some(0)));
        form.step_forward();
        assert_eq!(form.focused_item_index(), (None, Some(1)));
        assert!(form.down_scroll_button().is_disabled());

        form.step_forward();
        assert_eq!(form.focused_item_index(), (None, Some(1)));
        assert_eq!(form.focused_element(), 4);
        assert!(form.down_scroll_button().is_disabled());
        assert_eq!(focused_count(&form), 1);
    }

    #[test]
    fn test_step_backward_skips_text_views() {
        let mut form = contact_form();
        form.set_focus(2);
        form.step_backward();
        assert_eq!(form.focused_item_index(), (Some(0), None));
        assert!(form.up_scroll_button().is_disabled());
        assert!(!form.down_scroll_button().is_disabled());

        form.step_backward();
        assert_eq!(form.focused_item_index(), (Some(0), None));
        assert_eq!(focused_count(&form), 1);
    }

    #[test]
    fn test_consecutive_read_only_items() {
        let mut form = ScrollableForm::default();
        form.add_text_view("A", "a", 0, 1, false, false)
            .add_input_field("B", "", 5)
            .add_text_view("C", "c", 0, 1, false, false)
            .add_text_view("D", "d", 0, 1, false, false)
            .add_input_field("E", "", 5);
        form.set_focus(1);
        form.step_forward();
        assert_eq!(form.focused_item_index(), (Some(4), None));
        assert!(form.down_scroll_button().is_disabled());

        form.step_backward();
        assert_eq!(form.focused_item_index(), (Some(1), None));
        // Stepping back lands on the text view at 0, which is skipped.
        form.step_backward();
        assert_eq!(form.focused_item_index(), (Some(1), None));
        assert!(form.up_scroll_button().is_disabled());
    }

    #[test]
    fn test_set_focus_out_of_range_targets_first() {
        let mut form = contact_form();
        form.set_focus(3);
        assert_eq!(form.focused_item_index(), (None, Some(0)));
        form.set_focus(42);
        assert_eq!(form.focused_item_index(), (Some(0), None));
        assert_eq!(form.focused_element(), 0);
        assert_eq!(focused_count(&form), 1);
    }

    #[test]
    fn test_tab_and_back_tab() {
        let mut form = contact_form();
        form.focus();
        // The text view refuses focus and is passed over with the replayed Tab.
        assert!(form.handle_key(key(KeyCode::Tab)));
        assert_eq!(form.focused_item_index(), (Some(2), None));
        assert!(form.handle_key(key(KeyCode::BackTab)));
        assert_eq!(form.focused_item_index(), (Some(0), None));
        // Back from the first element wraps to the last one.
        assert!(form.handle_key(key(KeyCode::BackTab)));
        assert_eq!(form.focused_item_index(), (None, Some(1)));
        // Tab from the last element wraps to the first one.
        assert!(form.handle_key(key(KeyCode::Tab)));
        assert_eq!(form.focused_item_index(), (Some(0), None));
        assert_eq!(focused_count(&form), 1);
    }

    #[test]
    fn test_typing_goes_to_focused_field() {
        let mut form = contact_form();
        form.focus();
        assert!(form.handle_key(key(KeyCode::Char('a'))));
        assert!(form.handle_key(key(KeyCode::Enter)));
        assert!(form.handle_key(key(KeyCode::Char('b'))));
        assert_eq!(input(&form, 0).value(), "a");
        assert_eq!(input(&form, 2).value(), "b");
    }

    #[test]
    fn test_disabled_buttons_are_skipped() {
        let mut form = ScrollableForm::default();
        form.add_input_field("Name", "", 10);
        form.add_button_widget({
            let mut button = Button::new("Save");
            button.set_disabled(true);
            button
        });
        form.add_button("Quit", || {});
        form.focus();
        form.handle_key(key(KeyCode::Tab));
        assert_eq!(form.focused_item_index(), (None, Some(1)));
        assert_eq!(form.focused_element(), 2);
    }

    #[test]
    fn test_form_keeps_focus_when_nothing_takes_it() {
        let mut form = ScrollableForm::default();
        form.add_text_view("Notes", "x", 0, 1, false, false);
        form.add_button_widget({
            let mut button = Button::new("Save");
            button.set_disabled(true);
            button
        });
        form.focus();
        assert!(form.is_focused());
        assert_eq!(form.focused_item_index(), (None, None));
        assert!(!form.handle_key(key(KeyCode::Tab)));
        form.blur();
        assert!(!form.is_focused());

        let mut empty = ScrollableForm::default();
        empty.focus();
        assert!(empty.is_focused());
        empty.set_focus(0);
        assert_eq!(empty.focused_element(), 0);
    }

    #[test]
    fn test_escape_without_cancel_returns_to_first() {
        let mut form = contact_form();
        form.set_focus(3);
        assert!(form.handle_key(key(KeyCode::Esc)));
        assert_eq!(form.focused_item_index(), (Some(0), None));
    }

    #[test]
    fn test_escape_runs_cancel() {
        let cancelled = Rc::new(Cell::new(false));
        let flag = cancelled.clone();
        let mut form = contact_form();
        form.set_cancel_fn(move || flag.set(true));
        form.set_focus(2);
        assert!(form.handle_key(key(KeyCode::Esc)));
        assert!(cancelled.get());
        assert_eq!(form.focused_item_index(), (Some(2), None));
    }

    #[test]
    fn test_images_are_passed_over_in_key_direction() {
        let pixels = vec![vec![Color::Red]];
        let mut form = ScrollableForm::default();
        form.add_image("Logo", pixels.clone(), 1, 1)
            .add_input_field("A", "", 5)
            .add_image("Photo", pixels, 1, 1)
            .add_input_field("B", "", 5);
        // The initial key is Tab, so focus moves on to the first field.
        form.focus();
        assert_eq!(form.focused_item_index(), (Some(1), None));
        form.handle_key(key(KeyCode::Tab));
        assert_eq!(form.focused_item_index(), (Some(3), None));
        form.handle_key(key(KeyCode::BackTab));
        assert_eq!(form.focused_item_index(), (Some(1), None));
        // Back from A lands on the logo, is replayed as BackTab and wraps.
        form.handle_key(key(KeyCode::BackTab));
        assert_eq!(form.focused_item_index(), (Some(3), None));
    }

    #[test]
    fn test_removal_keeps_focused_element_in_range() {
        let mut form = contact_form();
        form.set_focus(4);
        assert!(form.remove_button(1).is_some());
        assert_eq!(form.focused_element(), 3);
        assert!(form.remove_form_item(0).is_some());
        assert!(form.focused_element() < form.form_item_count() + form.button_count());
        assert!(form.remove_form_item(9).is_none());
        form.insert_form_item(0, Checkbox::new("Agree", false).boxed());
        assert_eq!(form.form_item_index("Agree"), Some(0));
        assert!(form.focused_element() < form.form_item_count() + form.button_count());
        form.clear(true);
        assert_eq!(form.focused_element(), 0);
        assert_eq!(form.form_item_count(), 0);
        assert_eq!(form.button_count(), 0);
    }

    #[test]
    fn test_lookups() {
        let mut form = contact_form();
        assert_eq!(form.form_item_index("Last"), Some(2));
        assert_eq!(form.form_item_by_label("Notes").map(|item| item.label()), Some("Notes"));
        assert!(form.form_item_by_label("Nope").is_none());
        assert_eq!(form.button_index("Cancel"), Some(1));
        assert_eq!(form.button(0).map(Button::label), Some("Save"));
        form.clear(false);
        assert_eq!(form.form_item_count(), 0);
        assert_eq!(form.button_count(), 2);
        form.clear_buttons();
        assert_eq!(form.button_count(), 0);
    }

    #[test]
    fn test_paste_goes_to_focused_field() {
        let mut form = contact_form();
        assert!(!form.handle_paste("nobody"));
        form.set_focus(2);
        assert!(form.handle_paste("Doe"));
        assert_eq!(input(&form, 2).value(), "Doe");
        form.set_focus(3);
        assert!(!form.handle_paste("button"));
    }

    fn tall_form() -> ScrollableForm {
        let mut form = ScrollableForm::default();
        for label in ["A", "B", "C", "D", "E", "F"] {
            form.add_input_field(label, "", 5);
        }
        form
    }

    #[test]
    fn test_draw_scrolls_focused_into_view() {
        let mut form = tall_form();
        let mut buf = Buffer::empty(Rect::new(0, 0, 30, 7));
        form.set_focus(0);
        form.draw(buf.area, &mut buf);
        assert_eq!(form.form_item(0).map(|item| item.area()), Some(Rect::new(1, 1, 28, 1)));
        assert_eq!(form.form_item(2).map(|item| item.area().y), Some(5));
        assert_eq!(form.form_item(3).map(|item| item.area()), Some(Rect::default()));
        assert_eq!(row(&buf, 1).trim_end(), " A");

        // Inner rows 1..6, F sits at row 11 before scrolling.
        form.set_focus(5);
        let mut buf = Buffer::empty(Rect::new(0, 0, 30, 7));
        form.draw(buf.area, &mut buf);
        assert_eq!(form.form_item(5).map(|item| item.area().y), Some(5));
        assert_eq!(form.form_item(3).map(|item| item.area().y), Some(1));
        assert_eq!(form.form_item(0).map(|item| item.area()), Some(Rect::default()));
        assert!(row(&buf, 1).starts_with(" D"));
        assert!(row(&buf, 5).starts_with(" F"));
        assert_eq!(buf[(29, 0)].symbol(), SCROLL_UP_LABEL);
        assert_eq!(buf[(29, 6)].symbol(), SCROLL_DOWN_LABEL);
    }

    #[test]
    fn test_scroll_buttons_step() {
        let mut form = tall_form();
        let mut buf = Buffer::empty(Rect::new(0, 0, 30, 7));
        form.focus();
        form.draw(buf.area, &mut buf);
        assert!(form.handle_mouse(MouseAction::LeftClick, Position::new(29, 6)));
        assert_eq!(form.focused_item_index(), (Some(1), None));
        assert!(form.handle_mouse(MouseAction::LeftClick, Position::new(29, 0)));
        assert_eq!(form.focused_item_index(), (Some(0), None));
        // Already at the top: the click is used but nothing moves.
        assert!(form.handle_mouse(MouseAction::LeftClick, Position::new(29, 0)));
        assert_eq!(form.focused_item_index(), (Some(0), None));
        assert!(form.up_scroll_button().is_disabled());
    }

    #[test]
    fn test_draw_partly_hidden_item_shows_visible_rows() {
        let mut form = ScrollableForm::default();
        form.add_text_area("Addr", "l1\nl2\nl3", 0, 3, 0)
            .add_input_field("B", "", 5)
            .add_input_field("C", "", 5);
        form.set_focus(2);
        let mut buf = Buffer::empty(Rect::new(0, 0, 30, 7));
        form.draw(buf.area, &mut buf);
        // Scrolled by two, the area spans rows -1 to 1 and only its last row shows.
        assert_eq!(form.form_item(0).map(|item| item.area()), Some(Rect::new(1, 1, 28, 1)));
        assert_eq!(row(&buf, 1).trim_end(), "      l3");
        assert!(!row(&buf, 0).contains('l'));
        assert!(row(&buf, 3).starts_with(" B"));
        assert!(row(&buf, 5).starts_with(" C"));
    }

    #[test]
    fn test_scroll_button_focus_goes_to_last_element() {
        let mut form = contact_form();
        form.set_focus(2);
        form.blur();
        assert_eq!(form.focused_item_index(), (None, None));
        form.focus_scroll_button(ScrollButton::Down);
        assert!(!form.down_scroll_button().is_focused());
        assert_eq!(form.focused_item_index(), (Some(2), None));

        // A press on an arrow asks it for the focus too.
        form.blur();
        let mut buf = Buffer::empty(Rect::new(0, 0, 30, 12));
        form.draw(buf.area, &mut buf);
        assert!(form.handle_mouse(MouseAction::LeftDown, Position::new(29, 0)));
        assert!(!form.up_scroll_button().is_focused());
        assert_eq!(form.focused_item_index(), (Some(2), None));
        assert_eq!(focused_count(&form), 1);
    }

    #[test]
    fn test_mouse_focuses_items() {
        let mut form = contact_form();
        let mut buf = Buffer::empty(Rect::new(0, 0, 30, 12));
        form.focus();
        form.draw(buf.area, &mut buf);
        let last = form.form_item(2).map(|item| item.area()).unwrap();
        assert!(form.handle_mouse(MouseAction::LeftDown, Position::new(last.x + 8, last.y)));
        assert_eq!(form.focused_item_index(), (Some(2), None));
        assert_eq!(form.focused_element(), 2);

        // Presses on read-only items hand the focus back to the last element.
        let notes = form.form_item(1).map(|item| item.area()).unwrap();
        assert!(form.handle_mouse(MouseAction::LeftDown, Position::new(notes.x + 8, notes.y)));
        assert_eq!(form.focused_item_index(), (Some(2), None));

        assert!(!form.handle_mouse(MouseAction::Move, Position::new(notes.x, notes.y)));
        assert!(!form.handle_mouse(MouseAction::LeftDown, Position::new(50, 50)));
    }

    #[test]
    fn test_button_click_selects() {
        let saved = Rc::new(Cell::new(0));
        let count = saved.clone();
        let mut form = ScrollableForm::default();
        form.add_input_field("Name", "", 10)
            .add_button("Save", move || count.set(count.get() + 1));
        let mut buf = Buffer::empty(Rect::new(0, 0, 30, 8));
        form.draw(buf.area, &mut buf);
        let save = form.button(0).map(Button::area).unwrap();
        let at = Position::new(save.x + 1, save.y);
        assert!(form.handle_mouse(MouseAction::LeftDown, at));
        assert_eq!(form.focused_item_index(), (None, Some(0)));
        assert!(form.handle_mouse(MouseAction::LeftClick, at));
        assert_eq!(saved.get(), 1);
        assert!(form.handle_key(key(KeyCode::Enter)));
        assert_eq!(saved.get(), 2);
    }

    #[test]
    fn test_from_config() {
        let mut config = FormConfig::default();
        config.layout.horizontal = true;
        config.layout.item_padding = 3;
        config.theme.label_color = Color::Red;
        let form = ScrollableForm::from_config(&config);
        assert!(form.horizontal);
        assert_eq!(form.item_padding, 3);
        assert_eq!(form.label_color, Color::Red);
    }
}
