use std::any::Any;

use crossterm::event::KeyEvent;
use focusable::Focus;
use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect};
use ratatui::style::Color;
use ratatui::widgets::WidgetRef;

use super::form_item::{
    field_extent, render_label, FormAttributes, FormItem, KeyOutcome, MouseOutcome,
};
use crate::event::MouseAction;

/// A picture drawn with half blocks, two pixels per cell.
///
/// Images are not interactive and never take the focus.
#[derive(Debug, Clone, Focus)]
pub struct Image {
    pub is_focused: bool,
    label: String,
    /// Rows of pixels, all of the same length.
    pixels: Vec<Vec<Color>>,
    field_width: u16,
    field_height: u16,
    attributes: FormAttributes,
    area: Rect,
}

impl Image {
    /// Rows shorter than the first one are padded with the reset color.
    pub fn new(label: &str, mut pixels: Vec<Vec<Color>>) -> Self {
        let width = pixels.first().map_or(0, Vec::len);
        for row in &mut pixels {
            row.resize(width, Color::Reset);
        }
        Self {
            is_focused: false,
            label: label.to_string(),
            pixels,
            field_width: 0,
            field_height: 0,
            attributes: FormAttributes::default(),
            area: Rect::default(),
        }
    }

    /// Size of the image cell area. A width of 0 adapts to the available space.
    pub fn size(mut self, field_width: u16, field_height: u16) -> Self {
        self.field_width = field_width;
        self.field_height = field_height;
        self
    }

    fn pixel_size(&self) -> (usize, usize) {
        (self.pixels.first().map_or(0, Vec::len), self.pixels.len())
    }

    /// Cells used to show the image inside `width` x `height` cells, keeping
    /// the aspect ratio. A cell is one pixel wide and two pixels high.
    fn fit(&self, width: u16, height: u16) -> (u16, u16) {
        let (pixel_width, pixel_height) = self.pixel_size();
        if pixel_width == 0 || pixel_height == 0 || width == 0 || height == 0 {
            return (0, 0);
        }
        let max_width = usize::from(width);
        let max_height = usize::from(height) * 2;
        // Compare pixel_width / pixel_height with max_width / max_height.
        if pixel_width * max_height > max_width * pixel_height {
            let rows = (pixel_height * max_width).div_ceil(pixel_width);
            (width, rows.div_ceil(2).max(1) as u16)
        } else {
            let columns = (pixel_width * max_height / pixel_height).max(1);
            (columns as u16, height)
        }
    }

    fn sample(&self, x: usize, y: usize, columns: usize, rows: usize) -> Color {
        let (pixel_width, pixel_height) = self.pixel_size();
        let px = (x * pixel_width / columns).min(pixel_width - 1);
        let py = (y * pixel_height / rows).min(pixel_height - 1);
        self.pixels[py][px]
    }
}

impl FormItem for Image {
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
        false
    }

    fn handle_key(&mut self, _key: KeyEvent) -> KeyOutcome {
        KeyOutcome::Ignored
    }

    fn handle_mouse(&mut self, _action: MouseAction, _position: Position) -> MouseOutcome {
        MouseOutcome::Ignored
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl WidgetRef for Image {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let area = area.intersection(buf.area);
        if area.is_empty() {
            return;
        }
        let field = render_label(&self.label, &self.attributes, area, buf);
        let (columns, rows) = self.fit(field_extent(self.field_width, field.width), field.height);
        let pixel_rows = usize::from(rows) * 2;
        for row in 0..rows {
            for column in 0..columns {
                let x = usize::from(column);
                let top = self.sample(x, usize::from(row) * 2, usize::from(columns), pixel_rows);
                let bottom =
                    self.sample(x, usize::from(row) * 2 + 1, usize::from(columns), pixel_rows);
                buf[(field.x + column, field.y + row)]
                    .set_symbol("▀")
                    .set_fg(top)
                    .set_bg(bottom);
            }
        }
    }
}
