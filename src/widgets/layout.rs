//! Placement of form items and buttons.
//!
//! Positions are computed in signed cell coordinates since elements can sit
//! above or below the visible band before the scroll offset is applied.

use ratatui::layout::{Alignment, Rect};

use super::form_item::{DEFAULT_FIELD_HEIGHT, DEFAULT_FIELD_WIDTH};

/// Cells a button adds around its label.
pub const BUTTON_CHROME: i32 = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemMetrics {
    /// Display width of the label, style tags excluded.
    pub label_width: i32,
    /// Requested field width, 0 or less means "as wide as possible".
    pub field_width: i32,
    /// Requested field height, 0 or less means [`DEFAULT_FIELD_HEIGHT`].
    pub field_height: i32,
    pub focused: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonMetrics {
    pub label_width: i32,
    pub focused: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutParams {
    /// Area available to items and buttons.
    pub area: Rect,
    pub horizontal: bool,
    pub item_padding: i32,
    pub buttons_align: Alignment,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Placement {
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Moves the placement up by `offset` rows.
    pub fn scrolled(self, offset: i32) -> Self {
        Self {
            y: self.y - offset,
            ..self
        }
    }

    /// Whether any row of the placement lies in `[top, bottom)`.
    pub fn is_visible(&self, top: i32, bottom: i32) -> bool {
        !(self.bottom() <= top || self.y >= bottom)
    }

    /// The placement as a screen rect, `None` when it starts off screen.
    pub fn rect(&self) -> Option<Rect> {
        Some(Rect::new(
            u16::try_from(self.x).ok()?,
            u16::try_from(self.y).ok()?,
            u16::try_from(self.width).ok()?,
            u16::try_from(self.height).ok()?,
        ))
    }

    /// The part of the placement inside `bounds`, `None` when nothing is left.
    pub fn clip(&self, bounds: Rect) -> Option<Rect> {
        let left = self.x.max(i32::from(bounds.x));
        let top = self.y.max(i32::from(bounds.y));
        let right = (self.x + self.width).min(i32::from(bounds.right()));
        let bottom = self.bottom().min(i32::from(bounds.bottom()));
        if left >= right || top >= bottom {
            return None;
        }
        Some(Rect::new(
            left as u16,
            top as u16,
            (right - left) as u16,
            (bottom - top) as u16,
        ))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormLayout {
    /// Label column width handed to each item.
    pub label_widths: Vec<i32>,
    pub items: Vec<Placement>,
    /// `None` for buttons that did not fit this frame.
    pub buttons: Vec<Option<Placement>>,
    pub focused: Option<Placement>,
    /// Rows everything has to move up to keep the focused element visible.
    pub offset: i32,
}

/// Shared label column width for vertical layouts.
pub fn label_column_width(items: &[ItemMetrics]) -> i32 {
    items.iter().map(|item| item.label_width).max().unwrap_or(0) + 1
}

/// Width of the whole button row including the separators between buttons.
pub fn buttons_row_width(buttons: &[ButtonMetrics]) -> i32 {
    buttons
        .iter()
        .map(|button| button.label_width + BUTTON_CHROME + 1)
        .sum::<i32>()
        - 1
}

/// Where a vertical button row starts for the given alignment.
pub fn buttons_row_start(x: i32, right_limit: i32, row_width: i32, align: Alignment) -> i32 {
    match align {
        Alignment::Left => x,
        Alignment::Center => (x + right_limit - row_width) / 2,
        Alignment::Right => right_limit - row_width,
    }
}

/// Rows to scroll so that `focused` is visible in `[top, bottom)`. An element
/// taller than the band is aligned with its top.
pub fn scroll_offset(focused: Option<Placement>, top: i32, bottom: i32) -> i32 {
    let Some(focused) = focused else {
        return 0;
    };
    if focused.bottom() <= bottom {
        return 0;
    }
    let offset = focused.bottom() - bottom;
    if focused.y - offset < top {
        focused.y - top
    } else {
        offset
    }
}

pub fn compute(params: &LayoutParams, items: &[ItemMetrics], buttons: &[ButtonMetrics]) -> FormLayout {
    let area = params.area;
    let start_x = i32::from(area.x);
    let top_limit = i32::from(area.y);
    let bottom_limit = i32::from(area.bottom());
    let right_limit = i32::from(area.right());
    let width = i32::from(area.width);
    let default_width = i32::from(DEFAULT_FIELD_WIDTH);
    let default_height = i32::from(DEFAULT_FIELD_HEIGHT);

    let mut x = start_x;
    let mut y = top_limit;
    let mut line_height = 1;
    let mut layout = FormLayout {
        label_widths: Vec::with_capacity(items.len()),
        items: Vec::with_capacity(items.len()),
        buttons: Vec::with_capacity(buttons.len()),
        ..FormLayout::default()
    };

    let max_label_width = label_column_width(items);
    for item in items {
        let (label_width, mut item_width) = if params.horizontal {
            let field_width = if item.field_width <= 0 {
                default_width
            } else {
                item.field_width
            };
            let label_width = item.label_width + 1;
            (label_width, label_width + field_width)
        } else {
            // All fields align vertically.
            (max_label_width, width)
        };
        let item_height = if item.field_height <= 0 {
            default_height
        } else {
            item.field_height
        };

        if params.horizontal && x + label_width + 1 >= right_limit {
            x = start_x;
            y += line_height + 1;
            line_height = item_height;
        }
        line_height = line_height.max(item_height);

        if x + item_width >= right_limit {
            item_width = right_limit - x;
        }

        let placement = Placement {
            x,
            y,
            width: item_width,
            height: item_height,
        };
        layout.label_widths.push(label_width);
        layout.items.push(placement);
        if item.focused {
            layout.focused = Some(placement);
        }

        if params.horizontal {
            x += item_width + params.item_padding;
        } else {
            y += item_height + params.item_padding;
        }
    }

    let row_width = buttons_row_width(buttons);
    if !params.horizontal && x + row_width < right_limit {
        x = buttons_row_start(x, right_limit, row_width, params.buttons_align);
        // Buttons always get an empty line above them.
        if params.item_padding == 0 {
            y += 1;
        }
    }

    for button in buttons {
        let mut space = right_limit - x;
        let mut button_width = button.label_width + BUTTON_CHROME;
        if params.horizontal {
            if space < button_width - BUTTON_CHROME {
                x = start_x;
                y += line_height + 1;
                space = width;
                line_height = 1;
            }
        } else if space < 1 {
            layout.buttons.push(None);
            continue;
        }
        button_width = button_width.min(space);

        let placement = Placement {
            x,
            y,
            width: button_width,
            height: 1,
        };
        layout.buttons.push(Some(placement));
        if button.focused {
            layout.focused = Some(placement);
        }
        x += button_width + 1;
    }

    layout.offset = scroll_offset(layout.focused, top_limit, bottom_limit);
    layout
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(label_width: i32, field_width: i32, field_height: i32) -> ItemMetrics {
        ItemMetrics {
            label_width,
            field_width,
            field_height,
            focused: false,
        }
    }

    fn button(label_width: i32) -> ButtonMetrics {
        ButtonMetrics {
            label_width,
            focused: false,
        }
    }

    fn params(area: Rect, horizontal: bool, item_padding: i32) -> LayoutParams {
        LayoutParams {
            area,
            horizontal,
            item_padding,
            buttons_align: Alignment::Left,
        }
    }

    #[test]
    fn test_vertical_label_column() {
        let items = [item(4, 10, 1), item(9, 5, 0), item(6, 0, 3)];
        let layout = compute(&params(Rect::new(1, 1, 40, 30), false, 1), &items, &[]);
        assert_eq!(layout.label_widths, vec![10, 10, 10]);
        assert_eq!(
            layout.items,
            vec![
                Placement { x: 1, y: 1, width: 40, height: 1 },
                Placement { x: 1, y: 3, width: 40, height: 1 },
                Placement { x: 1, y: 5, width: 40, height: 3 },
            ]
        );
        assert_eq!(layout.offset, 0);
        assert_eq!(layout.focused, None);
    }

    #[test]
    fn test_horizontal_wraps_rows() {
        // Widths: 6 + 10, 6 + 10, wrapping once the third would overflow 40.
        let items = [item(5, 10, 1), item(5, 10, 2), item(5, 10, 1)];
        let layout = compute(&params(Rect::new(0, 0, 40, 10), true, 1), &items, &[]);
        assert_eq!(layout.label_widths, vec![6, 6, 6]);
        assert_eq!(layout.items[0], Placement { x: 0, y: 0, width: 16, height: 1 });
        assert_eq!(layout.items[1], Placement { x: 17, y: 0, width: 16, height: 2 });
        // x = 34, 34 + 6 + 1 >= 40 so the item moves below the two row high line.
        assert_eq!(layout.items[2], Placement { x: 0, y: 3, width: 16, height: 1 });
    }

    #[test]
    fn test_horizontal_default_width_and_clipping() {
        let items = [item(3, 0, 1), item(2, 30, 1)];
        let layout = compute(&params(Rect::new(0, 0, 30, 10), true, 1), &items, &[]);
        assert_eq!(layout.items[0].width, 4 + DEFAULT_FIELD_WIDTH as i32);
        // Starts at 15 and would need 33 cells.
        assert_eq!(layout.items[1], Placement { x: 15, y: 0, width: 15, height: 1 });
    }

    #[test]
    fn test_buttons_below_items() {
        let items = [item(4, 10, 1)];
        let buttons = [button(4), button(6)];
        let layout = compute(&params(Rect::new(0, 0, 40, 10), false, 1), &items, &buttons);
        assert_eq!(layout.buttons[0], Some(Placement { x: 0, y: 2, width: 8, height: 1 }));
        assert_eq!(layout.buttons[1], Some(Placement { x: 9, y: 2, width: 10, height: 1 }));

        // Without padding an empty line is inserted.
        let layout = compute(&params(Rect::new(0, 0, 40, 10), false, 0), &items, &buttons);
        assert_eq!(layout.buttons[0].unwrap().y, 2);
    }

    #[test]
    fn test_buttons_alignment() {
        let buttons = [button(4), button(6)];
        assert_eq!(buttons_row_width(&buttons), 8 + 1 + 10);
        assert_eq!(buttons_row_width(&[]), -1);

        let mut p = params(Rect::new(2, 0, 40, 10), false, 1);
        p.buttons_align = Alignment::Right;
        let layout = compute(&p, &[], &buttons);
        assert_eq!(layout.buttons[0].unwrap().x, 42 - 19);
        assert_eq!(layout.buttons[1].unwrap().x, 42 - 19 + 9);

        p.buttons_align = Alignment::Center;
        let layout = compute(&p, &[], &buttons);
        assert_eq!(layout.buttons[0].unwrap().x, (2 + 42 - 19) / 2);
    }

    #[test]
    fn test_vertical_buttons_stop_without_space() {
        let buttons = [button(6), button(6), button(6)];
        let layout = compute(&params(Rect::new(0, 0, 15, 10), false, 1), &[], &buttons);
        assert_eq!(layout.buttons[0], Some(Placement { x: 0, y: 0, width: 10, height: 1 }));
        assert_eq!(layout.buttons[1], Some(Placement { x: 11, y: 0, width: 4, height: 1 }));
        assert_eq!(layout.buttons[2], None);
    }

    #[test]
    fn test_horizontal_buttons_wrap() {
        let items = [item(5, 10, 1)];
        let buttons = [button(6), button(6)];
        let layout = compute(&params(Rect::new(0, 0, 30, 10), true, 1), &items, &buttons);
        assert_eq!(layout.buttons[0], Some(Placement { x: 17, y: 0, width: 10, height: 1 }));
        // Only 2 cells left, fewer than the label needs.
        assert_eq!(layout.buttons[1], Some(Placement { x: 0, y: 2, width: 10, height: 1 }));
    }

    #[test]
    fn test_scroll_offset() {
        let p = |y, height| Some(Placement { x: 0, y, width: 5, height });
        assert_eq!(scroll_offset(None, 0, 10), 0);
        assert_eq!(scroll_offset(p(3, 2), 0, 10), 0);
        assert_eq!(scroll_offset(p(8, 2), 0, 10), 0);
        assert_eq!(scroll_offset(p(12, 2), 0, 10), 4);
        // Taller than the band: align the top instead.
        assert_eq!(scroll_offset(p(12, 15), 1, 10), 11);
    }

    #[test]
    fn test_focused_item_scrolls_into_view() {
        let mut items = vec![item(4, 10, 1); 8];
        items[7].focused = true;
        let layout = compute(&params(Rect::new(0, 1, 20, 6), false, 1), &items, &[]);
        // Item 7 sits at y = 15 and the band ends at 7.
        assert_eq!(layout.focused.unwrap().y, 15);
        assert_eq!(layout.offset, 9);
        let visible = layout
            .items
            .iter()
            .filter(|p| p.scrolled(layout.offset).is_visible(1, 7))
            .count();
        assert_eq!(visible, 3);
    }

    #[test]
    fn test_clip() {
        let bounds = Rect::new(1, 1, 10, 5);
        let p = Placement { x: 0, y: -1, width: 4, height: 3 };
        assert_eq!(p.clip(bounds), Some(Rect::new(1, 1, 3, 1)));
        assert_eq!(p.rect(), None);
        let p = Placement { x: 2, y: 6, width: 4, height: 1 };
        assert_eq!(p.clip(bounds), None);
        assert_eq!(p.rect(), Some(Rect::new(2, 6, 4, 1)));
    }
}
