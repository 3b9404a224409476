use ratatui::layout::Alignment;
use ratatui::style::{Color, Style};
use serde::Deserialize;
use strum_macros::{Display, EnumString};

pub mod file;
pub mod helpers;

pub const CONFIG_DIR_ENV: &str = "FORMSCROLL_CONFIG_DIR";
pub const CONFIG_FILE_NAME: &str = "config.yml";

/// Colors shared by a form and everything it lays out.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Theme {
    /// Background of the form itself, also passed to items.
    pub background_color: Color,
    pub label_color: Color,
    pub field_text_color: Color,
    pub field_background_color: Color,
    pub button_text_color: Color,
    pub button_background_color: Color,
    /// Text color of disabled buttons.
    pub button_disabled_text_color: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background_color: Color::Black,
            label_color: Color::Yellow,
            field_text_color: Color::White,
            field_background_color: Color::Blue,
            button_text_color: Color::White,
            button_background_color: Color::Blue,
            button_disabled_text_color: Color::DarkGray,
        }
    }
}

impl Theme {
    pub fn button_style(&self) -> Style {
        Style::new()
            .fg(self.button_text_color)
            .bg(self.button_background_color)
    }

    /// Style of a focused button, the inverse of [`Theme::button_style`].
    pub fn button_activated_style(&self) -> Style {
        Style::new()
            .fg(self.button_background_color)
            .bg(self.button_text_color)
    }

    pub fn button_disabled_style(&self) -> Style {
        Style::new()
            .fg(self.button_disabled_text_color)
            .bg(self.button_background_color)
    }
}

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Display, EnumString, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ButtonsAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl From<ButtonsAlign> for Alignment {
    fn from(align: ButtonsAlign) -> Self {
        match align {
            ButtonsAlign::Left => Alignment::Left,
            ButtonsAlign::Center => Alignment::Center,
            ButtonsAlign::Right => Alignment::Right,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Lay items out from left to right instead of top to bottom.
    pub horizontal: bool,
    /// Empty rows (vertical) or cells (horizontal) between items.
    pub item_padding: u16,
    pub buttons_align: ButtonsAlign,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            horizontal: false,
            item_padding: 1,
            buttons_align: ButtonsAlign::Left,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub theme: Theme,
    pub layout: LayoutConfig,
}
