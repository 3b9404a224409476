//! Inline style tags in labels and texts.
//!
//! A tag is written as `[foreground:background:attributes]` where every part is
//! optional, e.g. `[red]`, `[:blue]`, `[yellow::b]` or `[#ff8800]`. A `-` in a
//! position resets that part to the base style, so `[-]` restores the
//! foreground and `[-:-:-]` restores everything. Region tags (`["id"]`, `[""]`)
//! are recognised and dropped. Tags never count towards the display width.

use std::str::FromStr;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part<T> {
    Keep,
    Reset,
    Set(T),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StyleTag {
    fg: Part<Color>,
    bg: Part<Color>,
    modifiers: Part<Modifier>,
}

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Tag(Option<StyleTag>),
}

fn is_color_word(s: &str) -> bool {
    if let Some(hex) = s.strip_prefix('#') {
        return hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric())
}

fn parse_color(s: &str) -> Option<Part<Color>> {
    match s {
        "" => Some(Part::Keep),
        "-" => Some(Part::Reset),
        _ if is_color_word(s) => Some(
            // Unknown names are still tags, they just leave the color alone.
            Color::from_str(s).map(Part::Set).unwrap_or(Part::Keep),
        ),
        _ => None,
    }
}

fn parse_modifiers(s: &str) -> Option<Part<Modifier>> {
    match s {
        "" => return Some(Part::Keep),
        "-" => return Some(Part::Reset),
        _ => {}
    }
    let mut modifiers = Modifier::empty();
    for c in s.chars() {
        modifiers |= match c {
            'l' => Modifier::SLOW_BLINK,
            'b' => Modifier::BOLD,
            'i' => Modifier::ITALIC,
            'd' => Modifier::DIM,
            'r' => Modifier::REVERSED,
            'u' => Modifier::UNDERLINED,
            's' => Modifier::CROSSED_OUT,
            _ => return None,
        };
    }
    Some(Part::Set(modifiers))
}

/// Parses the inside of a `[...]` pair. `Some(None)` is a region tag.
fn parse_tag(content: &str) -> Option<Option<StyleTag>> {
    if content.len() >= 2 && content.starts_with('"') && content.ends_with('"') {
        return Some(None);
    }
    if content.is_empty() {
        return None;
    }
    let mut parts = content.split(':');
    let fg = parse_color(parts.next().unwrap_or_default())?;
    let bg = parse_color(parts.next().unwrap_or_default())?;
    let modifiers = parse_modifiers(parts.next().unwrap_or_default())?;
    if parts.next().is_some() {
        return None;
    }
    Some(Some(StyleTag { fg, bg, modifiers }))
}

fn segments(s: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut cursor = 0;
    while let Some(open) = s[cursor..].find('[').map(|i| cursor + i) {
        let Some(close) = s[open + 1..].find(']').map(|i| open + 1 + i) else {
            break;
        };
        match parse_tag(&s[open + 1..close]) {
            Some(tag) => {
                if text_start < open {
                    segments.push(Segment::Text(&s[text_start..open]));
                }
                segments.push(Segment::Tag(tag));
                text_start = close + 1;
                cursor = close + 1;
            }
            None => cursor = open + 1,
        }
    }
    if text_start < s.len() {
        segments.push(Segment::Text(&s[text_start..]));
    }
    segments
}

/// Removes all style tags.
pub fn strip_tags(s: &str) -> String {
    segments(s)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Text(text) => Some(text),
            Segment::Tag(_) => None,
        })
        .collect()
}

/// Display width in terminal columns, not counting style tags.
pub fn tagged_width(s: &str) -> usize {
    segments(s)
        .into_iter()
        .map(|segment| match segment {
            Segment::Text(text) => text.width(),
            Segment::Tag(_) => 0,
        })
        .sum()
}

/// Turns a single line with style tags into styled spans on top of `base`.
pub fn parse_line(s: &str, base: Style) -> Line<'static> {
    let mut style = base;
    let mut spans = Vec::new();
    for segment in segments(s) {
        match segment {
            Segment::Text(text) => spans.push(Span::styled(text.to_string(), style)),
            Segment::Tag(None) => {}
            Segment::Tag(Some(tag)) => {
                style = match tag.fg {
                    Part::Keep => style,
                    Part::Reset => Style { fg: base.fg, ..style },
                    Part::Set(color) => style.fg(color),
                };
                style = match tag.bg {
                    Part::Keep => style,
                    Part::Reset => Style { bg: base.bg, ..style },
                    Part::Set(color) => style.bg(color),
                };
                style = match tag.modifiers {
                    Part::Keep => style,
                    Part::Reset => Style {
                        add_modifier: base.add_modifier,
                        sub_modifier: base.sub_modifier,
                        ..style
                    },
                    Part::Set(modifiers) => style.add_modifier(modifiers),
                };
            }
        }
    }
    Line::from(spans)
}
