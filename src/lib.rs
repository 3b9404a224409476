//! Terminal forms that scroll to keep the focused element visible.
//!
//! A [`ScrollableForm`](widgets::ScrollableForm) lays out labelled items and a
//! row of buttons inside a fixed area, moves the focus between them with the
//! keyboard or mouse, and draws two arrows to step through elements.

pub mod config;
pub mod event;
pub mod markup;
pub mod widgets;

pub type FormResult<T> = color_eyre::eyre::Result<T>;
