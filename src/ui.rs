use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Stylize};
use ratatui::text::Line;
use ratatui::Frame;

use crate::app::App;

pub struct Palette;

impl Palette {
    pub const PURPLE: Color = Color::Indexed(93);
    pub const LIGHT_PURPLE: Color = Color::Indexed(183); // #CA7FF8
    pub const PINK: Color = Color::Indexed(205);
    pub const DARK_GRAY: Color = Color::Indexed(236);
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let mut main_layout = vec![Constraint::Min(0)];
    if cfg!(debug_assertions) {
        main_layout.push(Constraint::Percentage(40));
    }
    let main_layout = Layout::horizontal(main_layout).split(frame.area());
    let [form_area, status_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(main_layout[0]);

    #[cfg(debug_assertions)]
    render_debugger(app, frame, main_layout[1]);

    frame.render_widget(&mut app.form, form_area);
    render_status(app, frame, status_area);
}

fn render_status(app: &App, frame: &mut Frame, area: Rect) {
    let status = Line::from(app.status.as_str())
        .fg(Palette::LIGHT_PURPLE)
        .bg(Palette::DARK_GRAY);
    frame.render_widget(status, area);
}

#[cfg(debug_assertions)]
fn render_debugger(app: &App, frame: &mut Frame, area: Rect) {
    use ratatui::style::Style;
    use ratatui::widgets::Block;

    let logger = tui_logger::TuiLoggerWidget::default()
        .block(Block::bordered().title("Debugger"))
        .output_separator('|')
        .output_timestamp(Some("%F %H:%M:%S%.3f".to_string()))
        .output_level(Some(tui_logger::TuiLoggerLevelOutput::Long))
        .output_target(false)
        .output_file(false)
        .output_line(false)
        .style(Style::default().fg(Color::White))
        .state(&app.debugger_state);

    frame.render_widget(logger, area);
}
