use std::io;
use std::path::PathBuf;

use clap::Parser;
use formscroll::config::file::read_config;
use formscroll::config::helpers::get_config_file_path;
use formscroll::config::ButtonsAlign;
use formscroll::event::{Event, EventHandler};
use formscroll::FormResult;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
#[allow(unused_imports)]
use tracing_subscriber::prelude::*;

use crate::app::App;
use crate::handler::{handle_key_events, handle_mouse_events, handle_paste_event};
use crate::tui::Tui;

mod app;
mod handler;
mod tui;
mod ui;

#[cfg(debug_assertions)]
fn init_tracing() -> FormResult<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("formscroll=trace"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tui_logger::TuiTracingSubscriberLayer)
        .try_init()?;
    tui_logger::init_logger(tracing::log::LevelFilter::Trace)?;
    Ok(())
}

pub fn version() -> String {
    let commit_hash = option_env!("FORMSCROLL_GIT_INFO").unwrap_or(env!("CARGO_PKG_VERSION"));
    let name = clap::crate_name!();

    format!("{name} {commit_hash}")
}

#[derive(Parser, Debug)]
#[command(version = version(), about = "Fill in a scrollable terminal form")]
struct Args {
    /// YAML configuration file, defaults to the platform config directory.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Lay items out from left to right.
    #[arg(long)]
    horizontal: bool,
    /// Empty rows or cells between items.
    #[arg(short, long)]
    padding: Option<u16>,
    /// Alignment of the button row.
    #[arg(short, long, value_enum)]
    align: Option<ButtonsAlign>,
}

#[tokio::main]
async fn main() -> FormResult<()> {
    #[cfg(debug_assertions)]
    init_tracing()?;
    let args = Args::parse();
    color_eyre::install()?;

    let config_path = match args.config {
        Some(path) => path,
        None => get_config_file_path()?,
    };
    let mut config = read_config(config_path).await?;
    if args.horizontal {
        config.layout.horizontal = true;
    }
    if let Some(padding) = args.padding {
        config.layout.item_padding = padding;
    }
    if let Some(align) = args.align {
        config.layout.buttons_align = align;
    }
    tracing::debug!(?config, "starting");

    let mut app = App::new(&config);

    // Initialize the terminal user interface.
    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;
    let events = EventHandler::new(250);
    let mut tui = Tui::new(terminal, events);
    tui.init()?;

    // Start the main loop.
    while app.running {
        tui.draw(&mut app)?;
        match tui.events.next().await? {
            Event::Tick => {}
            Event::Key(key_event) => handle_key_events(key_event, &mut app),
            Event::Mouse(mouse_event) => handle_mouse_events(mouse_event, &mut app),
            Event::Paste(text) => handle_paste_event(&text, &mut app),
            Event::Resize(_, _) => {}
        }
    }

    // Exit the user interface.
    tui.exit()?;
    Ok(())
}
