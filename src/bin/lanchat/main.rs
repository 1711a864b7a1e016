//! lanchat - peer-to-peer LAN chat with a terminal UI
//!
//! Runs a full chat node (listener, dispatch loop, address book) behind a
//! terminal interface: a sidebar of contacts and open conversations, a
//! transcript pane, and an input box. Unsolicited messages from unknown
//! peers pop up as new conversations on their own.

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as TermEvent, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use lanchat::{ChatNodeBuilder, ContactDirectory, DEFAULT_PORT};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

mod app;
mod ui;

use app::{App, InputMode};

/// lanchat - peer-to-peer LAN chat
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the inbound listener to
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: IpAddr,

    /// TCP port for inbound and outbound messages
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Path to the contact file (JSON)
    #[arg(short, long)]
    contacts: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("lanchat={}", log_level))
        .with_target(false)
        .init();

    let contacts_path = args.contacts.unwrap_or_else(default_contacts_path);
    info!(path = %contacts_path.display(), "loading contact file");
    let directory = ContactDirectory::load(&contacts_path).context("failed to load contact file")?;

    let node = ChatNodeBuilder::new()
        .with_bind_address(args.bind)
        .with_port(args.port)
        .with_directory(directory)
        .build()
        .context("invalid configuration")?;

    node.start().await.context("failed to start listener")?;
    if let Some(address) = node.local_addr() {
        info!(%address, "listening for messages");
    }

    let mut app = App::new(node);
    let result = run_ui(&mut app).await;

    app.node.stop().await.ok();
    result
}

/// Default contact file location, e.g. `~/.local/share/lanchat/contacts.json`.
fn default_contacts_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "lanchat")
        .map(|dirs| dirs.data_dir().join("contacts.json"))
        .unwrap_or_else(|| PathBuf::from("contacts.json"))
}

/// Run the terminal user interface
async fn run_ui(app: &mut App) -> Result<()> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("failed to set up terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    let result = run_app(&mut terminal, app).await;

    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("failed to restore terminal")?;
    terminal.show_cursor().context("failed to show cursor")?;

    result
}

/// Main application loop
async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let TermEvent::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') if app.input_mode == InputMode::Normal => {
                        return Ok(());
                    }
                    KeyCode::Char('i') if app.input_mode == InputMode::Normal => {
                        if app.focused.is_some() {
                            app.input_mode = InputMode::Editing;
                        }
                    }
                    KeyCode::Char('x') if app.input_mode == InputMode::Normal => {
                        app.close_focused();
                    }
                    KeyCode::Esc if app.input_mode == InputMode::Editing => {
                        app.input_mode = InputMode::Normal;
                    }
                    KeyCode::Enter if app.input_mode == InputMode::Normal => {
                        app.open_selected();
                    }
                    KeyCode::Enter if app.input_mode == InputMode::Editing => {
                        app.send_current_input().await;
                    }
                    KeyCode::Char(c) if app.input_mode == InputMode::Editing => {
                        app.input.push(c);
                    }
                    KeyCode::Backspace if app.input_mode == InputMode::Editing => {
                        app.input.pop();
                    }
                    KeyCode::Up if app.input_mode == InputMode::Normal => {
                        app.select_previous();
                    }
                    KeyCode::Down if app.input_mode == InputMode::Normal => {
                        app.select_next();
                    }
                    _ => {}
                }
            }
        }

        // Pick up anything the dispatch loop routed since the last frame.
        app.process_events();
    }
}
