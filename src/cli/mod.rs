//! Terminal transparency dashboard (Ratatui + Crossterm)
//! - Reads the portal views straight from the store
//! - No tracing subscriber here; stdout belongs to the alternate screen

use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::{backend::CrosstermBackend, Terminal};
use sqlx::{Pool, Sqlite};

use crate::config::AppConfig;
use crate::transparency::PortalSettings;

pub mod api;
pub mod input;
pub mod state;
pub mod ui;
pub mod util;

type Term = Terminal<CrosstermBackend<std::io::Stdout>>;

pub async fn run(pool: Pool<Sqlite>, config: &AppConfig) -> Result<()> {
    let mut app = init_app(pool, config).await?;

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let outcome = event_loop(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    outcome
}

async fn event_loop(terminal: &mut Term, app: &mut state::App) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key).await?;
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.quit {
            return Ok(());
        }
    }
}

pub async fn init_app(pool: Pool<Sqlite>, config: &AppConfig) -> Result<state::App> {
    let settings = PortalSettings {
        fiscal_year: config.fiscal_year,
        usd_rate: config.usd_conversion_rate,
    };
    let client = api::Client::new(pool, settings);

    let mut app = state::App::new(client, std::env::current_dir()?);
    app.refresh().await?;
    Ok(app)
}
