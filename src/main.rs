use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use nexis_dash::app::App;
use nexis_dash::poller::{DashboardState, Poller};
use nexis_dash::ui;
use nexis_dash::ApiClient;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal dashboard for Nexis node monitoring", long_about = None)]
struct Args {
    /// Node API host
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Node API port
    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// Refresh interval in milliseconds
    #[arg(long, default_value_t = 5000)]
    refresh_ms: u64,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so the alternate screen stays clean.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nexis_dash=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let api_base = format!("http://{}:{}", args.host, args.port);
    let client = ApiClient::new(&api_base, Duration::from_millis(args.timeout_ms))?;

    let state = Arc::new(Mutex::new(DashboardState::default()));
    let poller = Poller::new(
        client,
        Duration::from_millis(args.refresh_ms),
        Arc::clone(&state),
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.spawn(poller.run());

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(state);
    let result = run_ui(&mut terminal, &mut app);

    // Clean up
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_ui(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui::render(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.on_key(key.code) {
                    return Ok(());
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }
}
