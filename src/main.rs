use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::{
    event::{poll, read, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use sygt::api::ApiClient;
use sygt::app::App;
use sygt::config::Config;
use sygt::event;
use sygt::nav::Route;
use sygt::resource::{ResourceKind, ResourceRegistry};
use sygt::ui;
use sygt::ui::splash::{render as render_splash, SplashState};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Checklist shown on the splash screen, in execution order
const STARTUP_STEPS: [&str; 3] = ["Configuración", "Backend", "Primera carga"];

/// Terminal dashboard for the municipal collections backend
#[derive(Parser, Debug)]
#[command(name = "sygt", version, about, long_about = None)]
struct Args {
    /// Backend base URL (overrides SYGT_API_URL and the config file)
    #[arg(short, long)]
    api_url: Option<String>,

    /// Initial screen, e.g. /pagos or recibos
    #[arg(short, long)]
    view: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    /// Run in read-only mode (block all write operations)
    #[arg(long)]
    readonly: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("sygt started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("sygt").join("sygt.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".sygt").join("sygt.log");
    }
    PathBuf::from("sygt.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Initialize and run
    let result = initialize_with_splash(&mut terminal, &args).await;

    match result {
        Ok(Some(mut app)) => {
            let run_result = run_app(&mut terminal, &mut app).await;
            cleanup_terminal(&mut terminal)?;

            if let Err(err) = run_result {
                eprintln!("Error: {err:?}");
            }
        },
        Ok(None) => {
            cleanup_terminal(&mut terminal)?;
        },
        Err(err) => {
            cleanup_terminal(&mut terminal)?;
            eprintln!("Initialization error: {err:?}");
        },
    }

    Ok(())
}

fn cleanup_terminal<B: Backend + std::io::Write>(terminal: &mut Terminal<B>) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

async fn initialize_with_splash<B: Backend>(
    terminal: &mut Terminal<B>,
    args: &Args,
) -> Result<Option<App>>
where
    B::Error: Send + Sync + 'static,
{
    let mut splash = SplashState::new(STARTUP_STEPS);
    terminal.draw(|f| render_splash(f, &splash))?;

    if check_abort()? {
        return Ok(None);
    }

    // Configuration: file, environment and flags
    let config_path = Config::config_path();
    splash.start(match &config_path {
        Some(path) => path.display().to_string(),
        None => "sin directorio de configuración".to_string(),
    });
    terminal.draw(|f| render_splash(f, &splash))?;

    let config = Config::load();
    let api_url = config.effective_api_url(args.api_url.as_deref());
    let timeout = config.effective_timeout(args.timeout_secs);
    tracing::info!("Using backend: {} (timeout {:?})", api_url, timeout);
    splash.finish();

    if check_abort()? {
        return Ok(None);
    }

    splash.start(format!("{} recursos en {}", ResourceKind::ALL.len(), api_url));
    terminal.draw(|f| render_splash(f, &splash))?;

    let registry = ResourceRegistry::new(&api_url)
        .with_context(|| format!("Invalid API URL: {}", api_url))?;
    let api = ApiClient::new(timeout)?;
    splash.finish();

    if check_abort()? {
        return Ok(None);
    }

    // Initial screen (CLI > last viewed > Cajeros)
    let route = match args.view.as_deref().or(config.last_view.as_deref()) {
        Some(view) => Route::parse(view).unwrap_or_else(|| {
            tracing::warn!("Unknown view {:?}, falling back to {}", view, Route::default());
            Route::default()
        }),
        None => Route::default(),
    };

    splash.start(format!("{} ({})", route.label(), route.path()));
    terminal.draw(|f| render_splash(f, &splash))?;

    let mut app = App::new(registry, api, route, config, args.readonly);
    app.config_path = config_path;
    app.refresh_current().await;

    splash.finish();
    terminal.draw(|f| render_splash(f, &splash))?;

    tokio::time::sleep(Duration::from_millis(200)).await;

    Ok(Some(app))
}

fn check_abort() -> Result<bool> {
    if poll(Duration::from_millis(50))? {
        if let Event::Key(key) = read()? {
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    loop {
        terminal.draw(|f| ui::render(f, app))?;

        if event::handle_events(app).await? {
            return Ok(());
        }
    }
}
