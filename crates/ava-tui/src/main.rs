use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ava_core::{Config, UrlSetting, WidgetConfig, WidgetController};

mod app;
mod commands;
mod handler;
mod tui;
mod ui;

use app::App;

const DEFAULT_LOG_FILTER: &str = "info,ava_core=debug,ava_tui=debug";

#[derive(Parser)]
#[command(name = "ava")]
#[command(about = "Ava customer support chat widget")]
struct Cli {
    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat widget (default)
    Chat {
        /// Chat backend base URL, overriding the stored setting
        #[arg(long)]
        backend_url: Option<String>,
    },
    /// Show or change the widget's URL settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },
    /// Expand the [ava_chatbot] marker in a page and prepend the asset tags
    Embed {
        /// HTML page to expand
        page: PathBuf,
    },
    /// Print the stylesheet, config and script tags for the widget
    Assets,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the current settings
    Show,
    /// Store a URL setting
    Set {
        /// Which setting: frontend or backend
        #[arg(value_parser = parse_url_setting)]
        setting: UrlSetting,
        url: String,
    },
    /// Forget both URLs
    Reset,
}

fn parse_url_setting(s: &str) -> Result<UrlSetting, String> {
    s.parse().map_err(|e: anyhow::Error| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::get_config_path()?,
    };

    match cli.command.unwrap_or(Commands::Chat { backend_url: None }) {
        Commands::Chat { backend_url } => {
            init_file_logging()?;
            run_widget(&config_path, backend_url.as_deref()).await?
        }
        Commands::Settings { action } => {
            init_stderr_logging();
            match action.unwrap_or(SettingsAction::Show) {
                SettingsAction::Show => print!("{}", commands::show_settings(&config_path)?),
                SettingsAction::Set { setting, url } => {
                    commands::set_setting(&config_path, setting, &url)?;
                    print!("{}", commands::show_settings(&config_path)?);
                }
                SettingsAction::Reset => {
                    commands::reset_settings(&config_path)?;
                    print!("{}", commands::show_settings(&config_path)?);
                }
            }
        }
        Commands::Embed { page } => {
            init_stderr_logging();
            println!("{}", commands::embed_page(&config_path, &page)?);
        }
        Commands::Assets => {
            init_stderr_logging();
            println!("{}", commands::asset_tags(&config_path)?);
        }
    }

    Ok(())
}

async fn run_widget(config_path: &std::path::Path, backend_override: Option<&str>) -> Result<()> {
    let config = Config::load_from(config_path)?;
    let widget_config = WidgetConfig::from_env(&config, backend_override)?;
    info!(backend = %widget_config.backend_url, "starting widget");

    let controller = WidgetController::connect(widget_config)?;
    let mut app = App::new(controller);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = event_loop(&mut app, &mut terminal).await;
    tui::restore()?;

    result
}

async fn event_loop(app: &mut App, terminal: &mut tui::Tui) -> Result<()> {
    let mut events = tui::EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;
        // Layout is known after drawing, so follow the newest message now.
        if app.controller.is_open() && app.sync_scroll() {
            terminal.draw(|frame| ui::render(app, frame))?;
        }

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await,
            None => break,
        }
    }

    Ok(())
}

/// The terminal belongs to the widget, so logs go to a file.
fn init_file_logging() -> Result<()> {
    let log_dir = dirs::cache_dir()
        .context("Could not determine cache directory")?
        .join("ava");
    std::fs::create_dir_all(&log_dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("ava.log"))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(env_filter())
        .init();
    Ok(())
}

fn init_stderr_logging() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter())
        .init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("AVA_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.into())
}
