//! CLI subcommand definitions and handlers.
//!
//! Uses clap derive to define the subcommand hierarchy:
//! - `status` (default) -- restore the stored session and report it
//! - `login` -- run the Twitch authorization flow
//! - `logout` -- forget the stored token and broadcaster id
//! - `whoami` -- fetch the authenticated broadcaster
//! - `auth-url` -- print a fresh authorization URL
//! - `poll` -- turn the prompt on the active TalesUp tab into a Twitch poll
//! - `config show|path` -- inspect configuration
//! - `version` -- print build/version info

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::auth::SessionManager;
use crate::browser::CdpTabHost;
use crate::config::{self, Config};
use crate::host::ConsoleIdentity;
use crate::polls::{PollPublisher, PublisherSettings};
use crate::session::{Session, SessionState};
use crate::store::FileStore;
use crate::twitch::HelixClient;

/// Start Twitch polls from TalesUp story prompts.
#[derive(Parser, Debug)]
#[command(
    name = "pollbridge",
    version = env!("CARGO_PKG_VERSION"),
    about = "Turns the current TalesUp prompt into a Twitch poll"
)]
pub struct Cli {
    /// Configuration file (default: $POLLBRIDGE_CONFIG or <config dir>/pollbridge/config.json5).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check the stored session (default when no subcommand is given).
    Status,

    /// Log in to Twitch.
    Login,

    /// Forget the stored Twitch session.
    Logout,

    /// Show the authenticated broadcaster.
    Whoami,

    /// Print a fresh authorization URL without starting the flow.
    AuthUrl,

    /// Create a Twitch poll from the prompt on the active TalesUp tab.
    Poll,

    /// Inspect configuration.
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Print version, build date, and git commit information.
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the fully loaded configuration as JSON.
    Show,

    /// Print the resolved configuration file path.
    Path,
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Components wired from configuration
pub struct App {
    pub sessions: SessionManager,
    pub publisher: PollPublisher,
}

impl App {
    /// Wire the CLI hosts: console login, file storage and a CDP browser.
    pub fn from_config(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        config.validate()?;

        let store_path = config
            .storage
            .path
            .clone()
            .unwrap_or_else(|| config::app_dir().join("storage.json"));
        let session = Session::new(Arc::new(FileStore::new(store_path)));

        let helix = HelixClient::new(&config.twitch)?;
        let identity = Arc::new(ConsoleIdentity::new(config.identity.redirect_base.clone()));
        let tabs = Arc::new(CdpTabHost::new(&config.browser)?);

        Ok(Self {
            sessions: SessionManager::new(config, helix.clone(), identity, session.clone()),
            publisher: PollPublisher::new(PublisherSettings::from(config), session, helix, tabs),
        })
    }
}

/// Parse-independent entry point used by `main`.
pub async fn run(cli: Cli) -> CliResult {
    let config_path = cli.config.clone().unwrap_or_else(config::get_config_path);
    let cfg = config::load_config_at(&config_path)?;

    if let Err(e) = crate::logging::init_logging(&cfg.logging) {
        eprintln!("Warning: {e}");
    }

    match cli.command.unwrap_or(Command::Status) {
        Command::Status => handle_status(&App::from_config(&cfg)?).await,
        Command::Login => handle_login(&App::from_config(&cfg)?).await,
        Command::Logout => handle_logout(&App::from_config(&cfg)?),
        Command::Whoami => handle_whoami(&App::from_config(&cfg)?).await,
        Command::AuthUrl => handle_auth_url(&App::from_config(&cfg)?),
        Command::Poll => handle_poll(&App::from_config(&cfg)?).await,
        Command::Config(ConfigCommand::Show) => handle_config_show(&cfg),
        Command::Config(ConfigCommand::Path) => {
            println!("{}", config_path.display());
            Ok(())
        }
        Command::Version => {
            handle_version();
            Ok(())
        }
    }
}

/// Run the `status` subcommand.
pub async fn handle_status(app: &App) -> CliResult {
    print_state(&current_state(app).await);
    Ok(())
}

/// Restore the stored session. An unreachable validation endpoint counts
/// as no session.
pub async fn current_state(app: &App) -> SessionState {
    match app.sessions.resume().await {
        Ok(state) => state,
        Err(_) => SessionState::NoSession,
    }
}

/// Run the `login` subcommand.
pub async fn handle_login(app: &App) -> CliResult {
    let state = app.sessions.login().await?;
    print_state(&state);
    Ok(())
}

/// Run the `logout` subcommand.
pub fn handle_logout(app: &App) -> CliResult {
    app.sessions.session().clear()?;
    println!("Logged out.");
    Ok(())
}

/// Run the `whoami` subcommand.
pub async fn handle_whoami(app: &App) -> CliResult {
    let identity = app.sessions.fetch_identity().await?;
    println!("{}", serde_json::to_string_pretty(&identity)?);
    Ok(())
}

/// Run the `auth-url` subcommand.
pub fn handle_auth_url(app: &App) -> CliResult {
    println!("{}", app.sessions.build_authorization_url().url);
    Ok(())
}

/// Run the `poll` subcommand.
///
/// The stored token is validated and the broadcaster fetched first; nothing
/// is posted unless the session is ready.
pub async fn handle_poll(app: &App) -> CliResult {
    let state = app.sessions.resume().await?;
    if !state.is_ready() {
        print_state(&state);
        return Ok(());
    }

    let status = app.publisher.publish().await?;
    println!("{}", status);
    Ok(())
}

/// Run the `config show` subcommand.
pub fn handle_config_show(cfg: &Config) -> CliResult {
    println!("{}", serde_json::to_string_pretty(cfg)?);
    Ok(())
}

/// Run the `version` subcommand.
pub fn handle_version() {
    println!("pollbridge {}", env!("CARGO_PKG_VERSION"));
    println!("  commit: {}", env!("POLLBRIDGE_GIT_HASH"));
    println!("  built:  {}", env!("POLLBRIDGE_BUILD_DATE"));
}

fn print_state(state: &SessionState) {
    match state {
        SessionState::NoSession => {
            println!("Not logged in. Run `pollbridge login`.");
        }
        SessionState::Authenticated => {
            println!("Logged in, but the Twitch profile could not be fetched.");
        }
        SessionState::Ready(identity) => {
            println!("Logged in as {} ({})", identity.display_name, identity.id);
            if !identity.profile_image_url.is_empty() {
                println!("  avatar: {}", identity.profile_image_url);
            }
        }
    }
}
