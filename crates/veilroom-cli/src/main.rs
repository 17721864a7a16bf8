//! Veilroom terminal client entry point.

use std::{
    io::{self, Write},
    path::PathBuf,
    time::Duration,
};

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use veilroom_cli::{
    FileStorage, Runtime, SystemEnv, TerminalDriver, TerminalError, UrlLocation,
    terminal::QUIT_COMMAND,
};
use veilroom_client::{
    SessionConfig, SyncSession,
    transport::{DEVELOPMENT_URL, HttpApi, Strategy, TransportConfig, TransportError, Url},
};
use veilroom_core::{
    StorageError, keys::load_or_create_key, room::resolve_room, sanitize::resolve_nickname,
    wire::MAX_PAGE_LIMIT,
};

/// Veilroom terminal client
#[derive(Parser, Debug)]
#[command(name = "veilroom")]
#[command(about = "End-to-end encrypted room chat in the terminal")]
#[command(version)]
struct Args {
    /// Room link (`https://host/room/<id>#<key>`)
    ///
    /// Without a link the last room is reopened, or a new room is created;
    /// a new key is generated whenever the link carries none.
    link: Option<String>,

    /// Server base URL (defaults to the link's origin, then a local server)
    #[arg(short, long)]
    server: Option<String>,

    /// Nickname to post as (remembered for next time)
    #[arg(short, long)]
    nick: Option<String>,

    /// Use the WebSocket push channel instead of polling
    #[arg(long)]
    push: bool,

    /// Polling interval in milliseconds
    #[arg(long, default_value_t = 1000)]
    poll_interval_ms: u64,

    /// Rows per fetch (at most 1000)
    #[arg(long, default_value_t = MAX_PAGE_LIMIT)]
    limit: u32,

    /// Ring the terminal bell for messages from others
    #[arg(long)]
    notify: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Client state file (defaults to the user config directory)
    #[arg(long)]
    state_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Delete every message in the room on the server
    Nuke,
}

/// Startup and runtime errors.
#[derive(Debug, Error)]
enum CliError {
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("no config directory; pass --state-file")]
    NoStateDir,

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Terminal(#[from] TerminalError),
}

/// Print the invite link where it will not mix with the chat on stdout.
fn announce(location: &UrlLocation) -> io::Result<()> {
    let mut err = io::stderr().lock();
    writeln!(err, "Share this link to invite others (it contains the room key):")?;
    writeln!(err, "  {}", location.share_link())?;
    writeln!(err, "Type a message and press enter; {QUIT_COMMAND} leaves.")?;
    err.flush()
}

fn parse_url(url: &str) -> Result<Url, CliError> {
    Url::parse(url).map_err(|e| CliError::InvalidUrl { url: url.to_owned(), reason: e.to_string() })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    Ok(run(args).await?)
}

async fn run(args: Args) -> Result<(), CliError> {
    let env = SystemEnv::new();

    let state_path =
        args.state_file.clone().or_else(FileStorage::default_path).ok_or(CliError::NoStateDir)?;
    let mut storage = FileStorage::open(state_path)?;

    let link = args.link.as_deref().map(parse_url).transpose()?;
    let base_url = match (&args.server, &link) {
        (Some(server), _) => parse_url(server)?,
        (None, Some(link)) => UrlLocation::new(link.clone()).origin(),
        (None, None) => parse_url(DEVELOPMENT_URL)?,
    };
    let mut location = UrlLocation::new(link.unwrap_or_else(|| base_url.clone()));

    let room = resolve_room(&mut location, &mut storage, &env)?;
    let mut config = TransportConfig::new(base_url);
    config.strategy = if args.push { Strategy::Push } else { Strategy::Poll };
    config.poll_interval = Duration::from_millis(args.poll_interval_ms.max(1));
    config.page_limit = args.limit;

    if let Some(Command::Nuke) = args.command {
        HttpApi::new(&config)?.nuke_room(&room).await?;
        tracing::info!(room = %room, "room cleared");
        return Ok(());
    }

    let key = load_or_create_key(&mut location, &env);
    let nickname = resolve_nickname(&mut storage, args.nick.as_deref())?;
    tracing::info!(room = %room, nickname = %nickname, server = %config.base_url, "joining room");
    announce(&location)?;

    let session_config =
        SessionConfig { page_limit: config.effective_limit(), ..SessionConfig::default() };
    let session = SyncSession::open(env, room.clone(), key, session_config);
    let driver = TerminalDriver::start(&config, room, args.notify)?;
    Runtime::new(driver, session, nickname).run().await?;
    Ok(())
}
