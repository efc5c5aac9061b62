use std::{
    error::Error,
    fs::OpenOptions,
    io,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{
    EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt,
};

use zadanko::{
    AddUserError, AppState, CredentialStore, Password, PasswordHash, USER_ADDED_MSG, add_user,
    build_router, graceful_shutdown,
};

/// A small HTTP service for managing user accounts.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "ZADANKO_DB_PATH", default_value = "zadanko.db", global = true)]
    db_path: PathBuf,

    /// The bcrypt cost used when hashing new passwords.
    #[arg(
        long,
        env = "ZADANKO_HASH_COST",
        default_value_t = PasswordHash::DEFAULT_COST,
        value_parser = clap::value_parser!(u32).range(4..=31),
        global = true
    )]
    hash_cost: u32,

    #[command(flatten)]
    serve: ServeArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (the default when no command is given).
    Serve,

    /// Register a new user directly in the database.
    AddUser {
        /// The email the user logs in with.
        email: String,

        /// The user's password. You will be prompted for it if it is omitted.
        password: Option<String>,
    },
}

/// Options for serving the HTTP API.
#[derive(clap::Args, Debug)]
struct ServeArgs {
    /// The address to serve the API from.
    #[arg(
        long,
        env = "ZADANKO_HOST",
        default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST),
        global = true
    )]
    host: IpAddr,

    /// The port to serve the API from.
    #[arg(short, long, env = "ZADANKO_PORT", default_value_t = 8080, global = true)]
    port: u16,

    /// File path to write debug logs to.
    #[arg(long, env = "ZADANKO_LOG_PATH", default_value = "debug.log", global = true)]
    log_path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    let args = Args::parse();

    match args.command {
        Some(Command::AddUser { email, password }) => {
            run_add_user(&args.db_path, args.hash_cost, &email, password)
        }
        Some(Command::Serve) | None => serve(&args.db_path, args.hash_cost, args.serve).await,
    }
}

async fn serve(
    db_path: &Path,
    hash_cost: u32,
    serve_args: ServeArgs,
) -> Result<ExitCode, Box<dyn Error>> {
    setup_logging(&serve_args.log_path)?;

    let conn = Connection::open(db_path)?;
    let state = AppState::new(conn, hash_cost)?;
    tracing::info!("Opened database at {}", db_path.display());

    let addr = SocketAddr::new(serve_args.host, serve_args.port);

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state));

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;

    Ok(ExitCode::SUCCESS)
}

fn run_add_user(
    db_path: &Path,
    hash_cost: u32,
    email: &str,
    password: Option<String>,
) -> Result<ExitCode, Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(filter::LevelFilter::WARN)
        .init();

    let password = match password {
        Some(password) => Password::new(password),
        None => match prompt_for_password()? {
            Some(password) => password,
            None => return Ok(ExitCode::FAILURE),
        },
    };

    let store = match Connection::open(db_path)
        .map_err(zadanko::Error::from)
        .and_then(|connection| CredentialStore::open(connection, hash_cost))
    {
        Ok(store) => store,
        Err(error) => {
            tracing::error!("Could not open the database at {}: {error}", db_path.display());
            eprintln!("{}", AddUserError::Storage);
            return Ok(ExitCode::FAILURE);
        }
    };

    match add_user(&store, email, &password) {
        Ok(_) => {
            println!("{USER_ADDED_MSG}");
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            eprintln!("{error}");
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Ask for the password twice without echoing it.
///
/// Returns `None` if the passwords do not match.
fn prompt_for_password() -> Result<Option<Password>, io::Error> {
    let first_password = rpassword::prompt_password("Password: ")?;
    let second_password = rpassword::prompt_password("Enter the same password again: ")?;

    if first_password != second_password {
        eprintln!("Passwords must match, try again.");
        return Ok(None);
    }

    Ok(Some(Password::new(first_password)))
}

fn setup_logging(log_path: &Path) -> Result<(), io::Error> {
    let stdout_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(stdout_filter);

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let debug_log = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(log_file))
        .with_filter(filter::LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
        .init();

    Ok(())
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but the logging
        // middleware already logs every response.
        .on_failure(());

    router.layer(tracing_layer)
}
