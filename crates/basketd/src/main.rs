use basketd::basket::{generate_token, TokenHash};
use basketd::registry::create_backend;
use basketd::{AppState, BasketServer, ServerConfig, ServiceMode};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "basketd", version, about = "HTTP request capture service")]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:55555", env = "BASKETD_LISTEN")]
    listen: SocketAddr,

    /// Path prefix under which baskets live
    #[arg(long, default_value = "", env = "BASKETD_PREFIX")]
    prefix: String,

    /// Default page size for listings
    #[arg(long, default_value_t = 20, env = "BASKETD_PAGE_SIZE")]
    page_size: usize,

    /// Capacity of baskets created without an explicit one
    #[arg(long, default_value_t = 200, env = "BASKETD_INIT_CAPACITY")]
    init_capacity: i64,

    /// Upper bound for configurable basket capacity
    #[arg(long, default_value_t = 2000, env = "BASKETD_MAX_CAPACITY")]
    max_capacity: i64,

    /// Captured bodies are truncated to this many bytes
    #[arg(long, default_value_t = 1024 * 1024, env = "BASKETD_MAX_BODY_SIZE")]
    max_body_size: usize,

    /// Who may create baskets
    #[arg(long, value_enum, default_value = "public", env = "BASKETD_MODE")]
    mode: ServiceMode,

    /// Master token; generated and logged when not supplied
    #[arg(long, env = "BASKETD_MASTER_TOKEN")]
    master_token: Option<String>,

    /// Timeout for forwarded calls, in seconds
    #[arg(long, default_value_t = 60, env = "BASKETD_FORWARD_TIMEOUT")]
    forward_timeout: u64,

    /// Storage backend
    #[arg(long, default_value = "memory", env = "BASKETD_BACKEND")]
    backend: String,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let config = ServerConfig {
        listen: args.listen,
        prefix: ServerConfig::normalize_prefix(&args.prefix),
        page_size: args.page_size,
        init_capacity: args.init_capacity,
        max_capacity: args.max_capacity,
        max_body_size: args.max_body_size,
        mode: args.mode,
        forward_timeout: Duration::from_secs(args.forward_timeout),
        backend: args.backend,
    };

    let master = match &args.master_token {
        Some(token) => TokenHash::of(token),
        None => {
            let token = generate_token();
            // the only time the generated master token is visible
            info!("generated master token: {}", token);
            TokenHash::of(&token)
        }
    };

    let registry = match create_backend(&config.backend, config.max_capacity) {
        Ok(registry) => registry,
        Err(e) => {
            error!("failed to initialize storage backend: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "starting basketd: mode={:?}, backend={}, prefix={:?}",
        config.mode, config.backend, config.prefix
    );

    let state = Arc::new(AppState::new(config, registry, master));

    tokio::select! {
        result = BasketServer::run(state) => {
            if let Err(e) = result {
                error!("server failed: {}", e);
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
        }
    }
}
