use std::path::PathBuf;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use traffic_dashboard::{
    DashboardConfig, Error, build_draft, load_config, load_outcome, render_dashboard,
    render_overview,
};
use traffic_feed::{DataFeed, GrpcStore};

#[derive(Parser, Debug)]
#[command(name = "traffic-dashboard", version, about = "Traffic & checkpoint status dashboard")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, env = "TRAFFIC_DASHBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Store address, overriding the configuration file.
    #[arg(long, env = "TRAFFIC_STORE_ADDRESS")]
    store: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the latest updates once and print them.
    List(Selection),
    /// Print the updates and follow new ones until Ctrl-C.
    Watch(Selection),
    /// Print the map focus and location markers.
    Map(Selection),
    /// Publish a new update to the store.
    Publish(PublishArgs),
}

#[derive(Args, Debug)]
struct Selection {
    /// City or checkpoint to show updates for.
    #[arg(long)]
    location: Option<String>,
}

#[derive(Args, Debug)]
struct PublishArgs {
    #[arg(long)]
    message: String,
    #[arg(long = "city")]
    cities: Vec<String>,
    /// Route status as NAME=STATUS.
    #[arg(long = "route")]
    routes: Vec<String>,
    /// Checkpoint status as NAME=STATUS.
    #[arg(long = "checkpoint")]
    checkpoints: Vec<String>,
    #[arg(long = "incident")]
    incidents: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(store) = cli.store {
        config.store_address = store;
    }

    info!(store = %config.store_address, "connecting to traffic store");
    let store = GrpcStore::connect(config.store_address.as_str()).await?;

    match cli.command {
        Command::List(selection) => list(store, &config, selection.location.as_deref()).await?,
        Command::Watch(selection) => watch(store, &config, selection.location.as_deref()).await?,
        Command::Map(selection) => map(store, &config, selection.location.as_deref()).await?,
        Command::Publish(args) => {
            let draft = build_draft(
                args.message,
                args.cities,
                &args.routes,
                &args.checkpoints,
                args.incidents,
            )?;
            let update = store.publish(draft).await?;
            println!("Published update {}", update.id);
        }
    }

    Ok(())
}

async fn list(
    store: GrpcStore,
    config: &DashboardConfig,
    location: Option<&str>,
) -> Result<(), Error> {
    let feed = DataFeed::new(store);
    let _ = feed.load().await;

    let state = feed.snapshot();
    print!("{}", render_dashboard(&state, location, &config.keywords, Utc::now()));
    load_outcome(&state)
}

async fn map(
    store: GrpcStore,
    config: &DashboardConfig,
    location: Option<&str>,
) -> Result<(), Error> {
    let feed = DataFeed::new(store);
    let loaded = feed.load().await;
    let state = feed.snapshot();

    if loaded.is_err() {
        print!("{}", render_dashboard(&state, location, &config.keywords, Utc::now()));
        return load_outcome(&state);
    }

    let markers = config.locations.markers(state.updates(), &config.keywords);
    print!("{}", render_overview(config.locations.focus(location), &markers));
    Ok(())
}

async fn watch(
    store: GrpcStore,
    config: &DashboardConfig,
    location: Option<&str>,
) -> Result<(), Error> {
    let feed = DataFeed::new(store);
    let mut changes = feed.watch();

    if feed.load().await.is_err() {
        let state = feed.snapshot();
        print!("{}", render_dashboard(&state, location, &config.keywords, Utc::now()));
        return load_outcome(&state);
    }
    feed.subscribe().await?;

    loop {
        let state = changes.borrow_and_update().clone();
        println!("{}", render_dashboard(&state, location, &config.keywords, Utc::now()));

        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    warn!("feed state channel closed");
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, closing subscription");
                break;
            }
        }
    }

    feed.unsubscribe();
    Ok(())
}
