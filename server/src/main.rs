use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tonic::transport::Server;
use tracing::info;
use tracing_subscriber::EnvFilter;

use traffic_store::{db, grpc, storage};

#[derive(Parser, Debug)]
#[command(name = "traffic-store", version, about = "Traffic update record store")]
struct Args {
    /// Address the gRPC service listens on.
    #[arg(long, env = "TRAFFIC_STORE_LISTEN", default_value = "127.0.0.1:50051")]
    listen: SocketAddr,

    /// sqlite database URL.
    #[arg(long, env = "TRAFFIC_DATABASE_URL", default_value = "sqlite::memory:")]
    database_url: String,

    /// Leave the schema alone (clients then see the "table not set up" state).
    #[arg(long)]
    no_schema: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let pool = if args.no_schema {
        db::connect(&args.database_url).await?
    } else {
        db::init_pool(&args.database_url).await?
    };
    let storage = Arc::new(storage::Storage::new(pool));
    let server = grpc::create_server(storage);

    info!(addr = %args.listen, database = %args.database_url, "traffic store listening");
    Server::builder().add_service(server).serve(args.listen).await?;

    Ok(())
}
