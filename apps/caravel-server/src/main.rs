use std::net::SocketAddr;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use caravel_runtime::{Credentials, Runtime};
use caravel_server::run_server;

#[derive(Debug, Parser)]
#[command(name = "caravel-server", about = "Task orchestration engine HTTP server")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let credentials = Credentials::from_env()?;
    let runtime = Runtime::from_credentials(credentials)?;
    run_server(runtime, args.listen).await
}
