use clap::Parser;
use linkwatch::cli::{self, output, Cli};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    // wss probes need a process-wide crypto provider; ring is the only one compiled in.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    if let Err(e) = cli::run(cli).await {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
