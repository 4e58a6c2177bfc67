#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

use bridge::cli::run_cli;
use bridge::config::ProcessEnv;
use bridge::ScriptChainClient;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (stdout, exit_code) = run_cli(&args, &ProcessEnv, &ScriptChainClient::new()).await;
    println!("{stdout}");
    std::process::exit(exit_code);
}
