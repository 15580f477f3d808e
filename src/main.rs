//! fridactl - manage the frida-server lifecycle on a rooted device.

use clap::Parser;

use fridactl::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
