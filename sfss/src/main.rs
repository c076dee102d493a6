use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use sfss::Server;

/// SFSS: the simulated file system storage server.
#[derive(Parser, Debug)]
#[command(name = "sfss", about = "Serve SFP file and directory requests over UDP")]
struct Args {
    /// Directory that backs the simulated filesystem. Created if missing.
    root: PathBuf,

    /// UDP port to listen on.
    #[arg(long, default_value_t = 8888)]
    port: u16,

    /// Address to bind to.
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    std::fs::create_dir_all(&args.root)
        .with_context(|| format!("creating root directory {}", args.root.display()))?;

    let server = Server::bind((args.bind.as_str(), args.port), args.root)
        .context("binding SFSS UDP socket")?;
    server.run().context("SFSS server loop")?;
    Ok(())
}
