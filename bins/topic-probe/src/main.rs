mod cmd;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cmd::config::{Effective, ProbeArgs};
use cmd::error::ProbeError;

#[derive(Parser)]
#[command(name = "topic-probe", about = "Write records to a topic and read them back")]
struct Cli {
    #[command(flatten)]
    args: ProbeArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match probe(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "probe failed");
            ExitCode::FAILURE
        }
    }
}

async fn probe(cli: Cli) -> Result<(), ProbeError> {
    let eff = Effective::new(&cli.args)?;
    cmd::probe::run(&eff).await
}
