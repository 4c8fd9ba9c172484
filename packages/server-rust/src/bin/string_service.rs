//! `string-service` binary.

use std::process::ExitCode;

use clap::Parser;
use strsvc_server::network::shutdown_signal;
use strsvc_server::{init_tracing, run, StringServiceArgs};

#[tokio::main]
async fn main() -> ExitCode {
    let args = StringServiceArgs::parse();
    if let Err(e) = init_tracing(args.log_format) {
        eprintln!("{e:#}");
        return ExitCode::from(1);
    }

    match run(args, shutdown_signal()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "string service exiting");
            ExitCode::from(e.exit_code())
        }
    }
}
