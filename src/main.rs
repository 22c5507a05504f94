use std::process::ExitCode;

use clap::Parser;

use cfmeta_lib::commands::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    cfmeta_lib::init_tracing();

    let cli = Cli::parse();
    match cli.run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("cfmeta error: {}", err);
            ExitCode::FAILURE
        }
    }
}
