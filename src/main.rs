// src/main.rs

use std::process::ExitCode;

use pipework::logging::{self, LogOptions};
use pipework::{cli, run};

#[tokio::main]
async fn main() -> ExitCode {
    match run_main().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("pipework error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

async fn run_main() -> anyhow::Result<ExitCode> {
    let args = cli::parse();
    let options = LogOptions::from_env(args.log_level).with_log_file(args.log_file.clone());
    logging::init_logging(&options)?;
    run(args, options).await
}
