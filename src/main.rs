// src/main.rs

use rundag::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("rundag error: {err}");
            std::process::exit(err.exit_code());
        }
    }
}

async fn run_main() -> rundag::errors::Result<i32> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
