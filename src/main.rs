use anyhow::{Context, Result as AnyResult};
use clap::Parser;
use platform_namespace_client::{
    actions,
    cli::{Cli, Commands},
    config::process_env,
    consts::DEFAULT_LOG_FILTER,
};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", DEFAULT_LOG_FILTER);
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::debug!(?error, "Command failed");
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> AnyResult<()> {
    match cli.command {
        Commands::Create(args) => {
            let product_key = args.product_key.clone();
            actions::create(args, process_env, &mut std::io::stdout())
                .await
                .with_context(|| format!("Failed to create namespace for '{product_key}'"))?;
        }
    }

    Ok(())
}
