use anyhow::Result;
use recipe_chef::cli::{parse_args, run};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let cli = parse_args();

    let default_directive = if cli.verbose {
        "recipe_chef=debug"
    } else {
        "recipe_chef=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // Logs go to stderr so recipe output stays clean on stdout
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    info!(profile = %cli.profile_path.display(), "Starting recipe-chef");

    run(cli).await
}
