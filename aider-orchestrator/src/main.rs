use aider_orchestrator::orchestrator::{run_workflow, Cli};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // API keys may live in a local .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    run_workflow(cli).await
}
