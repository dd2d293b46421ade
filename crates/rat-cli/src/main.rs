use clap::Parser;
use rat_llm::ClientFactory;
use rat_relay::Relay;

use rat_cli::{cli::Args, config::Config, logging::init_logging, repl::ChatRepl, terminal::TerminalSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = Config::load(&args)
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config.logging);

    tracing::info!(
        "Profile: {}",
        args.profile.as_deref().unwrap_or("default")
    );

    let reasoning_client = ClientFactory::create_chat_client(config.reasoning.provider_config()?)?;
    let answering_client = ClientFactory::create_chat_client(config.answering.provider_config()?)?;

    let relay = Relay::new(reasoning_client, answering_client, config.relay_config())?;

    let mut repl = ChatRepl::new(relay, TerminalSink::stdout());
    repl.banner();
    if config.relay.health_check {
        repl.check_endpoint().await;
    }
    repl.run().await
}
