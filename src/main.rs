use clap::Parser;
use color_eyre::Result;
use logtick::{
    init_errors,
    init_logging,
    run_receiver,
    AgentConfig,
    App,
    Args,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_errors()?;
    let args = Args::parse();

    if args.server {
        init_logging("info", None)?;
        return run_receiver(args.server_address).await;
    }

    let bootstrap = AgentConfig::bootstrap(&args.config)?;
    if bootstrap.created {
        println!("Created configuration file {}", args.config.display());
    }
    if let Some(agent_id) = &bootstrap.generated_agent_id {
        println!("Generated agent id {agent_id}");
    }

    let config = AgentConfig::load(&args.config, args.clone())?;
    if args.init {
        println!("Configuration ready at {}", args.config.display());
        return Ok(());
    }

    App::new(config).run().await
}
