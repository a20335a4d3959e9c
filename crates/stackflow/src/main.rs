mod catalog;
mod commands;
mod utils;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "stackflow")]
#[command(about = "Declarative CloudFormation stacks, deployed and watched to completion", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Format {
    Json,
    Yaml,
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in stacks
    Stacks,
    /// Print the rendered template of a stack
    Render {
        /// Built-in stack (see `stackflow stacks`)
        stack: String,
        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: Format,
        /// Stack name to render for (defaults to the built-in name)
        #[arg(short = 'n', long)]
        stack_name: Option<String>,
    },
    /// Check a stack's references and render it
    Validate {
        /// Built-in stack (see `stackflow stacks`)
        stack: String,
    },
    /// Create or update a stack and wait until it settles
    Deploy {
        /// Built-in stack (see `stackflow stacks`)
        stack: String,
        /// Remote stack name (defaults to the built-in name)
        #[arg(short = 'n', long)]
        stack_name: Option<String>,
        /// Parameter value, KEY=VALUE (repeatable)
        #[arg(short, long = "param", value_name = "KEY=VALUE")]
        param: Vec<String>,
        /// AWS region
        #[arg(long, env = "AWS_REGION")]
        region: Option<String>,
        /// AWS named profile
        #[arg(long, env = "AWS_PROFILE")]
        profile: Option<String>,
        /// Seconds between event polls
        #[arg(long, value_name = "SECS")]
        poll_interval: Option<u64>,
        /// Give up waiting after this many seconds
        #[arg(long, value_name = "SECS")]
        max_wait: Option<u64>,
        /// Skip the confirmation and deploy
        #[arg(short, long)]
        yes: bool,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    utils::init_tracing(cli.verbose);

    match cli.command {
        Commands::Stacks => commands::stacks::handle(),
        Commands::Render {
            stack,
            format,
            stack_name,
        } => commands::render::handle(&stack, stack_name.as_deref(), format)?,
        Commands::Validate { stack } => commands::validate::handle(&stack)?,
        Commands::Deploy {
            stack,
            stack_name,
            param,
            region,
            profile,
            poll_interval,
            max_wait,
            yes,
        } => {
            let options = commands::deploy::DeployOptions {
                stack_name,
                params: param,
                region,
                profile,
                poll_interval,
                max_wait,
                yes,
            };
            commands::deploy::handle(&stack, options).await?;
        }
        Commands::Version => {
            println!("stackflow {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
