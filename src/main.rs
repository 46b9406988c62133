mod cerebras_client;
mod cli;
mod config;

use std::io;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use eyre::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use crate::cerebras_client::CerebrasClient;
use crate::cli::chat::responder::ChatResponder;
use crate::cli::chat::{ChatContext, DEFAULT_CONTEXT_ID};
use crate::config::Config;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    chat: ChatArgs,
}

impl Cli {
    /// Resolve the options for the chat session. `--verbose` counts whether it
    /// is given before or after the `chat` subcommand.
    fn into_chat_args(self) -> ChatArgs {
        match self.command {
            Some(Commands::Chat(mut args)) => {
                args.verbose |= self.chat.verbose;
                args
            }
            // Default to chat if no subcommand is provided
            None => self.chat,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start a chat session
    Chat(ChatArgs),
}

#[derive(Args)]
struct ChatArgs {
    /// Input to send to the chat; prints the reply and exits
    #[arg(short, long)]
    input: Option<String>,

    /// Conversation to use
    #[arg(short, long, default_value = DEFAULT_CONTEXT_ID)]
    context: String,

    /// Model to request completions from
    #[arg(short, long)]
    model: Option<String>,

    /// Sampling temperature
    #[arg(short, long)]
    temperature: Option<f32>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv().ok();

    let args = Cli::parse().into_chat_args();

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("Starting Cerebras Chat CLI");

    let config = match Config::from_env().and_then(|c| c.with_overrides(args.model, args.temperature)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to initialize Cerebras client: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    info!(model = %config.model, base_url = %config.base_url, "Using completion endpoint");

    let client = CerebrasClient::new(&config);
    let responder = ChatResponder::new(client, config.model.clone(), config.temperature);

    let interactive = args.input.is_none();
    let mut chat_context = ChatContext::new(
        Box::new(io::stdout()),
        args.input,
        interactive,
        args.context,
        responder,
    );
    chat_context.run().await
}
