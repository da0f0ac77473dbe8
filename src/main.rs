//! argo-agent CLI entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use argo_agent::agent::{AgentSession, LlmClient, ProviderRegistry};
use argo_agent::config::{self, Config, ToolMode};
use argo_agent::tools::ToolRegistry;
use argo_agent::ui;

#[derive(Parser)]
#[command(name = "argo-agent")]
#[command(about = "🌊 Ask questions about ARGO float data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Ask a single question
    Ask {
        /// Question to send to the agent
        #[arg(short, long)]
        message: String,

        /// Where tool calls are answered (remote or simulation)
        #[arg(long)]
        tools: Option<ToolMode>,

        /// Print each tool call and its outcome
        #[arg(short, long)]
        verbose: bool,
    },

    /// Interactive conversation
    Chat {
        /// Where tool calls are answered (remote or simulation)
        #[arg(long)]
        tools: Option<ToolMode>,

        /// Print each tool call and its outcome
        #[arg(short, long)]
        verbose: bool,
    },

    /// List available tools
    Tools,

    /// Show configuration status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = config::load_file_or_default(&config::config_path())?;
    let env_overrides = config.apply_env();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // init, tools and status still work with a broken environment
    if let Err(e) = env_overrides {
        match cli.command {
            Commands::Init { .. } | Commands::Tools => {}
            Commands::Status => ui::print_warning(&format!("Ignoring environment overrides: {e}")),
            _ => return Err(e.into()),
        }
    }

    match cli.command {
        Commands::Init { force } => {
            let path = config::config_path();
            if path.exists() && !force {
                ui::print_warning(&format!("Config already exists at {:?} (use --force)", path));
                return Ok(());
            }
            config::save(&Config::default())?;
            ui::print_success(&format!("Wrote {:?}", path));
            ui::print_step("Set OPENAI_API_KEY (or edit the file), then run: argo-agent ask -m \"...\"");
        }

        Commands::Ask { message, tools, verbose } => {
            if let Some(mode) = tools {
                config.tool_mode = mode;
            }
            let mut session = build_session(&config)?;

            let cancel = CancellationToken::new();
            let trigger = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    trigger.cancel();
                }
            });

            let turn = session.run_turn_cancellable(&message, &cancel).await;
            match turn {
                Ok(turn) => {
                    if verbose {
                        ui::print_tool_trace(&turn.calls, &turn.results);
                    }
                    println!("\n{}", turn.answer);
                }
                Err(e) => {
                    ui::print_error(&format!("I encountered an error while processing your query: {e}"));
                }
            }
        }

        Commands::Chat { tools, verbose } => {
            if let Some(mode) = tools {
                config.tool_mode = mode;
            }
            let mut session = build_session(&config)?;
            ui::print_header(&config.model, &config.provider, mode_name(config.tool_mode));
            run_interactive(&mut session, verbose).await?;
        }

        Commands::Tools => {
            for tool in ToolRegistry::simulation().definitions() {
                ui::print_tool_definition(&tool);
            }
        }

        Commands::Status => {
            println!("🌊 argo-agent status\n");
            println!("Config: {:?}", config::config_path());
            println!("Provider: {}", config.provider);
            println!("Model: {}", config.model);
            println!("API key: {}", if config.api_key().is_empty() { "not set" } else { "✓" });
            println!("Tools: {}", mode_name(config.tool_mode));
            if config.tool_mode == ToolMode::Remote {
                println!("Tool server: {}{}", config.mcp.server_url, config.mcp.endpoint_path);
                match config.mcp.retry_policy() {
                    Ok(policy) => println!(
                        "Retries: {} attempts, first backoff {:?}, timeout {:?}",
                        policy.max_attempts(),
                        policy.base_delay(),
                        policy.timeout()
                    ),
                    Err(e) => ui::print_warning(&e.to_string()),
                }
            }
        }
    }

    Ok(())
}

fn build_session(config: &Config) -> Result<AgentSession<Box<dyn LlmClient>>> {
    config.validate()?;
    let client = ProviderRegistry::create(config)?;
    Ok(AgentSession::from_config(client, config)?)
}

fn mode_name(mode: ToolMode) -> &'static str {
    match mode {
        ToolMode::Remote => "remote",
        ToolMode::Simulation => "simulation",
    }
}

async fn run_interactive(session: &mut AgentSession<Box<dyn LlmClient>>, verbose: bool) -> Result<()> {
    use std::io::{self, BufRead, Write};

    let stdin = io::stdin();
    loop {
        print!("\x1b[1;34mYou\x1b[0m: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "exit" | "quit") {
            println!("👋 Bye!");
            break;
        }

        ui::print_thinking("Thinking");
        match session.run_turn(input).await {
            Ok(turn) => {
                if verbose {
                    ui::print_tool_trace(&turn.calls, &turn.results);
                }
                println!("\n\x1b[1;32mAgent\x1b[0m: {}\n", turn.answer);
            }
            Err(e) => println!("\n\x1b[1;31mError\x1b[0m: {}\n", e),
        }
    }

    Ok(())
}
