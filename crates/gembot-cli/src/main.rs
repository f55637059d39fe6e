//! gembot CLI — terminal chat, structured extraction, and the widget server.
//!
//! Usage:
//!   gembot chat             — Interactive chat session against the flash model
//!   gembot extract          — One structured extraction, printed as JSON
//!   gembot serve            — Serve the browser chat widget
//!   gembot status           — Show configuration status

mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::sync::Arc;

use gembot_core::chat::ChatSession;
use gembot_core::config::{Config, ConfigError, API_KEY_VAR};
use gembot_core::invoke::Invoker;

#[derive(Parser)]
#[command(
    name = "gembot",
    version,
    about = "A thin Gemini chat-widget wrapper",
    long_about = "gembot — chat with Gemini from the terminal or a browser widget,\nand coerce model replies into a fixed summary/sentiment/response record."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Use the capable (pro) model instead of flash
        #[arg(long)]
        pro: bool,
    },

    /// Run one structured extraction and print the result as JSON
    Extract {
        /// System instructions for the model
        #[arg(short, long)]
        system: String,

        /// Use the capable (pro) model instead of flash
        #[arg(long)]
        pro: bool,

        /// The user prompt to analyse
        prompt: String,
    },

    /// Serve the browser chat widget
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(long, default_value_t = 7861)]
        port: u16,
    },

    /// Show configuration status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Chat { pro }) => cmd_chat(pro).await?,
        Some(Commands::Extract { system, pro, prompt }) => {
            cmd_extract(&system, pro, &prompt).await?
        }
        Some(Commands::Serve { host, port }) => cmd_serve(&host, port).await?,
        Some(Commands::Status) => cmd_status()?,
        None => cmd_chat(false).await?,
    }

    Ok(())
}

// ── Shared Setup ────────────────────────────────────────────────────

/// Load configuration or abort with a startup error.
///
/// A missing API key must stop the process before any request can be
/// attempted.
fn load_config() -> Result<Config> {
    Ok(Config::from_env()?)
}

fn build_invoker(config: Config) -> Invoker {
    Invoker::new(config, reqwest::Client::new())
}

// ── Chat Command ────────────────────────────────────────────────────

async fn cmd_chat(pro: bool) -> Result<()> {
    let config = load_config()?;
    let model_id = if pro {
        config.pro.id.clone()
    } else {
        config.flash.id.clone()
    };
    let invoker = build_invoker(config);
    let handle = if pro {
        invoker.capable_handle().await
    } else {
        invoker.fast_handle().await
    };
    let mut session = ChatSession::new(handle);

    println!();
    println!("  gembot v{}", env!("CARGO_PKG_VERSION"));
    println!("  Model: {model_id}");
    println!();
    println!("  Type your message, /clear to reset, /quit to exit.");
    println!("  ─────────────────────────────────────");
    println!();

    let stdin = io::stdin();
    loop {
        print!("  \x1b[36m>\x1b[0m ");
        io::stdout().flush()?;

        let mut input = String::new();
        if stdin.read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        match input {
            "/quit" | "/exit" | "/q" => {
                println!("  Goodbye!");
                break;
            }
            "/clear" => {
                session.reset();
                println!("  Transcript cleared.");
                continue;
            }
            _ => {}
        }

        println!();
        let reply = session.send(input).await;
        if reply.is_failure() {
            eprintln!("  \x1b[31m{}\x1b[0m\n", reply.display_text());
        } else {
            println!("  \x1b[32m{}\x1b[0m\n", reply.display_text());
        }
    }

    Ok(())
}

// ── Extract Command ─────────────────────────────────────────────────

async fn cmd_extract(system: &str, pro: bool, prompt: &str) -> Result<()> {
    let config = load_config()?;
    let invoker = build_invoker(config);

    let reply = if pro {
        invoker.invoke_capable(system, prompt).await?
    } else {
        invoker.invoke_fast(system, prompt).await?
    };

    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}

// ── Serve Command ───────────────────────────────────────────────────

async fn cmd_serve(host: &str, port: u16) -> Result<()> {
    let config = load_config()?;
    let invoker = Arc::new(build_invoker(config));
    server::run(invoker, host, port).await
}

// ── Status Command ──────────────────────────────────────────────────

fn cmd_status() -> Result<()> {
    println!();
    println!("  gembot status");
    println!("  ─────────────────────────────────────");

    match Config::from_env() {
        Ok(config) => {
            println!("  API key:     ✅ {API_KEY_VAR} set ({})", config.masked_key());
            println!("  Fast model:  {}", config.flash.id);
            println!("  Capable:     {}", config.pro.id);
            println!(
                "  Sampling:    temperature {} | max output tokens {}",
                config.flash.temperature, config.flash.max_output_tokens
            );
        }
        Err(e @ ConfigError::MissingApiKey) => {
            println!("  API key:     ❌ {e}");
        }
        Err(e) => {
            println!("  Config:      ❌ {e}");
        }
    }

    println!();
    Ok(())
}
