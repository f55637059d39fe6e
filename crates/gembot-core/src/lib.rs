//! gembot-core: library behind the gembot chat widget.
//!
//! A thin wrapper around the hosted Gemini API with two independent flows:
//!
//! - [`config`] — Typed parameters read once from the environment
//! - [`provider`] — `TextModel` trait and the Gemini REST implementation
//! - [`history`] — Conversation transcript and the provider-shape adapter
//! - [`chat`] — Interactive exchange with the never-fails reply contract
//! - [`structured`] — Prompt template and strict three-field JSON coercion
//! - [`invoke`] — Lazily constructed flash/pro handles and dispatch
//!
//! # Quick Start
//!
//! ```no_run
//! use gembot_core::chat::ChatSession;
//! use gembot_core::config::Config;
//! use gembot_core::invoke::Invoker;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! // Read GOOGLE_API_KEY and the model parameters
//! let config = Config::from_env()?;
//!
//! // Construct the invoker once; handles are created on first use
//! let invoker = Invoker::new(config, reqwest::Client::new());
//!
//! // Flow A: interactive chat against the flash model
//! let mut session = ChatSession::new(invoker.fast_handle().await);
//! let reply = session.send("Hello!").await;
//! println!("{}", reply.display_text());
//!
//! // Flow B: structured extraction
//! let parsed = invoker
//!     .invoke_fast("You analyse customer messages.", "The order arrived broken.")
//!     .await?;
//! println!("sentiment: {}", parsed.sentiment);
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod config;
pub mod history;
pub mod invoke;
pub mod provider;
pub mod structured;
