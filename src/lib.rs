//! Murmur — minimal multi-agent orchestration runtime.
//!
//! Drives a conversable agent (instructions + tools) through a multi-turn
//! loop against a pluggable chat backend, executing the tool calls the model
//! requests, feeding results back into the conversation, and handing control
//! off between agents when a tool returns a new one.
//!
//! # Quick Start
//!
//! ```no_run
//! use murmur::prelude::*;
//!
//! # async fn example() -> murmur::error::Result<()> {
//! let agent = Agent::new("Assistant", "gpt-4o")
//!     .with_instructions("You are a helpful agent.");
//!
//! let orchestrator = Orchestrator::new(ProviderKind::OpenAi)?;
//! let response = orchestrator
//!     .run(
//!         agent,
//!         vec![Message::user("Hi!")],
//!         ContextVariables::new(),
//!         RunOptions::default(),
//!     )
//!     .await?;
//! println!("{:?}", response.messages.last());
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod prelude;
pub mod provider;
pub mod tools;
pub mod types;
