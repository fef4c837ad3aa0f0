pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;
pub use config::RunSettings;

pub use adapters::{ovh::OvhClient, prompt::ConsolePrompt};
pub use core::combinations::{generate_combinations, Combination};
pub use core::orchestrator::{CompletedOrder, OrderOrchestrator, OrderOutcome, OrderState};
pub use domain::model::OrderRequest;
pub use domain::ports::{OrderService, Prompt};
pub use utils::error::{OrderError, Result};
