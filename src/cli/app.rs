// ABOUTME: Main application orchestration for the autodevops CLI
// ABOUTME: Wires configuration, logging, definition store, handlers and commands together

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use super::commands;
use super::{Args, Commands, Config};
use crate::engine::WorkflowExecutor;
use crate::logging::{ExecutionLogger, JsonLinesSink};
use crate::store::DirectoryStore;
use crate::tasks::HandlerTable;

pub struct App {
    config: Config,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Install the tracing subscriber. Diagnostics go to stderr; stdout carries reports.
    pub fn init_logging(&self, verbose: bool, no_color: bool) -> Result<()> {
        let level = self.log_level(verbose);
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(!no_color)
            .with_target(false)
            .with_writer(std::io::stderr);

        let installed = match self.config.logging.format.as_str() {
            "compact" => builder.compact().try_init(),
            _ => builder.try_init(),
        };
        installed.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

        debug!("Logging initialized with level: {}", level);
        Ok(())
    }

    fn log_level(&self, verbose: bool) -> &str {
        if verbose {
            "debug"
        } else {
            &self.config.logging.level
        }
    }

    /// Build the executor described by the configuration
    pub fn build_executor(&self) -> Result<WorkflowExecutor> {
        let store = Arc::new(DirectoryStore::new(&self.config.workflows_dir));
        let handlers = HandlerTable::with_defaults(&self.config.handlers)?;

        let logger = match &self.config.log_file {
            Some(path) => {
                debug!("Execution log: {}", path.display());
                ExecutionLogger::new(Arc::new(JsonLinesSink::new(path)))
            }
            None => ExecutionLogger::disabled(),
        };

        Ok(WorkflowExecutor::new(store, handlers).with_logger(logger))
    }

    /// Run the application with parsed arguments
    pub async fn run(&mut self, args: Args) -> Result<()> {
        self.init_logging(args.verbose, args.no_color)?;

        info!("Starting autodevops v{}", env!("CARGO_PKG_VERSION"));
        debug!("Configuration loaded from: {:?}", args.config);

        let executor = self.build_executor()?;

        match args.command {
            Commands::Run {
                workflow_id,
                inputs,
                output,
            } => {
                let inputs = Args::parse_inputs(&inputs)?;
                commands::run_workflow(&executor, &workflow_id, &inputs, output).await
            }

            Commands::Named {
                name,
                inputs,
                output,
            } => {
                let inputs = Args::parse_inputs(&inputs)?;
                commands::run_named_workflow(&executor, &name, &inputs, output).await
            }

            Commands::Validate { workflow_id } => {
                commands::validate_workflow(&executor, &workflow_id).await
            }

            Commands::List => commands::list_workflows(&executor).await,
        }
    }

    /// Create application and parse arguments from the command line
    pub fn from_args() -> Result<(Self, Args)> {
        let args = Args::parse_args();
        let config = Config::load(args.config.clone())?;
        Ok((Self::new(config), args))
    }
}
