// ABOUTME: Command line argument definitions and parsing using Clap
// ABOUTME: Defines the CLI structure, subcommands and key=value input parsing

use clap::{Parser, Subcommand};
use serde_json::Value as JsonValue;
use std::path::PathBuf;

use crate::template::Inputs;

#[derive(Parser)]
#[command(name = "autodevops")]
#[command(about = "Run AutoDevOps workflows: mail, language-model, GitHub and HTTP tasks in sequence")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Path to configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a workflow from the workflows directory
    Run {
        #[arg(help = "Workflow id (file name without extension)")]
        workflow_id: String,

        #[arg(short = 'i', long = "input", help = "Workflow input (key=value)")]
        inputs: Vec<String>,

        #[arg(short, long, help = "Write the execution report to this file")]
        output: Option<PathBuf>,
    },

    /// Execute a built-in named workflow
    Named {
        #[arg(help = "Workflow name, e.g. trout")]
        name: String,

        #[arg(short = 'i', long = "input", help = "Workflow input (key=value)")]
        inputs: Vec<String>,

        #[arg(short, long, help = "Write the execution report to this file")]
        output: Option<PathBuf>,
    },

    /// Load and validate a workflow without executing it
    Validate {
        #[arg(help = "Workflow id (file name without extension)")]
        workflow_id: String,
    },

    /// List available workflows
    List,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parse inputs from key=value format.
    ///
    /// Values that parse as a JSON array or object are passed through as
    /// JSON; everything else is kept as a string.
    pub fn parse_inputs(inputs: &[String]) -> anyhow::Result<Inputs> {
        let mut parsed = Inputs::new();

        for input in inputs {
            let Some((key, value)) = input.split_once('=') else {
                return Err(anyhow::anyhow!(
                    "Invalid input format '{}'. Expected 'key=value'",
                    input
                ));
            };

            let value = match serde_json::from_str::<JsonValue>(value) {
                Ok(json @ (JsonValue::Array(_) | JsonValue::Object(_))) => json,
                _ => JsonValue::String(value.to_string()),
            };
            parsed.insert(key.trim().to_string(), value);
        }

        Ok(parsed)
    }
}
