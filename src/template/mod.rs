// ABOUTME: Template module resolving task parameters before dispatch
// ABOUTME: Provides the resolution snapshot, Handlebars engine, helpers and reference scanning

pub mod context;
pub mod engine;
pub mod error;
pub mod helpers;
pub mod references;

pub use context::{Inputs, TemplateContext, WorkflowInfo};
pub use engine::TemplateEngine;
pub use error::{Result, TemplateError};
pub use references::{extract_references, TemplateReference};
