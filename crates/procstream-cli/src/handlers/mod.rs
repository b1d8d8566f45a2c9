//! Command handlers.
//!
//! Handlers follow the canonical pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<()>`
//! - Thin wrappers that call the context and format terminal output

pub mod list;
pub mod metrics;
pub mod search;
pub mod serve;
