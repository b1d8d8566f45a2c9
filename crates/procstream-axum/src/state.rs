//! Shared application state type.

use crate::bootstrap::AxumContext;
use std::sync::Arc;

/// Application state shared across all handlers.
///
/// An Arc-wrapped [`AxumContext`] holding the streaming gateway and the
/// process-control collaborator.
pub type AppState = Arc<AxumContext>;
