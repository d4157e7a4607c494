/*!
 * Sandbox Traits
 * Execution abstraction the loader runs units through
 */

use super::capabilities::CapabilityContext;
use super::script::Value;
use crate::core::LoaderResult;
use std::path::Path;

/// Runs one unit's source against its capability context
///
/// Every call gets a fresh global scope; nothing leaks between executions
/// except values reachable from the context itself.
pub trait UnitExecutor: Send + Sync {
    /// Execute `source` and return its export value
    fn execute(
        &self,
        source: &str,
        context: CapabilityContext,
        source_name: &Path,
    ) -> LoaderResult<Value>;
}
