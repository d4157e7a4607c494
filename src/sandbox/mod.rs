/*!
 * Sandbox Module
 * Isolated execution of units against an explicit capability surface
 */

pub mod capabilities;
pub mod executor;
pub mod script;
pub mod traits;

pub use capabilities::CapabilityContext;
pub use executor::{surface, ScriptExecutor};
pub use script::{ScriptError, ScriptResult, Value};
pub use traits::UnitExecutor;
