//! Tools served over `tools/call`.

pub mod calculator;
pub mod weather;

use toolchat_core::registry::{FnHandler, ToolRegistry};

use crate::SetupError;

pub fn registry() -> Result<ToolRegistry, SetupError> {
    Ok(ToolRegistry::builder()
        .tool(calculator::declaration()?, FnHandler(calculator::handle))
        .tool(weather::declaration()?, FnHandler(weather::handle))
        .build()?)
}
