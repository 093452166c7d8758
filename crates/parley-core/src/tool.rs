//! Tools owned by an assistant.

use serde::Serialize;

use crate::function::FunctionDefinition;

/// A capability an assistant exposes to the language model.
///
/// Only function tools exist today; the tagged representation leaves room
/// for other kinds without changing the wire shape.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Tool {
    Function { function: FunctionDefinition },
}

impl Tool {
    /// Wrap a function definition as a tool.
    pub fn function(function: FunctionDefinition) -> Self {
        Tool::Function { function }
    }

    /// The function definition behind this tool, if it is a function tool.
    pub fn as_function(&self) -> Option<&FunctionDefinition> {
        match self {
            Tool::Function { function } => Some(function),
        }
    }
}

impl From<FunctionDefinition> for Tool {
    fn from(function: FunctionDefinition) -> Self {
        Tool::function(function)
    }
}
