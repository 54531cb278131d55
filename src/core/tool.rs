use serde::{Deserialize, Serialize};

/// Declaration of a tool offered to the model.
///
/// The shape follows the function-calling convention shared by the hosted
/// providers: a name, a human readable description and a JSON schema for the
/// arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}
