//! Server-side tool registry
//!
//! Maps tool names to handlers and validates arguments against the
//! declared input schema before dispatch.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::RegistryError;
use crate::mcp::types::{CallToolResult, ToolDescriptor};

/// A tool handler: arguments in, text (or a failure message) out.
///
/// Handlers run synchronously; a returned `Err` becomes a result with
/// `isError = true` on the wire, not a protocol error.
pub type ToolHandlerFn = Box<dyn Fn(&Value) -> std::result::Result<String, String> + Send + Sync>;

struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: ToolHandlerFn,
}

/// Registry of callable tools
#[derive(Default)]
pub struct ToolRegistry {
    // BTreeMap keeps listing order deterministic.
    tools: BTreeMap<String, RegisteredTool>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Panics if the name is already taken; duplicate
    /// names would make by-name dispatch ambiguous.
    pub fn register<F>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        handler: F,
    ) where
        F: Fn(&Value) -> std::result::Result<String, String> + Send + Sync + 'static,
    {
        let name = name.into();
        let registered = RegisteredTool {
            descriptor: ToolDescriptor {
                name: name.clone(),
                description: Some(description.into()),
                input_schema,
            },
            handler: Box::new(handler),
        };
        let previous = self.tools.insert(name.clone(), registered);
        assert!(previous.is_none(), "duplicate tool registration: {}", name);
    }

    /// All registered tool descriptors, sorted by name. Idempotent and
    /// side-effect free.
    pub fn list(&self) -> Vec<ToolDescriptor> {
        self.tools.values().map(|t| t.descriptor.clone()).collect()
    }

    /// Look up `name` and run its handler with `arguments`.
    ///
    /// Fails with `UnknownTool` for an unregistered name and
    /// `InvalidArguments` when the arguments do not satisfy the declared
    /// schema. A handler failure is wrapped as an `isError` result.
    pub fn invoke(
        &self,
        name: &str,
        arguments: &Value,
    ) -> std::result::Result<CallToolResult, RegistryError> {
        let tool = self.tools.get(name).ok_or_else(|| RegistryError::UnknownTool {
            name: name.to_string(),
        })?;

        validate_arguments(&tool.descriptor.input_schema, arguments)?;

        Ok(match (tool.handler)(arguments) {
            Ok(text) => CallToolResult::text(text),
            Err(message) => CallToolResult::error(message),
        })
    }
}

/// Check `arguments` against an input schema: must be an object, must carry
/// every `required` property, and present properties must match a declared
/// primitive `type`. Nested schemas are not descended into.
fn validate_arguments(schema: &Value, arguments: &Value) -> std::result::Result<(), RegistryError> {
    let args = arguments.as_object().ok_or_else(|| RegistryError::InvalidArguments {
        message: "arguments must be a JSON object".to_string(),
    })?;

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for field in required.iter().filter_map(Value::as_str) {
            if !args.contains_key(field) {
                return Err(RegistryError::InvalidArguments {
                    message: format!("missing required field: {}", field),
                });
            }
        }
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };

    for (key, value) in args {
        let Some(declared) = properties.get(key).and_then(|p| p.get("type")).and_then(Value::as_str)
        else {
            continue;
        };
        let ok = match declared {
            "integer" => value.as_i64().is_some() || value.as_u64().is_some(),
            "number" => value.is_number(),
            "string" => value.is_string(),
            "boolean" => value.is_boolean(),
            "object" => value.is_object(),
            "array" => value.is_array(),
            _ => true,
        };
        if !ok {
            return Err(RegistryError::InvalidArguments {
                message: format!("field '{}' must be of type {}", key, declared),
            });
        }
    }

    Ok(())
}
