//! Built-in demonstration tools
//!
//! Small arithmetic tools served by the `serve` subcommand. Illustrative
//! registry content; the protocol layer does not depend on them.

use serde::Deserialize;
use serde_json::json;

use crate::mcp::registry::ToolRegistry;

/// Register the arithmetic demo tools.
pub fn arithmetic_tools(registry: &mut ToolRegistry) {
    registry.register(
        "add",
        "Add two integers and return their sum",
        json!({
            "type": "object",
            "properties": {
                "a": { "type": "integer", "description": "First addend" },
                "b": { "type": "integer", "description": "Second addend" }
            },
            "required": ["a", "b"]
        }),
        |args| {
            #[derive(Deserialize)]
            struct Args {
                a: i64,
                b: i64,
            }
            let args: Args =
                serde_json::from_value(args.clone()).map_err(|e| e.to_string())?;
            let sum = args.a.checked_add(args.b).ok_or("integer overflow")?;
            Ok(sum.to_string())
        },
    );

    registry.register(
        "add_three",
        "Add three to an integer",
        json!({
            "type": "object",
            "properties": {
                "a": { "type": "integer", "description": "The addend" }
            },
            "required": ["a"]
        }),
        |args| {
            #[derive(Deserialize)]
            struct Args {
                a: i64,
            }
            let args: Args =
                serde_json::from_value(args.clone()).map_err(|e| e.to_string())?;
            let sum = args.a.checked_add(3).ok_or("integer overflow")?;
            Ok(sum.to_string())
        },
    );
}
