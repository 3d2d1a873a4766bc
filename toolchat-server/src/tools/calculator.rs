//! Four-function calculator.

use toolchat_core::registry::{DomainError, ToolOutput};
use toolchat_core::schema::{ObjectSchema, PropertySchema, SchemaError, ToolDeclaration};
use toolchat_core::validation::ToolArguments;

pub const NAME: &str = "calculator";

const OPERATIONS: [&str; 4] = ["add", "subtract", "multiply", "divide"];

pub fn declaration() -> Result<ToolDeclaration, SchemaError> {
    let schema = ObjectSchema::new(
        [
            (
                "operation",
                PropertySchema::string("Arithmetic operation to perform").with_enum(OPERATIONS),
            ),
            ("a", PropertySchema::number("First operand")),
            ("b", PropertySchema::number("Second operand")),
        ],
        ["operation", "a", "b"],
    )?;
    Ok(ToolDeclaration::new(
        NAME,
        "Performs basic arithmetic (add, subtract, multiply, divide) on two numbers",
        schema,
    ))
}

/// Arguments arrive validated, so the operation is one of [`OPERATIONS`] and both operands
/// are numbers.
pub fn handle(arguments: ToolArguments) -> Result<ToolOutput, DomainError> {
    let operation = arguments.str("operation").unwrap_or_default();
    let a = arguments.number("a").unwrap_or_default();
    let b = arguments.number("b").unwrap_or_default();

    let value = match operation {
        "add" => a + b,
        "subtract" => a - b,
        "multiply" => a * b,
        "divide" => {
            if b == 0.0 {
                return Err(DomainError::new("Division by zero is not allowed"));
            }
            a / b
        }
        other => return Err(DomainError::new(format!("Unsupported operation: {other}"))),
    };

    if !value.is_finite() {
        return Err(DomainError::new("Result is too large to represent"));
    }
    Ok(ToolOutput::text(format_number(value)))
}

/// Integral values print without a fractional part.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
