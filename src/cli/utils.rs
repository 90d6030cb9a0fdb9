use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Print a success message, merging `data` into the JSON object when asked for JSON.
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message,
            });
            if let (Some(Value::Object(fields)), Some(target)) = (data, response.as_object_mut()) {
                target.extend(fields);
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}
