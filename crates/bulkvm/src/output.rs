//! Output formatting: json, yaml, and table rendering

use anyhow::Result;
use comfy_table::Table;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, clap::ValueEnum, Default)]
pub enum OutputFormat {
    /// Table for humans, unless the data has no tabular shape
    #[default]
    Auto,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Human-readable table format
    Table,
}

pub fn print_output<T: Serialize>(data: T, format: OutputFormat) -> Result<()> {
    let json_value = serde_json::to_value(data)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json_value)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(&json_value)?);
        }
        OutputFormat::Auto | OutputFormat::Table => {
            print_as_table(&json_value)?;
        }
    }

    Ok(())
}

fn print_as_table(value: &Value) -> Result<()> {
    match value {
        Value::Array(arr) if !arr.is_empty() => {
            let mut table = Table::new();

            if let Value::Object(first) = &arr[0] {
                let headers: Vec<String> = first.keys().cloned().collect();
                table.set_header(&headers);

                for item in arr {
                    if let Value::Object(obj) = item {
                        let row: Vec<String> = headers
                            .iter()
                            .map(|h| format_value(obj.get(h).unwrap_or(&Value::Null)))
                            .collect();
                        table.add_row(row);
                    }
                }
            } else {
                table.set_header(vec!["Value"]);
                for item in arr {
                    table.add_row(vec![format_value(item)]);
                }
            }

            println!("{table}");
        }
        Value::Object(obj) => {
            let mut table = Table::new();
            table.set_header(vec!["Key", "Value"]);
            for (key, val) in obj {
                table.add_row(vec![key.clone(), format_value(val)]);
            }
            println!("{table}");
        }
        Value::Array(_) => {
            println!("(no results)");
        }
        other => {
            println!("{}", format_value(other));
        }
    }

    Ok(())
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        // Nested structures are rendered compactly inside a cell.
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn format_value_scalars() {
        assert_eq!(format_value(&json!(null)), "");
        assert_eq!(format_value(&json!("text")), "text");
        assert_eq!(format_value(&json!(42)), "42");
        assert_eq!(format_value(&json!(true)), "true");
    }

    #[test]
    fn format_value_nested_is_compact_json() {
        assert_eq!(format_value(&json!({"a": 1})), "{\"a\":1}");
        assert_eq!(format_value(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn print_output_handles_every_shape() {
        assert!(print_output(json!([{"name": "vm-1"}]), OutputFormat::Table).is_ok());
        assert!(print_output(json!({"key": "value"}), OutputFormat::Json).is_ok());
        assert!(print_output(json!([]), OutputFormat::Auto).is_ok());
        assert!(print_output(json!("scalar"), OutputFormat::Yaml).is_ok());
    }
}
