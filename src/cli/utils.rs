use serde::Serialize;
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::client::{CollectionHook, EntityHook, TransportError};
use serde::de::DeserializeOwned;

fn print_structured(output_format: &OutputFormat, value: &Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
        _ => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
        _ => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let Some(data_value) = data {
                response["data"] = data_value;
            }

            print_structured(output_format, &response)?;
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
        _ => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            print_structured(output_format, &response)?;
        }
    }
    Ok(())
}

/// Machine-readable code for a failed command, when the cause is known.
pub fn error_code(error: &anyhow::Error) -> Option<&'static str> {
    match error.downcast_ref::<TransportError>()? {
        TransportError::Http { status: 401, .. } => Some("UNAUTHORIZED"),
        TransportError::Http { status: 403, .. } => Some("FORBIDDEN"),
        TransportError::Http { status: 404, .. } => Some("NOT_FOUND"),
        TransportError::Http { .. } => Some("HTTP_ERROR"),
        TransportError::Network(_) => Some("NETWORK_ERROR"),
        TransportError::Decode(_) => Some("DECODE_ERROR"),
    }
}

/// Report a failed command; `verbose` adds the error chain in text mode.
pub fn report_error(output_format: &OutputFormat, error: &anyhow::Error, verbose: bool) -> anyhow::Result<()> {
    let message = match output_format {
        OutputFormat::Text if verbose => format!("{:?}", error),
        _ => error.to_string(),
    };
    output_error(output_format, &message, error_code(error))
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(output_format: &OutputFormat, collection_name: &str, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Text => {
            println!("{}", message);
        }
        _ => {
            print_structured(output_format, &json!({ collection_name: [] }))?;
        }
    }
    Ok(())
}

/// One line per record in text mode, the full records otherwise
pub fn output_collection<T: Serialize>(
    output_format: &OutputFormat,
    collection_name: &str,
    records: &[T],
    line: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Text => {
            for record in records {
                println!("{}", line(record));
            }
            println!("({} {})", records.len(), collection_name);
        }
        _ => {
            print_structured(output_format, &json!({ collection_name: records }))?;
        }
    }
    Ok(())
}

/// `key: value` lines in text mode, the full record otherwise
pub fn output_record<T: Serialize>(output_format: &OutputFormat, record: &T) -> anyhow::Result<()> {
    let value = serde_json::to_value(record)?;
    match output_format {
        OutputFormat::Text => print!("{}", render_text(&value)),
        _ => print_structured(output_format, &value)?,
    }
    Ok(())
}

pub fn render_text(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let width = map.keys().map(String::len).max().unwrap_or(0);
            map.iter()
                .map(|(key, value)| format!("{:width$}  {}\n", key, scalar(value), width = width))
                .collect()
        }
        other => format!("{}\n", scalar(other)),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(scalar).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

/// Wait for a list read and print it, failing on transport errors.
pub async fn show_collection<T: Serialize + DeserializeOwned>(
    output_format: &OutputFormat,
    mut hook: CollectionHook<T>,
    collection_name: &str,
    line: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    let state = hook.settled().await;
    if let Some(error) = &state.error {
        return Err(error.clone().into());
    }
    if state.is_empty {
        return output_empty_collection(output_format, collection_name, &format!("No {} found", collection_name));
    }
    output_collection(output_format, collection_name, &state.data, line)
}

/// Wait for a single-record read and print it, failing on transport errors.
pub async fn show_entity<T: Serialize + DeserializeOwned>(
    output_format: &OutputFormat,
    mut hook: EntityHook<T>,
) -> anyhow::Result<()> {
    let state = hook.settled().await;
    if let Some(error) = &state.error {
        return Err(error.clone().into());
    }
    match &state.data {
        Some(record) => output_record(output_format, record),
        None => Err(anyhow::anyhow!("Record not found")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_text_aligns_keys() {
        let text = render_text(&json!({ "id": 1, "title": "Jonah", "options": ["a", "b"], "sent_at": null }));
        assert!(text.contains("title    Jonah\n"));
        assert!(text.contains("options  a, b\n"));
        assert!(text.contains("sent_at  -\n"));
    }

    #[test]
    fn test_error_code_follows_transport_error() {
        let forbidden = anyhow::Error::new(TransportError::Http {
            status: 403,
            message: "INVALID ACCESS".to_string(),
        });
        assert_eq!(error_code(&forbidden), Some("FORBIDDEN"));

        let offline = anyhow::Error::new(TransportError::Network("connection refused".to_string()));
        assert_eq!(error_code(&offline), Some("NETWORK_ERROR"));

        assert_eq!(error_code(&anyhow::anyhow!("Record not found")), None);
    }
}
