use std::path::Path;

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;

use crate::FillError;
use crate::FillResult;
use crate::Value;

/// Parse data file content into a [`Value`].
///
/// `format` is a lowercase extension or format name: `json`, `toml`, `yaml`,
/// `yml`, or `text` (also `txt`, `string`, `raw`) for plain text.
/// `path_display` is only used in error messages.
pub fn parse_data(content: &str, format: &str, path_display: &str) -> FillResult<Value> {
	let data_error = |reason: String| {
		FillError::DataFile {
			path: path_display.to_string(),
			reason,
		}
	};

	match format {
		"text" | "string" | "raw" | "txt" => Ok(Value::Text(content.to_string())),
		"json" => {
			serde_json::from_str::<serde_json::Value>(content)
				.map(Value::from)
				.map_err(|e| data_error(e.to_string()))
		}
		"toml" => {
			toml::from_str::<toml::Value>(content)
				.map(toml_to_value)
				.map_err(|e| data_error(e.to_string()))
		}
		"yaml" | "yml" => {
			serde_yaml_ng::from_str::<serde_json::Value>(content)
				.map(Value::from)
				.map_err(|e| data_error(e.to_string()))
		}
		other => Err(FillError::UnsupportedDataFormat(other.to_string())),
	}
}

/// Read a data file and parse it using its extension as the format.
pub fn load_data(path: &Path) -> FillResult<Value> {
	let path_display = path.display().to_string();
	let content = std::fs::read_to_string(path).map_err(|e| {
		FillError::DataFile {
			path: path_display.clone(),
			reason: e.to_string(),
		}
	})?;
	let format = path
		.extension()
		.and_then(|e| e.to_str())
		.unwrap_or("")
		.to_ascii_lowercase();

	parse_data(&content, &format, &path_display)
}

fn toml_to_value(value: toml::Value) -> Value {
	match value {
		toml::Value::String(s) => Value::Text(s),
		toml::Value::Integer(i) => Value::Int(i),
		toml::Value::Float(f) => Value::Float(f),
		toml::Value::Boolean(b) => Value::Bool(b),
		toml::Value::Datetime(dt) => toml_datetime_to_value(&dt.to_string()),
		toml::Value::Array(items) => Value::sequence(items.into_iter().map(toml_to_value)),
		toml::Value::Table(table) => {
			Value::mapping(
				table
					.into_iter()
					.map(|(key, value)| (key, toml_to_value(value))),
			)
		}
	}
}

/// Offset datetimes keep their local wall clock time. Local times without a
/// date stay text.
fn toml_datetime_to_value(text: &str) -> Value {
	if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
		return Value::Date(datetime.naive_local());
	}

	if let Ok(datetime) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
		return Value::Date(datetime);
	}

	if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
		return Value::Date(date.and_time(NaiveTime::MIN));
	}

	Value::Text(text.to_string())
}
