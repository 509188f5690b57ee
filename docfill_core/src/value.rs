use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use chrono::format::Item;
use chrono::format::StrftimeItems;
use float_cmp::approx_eq;
use indexmap::IndexMap;
use serde::Serialize;

use crate::FillError;
use crate::FillOptions;
use crate::FillResult;
use crate::config::DEFAULT_DATE_FORMAT;

/// Ordered key to value storage used by [`Value::Mapping`].
pub type Mapping = IndexMap<String, Value>;

/// A node in the data graph that placeholders are resolved against.
///
/// Every piece of data is classified once into one of these variants. Strings
/// are scalars: only [`Value::Sequence`] drives collection expansion.
#[derive(Debug, Clone, Default)]
pub enum Value {
	#[default]
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Text(String),
	Date(NaiveDateTime),
	Sequence(Arc<Vec<Value>>),
	Mapping(Arc<Mapping>),
	Record(Arc<dyn Record>),
}

impl Eq for Value {}
impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Value::Null, Value::Null) => true,
			(Value::Bool(value), Value::Bool(other_value)) => value == other_value,
			(Value::Int(value), Value::Int(other_value)) => value == other_value,
			(Value::Float(value), Value::Float(other_value)) => {
				approx_eq!(f64, *value, *other_value, ulps = 2)
			}
			(Value::Text(value), Value::Text(other_value)) => value == other_value,
			(Value::Date(value), Value::Date(other_value)) => value == other_value,
			(Value::Sequence(value), Value::Sequence(other_value)) => value == other_value,
			(Value::Mapping(value), Value::Mapping(other_value)) => value == other_value,
			(Value::Record(value), Value::Record(other_value)) => Arc::ptr_eq(value, other_value),
			_ => false,
		}
	}
}

/// A typed object that exposes its fields by name.
///
/// Implement this for domain types that should be reachable from
/// placeholders without converting them into a [`Mapping`] first. A record
/// may additionally behave like a mapping by returning entries from
/// [`Record::entry`]; entries always win over same-named fields.
pub trait Record: fmt::Debug + Send + Sync {
	/// The field layout of this type, built once per type.
	fn schema(&self) -> &'static Schema;

	/// Look up a field declared in [`Record::schema`].
	fn field(&self, name: &str) -> Option<Value>;

	/// Look up a mapping entry.
	fn entry(&self, _key: &str) -> Option<Value> {
		None
	}

	/// Keys of every mapping entry, in order.
	fn entry_keys(&self) -> Vec<String> {
		Vec::new()
	}
}

/// Static description of a [`Record`] type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
	type_name: &'static str,
	fields: &'static [FieldDescriptor],
}

impl Schema {
	pub const fn new(type_name: &'static str, fields: &'static [FieldDescriptor]) -> Self {
		Self { type_name, fields }
	}

	pub fn type_name(&self) -> &'static str {
		self.type_name
	}

	/// Fields in declaration order.
	pub fn fields(&self) -> &'static [FieldDescriptor] {
		self.fields
	}

	pub fn field(&self, name: &str) -> Option<&'static FieldDescriptor> {
		self.fields.iter().find(|field| field.name == name)
	}
}

/// One field of a [`Schema`], with optional rendering metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
	pub name: &'static str,
	/// chrono strftime pattern applied when the field holds a date that is
	/// written as text.
	pub format: Option<&'static str>,
}

impl FieldDescriptor {
	pub const fn new(name: &'static str) -> Self {
		Self { name, format: None }
	}

	pub const fn with_format(name: &'static str, format: &'static str) -> Self {
		Self {
			name,
			format: Some(format),
		}
	}
}

impl Value {
	/// Convert any serializable value into a [`Value`]. Map key order is
	/// preserved.
	pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> FillResult<Value> {
		serde_json::to_value(value)
			.map(Value::from)
			.map_err(|e| FillError::Serialize(e.to_string()))
	}

	pub fn record<R: Record + 'static>(record: R) -> Value {
		Value::Record(Arc::new(record))
	}

	pub fn sequence<I, V>(items: I) -> Value
	where
		I: IntoIterator<Item = V>,
		V: Into<Value>,
	{
		Value::Sequence(Arc::new(items.into_iter().map(Into::into).collect()))
	}

	pub fn mapping<I, K, V>(entries: I) -> Value
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<Value>,
	{
		Value::Mapping(Arc::new(
			entries
				.into_iter()
				.map(|(key, value)| (key.into(), value.into()))
				.collect(),
		))
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	/// The items of a sequence. Every other variant, including text, returns
	/// `None`.
	pub fn as_sequence(&self) -> Option<&Arc<Vec<Value>>> {
		match self {
			Value::Sequence(items) => Some(items),
			_ => None,
		}
	}

	/// Short name of the variant, used in log output.
	pub fn kind(&self) -> &'static str {
		match self {
			Value::Null => "null",
			Value::Bool(_) => "bool",
			Value::Int(_) => "int",
			Value::Float(_) => "float",
			Value::Text(_) => "text",
			Value::Date(_) => "date",
			Value::Sequence(_) => "sequence",
			Value::Mapping(_) => "mapping",
			Value::Record(_) => "record",
		}
	}

	/// Render the value as text.
	///
	/// `format` is the field level date format, which wins over
	/// [`FillOptions::date_format`]. Null renders as an empty string,
	/// sequences join their rendered items with the configured separator,
	/// mappings render their values the same way, and records render as
	/// their type name.
	pub fn render(&self, options: &FillOptions, format: Option<&str>) -> String {
		match self {
			Value::Null => String::new(),
			Value::Bool(value) => value.to_string(),
			Value::Int(value) => value.to_string(),
			Value::Float(value) => value.to_string(),
			Value::Text(value) => value.clone(),
			Value::Date(value) => {
				format
					.and_then(|pattern| format_date(value, pattern))
					.or_else(|| format_date(value, &options.date_format))
					.unwrap_or_else(|| value.format(DEFAULT_DATE_FORMAT).to_string())
			}
			Value::Sequence(items) => join_rendered(items.iter(), options),
			Value::Mapping(entries) => join_rendered(entries.values(), options),
			Value::Record(record) => record.schema().type_name().to_string(),
		}
	}
}

fn join_rendered<'v>(values: impl Iterator<Item = &'v Value>, options: &FillOptions) -> String {
	values
		.map(|value| value.render(options, None))
		.collect::<Vec<_>>()
		.join(&options.sequence_separator)
}

/// Format a date, returning `None` when the pattern is not a valid strftime
/// pattern or needs information a naive date does not carry.
pub(crate) fn format_date(date: &NaiveDateTime, pattern: &str) -> Option<String> {
	let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
	if items.iter().any(|item| matches!(item, Item::Error)) {
		return None;
	}

	let mut rendered = String::new();
	write!(rendered, "{}", date.format_with_items(items.into_iter())).ok()?;
	Some(rendered)
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.render(&FillOptions::default(), None))
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Value::Bool(value)
	}
}

impl From<i32> for Value {
	fn from(value: i32) -> Self {
		Value::Int(i64::from(value))
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Value::Int(value)
	}
}

impl From<u32> for Value {
	fn from(value: u32) -> Self {
		Value::Int(i64::from(value))
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Value::Float(value)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Value::Text(value.to_string())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Value::Text(value)
	}
}

impl From<NaiveDateTime> for Value {
	fn from(value: NaiveDateTime) -> Self {
		Value::Date(value)
	}
}

impl From<NaiveDate> for Value {
	fn from(value: NaiveDate) -> Self {
		Value::Date(value.and_time(NaiveTime::MIN))
	}
}

impl From<Mapping> for Value {
	fn from(value: Mapping) -> Self {
		Value::Mapping(Arc::new(value))
	}
}

impl<T: Into<Value>> From<Vec<T>> for Value {
	fn from(value: Vec<T>) -> Self {
		Value::sequence(value)
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map_or(Value::Null, Into::into)
	}
}

impl From<serde_json::Value> for Value {
	fn from(value: serde_json::Value) -> Self {
		match value {
			serde_json::Value::Null => Value::Null,
			serde_json::Value::Bool(value) => Value::Bool(value),
			serde_json::Value::Number(number) => {
				match (number.as_i64(), number.as_f64()) {
					(Some(int), _) => Value::Int(int),
					(None, Some(float)) => Value::Float(float),
					(None, None) => Value::Text(number.to_string()),
				}
			}
			serde_json::Value::String(text) => Value::Text(text),
			serde_json::Value::Array(items) => Value::sequence(items),
			serde_json::Value::Object(entries) => Value::mapping(entries),
		}
	}
}
