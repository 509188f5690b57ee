use std::borrow::Cow;
use std::sync::Arc;

use crate::Value;

/// Separator between the segments of a placeholder path.
pub const PATH_SEPARATOR: char = ':';

/// The outcome of resolving a path.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<'d> {
	/// The last segment of the resolved path.
	pub key: String,
	/// The resolved node. Borrowed when it lives in the data root, owned when
	/// a [`crate::Record`] produced it.
	pub value: Cow<'d, Value>,
	/// Date format declared on the record field that produced the value.
	pub format: Option<&'static str>,
}

impl Resolved<'_> {
	pub fn into_owned(self) -> Resolved<'static> {
		Resolved {
			key: self.key,
			value: Cow::Owned(self.value.into_owned()),
			format: self.format,
		}
	}
}

/// Resolve a `:` separated path against `root`.
///
/// Each segment is looked up as a mapping key first and as a record field
/// second. Resolution fails when a segment is missing, when a segment is
/// requested on a null or scalar node, or when the path is empty.
pub fn resolve<'d>(root: &'d Value, path: &str) -> Option<Resolved<'d>> {
	if path.is_empty() {
		return None;
	}

	let mut cursor = Cow::Borrowed(root);
	let mut format = None;
	let mut key = "";

	for segment in path.split(PATH_SEPARATOR) {
		if segment.is_empty() {
			return None;
		}

		let (next, next_format) = step(cursor, segment)?;
		cursor = next;
		format = next_format;
		key = segment;
	}

	Some(Resolved {
		key: key.to_string(),
		value: cursor,
		format,
	})
}

/// Resolve `path` and return its items when the final node is a sequence.
///
/// Sequences met before the final segment are never flattened.
pub fn resolve_items(root: &Value, path: &str) -> Option<Arc<Vec<Value>>> {
	resolve(root, path)?.value.as_sequence().map(Arc::clone)
}

fn step<'d>(cursor: Cow<'d, Value>, segment: &str) -> Option<(Cow<'d, Value>, Option<&'static str>)> {
	match cursor {
		Cow::Borrowed(node) => lookup(node, segment),
		Cow::Owned(node) => {
			lookup(&node, segment).map(|(value, format)| (Cow::Owned(value.into_owned()), format))
		}
	}
}

fn lookup<'v>(node: &'v Value, segment: &str) -> Option<(Cow<'v, Value>, Option<&'static str>)> {
	match node {
		Value::Mapping(entries) => entries.get(segment).map(|value| (Cow::Borrowed(value), None)),
		Value::Record(record) => {
			if let Some(entry) = record.entry(segment) {
				return Some((Cow::Owned(entry), None));
			}

			let format = record.schema().field(segment).and_then(|field| field.format);
			record.field(segment).map(|value| (Cow::Owned(value), format))
		}
		_ => None,
	}
}

fn join_path(base: &str, key: &str) -> String {
	if base.is_empty() {
		key.to_string()
	} else {
		format!("{base}{PATH_SEPARATOR}{key}")
	}
}

fn child_keys(node: &Value) -> Vec<String> {
	match node {
		Value::Mapping(entries) => entries.keys().cloned().collect(),
		Value::Record(record) => {
			let keys = record.entry_keys();
			if keys.is_empty() {
				record
					.schema()
					.fields()
					.iter()
					.map(|field| field.name.to_string())
					.collect()
			} else {
				keys
			}
		}
		_ => Vec::new(),
	}
}

fn section_at<'d>(node: &Cow<'d, Value>, relative: &str, path: String) -> SourceSection<'d> {
	let resolved = match node {
		Cow::Borrowed(root) => resolve(*root, relative),
		Cow::Owned(owned) => resolve(owned, relative).map(Resolved::into_owned),
	};

	match resolved {
		Some(resolved) => {
			SourceSection {
				key: resolved.key,
				path,
				value: Some(resolved.value),
				format: resolved.format,
			}
		}
		None => SourceSection::default(),
	}
}

fn sections_under<'d>(node: &Cow<'d, Value>, base: &str) -> Vec<SourceSection<'d>> {
	child_keys(node)
		.into_iter()
		.map(|key| {
			let path = join_path(base, &key);
			section_at(node, &key, path)
		})
		.collect()
}

/// The data a fill operation reads from.
///
/// A source borrows its data root for the whole fill, so every
/// [`SourceSection`] it hands out is released together with the operation.
/// An optional prefix scopes every lookup below a fixed path, so
/// `source.get("Name")` on a source prefixed with `Customer` reads
/// `Customer:Name`.
#[derive(Debug, Clone)]
pub struct Source<'d> {
	root: &'d Value,
	prefix: Option<String>,
}

impl<'d> Source<'d> {
	pub fn new(root: &'d Value) -> Self {
		Self { root, prefix: None }
	}

	#[must_use]
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		let prefix = prefix.into();
		self.prefix = (!prefix.is_empty()).then_some(prefix);
		self
	}

	pub fn root(&self) -> &'d Value {
		self.root
	}

	pub fn prefix(&self) -> Option<&str> {
		self.prefix.as_deref()
	}

	fn qualify<'p>(&self, path: &'p str) -> Cow<'p, str> {
		match &self.prefix {
			Some(prefix) => Cow::Owned(join_path(prefix, path)),
			None => Cow::Borrowed(path),
		}
	}

	/// Resolve a single value.
	pub fn get(&self, path: &str) -> Option<Resolved<'d>> {
		resolve(self.root, &self.qualify(path))
	}

	/// Resolve the items of a collection placeholder path.
	pub fn items(&self, path: &str) -> Option<Arc<Vec<Value>>> {
		resolve_items(self.root, &self.qualify(path))
	}

	/// A named view of `path`. Never fails: a missing path yields the empty
	/// section.
	pub fn section(&self, path: &str) -> SourceSection<'d> {
		section_at(&Cow::Borrowed(self.root), &self.qualify(path), path.to_string())
	}

	/// One section per key of the scope this source reads from.
	pub fn children(&self) -> Vec<SourceSection<'d>> {
		match &self.prefix {
			Some(prefix) => self.section_scope(prefix).children(),
			None => sections_under(&Cow::Borrowed(self.root), ""),
		}
	}

	fn section_scope(&self, prefix: &str) -> SourceSection<'d> {
		section_at(&Cow::Borrowed(self.root), prefix, String::new())
	}
}

/// A named, path addressable view into a resolved node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceSection<'d> {
	pub key: String,
	pub path: String,
	pub value: Option<Cow<'d, Value>>,
	pub format: Option<&'static str>,
}

impl<'d> SourceSection<'d> {
	pub fn empty() -> Self {
		Self::default()
	}

	pub fn is_empty(&self) -> bool {
		self.key.is_empty() && self.value.is_none()
	}

	pub fn value(&self) -> Option<&Value> {
		self.value.as_deref()
	}

	/// A source reading from this section's node.
	pub fn source(&self) -> Option<Source<'_>> {
		self.value().map(Source::new)
	}

	/// Resolve a path relative to this section.
	pub fn get(&self, path: &str) -> Option<Resolved<'_>> {
		resolve(self.value()?, path)
	}

	/// A child section relative to this one. Missing paths yield the empty
	/// section.
	pub fn section(&self, path: &str) -> SourceSection<'d> {
		match &self.value {
			Some(node) => section_at(node, path, join_path(&self.path, path)),
			None => SourceSection::default(),
		}
	}

	pub fn children(&self) -> Vec<SourceSection<'d>> {
		match &self.value {
			Some(node) => sections_under(node, &self.path),
			None => Vec::new(),
		}
	}
}
