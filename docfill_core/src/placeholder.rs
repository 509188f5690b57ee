use std::ops::Range;
use std::sync::LazyLock;

use regex::NoExpand;
use regex::Regex;

/// Matches `{segment(:segment)*}`. Group 1 is the path.
pub static SCALAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\{([a-zA-Z0-9:]+)\}")
		.unwrap_or_else(|e| panic!("invalid scalar placeholder pattern: {e}"))
});

/// Matches `[collection]` and `[collection.property]` where both parts are
/// `:` separated paths.
pub static COLLECTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"\[(?<collection>[a-zA-Z0-9]+(?::[a-zA-Z0-9]+)*)(?:\.(?<property>[a-zA-Z0-9]+(?::[a-zA-Z0-9]+)*))?\]",
	)
	.unwrap_or_else(|e| panic!("invalid collection placeholder pattern: {e}"))
});

/// The two placeholder flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
	/// `{path}`, replaced by one value.
	Scalar,
	/// `[path]` or `[path.property]`, expanded into one row per item.
	Collection,
}

impl PlaceholderKind {
	pub fn pattern(self) -> &'static Regex {
		match self {
			PlaceholderKind::Scalar => &SCALAR_PATTERN,
			PlaceholderKind::Collection => &COLLECTION_PATTERN,
		}
	}
}

/// How a piece of text relates to a placeholder pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
	pub is_match: bool,
	/// The text consists of nothing but placeholder matches.
	pub pattern_only: bool,
	pub match_count: usize,
}

impl Classification {
	/// Whether the text is exactly one placeholder, which allows the resolved
	/// value to keep its native type.
	pub fn is_single_placeholder(&self) -> bool {
		self.pattern_only && self.match_count == 1
	}
}

pub fn classify(text: &str, pattern: &Regex) -> Classification {
	let mut match_count = 0;
	let mut matched_len = 0;

	for found in pattern.find_iter(text) {
		match_count += 1;
		matched_len += found.len();
	}

	Classification {
		is_match: match_count > 0,
		pattern_only: match_count > 0 && matched_len == text.len(),
		match_count,
	}
}

/// A `{path}` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarPlaceholder {
	pub path: String,
	/// Byte range of the whole placeholder, braces included.
	pub span: Range<usize>,
}

/// A `[collection.property]` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionPlaceholder {
	pub collection: String,
	pub property: Option<String>,
	/// Byte range of the whole placeholder, brackets included.
	pub span: Range<usize>,
}

impl CollectionPlaceholder {
	/// The placeholder as written in the template.
	pub fn source_text(&self) -> String {
		match &self.property {
			Some(property) => format!("[{}.{property}]", self.collection),
			None => format!("[{}]", self.collection),
		}
	}
}

pub fn has_scalar(text: &str) -> bool {
	SCALAR_PATTERN.is_match(text)
}

pub fn has_collection(text: &str) -> bool {
	COLLECTION_PATTERN.is_match(text)
}

/// Every scalar placeholder in `text`, in order.
pub fn scalar_placeholders(text: &str) -> Vec<ScalarPlaceholder> {
	SCALAR_PATTERN
		.captures_iter(text)
		.filter_map(|captures| {
			let whole = captures.get(0)?;
			let path = captures.get(1)?;
			Some(ScalarPlaceholder {
				path: path.as_str().to_string(),
				span: whole.range(),
			})
		})
		.collect()
}

/// The path inside a matched scalar placeholder, `{Customer:Name}` gives
/// `Customer:Name`.
pub fn scalar_path(placeholder: &str) -> Option<&str> {
	SCALAR_PATTERN
		.captures(placeholder)
		.and_then(|captures| captures.get(1))
		.map(|path| path.as_str())
}

/// The first collection placeholder in `text`. Later ones are ignored.
pub fn first_collection(text: &str) -> Option<CollectionPlaceholder> {
	let captures = COLLECTION_PATTERN.captures(text)?;
	let whole = captures.get(0)?;
	let collection = captures.name("collection")?;

	Some(CollectionPlaceholder {
		collection: collection.as_str().to_string(),
		property: captures.name("property").map(|m| m.as_str().to_string()),
		span: whole.range(),
	})
}

/// Replace the first match of `pattern` with `replacement`, taken literally.
pub fn replace_first(text: &str, pattern: &Regex, replacement: &str) -> String {
	pattern.replacen(text, 1, NoExpand(replacement)).into_owned()
}
