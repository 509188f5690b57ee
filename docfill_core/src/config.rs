use std::path::Path;
use std::path::PathBuf;

use chrono::format::Item;
use chrono::format::StrftimeItems;
use serde::Deserialize;
use serde::Serialize;

use crate::FillError;
use crate::FillResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] =
	["docfill.toml", ".docfill.toml", ".config/docfill.toml"];

/// The date format used when a date is written as text and no field level
/// format is declared.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The separator placed between items when a sequence is written as text.
pub const DEFAULT_SEQUENCE_SEPARATOR: &str = ", ";

/// Options that control how values are rendered and which parts of a
/// document are visited.
///
/// ```toml
/// date_format = "%d/%m/%Y"
/// sequence_separator = "; "
///
/// [flow]
/// headers = true
/// footers = false
/// expand_part_tables = false
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, Eq, PartialEq)]
pub struct FillOptions {
	/// chrono strftime pattern for dates rendered into text.
	#[serde(default = "default_date_format")]
	pub date_format: String,
	/// Separator used when a sequence is rendered into text.
	#[serde(default = "default_sequence_separator")]
	pub sequence_separator: String,
	/// Flow document traversal options.
	#[serde(default)]
	pub flow: FlowOptions,
}

impl Default for FillOptions {
	fn default() -> Self {
		Self {
			date_format: default_date_format(),
			sequence_separator: default_sequence_separator(),
			flow: FlowOptions::default(),
		}
	}
}

/// Which parts of a flow document are filled.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Eq, PartialEq)]
pub struct FlowOptions {
	/// Fill header paragraphs and tables.
	#[serde(default = "default_true")]
	pub headers: bool,
	/// Fill footer paragraphs and tables.
	#[serde(default = "default_true")]
	pub footers: bool,
	/// Expand collection placeholders in header and footer tables. Body
	/// tables are always expanded.
	#[serde(default)]
	pub expand_part_tables: bool,
}

impl Default for FlowOptions {
	fn default() -> Self {
		Self {
			headers: true,
			footers: true,
			expand_part_tables: false,
		}
	}
}

fn default_date_format() -> String {
	DEFAULT_DATE_FORMAT.to_string()
}

fn default_sequence_separator() -> String {
	DEFAULT_SEQUENCE_SEPARATOR.to_string()
}

fn default_true() -> bool {
	true
}

impl FillOptions {
	/// Resolve the highest-precedence config path under `root`.
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the options from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> FillResult<Option<FillOptions>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		Self::from_toml_str(&content).map(Some)
	}

	/// Parse and validate options from TOML content.
	pub fn from_toml_str(content: &str) -> FillResult<FillOptions> {
		let options: FillOptions =
			toml::from_str(content).map_err(|e| FillError::ConfigParse(e.to_string()))?;
		options.validate()?;

		Ok(options)
	}

	/// Reject date formats that chrono cannot render.
	pub fn validate(&self) -> FillResult<()> {
		if is_valid_date_format(&self.date_format) {
			Ok(())
		} else {
			Err(FillError::InvalidDateFormat(self.date_format.clone()))
		}
	}
}

pub(crate) fn is_valid_date_format(pattern: &str) -> bool {
	!StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}
