use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum FillError {
	#[error(transparent)]
	#[diagnostic(code(docfill::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(docfill::config_parse),
		help("check that docfill.toml is valid TOML with top level options and an optional [flow] section")
	)]
	ConfigParse(String),

	#[error("failed to load data file `{path}`: {reason}")]
	#[diagnostic(code(docfill::data_file))]
	DataFile { path: String, reason: String },

	#[error("unsupported data file format: `{0}`")]
	#[diagnostic(
		code(docfill::unsupported_format),
		help("supported formats: text, json, toml, yaml, yml")
	)]
	UnsupportedDataFormat(String),

	#[error("failed to convert data into a fill value: {0}")]
	#[diagnostic(code(docfill::serialize))]
	Serialize(String),

	#[error("invalid date format: `{0}`")]
	#[diagnostic(
		code(docfill::invalid_date_format),
		help("use chrono strftime specifiers such as `%Y-%m-%d %H:%M:%S`")
	)]
	InvalidDateFormat(String),

	#[error("alignment references fragment {index} but the paragraph only has {count}")]
	#[diagnostic(code(docfill::fragment_out_of_range))]
	FragmentOutOfRange { index: usize, count: usize },

	#[error("row {row} is out of range for a table with {count} rows")]
	#[diagnostic(code(docfill::row_out_of_range))]
	RowOutOfRange { row: usize, count: usize },

	#[error("the fill operation was cancelled")]
	#[diagnostic(code(docfill::cancelled))]
	Cancelled,
}

pub type FillResult<T> = Result<T, FillError>;
