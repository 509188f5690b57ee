//! Traits implemented by document backends.
//!
//! The engine never reads or writes container formats. It walks a document
//! through these traits, which a backend implements over its own object
//! model. [`crate::memory`] is the in-memory implementation.

use std::ops::Range;

use chrono::NaiveDateTime;
use float_cmp::approx_eq;
use serde::Deserialize;
use serde::Serialize;

use crate::FillOptions;
use crate::FillResult;
use crate::Value;
use crate::config::DEFAULT_DATE_FORMAT;

/// A typed spreadsheet cell value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
	#[default]
	Blank,
	Text(String),
	Bool(bool),
	Int(i64),
	Float(f64),
	Date(NaiveDateTime),
}

impl Eq for CellValue {}
impl PartialEq for CellValue {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(CellValue::Blank, CellValue::Blank) => true,
			(CellValue::Text(value), CellValue::Text(other_value)) => value == other_value,
			(CellValue::Bool(value), CellValue::Bool(other_value)) => value == other_value,
			(CellValue::Int(value), CellValue::Int(other_value)) => value == other_value,
			(CellValue::Float(value), CellValue::Float(other_value)) => {
				approx_eq!(f64, *value, *other_value, ulps = 2)
			}
			(CellValue::Date(value), CellValue::Date(other_value)) => value == other_value,
			_ => false,
		}
	}
}

impl CellValue {
	/// Convert a resolved value, keeping numbers, dates and booleans typed.
	/// Containers are written as their rendered text.
	pub fn from_value(value: &Value, options: &FillOptions, format: Option<&str>) -> Self {
		match value {
			Value::Null => CellValue::Blank,
			Value::Bool(value) => CellValue::Bool(*value),
			Value::Int(value) => CellValue::Int(*value),
			Value::Float(value) => CellValue::Float(*value),
			Value::Text(value) => CellValue::Text(value.clone()),
			Value::Date(value) => CellValue::Date(*value),
			Value::Sequence(_) | Value::Mapping(_) | Value::Record(_) => {
				CellValue::Text(value.render(options, format))
			}
		}
	}

	/// The stringified value.
	pub fn to_text(&self) -> String {
		match self {
			CellValue::Blank => String::new(),
			CellValue::Text(value) => value.clone(),
			CellValue::Bool(value) => value.to_string(),
			CellValue::Int(value) => value.to_string(),
			CellValue::Float(value) => value.to_string(),
			CellValue::Date(value) => value.format(DEFAULT_DATE_FORMAT).to_string(),
		}
	}

	pub fn as_text(&self) -> Option<&str> {
		match self {
			CellValue::Text(value) => Some(value),
			_ => None,
		}
	}

	/// Whether the cell holds a value. Text made only of whitespace counts.
	pub fn has_content(&self) -> bool {
		match self {
			CellValue::Blank => false,
			CellValue::Text(value) => !value.is_empty(),
			_ => true,
		}
	}
}

impl From<&str> for CellValue {
	fn from(value: &str) -> Self {
		CellValue::Text(value.to_string())
	}
}

impl From<String> for CellValue {
	fn from(value: String) -> Self {
		CellValue::Text(value)
	}
}

impl From<i64> for CellValue {
	fn from(value: i64) -> Self {
		CellValue::Int(value)
	}
}

impl From<f64> for CellValue {
	fn from(value: f64) -> Self {
		CellValue::Float(value)
	}
}

impl From<bool> for CellValue {
	fn from(value: bool) -> Self {
		CellValue::Bool(value)
	}
}

/// An inclusive rectangle of merged cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
	pub first_row: usize,
	pub last_row: usize,
	pub first_column: usize,
	pub last_column: usize,
}

impl CellRange {
	pub const fn new(
		first_row: usize,
		last_row: usize,
		first_column: usize,
		last_column: usize,
	) -> Self {
		Self {
			first_row,
			last_row,
			first_column,
			last_column,
		}
	}

	pub fn contains(&self, row: usize, column: usize) -> bool {
		(self.first_row..=self.last_row).contains(&row)
			&& (self.first_column..=self.last_column).contains(&column)
	}
}

/// A worksheet of sparse rows and cells.
pub trait Sheet {
	/// A backend style handle copied from template cells onto new cells.
	type Style: Clone;

	fn name(&self) -> &str;

	/// Index of the first row that exists.
	fn first_row(&self) -> Option<usize>;

	/// Index of the last row that exists.
	fn last_row(&self) -> Option<usize>;

	fn has_row(&self, row: usize) -> bool;

	/// Create an empty row. Does nothing if it already exists.
	fn create_row(&mut self, row: usize);

	/// Move every row at or below `start` down by `count` rows. Merged
	/// regions move with their rows.
	fn shift_rows(&mut self, start: usize, count: usize);

	/// Column indices of the cells that exist in `row`.
	fn cell_columns(&self, row: usize) -> Range<usize>;

	/// `None` when the cell does not exist.
	fn cell_value(&self, row: usize, column: usize) -> Option<CellValue>;

	/// Write a value, creating the row and cell when missing.
	fn set_cell_value(&mut self, row: usize, column: usize, value: CellValue);

	fn cell_style(&self, row: usize, column: usize) -> Option<Self::Style>;

	/// Apply a style, creating the row and cell when missing.
	fn set_cell_style(&mut self, row: usize, column: usize, style: Self::Style);

	fn merged_regions(&self) -> &[CellRange];

	fn is_merged(&self, row: usize, column: usize) -> bool {
		self.merged_regions()
			.iter()
			.any(|region| region.contains(row, column))
	}
}

/// A spreadsheet made of [`Sheet`]s.
pub trait Workbook {
	type Sheet: Sheet;

	fn sheet_count(&self) -> usize;

	fn sheet(&self, index: usize) -> Option<&Self::Sheet>;

	fn sheet_mut(&mut self, index: usize) -> Option<&mut Self::Sheet>;
}

/// A paragraph made of text runs. Each run is one fragment that carries its
/// own formatting.
pub trait Paragraph {
	fn run_count(&self) -> usize;

	fn run_text(&self, index: usize) -> Option<&str>;

	fn set_run_text(&mut self, index: usize, text: String);

	fn remove_run(&mut self, index: usize);

	/// The text of every run, in order.
	fn runs(&self) -> Vec<&str> {
		(0..self.run_count())
			.filter_map(|index| self.run_text(index))
			.collect()
	}

	/// The concatenated text of every run.
	fn text(&self) -> String {
		self.runs().concat()
	}
}

pub trait TableCell {
	type Paragraph: Paragraph;

	fn paragraph_count(&self) -> usize;

	fn paragraph(&self, index: usize) -> Option<&Self::Paragraph>;

	fn paragraph_mut(&mut self, index: usize) -> Option<&mut Self::Paragraph>;

	/// Whether the cell spans several grid columns or is part of a vertical
	/// or horizontal merge.
	fn is_merged(&self) -> bool;

	/// Paragraph texts joined by newlines.
	fn text(&self) -> String {
		(0..self.paragraph_count())
			.filter_map(|index| self.paragraph(index).map(Paragraph::text))
			.collect::<Vec<_>>()
			.join("\n")
	}
}

pub trait TableRow {
	type Cell: TableCell;

	fn cell_count(&self) -> usize;

	fn cell(&self, index: usize) -> Option<&Self::Cell>;

	fn cell_mut(&mut self, index: usize) -> Option<&mut Self::Cell>;
}

pub trait Table {
	type Row: TableRow;

	fn row_count(&self) -> usize;

	fn row(&self, index: usize) -> Option<&Self::Row>;

	fn row_mut(&mut self, index: usize) -> Option<&mut Self::Row>;

	/// Insert a copy of row `source` at `target`, moving the rows at and after
	/// `target` down. `target` may equal [`Table::row_count`] to append.
	fn clone_row(&mut self, source: usize, target: usize) -> FillResult<()>;

	fn remove_row(&mut self, index: usize) -> FillResult<()>;
}

/// A run of paragraphs and tables: the document body, a header or a footer.
pub trait Body {
	type Paragraph: Paragraph;
	type Table: Table;

	fn paragraph_count(&self) -> usize;

	fn paragraph(&self, index: usize) -> Option<&Self::Paragraph>;

	fn paragraph_mut(&mut self, index: usize) -> Option<&mut Self::Paragraph>;

	fn table_count(&self) -> usize;

	fn table(&self, index: usize) -> Option<&Self::Table>;

	fn table_mut(&mut self, index: usize) -> Option<&mut Self::Table>;
}

/// A word processing document.
pub trait FlowDocument {
	type Part: Body;

	fn body(&self) -> &Self::Part;

	fn body_mut(&mut self) -> &mut Self::Part;

	fn header_count(&self) -> usize;

	fn header(&self, index: usize) -> Option<&Self::Part>;

	fn header_mut(&mut self, index: usize) -> Option<&mut Self::Part>;

	fn footer_count(&self) -> usize;

	fn footer(&self, index: usize) -> Option<&Self::Part>;

	fn footer_mut(&mut self, index: usize) -> Option<&mut Self::Part>;
}
