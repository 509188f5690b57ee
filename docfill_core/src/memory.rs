//! In-memory documents implementing every trait in [`crate::document`].
//!
//! All types are serde (de)serializable so templates can be described in
//! JSON or YAML and filled without a container backend.

use std::collections::BTreeMap;
use std::ops::Range;

use serde::Deserialize;
use serde::Serialize;

use crate::Body;
use crate::CellRange;
use crate::CellValue;
use crate::FillError;
use crate::FillResult;
use crate::FlowDocument;
use crate::Paragraph;
use crate::Sheet;
use crate::Table;
use crate::TableCell;
use crate::TableRow;
use crate::Workbook;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryWorkbook {
	pub sheets: Vec<MemorySheet>,
}

impl MemoryWorkbook {
	pub fn new(sheets: Vec<MemorySheet>) -> Self {
		Self { sheets }
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySheet {
	pub name: String,
	#[serde(default)]
	pub rows: BTreeMap<usize, MemoryRow>,
	#[serde(default)]
	pub merged: Vec<CellRange>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRow {
	#[serde(default)]
	pub cells: BTreeMap<usize, MemoryCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryCell {
	#[serde(default)]
	pub value: CellValue,
	/// Style identifier.
	#[serde(default)]
	pub style: u32,
}

impl MemorySheet {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			..Self::default()
		}
	}

	#[must_use]
	pub fn with_cell(self, row: usize, column: usize, value: impl Into<CellValue>) -> Self {
		self.with_styled_cell(row, column, value, 0)
	}

	#[must_use]
	pub fn with_styled_cell(
		mut self,
		row: usize,
		column: usize,
		value: impl Into<CellValue>,
		style: u32,
	) -> Self {
		self.rows.entry(row).or_default().cells.insert(column, MemoryCell {
			value: value.into(),
			style,
		});
		self
	}

	#[must_use]
	pub fn with_merged(mut self, region: CellRange) -> Self {
		self.merged.push(region);
		self
	}

	pub fn cell(&self, row: usize, column: usize) -> Option<&MemoryCell> {
		self.rows.get(&row)?.cells.get(&column)
	}

	/// The stringified value of a cell, `None` when it does not exist.
	pub fn text(&self, row: usize, column: usize) -> Option<String> {
		self.cell(row, column).map(|cell| cell.value.to_text())
	}

	fn cell_entry(&mut self, row: usize, column: usize) -> &mut MemoryCell {
		self.rows
			.entry(row)
			.or_default()
			.cells
			.entry(column)
			.or_default()
	}
}

impl Sheet for MemorySheet {
	type Style = u32;

	fn name(&self) -> &str {
		&self.name
	}

	fn first_row(&self) -> Option<usize> {
		self.rows.keys().next().copied()
	}

	fn last_row(&self) -> Option<usize> {
		self.rows.keys().next_back().copied()
	}

	fn has_row(&self, row: usize) -> bool {
		self.rows.contains_key(&row)
	}

	fn create_row(&mut self, row: usize) {
		self.rows.entry(row).or_default();
	}

	fn shift_rows(&mut self, start: usize, count: usize) {
		let moved = self.rows.split_off(&start);
		for (row, data) in moved {
			self.rows.insert(row + count, data);
		}

		for region in &mut self.merged {
			if region.first_row >= start {
				region.first_row += count;
				region.last_row += count;
			} else if region.last_row >= start {
				region.last_row += count;
			}
		}
	}

	fn cell_columns(&self, row: usize) -> Range<usize> {
		let Some(cells) = self.rows.get(&row).map(|row| &row.cells) else {
			return 0..0;
		};

		match (cells.keys().next(), cells.keys().next_back()) {
			(Some(first), Some(last)) => *first..*last + 1,
			_ => 0..0,
		}
	}

	fn cell_value(&self, row: usize, column: usize) -> Option<CellValue> {
		self.cell(row, column).map(|cell| cell.value.clone())
	}

	fn set_cell_value(&mut self, row: usize, column: usize, value: CellValue) {
		self.cell_entry(row, column).value = value;
	}

	fn cell_style(&self, row: usize, column: usize) -> Option<u32> {
		self.cell(row, column).map(|cell| cell.style)
	}

	fn set_cell_style(&mut self, row: usize, column: usize, style: u32) {
		self.cell_entry(row, column).style = style;
	}

	fn merged_regions(&self) -> &[CellRange] {
		&self.merged
	}
}

impl Workbook for MemoryWorkbook {
	type Sheet = MemorySheet;

	fn sheet_count(&self) -> usize {
		self.sheets.len()
	}

	fn sheet(&self, index: usize) -> Option<&MemorySheet> {
		self.sheets.get(index)
	}

	fn sheet_mut(&mut self, index: usize) -> Option<&mut MemorySheet> {
		self.sheets.get_mut(index)
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRun {
	pub text: String,
	/// Formatting identifier carried by the run.
	#[serde(default)]
	pub style: u32,
}

impl MemoryRun {
	pub fn new(text: impl Into<String>) -> Self {
		Self {
			text: text.into(),
			style: 0,
		}
	}

	pub fn styled(text: impl Into<String>, style: u32) -> Self {
		Self {
			text: text.into(),
			style,
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryParagraph {
	#[serde(default)]
	pub runs: Vec<MemoryRun>,
}

impl MemoryParagraph {
	/// A paragraph with a single run.
	pub fn new(text: impl Into<String>) -> Self {
		Self {
			runs: vec![MemoryRun::new(text)],
		}
	}

	/// A paragraph with one unstyled run per item.
	pub fn from_runs<I, S>(runs: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			runs: runs.into_iter().map(MemoryRun::new).collect(),
		}
	}
}

impl Paragraph for MemoryParagraph {
	fn run_count(&self) -> usize {
		self.runs.len()
	}

	fn run_text(&self, index: usize) -> Option<&str> {
		self.runs.get(index).map(|run| run.text.as_str())
	}

	fn set_run_text(&mut self, index: usize, text: String) {
		if let Some(run) = self.runs.get_mut(index) {
			run.text = text;
		}
	}

	fn remove_run(&mut self, index: usize) {
		if index < self.runs.len() {
			self.runs.remove(index);
		}
	}
}

/// How a table cell takes part in a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellMerge {
	/// The cell spans this many grid columns.
	GridSpan(u32),
	Horizontal,
	Vertical,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryTableCell {
	#[serde(default)]
	pub paragraphs: Vec<MemoryParagraph>,
	#[serde(default)]
	pub merge: Option<CellMerge>,
}

impl MemoryTableCell {
	pub fn new(text: impl Into<String>) -> Self {
		Self {
			paragraphs: vec![MemoryParagraph::new(text)],
			merge: None,
		}
	}

	#[must_use]
	pub fn merged(mut self, merge: CellMerge) -> Self {
		self.merge = Some(merge);
		self
	}
}

impl TableCell for MemoryTableCell {
	type Paragraph = MemoryParagraph;

	fn paragraph_count(&self) -> usize {
		self.paragraphs.len()
	}

	fn paragraph(&self, index: usize) -> Option<&MemoryParagraph> {
		self.paragraphs.get(index)
	}

	fn paragraph_mut(&mut self, index: usize) -> Option<&mut MemoryParagraph> {
		self.paragraphs.get_mut(index)
	}

	fn is_merged(&self) -> bool {
		match self.merge {
			Some(CellMerge::GridSpan(span)) => span > 1,
			Some(CellMerge::Horizontal | CellMerge::Vertical) => true,
			None => false,
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryTableRow {
	#[serde(default)]
	pub cells: Vec<MemoryTableCell>,
}

impl MemoryTableRow {
	/// A row with one single-paragraph cell per text.
	pub fn from_texts<I, S>(texts: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			cells: texts.into_iter().map(MemoryTableCell::new).collect(),
		}
	}
}

impl TableRow for MemoryTableRow {
	type Cell = MemoryTableCell;

	fn cell_count(&self) -> usize {
		self.cells.len()
	}

	fn cell(&self, index: usize) -> Option<&MemoryTableCell> {
		self.cells.get(index)
	}

	fn cell_mut(&mut self, index: usize) -> Option<&mut MemoryTableCell> {
		self.cells.get_mut(index)
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryTable {
	#[serde(default)]
	pub rows: Vec<MemoryTableRow>,
}

impl MemoryTable {
	pub fn from_rows<R, I, S>(rows: R) -> Self
	where
		R: IntoIterator<Item = I>,
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			rows: rows.into_iter().map(MemoryTableRow::from_texts).collect(),
		}
	}

	/// The text of every cell, row by row.
	pub fn texts(&self) -> Vec<Vec<String>> {
		self.rows
			.iter()
			.map(|row| row.cells.iter().map(TableCell::text).collect())
			.collect()
	}
}

impl Table for MemoryTable {
	type Row = MemoryTableRow;

	fn row_count(&self) -> usize {
		self.rows.len()
	}

	fn row(&self, index: usize) -> Option<&MemoryTableRow> {
		self.rows.get(index)
	}

	fn row_mut(&mut self, index: usize) -> Option<&mut MemoryTableRow> {
		self.rows.get_mut(index)
	}

	fn clone_row(&mut self, source: usize, target: usize) -> FillResult<()> {
		let count = self.rows.len();
		let Some(row) = self.rows.get(source).cloned() else {
			return Err(FillError::RowOutOfRange { row: source, count });
		};

		if target > count {
			return Err(FillError::RowOutOfRange { row: target, count });
		}

		self.rows.insert(target, row);
		Ok(())
	}

	fn remove_row(&mut self, index: usize) -> FillResult<()> {
		if index >= self.rows.len() {
			return Err(FillError::RowOutOfRange {
				row: index,
				count: self.rows.len(),
			});
		}

		self.rows.remove(index);
		Ok(())
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryBody {
	#[serde(default)]
	pub paragraphs: Vec<MemoryParagraph>,
	#[serde(default)]
	pub tables: Vec<MemoryTable>,
}

impl Body for MemoryBody {
	type Paragraph = MemoryParagraph;
	type Table = MemoryTable;

	fn paragraph_count(&self) -> usize {
		self.paragraphs.len()
	}

	fn paragraph(&self, index: usize) -> Option<&MemoryParagraph> {
		self.paragraphs.get(index)
	}

	fn paragraph_mut(&mut self, index: usize) -> Option<&mut MemoryParagraph> {
		self.paragraphs.get_mut(index)
	}

	fn table_count(&self) -> usize {
		self.tables.len()
	}

	fn table(&self, index: usize) -> Option<&MemoryTable> {
		self.tables.get(index)
	}

	fn table_mut(&mut self, index: usize) -> Option<&mut MemoryTable> {
		self.tables.get_mut(index)
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryDocument {
	#[serde(default)]
	pub body: MemoryBody,
	#[serde(default)]
	pub headers: Vec<MemoryBody>,
	#[serde(default)]
	pub footers: Vec<MemoryBody>,
}

impl FlowDocument for MemoryDocument {
	type Part = MemoryBody;

	fn body(&self) -> &MemoryBody {
		&self.body
	}

	fn body_mut(&mut self) -> &mut MemoryBody {
		&mut self.body
	}

	fn header_count(&self) -> usize {
		self.headers.len()
	}

	fn header(&self, index: usize) -> Option<&MemoryBody> {
		self.headers.get(index)
	}

	fn header_mut(&mut self, index: usize) -> Option<&mut MemoryBody> {
		self.headers.get_mut(index)
	}

	fn footer_count(&self) -> usize {
		self.footers.len()
	}

	fn footer(&self, index: usize) -> Option<&MemoryBody> {
		self.footers.get(index)
	}

	fn footer_mut(&mut self, index: usize) -> Option<&mut MemoryBody> {
		self.footers.get_mut(index)
	}
}
