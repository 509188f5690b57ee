use std::fmt;

use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::instrument;
use tracing::warn;

use crate::Body;
use crate::CollectionFiller;
use crate::FillError;
use crate::FillOptions;
use crate::FillOutcome;
use crate::FillResult;
use crate::Filler;
use crate::FlowDocument;
use crate::Paragraph;
use crate::PlaceholderKind;
use crate::ScalarFiller;
use crate::Sheet;
use crate::SheetCell;
use crate::Source;
use crate::Table;
use crate::TableCell;
use crate::TableRow;
use crate::Value;
use crate::Workbook;
use crate::memory::MemoryDocument;
use crate::memory::MemoryWorkbook;

/// Which part of a flow document a location refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Part {
	Body,
	Header(usize),
	Footer(usize),
}

impl fmt::Display for Part {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Part::Body => write!(f, "body"),
			Part::Header(index) => write!(f, "header {index}"),
			Part::Footer(index) => write!(f, "footer {index}"),
		}
	}
}

/// Where a placeholder was found. Indices are 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
	Cell {
		sheet: String,
		row: usize,
		column: usize,
	},
	Paragraph {
		part: Part,
		index: usize,
	},
	Table {
		part: Part,
		table: usize,
	},
	TableCell {
		part: Part,
		table: usize,
		row: usize,
		column: usize,
	},
}

impl fmt::Display for Location {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Location::Cell { sheet, row, column } => {
				write!(f, "sheet `{sheet}` row {row} column {column}")
			}
			Location::Paragraph { part, index } => write!(f, "{part} paragraph {index}"),
			Location::Table { part, table } => write!(f, "{part} table {table}"),
			Location::TableCell {
				part,
				table,
				row,
				column,
			} => write!(f, "{part} table {table} row {row} column {column}"),
		}
	}
}

/// A placeholder that was left in the output because its path did not
/// resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedPlaceholder {
	pub location: Location,
	/// The placeholder as written, e.g. `{Customer:Name}`.
	pub placeholder: String,
}

/// Summary of one fill operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
	pub scalars_filled: usize,
	pub collections_expanded: usize,
	pub rows_emitted: usize,
	/// Placeholders left verbatim in the output.
	pub unresolved: Vec<UnresolvedPlaceholder>,
}

impl FillReport {
	/// Returns true if every placeholder was resolved.
	pub fn is_complete(&self) -> bool {
		self.unresolved.is_empty()
	}

	/// Returns true if anything was substituted or expanded.
	pub fn has_changes(&self) -> bool {
		self.scalars_filled > 0 || self.collections_expanded > 0
	}

	fn absorb(&mut self, outcome: FillOutcome, location: impl Fn() -> Location) {
		self.scalars_filled += outcome.filled;
		self.collections_expanded += outcome.expanded;
		self.rows_emitted += outcome.rows_emitted;

		for placeholder in outcome.unresolved {
			self.unresolved.push(UnresolvedPlaceholder {
				location: location(),
				placeholder,
			});
		}
	}
}

/// A placeholder found by [`collect_placeholders`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderUse {
	pub kind: PlaceholderKind,
	/// The placeholder as written.
	pub text: String,
	pub location: Location,
}

/// A template that can be filled.
pub trait Fillable {
	fn fill_with(
		&mut self,
		source: &Source<'_>,
		options: &FillOptions,
		cancel: &CancellationToken,
	) -> FillResult<FillReport>;

	/// Every placeholder in the template, in traversal order.
	fn placeholders(&self) -> Vec<PlaceholderUse>;
}

impl Fillable for MemoryWorkbook {
	fn fill_with(
		&mut self,
		source: &Source<'_>,
		options: &FillOptions,
		cancel: &CancellationToken,
	) -> FillResult<FillReport> {
		fill_workbook(self, source, options, cancel)
	}

	fn placeholders(&self) -> Vec<PlaceholderUse> {
		workbook_placeholders(self)
	}
}

impl Fillable for MemoryDocument {
	fn fill_with(
		&mut self,
		source: &Source<'_>,
		options: &FillOptions,
		cancel: &CancellationToken,
	) -> FillResult<FillReport> {
		fill_document(self, source, options, cancel)
	}

	fn placeholders(&self) -> Vec<PlaceholderUse> {
		document_placeholders(self)
	}
}

fn ensure_active(cancel: &CancellationToken) -> FillResult<()> {
	if cancel.is_cancelled() {
		warn!("fill cancelled");
		return Err(FillError::Cancelled);
	}

	Ok(())
}

/// Fill every sheet of a workbook. Collection placeholders are expanded
/// before scalar placeholders are replaced, so rows created by an expansion
/// get their scalars filled too.
#[instrument(skip_all, fields(sheets = workbook.sheet_count()))]
pub fn fill_workbook<W: Workbook + ?Sized>(
	workbook: &mut W,
	source: &Source<'_>,
	options: &FillOptions,
	cancel: &CancellationToken,
) -> FillResult<FillReport> {
	let scalars = ScalarFiller::new(options.clone());
	let collections = CollectionFiller::new(options.clone(), cancel.clone());
	let mut report = FillReport::default();

	for index in 0..workbook.sheet_count() {
		let Some(sheet) = workbook.sheet_mut(index) else {
			continue;
		};

		debug!(sheet = sheet.name(), "filling sheet");
		fill_sheet(sheet, &collections, source, cancel, &mut report)?;
		fill_sheet(sheet, &scalars, source, cancel, &mut report)?;
	}

	Ok(report)
}

/// One pass over every existing cell of a sheet. Rows added while the pass
/// runs are visited as well.
fn fill_sheet<S, F>(
	sheet: &mut S,
	filler: &F,
	source: &Source<'_>,
	cancel: &CancellationToken,
	report: &mut FillReport,
) -> FillResult<()>
where
	S: Sheet + ?Sized,
	F: for<'s> Filler<SheetCell<'s, S>>,
{
	let Some(mut row) = sheet.first_row() else {
		return Ok(());
	};
	let name = sheet.name().to_string();

	while sheet.last_row().is_some_and(|last| row <= last) {
		ensure_active(cancel)?;

		for column in sheet.cell_columns(row) {
			let mut cell = SheetCell::new(&mut *sheet, row, column);
			if !filler.check(&cell) {
				continue;
			}

			let outcome = filler.fill(&mut cell, source)?;
			report.absorb(outcome, || {
				Location::Cell {
					sheet: name.clone(),
					row,
					column,
				}
			});
		}

		row += 1;
	}

	Ok(())
}

/// Fill a flow document: the body first, then headers and footers as
/// enabled by [`FillOptions::flow`].
#[instrument(skip_all, fields(headers = document.header_count(), footers = document.footer_count()))]
pub fn fill_document<D: FlowDocument + ?Sized>(
	document: &mut D,
	source: &Source<'_>,
	options: &FillOptions,
	cancel: &CancellationToken,
) -> FillResult<FillReport> {
	let pass = FlowPass {
		scalars: ScalarFiller::new(options.clone()),
		collections: CollectionFiller::new(options.clone(), cancel.clone()),
		source,
		cancel,
	};
	let mut report = FillReport::default();

	pass.fill_part(document.body_mut(), Part::Body, true, &mut report)?;

	if options.flow.headers {
		for index in 0..document.header_count() {
			if let Some(header) = document.header_mut(index) {
				let expand = options.flow.expand_part_tables;
				pass.fill_part(header, Part::Header(index), expand, &mut report)?;
			}
		}
	}

	if options.flow.footers {
		for index in 0..document.footer_count() {
			if let Some(footer) = document.footer_mut(index) {
				let expand = options.flow.expand_part_tables;
				pass.fill_part(footer, Part::Footer(index), expand, &mut report)?;
			}
		}
	}

	Ok(report)
}

struct FlowPass<'a, 'd> {
	scalars: ScalarFiller,
	collections: CollectionFiller,
	source: &'a Source<'d>,
	cancel: &'a CancellationToken,
}

impl FlowPass<'_, '_> {
	fn fill_part<B: Body + ?Sized>(
		&self,
		part: &mut B,
		which: Part,
		expand_tables: bool,
		report: &mut FillReport,
	) -> FillResult<()> {
		for index in 0..part.paragraph_count() {
			ensure_active(self.cancel)?;
			let Some(paragraph) = part.paragraph_mut(index) else {
				continue;
			};

			self.fill_paragraph(paragraph, report, || {
				Location::Paragraph { part: which, index }
			})?;
		}

		for table_index in 0..part.table_count() {
			ensure_active(self.cancel)?;
			let Some(table) = part.table_mut(table_index) else {
				continue;
			};

			if expand_tables && self.collections.check(&*table) {
				let outcome = self.collections.fill(table, self.source)?;
				report.absorb(outcome, || {
					Location::Table {
						part: which,
						table: table_index,
					}
				});
			}

			self.fill_table_cells(table, which, table_index, report)?;
		}

		Ok(())
	}

	fn fill_table_cells<T: Table + ?Sized>(
		&self,
		table: &mut T,
		which: Part,
		table_index: usize,
		report: &mut FillReport,
	) -> FillResult<()> {
		for row_index in 0..table.row_count() {
			let Some(row) = table.row_mut(row_index) else {
				continue;
			};

			for column in 0..row.cell_count() {
				let Some(cell) = row.cell_mut(column) else {
					continue;
				};

				for index in 0..cell.paragraph_count() {
					let Some(paragraph) = cell.paragraph_mut(index) else {
						continue;
					};

					self.fill_paragraph(paragraph, report, || {
						Location::TableCell {
							part: which,
							table: table_index,
							row: row_index,
							column,
						}
					})?;
				}
			}
		}

		Ok(())
	}

	fn fill_paragraph<P: Paragraph + ?Sized>(
		&self,
		paragraph: &mut P,
		report: &mut FillReport,
		location: impl Fn() -> Location,
	) -> FillResult<()> {
		if !self.scalars.check(&*paragraph) {
			return Ok(());
		}

		let outcome = self.scalars.fill(paragraph, self.source)?;
		report.absorb(outcome, location);

		Ok(())
	}
}

/// Every placeholder in a template, without modifying it.
pub fn collect_placeholders<T: Fillable + ?Sized>(template: &T) -> Vec<PlaceholderUse> {
	template.placeholders()
}

fn placeholders_in(text: &str, location: &impl Fn() -> Location, found: &mut Vec<PlaceholderUse>) {
	let mut matches: Vec<_> = [PlaceholderKind::Collection, PlaceholderKind::Scalar]
		.into_iter()
		.flat_map(|kind| {
			kind.pattern()
				.find_iter(text)
				.map(move |matched| (matched.start(), kind, matched.as_str()))
		})
		.collect();
	matches.sort_by_key(|(start, ..)| *start);

	found.extend(matches.into_iter().map(|(_, kind, matched)| {
		PlaceholderUse {
			kind,
			text: matched.to_string(),
			location: location(),
		}
	}));
}

/// Placeholders in every cell of every sheet.
pub fn workbook_placeholders<W: Workbook + ?Sized>(workbook: &W) -> Vec<PlaceholderUse> {
	let mut found = Vec::new();

	for index in 0..workbook.sheet_count() {
		let Some(sheet) = workbook.sheet(index) else {
			continue;
		};
		let (Some(first), Some(last)) = (sheet.first_row(), sheet.last_row()) else {
			continue;
		};

		for row in first..=last {
			for column in sheet.cell_columns(row) {
				let Some(text) = sheet
					.cell_value(row, column)
					.and_then(|value| value.as_text().map(str::to_string))
				else {
					continue;
				};

				let location = || {
					Location::Cell {
						sheet: sheet.name().to_string(),
						row,
						column,
					}
				};
				placeholders_in(&text, &location, &mut found);
			}
		}
	}

	found
}

/// Placeholders in the body, headers and footers of a flow document.
pub fn document_placeholders<D: FlowDocument + ?Sized>(document: &D) -> Vec<PlaceholderUse> {
	let mut found = Vec::new();
	part_placeholders(document.body(), Part::Body, &mut found);

	for index in 0..document.header_count() {
		if let Some(header) = document.header(index) {
			part_placeholders(header, Part::Header(index), &mut found);
		}
	}

	for index in 0..document.footer_count() {
		if let Some(footer) = document.footer(index) {
			part_placeholders(footer, Part::Footer(index), &mut found);
		}
	}

	found
}

fn part_placeholders<B: Body + ?Sized>(part: &B, which: Part, found: &mut Vec<PlaceholderUse>) {
	for index in 0..part.paragraph_count() {
		if let Some(paragraph) = part.paragraph(index) {
			let location = || Location::Paragraph { part: which, index };
			placeholders_in(&paragraph.text(), &location, found);
		}
	}

	for table_index in 0..part.table_count() {
		let Some(table) = part.table(table_index) else {
			continue;
		};

		for row_index in 0..table.row_count() {
			let Some(row) = table.row(row_index) else {
				continue;
			};

			for column in 0..row.cell_count() {
				let Some(cell) = row.cell(column) else {
					continue;
				};
				let location = || {
					Location::TableCell {
						part: which,
						table: table_index,
						row: row_index,
						column,
					}
				};

				for index in 0..cell.paragraph_count() {
					if let Some(paragraph) = cell.paragraph(index) {
						placeholders_in(&paragraph.text(), &location, found);
					}
				}
			}
		}
	}
}

/// Fills templates with data.
///
/// Holds the options, an optional path prefix applied to every lookup and
/// the cancellation token checked between rows, paragraphs, tables and
/// batch items.
#[derive(Debug, Clone, Default)]
pub struct TemplateFiller {
	options: FillOptions,
	prefix: Option<String>,
	cancel: CancellationToken,
}

impl TemplateFiller {
	pub fn new(options: FillOptions) -> Self {
		Self {
			options,
			prefix: None,
			cancel: CancellationToken::new(),
		}
	}

	/// Resolve every placeholder path below `prefix`.
	#[must_use]
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = Some(prefix.into());
		self
	}

	#[must_use]
	pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
		self.cancel = cancel;
		self
	}

	pub fn options(&self) -> &FillOptions {
		&self.options
	}

	pub fn cancellation(&self) -> &CancellationToken {
		&self.cancel
	}

	fn source<'d>(&self, data: &'d Value) -> Source<'d> {
		match &self.prefix {
			Some(prefix) => Source::new(data).with_prefix(prefix.as_str()),
			None => Source::new(data),
		}
	}

	/// Fill `template` in place.
	pub fn fill<T: Fillable + ?Sized>(&self, template: &mut T, data: &Value) -> FillResult<FillReport> {
		ensure_active(&self.cancel)?;
		let source = self.source(data);
		let report = template.fill_with(&source, &self.options, &self.cancel)?;

		debug!(
			scalars = report.scalars_filled,
			collections = report.collections_expanded,
			unresolved = report.unresolved.len(),
			"filled template"
		);

		Ok(report)
	}

	/// Fill a fresh copy of `template` for every data value.
	///
	/// `sink` receives each copy only after it has been filled completely.
	/// The template itself is never modified.
	pub fn fill_batch<'v, T, I, F>(
		&self,
		template: &T,
		data: I,
		mut sink: F,
	) -> FillResult<Vec<FillReport>>
	where
		T: Fillable + Clone,
		I: IntoIterator<Item = &'v Value>,
		F: FnMut(usize, T) -> FillResult<()>,
	{
		let mut reports = Vec::new();

		for (index, value) in data.into_iter().enumerate() {
			ensure_active(&self.cancel)?;
			let mut copy = template.clone();
			let report = self.fill(&mut copy, value)?;
			sink(index, copy)?;
			reports.push(report);
		}

		Ok(reports)
	}

	/// [`TemplateFiller::fill`] for async callers. Runs to completion without
	/// yielding.
	#[allow(clippy::unused_async)]
	pub async fn fill_async<T: Fillable + ?Sized>(
		&self,
		template: &mut T,
		data: &Value,
	) -> FillResult<FillReport> {
		self.fill(template, data)
	}

	/// [`TemplateFiller::fill_batch`] for async callers. Runs to completion
	/// without yielding.
	#[allow(clippy::unused_async)]
	pub async fn fill_batch_async<'v, T, I, F>(
		&self,
		template: &T,
		data: I,
		sink: F,
	) -> FillResult<Vec<FillReport>>
	where
		T: Fillable + Clone,
		I: IntoIterator<Item = &'v Value>,
		F: FnMut(usize, T) -> FillResult<()>,
	{
		self.fill_batch(template, data, sink)
	}
}
