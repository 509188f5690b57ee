use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::trace;

use crate::COLLECTION_PATTERN;
use crate::CellValue;
use crate::CollectionPlaceholder;
use crate::FillError;
use crate::FillOptions;
use crate::FillOutcome;
use crate::FillResult;
use crate::Filler;
use crate::Paragraph;
use crate::Sheet;
use crate::SheetCell;
use crate::Source;
use crate::Table;
use crate::TableCell;
use crate::TableRow;
use crate::Value;
use crate::align;
use crate::classify;
use crate::first_collection;
use crate::replace_first;
use crate::resolve;
use crate::splice;

/// Expands `[collection]` and `[collection.property]` placeholders into one
/// row per item.
///
/// Spreadsheet cells expand downwards from the anchor cell. Tables expand
/// every collection column of a template row together, then drop the
/// template row.
#[derive(Debug, Clone, Default)]
pub struct CollectionFiller {
	options: FillOptions,
	cancel: CancellationToken,
}

impl CollectionFiller {
	pub fn new(options: FillOptions, cancel: CancellationToken) -> Self {
		Self { options, cancel }
	}

	fn ensure_active(&self) -> FillResult<()> {
		if self.cancel.is_cancelled() {
			return Err(FillError::Cancelled);
		}

		Ok(())
	}

	fn items(
		&self,
		placeholder: &CollectionPlaceholder,
		source: &Source<'_>,
		outcome: &mut FillOutcome,
	) -> Option<Arc<Vec<Value>>> {
		let items = source.items(&placeholder.collection);
		if items.is_none() {
			debug!(
				collection = %placeholder.collection,
				"collection placeholder did not resolve to a sequence"
			);
			outcome.unresolved.push(placeholder.source_text());
		}

		items
	}
}

/// The value written for one item: the item itself or its property.
fn item_value(item: &Value, property: Option<&str>) -> Option<(Value, Option<&'static str>)> {
	match property {
		None => Some((item.clone(), None)),
		Some(property) => {
			resolve(item, property).map(|resolved| (resolved.value.into_owned(), resolved.format))
		}
	}
}

fn cell_has_collection<C: TableCell + ?Sized>(cell: &C) -> bool {
	(0..cell.paragraph_count()).any(|index| {
		cell.paragraph(index)
			.is_some_and(|paragraph| COLLECTION_PATTERN.is_match(&paragraph.text()))
	})
}

impl<S: Sheet + ?Sized> Filler<SheetCell<'_, S>> for CollectionFiller {
	fn check(&self, cell: &SheetCell<'_, S>) -> bool {
		cell.text()
			.is_some_and(|text| COLLECTION_PATTERN.is_match(&text))
	}

	fn fill(&self, cell: &mut SheetCell<'_, S>, source: &Source<'_>) -> FillResult<FillOutcome> {
		let mut outcome = FillOutcome::default();
		let Some(template) = cell.text() else {
			return Ok(outcome);
		};
		let Some(placeholder) = first_collection(&template) else {
			return Ok(outcome);
		};
		let Some(items) = self.items(&placeholder, source, &mut outcome) else {
			return Ok(outcome);
		};

		let native = classify(&template, &COLLECTION_PATTERN).is_single_placeholder();
		let anchor = cell.row;
		let column = cell.column;
		let sheet = &mut *cell.sheet;
		let row_styles: Vec<_> = sheet
			.cell_columns(anchor)
			.filter_map(|col| sheet.cell_style(anchor, col).map(|style| (col, style)))
			.collect();
		let anchor_style = sheet.cell_style(anchor, column);
		let mut missing_property = false;
		// Where the template cell currently sits. Moves when rows are shifted
		// over a merged anchor.
		let mut template_row = anchor;

		for (offset, item) in items.iter().enumerate() {
			self.ensure_active()?;
			let target = anchor + offset;

			let fresh_row = if !sheet.has_row(target) {
				true
			} else if sheet.is_merged(target, column)
				|| (offset > 0
					&& sheet
						.cell_value(target, column)
						.is_some_and(|value| value.has_content()))
			{
				trace!(target, "shifting rows to keep existing content");
				sheet.shift_rows(target, 1);
				if template_row >= target {
					template_row += 1;
				}
				true
			} else {
				false
			};

			if fresh_row {
				sheet.create_row(target);
				for (col, style) in &row_styles {
					sheet.set_cell_style(target, *col, style.clone());
				}
			} else if let Some(style) = &anchor_style {
				sheet.set_cell_style(target, column, style.clone());
			}

			let (value, format) = match item_value(item, placeholder.property.as_deref()) {
				Some(found) => found,
				None => {
					missing_property = true;
					(Value::Null, None)
				}
			};

			let cell_value = if native {
				CellValue::from_value(&value, &self.options, format)
			} else {
				let rendered = value.render(&self.options, format);
				CellValue::Text(replace_first(&template, &COLLECTION_PATTERN, &rendered))
			};

			sheet.set_cell_value(target, column, cell_value);
			outcome.rows_emitted += 1;
		}

		// A displaced template cell must not be expanded a second time.
		if template_row != anchor {
			sheet.set_cell_value(template_row, column, CellValue::Blank);
		}

		if missing_property {
			outcome.unresolved.push(placeholder.source_text());
		}

		outcome.expanded += 1;
		debug!(
			collection = %placeholder.collection,
			rows = outcome.rows_emitted,
			"expanded collection in sheet"
		);

		Ok(outcome)
	}
}

/// One collection column of a table template row.
#[derive(Debug)]
struct ColumnCursor {
	column: usize,
	placeholder: String,
	items: Arc<Vec<Value>>,
	property: Option<String>,
	position: usize,
	active: bool,
	missing_property: bool,
}

impl ColumnCursor {
	fn advance(&mut self, options: &FillOptions) -> Option<String> {
		if !self.active {
			return None;
		}

		let Some(item) = self.items.get(self.position) else {
			self.active = false;
			return None;
		};
		self.position += 1;

		match item_value(item, self.property.as_deref()) {
			Some((value, format)) => Some(value.render(options, format)),
			None => {
				self.missing_property = true;
				Some(String::new())
			}
		}
	}
}

/// Rows of values produced by advancing every cursor together. Exhausted
/// cursors yield empty text until every cursor is exhausted.
struct Generations<'c> {
	cursors: &'c mut [ColumnCursor],
	options: &'c FillOptions,
}

impl Iterator for Generations<'_> {
	type Item = Vec<String>;

	fn next(&mut self) -> Option<Self::Item> {
		let options = self.options;
		let values: Vec<Option<String>> = self
			.cursors
			.iter_mut()
			.map(|cursor| cursor.advance(options))
			.collect();

		if values.iter().all(Option::is_none) {
			return None;
		}

		Some(values.into_iter().map(Option::unwrap_or_default).collect())
	}
}

impl CollectionFiller {
	fn cursors<R: TableRow + ?Sized>(
		&self,
		row: &R,
		source: &Source<'_>,
		outcome: &mut FillOutcome,
	) -> Vec<ColumnCursor> {
		let mut cursors = Vec::new();

		for column in 0..row.cell_count() {
			let Some(cell) = row.cell(column) else {
				continue;
			};
			let placeholder = (0..cell.paragraph_count())
				.filter_map(|index| cell.paragraph(index))
				.find_map(|paragraph| first_collection(&paragraph.text()));
			let Some(placeholder) = placeholder else {
				continue;
			};
			let Some(items) = self.items(&placeholder, source, outcome) else {
				continue;
			};

			cursors.push(ColumnCursor {
				column,
				placeholder: placeholder.source_text(),
				items,
				property: placeholder.property.clone(),
				position: 0,
				active: true,
				missing_property: false,
			});
		}

		cursors
	}

	/// Emit the generated rows below `template` and return how many were
	/// written.
	fn expand_row<T: Table + ?Sized>(
		&self,
		table: &mut T,
		template: usize,
		cursors: &mut [ColumnCursor],
	) -> FillResult<usize> {
		let columns: Vec<usize> = cursors.iter().map(|cursor| cursor.column).collect();
		let generations = Generations {
			cursors,
			options: &self.options,
		};
		let mut emitted = 0;

		for values in generations {
			self.ensure_active()?;
			let target = template + 1 + emitted;

			if target < table.row_count() {
				let occupied = table.row(target).is_some_and(|row| {
					columns.iter().any(|column| {
						row.cell(*column).is_some_and(|cell| {
							cell.is_merged() || !cell.text().trim().is_empty()
						})
					})
				});

				if !occupied {
					table.remove_row(target)?;
				}
			}

			table.clone_row(template, target)?;

			let count = table.row_count();
			let row = table
				.row_mut(target)
				.ok_or(FillError::RowOutOfRange { row: target, count })?;

			for (column, value) in columns.iter().zip(&values) {
				if let Some(cell) = row.cell_mut(*column) {
					substitute_first(cell, value)?;
				}
			}

			emitted += 1;
		}

		Ok(emitted)
	}
}

/// Splice `value` over the first collection placeholder of the first
/// paragraph that has one.
fn substitute_first<C: TableCell + ?Sized>(cell: &mut C, value: &str) -> FillResult<()> {
	for index in 0..cell.paragraph_count() {
		let Some(paragraph) = cell.paragraph_mut(index) else {
			continue;
		};
		let alignments = align(&paragraph.runs(), &COLLECTION_PATTERN);
		if let Some(first) = alignments.first() {
			return splice(paragraph, first, value);
		}
	}

	Ok(())
}

impl<T: Table + ?Sized> Filler<T> for CollectionFiller {
	fn check(&self, table: &T) -> bool {
		(0..table.row_count()).any(|index| {
			table.row(index).is_some_and(|row| {
				(0..row.cell_count()).any(|column| row.cell(column).is_some_and(cell_has_collection))
			})
		})
	}

	fn fill(&self, table: &mut T, source: &Source<'_>) -> FillResult<FillOutcome> {
		let mut outcome = FillOutcome::default();
		let mut index = 0;

		while index < table.row_count() {
			self.ensure_active()?;

			let mut cursors = match table.row(index) {
				Some(row) => self.cursors(row, source, &mut outcome),
				None => Vec::new(),
			};

			if cursors.is_empty() {
				index += 1;
				continue;
			}

			let emitted = self.expand_row(table, index, &mut cursors)?;
			table.remove_row(index)?;

			outcome.unresolved.extend(
				cursors
					.iter()
					.filter(|cursor| cursor.missing_property)
					.map(|cursor| cursor.placeholder.clone()),
			);

			debug!(row = index, rows = emitted, "expanded table template row");
			outcome.expanded += cursors.len();
			outcome.rows_emitted += emitted;
			index += emitted;
		}

		Ok(outcome)
	}
}
