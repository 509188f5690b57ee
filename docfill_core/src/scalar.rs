use tracing::debug;
use tracing::trace;

use crate::CellValue;
use crate::FillOptions;
use crate::FillOutcome;
use crate::FillResult;
use crate::Filler;
use crate::Paragraph;
use crate::Resolved;
use crate::SCALAR_PATTERN;
use crate::Sheet;
use crate::SheetCell;
use crate::Source;
use crate::align;
use crate::classify;
use crate::has_scalar;
use crate::scalar_path;
use crate::splice;

/// Replaces `{path}` placeholders in paragraphs and spreadsheet cells.
#[derive(Debug, Clone, Default)]
pub struct ScalarFiller {
	options: FillOptions,
}

impl ScalarFiller {
	pub fn new(options: FillOptions) -> Self {
		Self { options }
	}

	pub fn options(&self) -> &FillOptions {
		&self.options
	}

	fn render(&self, resolved: &Resolved<'_>) -> String {
		resolved.value.render(&self.options, resolved.format)
	}
}

impl<P: Paragraph + ?Sized> Filler<P> for ScalarFiller {
	fn check(&self, paragraph: &P) -> bool {
		has_scalar(&paragraph.text())
	}

	fn fill(&self, paragraph: &mut P, source: &Source<'_>) -> FillResult<FillOutcome> {
		let text = paragraph.text();
		let classification = classify(&text, &SCALAR_PATTERN);
		let mut outcome = FillOutcome::default();

		if !classification.is_match {
			return Ok(outcome);
		}

		if classification.is_single_placeholder() {
			let Some(path) = scalar_path(&text) else {
				return Ok(outcome);
			};

			match source.get(path) {
				Some(resolved) => {
					collapse_runs(paragraph, self.render(&resolved));
					outcome.filled += 1;
				}
				None => {
					debug!(path, "unresolved placeholder left in paragraph");
					outcome.unresolved.push(text.clone());
				}
			}

			return Ok(outcome);
		}

		let alignments = align(&paragraph.runs(), &SCALAR_PATTERN);

		// Later matches first so earlier fragment indices stay valid.
		for alignment in alignments.iter().rev() {
			let Some(path) = scalar_path(&alignment.key) else {
				continue;
			};

			match source.get(path) {
				Some(resolved) => {
					splice(paragraph, alignment, &self.render(&resolved))?;
					outcome.filled += 1;
				}
				None => {
					debug!(path, "unresolved placeholder left in paragraph");
					outcome.unresolved.push(alignment.key.clone());
				}
			}
		}

		outcome.unresolved.reverse();
		trace!(filled = outcome.filled, "filled paragraph");

		Ok(outcome)
	}
}

/// Put `text` into the first run and drop the rest.
fn collapse_runs<P: Paragraph + ?Sized>(paragraph: &mut P, text: String) {
	for index in (1..paragraph.run_count()).rev() {
		paragraph.remove_run(index);
	}

	paragraph.set_run_text(0, text);
}

impl<S: Sheet + ?Sized> Filler<SheetCell<'_, S>> for ScalarFiller {
	fn check(&self, cell: &SheetCell<'_, S>) -> bool {
		cell.text().is_some_and(|text| has_scalar(&text))
	}

	fn fill(&self, cell: &mut SheetCell<'_, S>, source: &Source<'_>) -> FillResult<FillOutcome> {
		let mut outcome = FillOutcome::default();
		let Some(text) = cell.text() else {
			return Ok(outcome);
		};

		let classification = classify(&text, &SCALAR_PATTERN);
		if !classification.is_match {
			return Ok(outcome);
		}

		if classification.is_single_placeholder() {
			let resolved = scalar_path(&text).and_then(|path| source.get(path));

			match resolved {
				Some(resolved) => {
					let value = CellValue::from_value(&resolved.value, &self.options, resolved.format);
					cell.sheet.set_cell_value(cell.row, cell.column, value);
					outcome.filled += 1;
				}
				None => {
					debug!(row = cell.row, column = cell.column, placeholder = %text, "unresolved placeholder left in cell");
					outcome.unresolved.push(text);
				}
			}

			return Ok(outcome);
		}

		let updated = SCALAR_PATTERN.replace_all(&text, |captures: &regex::Captures<'_>| {
			let placeholder = &captures[0];
			match source.get(&captures[1]) {
				Some(resolved) => {
					outcome.filled += 1;
					self.render(&resolved)
				}
				None => {
					debug!(row = cell.row, column = cell.column, placeholder, "unresolved placeholder left in cell");
					outcome.unresolved.push(placeholder.to_string());
					placeholder.to_string()
				}
			}
		});

		if outcome.filled > 0 {
			let updated = updated.into_owned();
			cell.sheet
				.set_cell_value(cell.row, cell.column, CellValue::Text(updated));
		}

		Ok(outcome)
	}
}
