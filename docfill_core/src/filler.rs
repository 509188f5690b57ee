use crate::FillResult;
use crate::Sheet;
use crate::Source;

/// Fills placeholders of one kind inside one structural unit.
///
/// Fillers hold no per-target state, so one instance is reused across every
/// cell, paragraph or table of a fill pass by passing each target in turn.
pub trait Filler<T: ?Sized> {
	/// Whether `target` holds at least one placeholder this filler handles.
	fn check(&self, target: &T) -> bool;

	/// Substitute the placeholders in `target` using `source`.
	fn fill(&self, target: &mut T, source: &Source<'_>) -> FillResult<FillOutcome>;
}

/// What a single [`Filler::fill`] call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillOutcome {
	/// Scalar placeholders replaced.
	pub filled: usize,
	/// Collection placeholders expanded.
	pub expanded: usize,
	/// Rows written by collection expansion.
	pub rows_emitted: usize,
	/// Placeholders left untouched because their path did not resolve, in
	/// document order.
	pub unresolved: Vec<String>,
}

impl FillOutcome {
	pub fn changed(&self) -> bool {
		self.filled > 0 || self.expanded > 0
	}

	pub fn merge(&mut self, other: FillOutcome) {
		self.filled += other.filled;
		self.expanded += other.expanded;
		self.rows_emitted += other.rows_emitted;
		self.unresolved.extend(other.unresolved);
	}
}

/// One cell of a [`Sheet`], addressed for filling.
#[derive(Debug)]
pub struct SheetCell<'s, S: Sheet + ?Sized> {
	pub sheet: &'s mut S,
	pub row: usize,
	pub column: usize,
}

impl<'s, S: Sheet + ?Sized> SheetCell<'s, S> {
	pub fn new(sheet: &'s mut S, row: usize, column: usize) -> Self {
		Self { sheet, row, column }
	}

	/// The cell's text, `None` for missing or non-text cells.
	pub fn text(&self) -> Option<String> {
		self.sheet
			.cell_value(self.row, self.column)
			.and_then(|value| value.as_text().map(str::to_string))
	}
}
