use std::ops::Range;

use derive_more::Deref;
use derive_more::DerefMut;
use regex::Regex;

use crate::FillError;
use crate::FillResult;
use crate::Paragraph;

/// The part of one fragment covered by a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentSpan {
	pub fragment: usize,
	/// Byte offset inside the fragment.
	pub start: usize,
	pub len: usize,
}

impl FragmentSpan {
	pub fn range(&self) -> Range<usize> {
		self.start..self.start + self.len
	}
}

/// Where one match over the concatenated fragments lives in the fragments
/// themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
	/// The matched text.
	pub key: String,
	/// Byte range of the match in the concatenated text.
	pub range: Range<usize>,
	/// Covered fragments in ascending order.
	pub spans: Vec<FragmentSpan>,
}

impl Alignment {
	/// Re-read the matched text from the fragments.
	pub fn replay<S: AsRef<str>>(&self, fragments: &[S]) -> String {
		self.spans
			.iter()
			.filter_map(|span| fragments.get(span.fragment)?.as_ref().get(span.range()))
			.collect()
	}
}

/// Every alignment for one pattern, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut)]
pub struct Alignments(Vec<Alignment>);

impl IntoIterator for Alignments {
	type IntoIter = std::vec::IntoIter<Alignment>;
	type Item = Alignment;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

/// Map every match of `pattern` over the concatenated `fragments` back onto
/// the fragments.
///
/// After each match the walk resumes from the last fragment it touched,
/// since the next match may begin in the same fragment.
pub fn align<S: AsRef<str>>(fragments: &[S], pattern: &Regex) -> Alignments {
	let text: String = fragments.iter().map(AsRef::as_ref).collect();
	let mut alignments = Vec::new();
	let mut fragment = 0;
	let mut offset = 0;

	for found in pattern.find_iter(&text) {
		let mut spans = Vec::new();
		let mut index = fragment;
		let mut start = offset;

		while let Some(current) = fragments.get(index) {
			let end = start + current.as_ref().len();
			let overlap_start = found.start().max(start);
			let overlap_end = found.end().min(end);

			if overlap_end > overlap_start {
				spans.push(FragmentSpan {
					fragment: index,
					start: overlap_start - start,
					len: overlap_end - overlap_start,
				});
			}

			if end >= found.end() {
				break;
			}

			start = end;
			index += 1;
		}

		fragment = index;
		offset = start;

		alignments.push(Alignment {
			key: found.as_str().to_string(),
			range: found.range(),
			spans,
		});
	}

	Alignments(alignments)
}

/// Replace the text covered by `alignment` with `replacement`.
///
/// A match inside one fragment is replaced in place. A match over several
/// fragments keeps the text before it in the head fragment followed by the
/// replacement, keeps the text after it in the tail fragment, deletes the
/// tail if nothing is left of it and deletes every fragment in between.
pub fn splice<P: Paragraph + ?Sized>(
	paragraph: &mut P,
	alignment: &Alignment,
	replacement: &str,
) -> FillResult<()> {
	let count = paragraph.run_count();

	match alignment.spans.as_slice() {
		[] => Ok(()),
		[only] => {
			let text = run_text(paragraph, only.fragment, count)?;
			let before = slice(text, ..only.start, only, count)?;
			let after = slice(text, only.start + only.len.., only, count)?;
			let updated = format!("{before}{replacement}{after}");
			paragraph.set_run_text(only.fragment, updated);

			Ok(())
		}
		[head, .., tail] => {
			let head_text = run_text(paragraph, head.fragment, count)?;
			let updated_head = format!("{}{replacement}", slice(head_text, ..head.start, head, count)?);
			let tail_text = run_text(paragraph, tail.fragment, count)?;
			let updated_tail = slice(tail_text, tail.start + tail.len.., tail, count)?.to_string();

			paragraph.set_run_text(head.fragment, updated_head);

			if updated_tail.is_empty() {
				paragraph.remove_run(tail.fragment);
			} else {
				paragraph.set_run_text(tail.fragment, updated_tail);
			}

			for interior in (head.fragment + 1..tail.fragment).rev() {
				paragraph.remove_run(interior);
			}

			Ok(())
		}
	}
}

fn run_text<P: Paragraph + ?Sized>(paragraph: &P, index: usize, count: usize) -> FillResult<&str> {
	paragraph
		.run_text(index)
		.ok_or(FillError::FragmentOutOfRange { index, count })
}

fn slice<'t, R>(text: &'t str, range: R, span: &FragmentSpan, count: usize) -> FillResult<&'t str>
where
	R: std::slice::SliceIndex<str, Output = str>,
{
	text.get(range).ok_or(FillError::FragmentOutOfRange {
		index: span.fragment,
		count,
	})
}
