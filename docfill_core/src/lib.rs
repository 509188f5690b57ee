//! `docfill_core` is the core library for docfill, a template merge engine
//! for spreadsheets and word processing documents. Templates carry
//! placeholders in their cells and paragraphs. The engine resolves each
//! placeholder against a data graph and writes the result back while keeping
//! the formatting of the surrounding text.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Template document (through the traits in `document`)
//!   → Collection pass (`[Items.Name]` placeholders grow into one row per item)
//!   → Scalar pass (`{Customer:Name}` placeholders are replaced in place)
//!   → Fragment aligner (maps each match back onto the runs that hold it)
//!   → FillReport (counts plus every placeholder left unresolved)
//! ```
//!
//! ## Placeholders
//!
//! - `{Name}`, `{Customer:Address:City}`: a scalar. Segments are separated by
//!   `:` and are looked up as mapping keys first and record fields second.
//!   When a cell holds nothing but one scalar placeholder the value keeps its
//!   native type, so numbers stay numbers and dates stay dates.
//! - `[Names]`, `[Students.Name]`, `[Project:Students.Info:Name]`: a
//!   collection, optionally followed by a property path read from each item.
//!   Only sequences are expanded.
//!
//! Placeholders whose path does not resolve are left verbatim in the output
//! and listed in [`FillReport::unresolved`].
//!
//! ## Modules
//!
//! - [`document`]: the traits a document backend implements.
//! - [`memory`]: serde friendly in-memory documents implementing those
//!   traits.
//!
//! ## Key Types
//!
//! - [`Value`]: the data graph, built from any `serde::Serialize` value or by
//!   implementing [`Record`] on a domain type.
//! - [`Source`]: a data root plus an optional path prefix.
//! - [`TemplateFiller`]: fills one template, a batch of copies, or either
//!   from async code.
//! - [`FillOptions`]: rendering options loaded from `docfill.toml`.
//!
//! ## Quick Start
//!
//! ```rust
//! use docfill_core::FillOptions;
//! use docfill_core::TemplateFiller;
//! use docfill_core::Value;
//! use docfill_core::memory::MemorySheet;
//! use docfill_core::memory::MemoryWorkbook;
//!
//! let mut workbook = MemoryWorkbook::new(vec![
//! 	MemorySheet::new("Report")
//! 		.with_cell(0, 0, "Instructor: {Instructor}")
//! 		.with_cell(1, 0, "[Students.Name]"),
//! ]);
//! let data = Value::from_serialize(&serde_json::json!({
//! 	"Instructor": "Ada",
//! 	"Students": [{ "Name": "Grace" }, { "Name": "Alan" }],
//! }))
//! .unwrap();
//!
//! let report = TemplateFiller::new(FillOptions::default())
//! 	.fill(&mut workbook, &data)
//! 	.unwrap();
//!
//! assert!(report.is_complete());
//! assert_eq!(workbook.sheets[0].text(0, 0).as_deref(), Some("Instructor: Ada"));
//! assert_eq!(workbook.sheets[0].text(2, 0).as_deref(), Some("Alan"));
//! ```

pub use align::*;
pub use collection::*;
pub use config::*;
pub use data::*;
pub use document::*;
pub use engine::*;
pub use error::*;
pub use filler::*;
pub use placeholder::*;
pub use scalar::*;
pub use source::*;
pub use value::*;

mod align;
mod collection;
pub mod config;
mod data;
pub mod document;
mod engine;
mod error;
mod filler;
pub mod memory;
mod placeholder;
mod scalar;
mod source;
mod value;

#[cfg(test)]
mod __fixtures;
