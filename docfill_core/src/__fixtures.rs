use chrono::NaiveDate;
use chrono::NaiveDateTime;
use serde_json::json;

use crate::FieldDescriptor;
use crate::Record;
use crate::Schema;
use crate::Value;
use crate::memory::MemoryBody;
use crate::memory::MemoryDocument;
use crate::memory::MemoryParagraph;
use crate::memory::MemoryTable;

#[derive(Debug)]
pub struct Student {
	pub name: &'static str,
	pub age: i64,
	pub enrolled: NaiveDateTime,
}

static STUDENT_SCHEMA: Schema = Schema::new("Student", &[
	FieldDescriptor::new("Name"),
	FieldDescriptor::new("Age"),
	FieldDescriptor::with_format("Enrolled", "%d/%m/%Y"),
]);

impl Record for Student {
	fn schema(&self) -> &'static Schema {
		&STUDENT_SCHEMA
	}

	fn field(&self, name: &str) -> Option<Value> {
		match name {
			"Name" => Some(self.name.into()),
			"Age" => Some(self.age.into()),
			"Enrolled" => Some(self.enrolled.into()),
			_ => None,
		}
	}
}

/// A record that is also a mapping with a `Title` entry shadowing its
/// `Title` field.
#[derive(Debug)]
pub struct Catalog;

static CATALOG_SCHEMA: Schema = Schema::new("Catalog", &[
	FieldDescriptor::new("Title"),
	FieldDescriptor::new("Edition"),
]);

impl Record for Catalog {
	fn schema(&self) -> &'static Schema {
		&CATALOG_SCHEMA
	}

	fn field(&self, name: &str) -> Option<Value> {
		match name {
			"Title" => Some("field title".into()),
			"Edition" => Some(Value::Int(2)),
			_ => None,
		}
	}

	fn entry(&self, key: &str) -> Option<Value> {
		(key == "Title").then(|| "entry title".into())
	}

	fn entry_keys(&self) -> Vec<String> {
		vec!["Title".to_string()]
	}
}

pub fn enrolled() -> NaiveDateTime {
	NaiveDate::from_ymd_opt(2024, 9, 2)
		.and_then(|date| date.and_hms_opt(8, 30, 0))
		.unwrap_or_else(|| panic!("valid date"))
}

pub fn students() -> Value {
	Value::sequence([
		Value::record(Student {
			name: "A",
			age: 30,
			enrolled: enrolled(),
		}),
		Value::record(Student {
			name: "B",
			age: 31,
			enrolled: enrolled(),
		}),
	])
}

pub fn class_data() -> Value {
	Value::mapping([
		("Instructor", Value::from("Ada")),
		("Room", Value::Int(12)),
		("Students", students()),
		(
			"Customer",
			Value::mapping([
				("Name", Value::from("Grace")),
				("Age", Value::Int(30)),
				("Address", Value::mapping([("City", "Lagos")])),
			]),
		),
		("Catalog", Value::record(Catalog)),
		("Nothing", Value::Null),
	])
}

pub fn json_data(value: serde_json::Value) -> Value {
	Value::from(value)
}

pub fn letters(count: usize) -> Value {
	Value::sequence((0..count).map(|index| {
		let letter = char::from(b'a' + index as u8);
		letter.to_string()
	}))
}

pub fn ragged_data() -> Value {
	json_data(json!({
		"Left": ["a1", "a2", "a3"],
		"Right": ["b1", "b2", "b3", "b4", "b5"],
	}))
}

pub fn grades_table() -> MemoryTable {
	MemoryTable::from_rows([
		vec!["Name", "Grade"],
		vec!["[Students.Name]", "[Students.Age]"],
		vec!["Total", "{Room}"],
	])
}

pub fn letter_document() -> MemoryDocument {
	MemoryDocument {
		body: MemoryBody {
			paragraphs: vec![
				MemoryParagraph::from_runs(["Dear ", "{Cus", "tomer:", "Name}", ","]),
				MemoryParagraph::new("{Room}"),
				MemoryParagraph::new("No placeholders here."),
			],
			tables: vec![grades_table()],
		},
		headers: vec![MemoryBody {
			paragraphs: vec![MemoryParagraph::new("Class of {Instructor}")],
			tables: vec![MemoryTable::from_rows([vec!["[Students.Name]"]])],
		}],
		footers: vec![MemoryBody {
			paragraphs: vec![MemoryParagraph::new("Room {Room}")],
			tables: Vec::new(),
		}],
	}
}
