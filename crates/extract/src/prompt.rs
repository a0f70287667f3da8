use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::Formatter;
use std::io;

use crate::schema::Record;

pub const EXTRACT_DIRECTIVE: &str = "extract: ";
pub const COMPARE_DIRECTIVE: &str = "compare: ";
pub const FAQ_DIRECTIVE: &str = "faq: ";

pub fn build_extraction_prompt(chunk_text: &str, flatten_newlines: bool) -> String {
    if flatten_newlines {
        format!("{}{}", EXTRACT_DIRECTIVE, chunk_text.replace('\n', " "))
    } else {
        format!("{}{}", EXTRACT_DIRECTIVE, chunk_text)
    }
}

pub fn build_stage_prompt(directive: &str, record_json: &str) -> String {
    format!("{}{}", directive, record_json)
}

/// Serialize a record the way the model saw records during training:
/// `", "` and `": "` separators, non-ASCII left unescaped, keys in insertion order.
pub fn to_canonical_json(record: &Record) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    record
        .serialize(&mut serializer)
        .context("Failed to serialize record")?;
    String::from_utf8(buf).context("Serialized record is not UTF-8")
}

struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}
