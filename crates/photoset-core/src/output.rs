//! JSON Lines output for generated datasets.
//!
//! One compact JSON object per line, UTF-8, with non-ASCII text left as-is
//! (serde_json never escapes it), so Chinese descriptions stay readable.

use serde::Serialize;
use std::io::{self, Write};

/// A writer that serializes items as newline-delimited JSON.
pub struct JsonlWriter<W: Write> {
    writer: W,
    items_written: usize,
}

impl<W: Write> JsonlWriter<W> {
    /// Wrap an underlying writer (file, buffer, etc.).
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            items_written: 0,
        }
    }

    /// Write a single item as one line.
    pub fn write<T: Serialize>(&mut self, item: &T) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
        writeln!(self.writer)?;
        self.items_written += 1;
        Ok(())
    }

    /// Write multiple items, one per line.
    pub fn write_all<T: Serialize>(&mut self, items: &[T]) -> io::Result<()> {
        for item in items {
            self.write(item)?;
        }
        Ok(())
    }

    /// Get the number of items written.
    pub fn items_written(&self) -> usize {
        self.items_written
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Consume the writer and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TrainingRecord;

    #[test]
    fn test_write_one_line_per_item() {
        let mut buffer = Vec::new();
        let mut writer = JsonlWriter::new(&mut buffer);

        let records = vec![
            TrainingRecord::build("a.jpg", "first"),
            TrainingRecord::build("b.jpg", "second"),
        ];
        writer.write_all(&records).unwrap();
        assert_eq!(writer.items_written(), 2);

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(output.ends_with('\n'));
        for line in lines {
            let parsed: TrainingRecord = serde_json::from_str(line).unwrap();
            assert_eq!(parsed.messages.len(), 2);
        }
    }

    #[test]
    fn test_non_ascii_not_escaped() {
        let mut buffer = Vec::new();
        let mut writer = JsonlWriter::new(&mut buffer);
        writer
            .write(&TrainingRecord::build("猫.png", "一只猫"))
            .unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("一只猫"));
        assert!(output.contains("猫.png"));
        assert!(!output.contains("\\u"));
    }
}
