use crate::export::exporter::Worksheet;
use anyhow::{Context, Result};
use std::io::Write;

/// Writes a worksheet as one JSON document: name, headers, range,
/// string pool and the sparse grid
pub struct JsonWriter<W: Write> {
    writer: W,
    pretty: bool,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        JsonWriter {
            writer,
            pretty: false,
        }
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn write_sheet(&mut self, sheet: &Worksheet) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, sheet)
        } else {
            serde_json::to_writer(&mut self.writer, sheet)
        }
        .context("Failed to serialize worksheet")?;

        writeln!(self.writer).context("Failed to write worksheet")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush writer")
    }
}

/// Writes a worksheet as delimited text, one line per row, covering every
/// written column including those past the header row
pub struct DelimitedWriter<W: Write> {
    writer: W,
    separator: char,
}

impl<W: Write> DelimitedWriter<W> {
    /// Tab-separated output
    pub fn new(writer: W) -> Self {
        Self::with_separator(writer, '\t')
    }

    pub fn with_separator(writer: W, separator: char) -> Self {
        DelimitedWriter { writer, separator }
    }

    pub fn write_sheet(&mut self, sheet: &Worksheet) -> Result<()> {
        let mut buf = [0u8; 4];
        let sep: &str = self.separator.encode_utf8(&mut buf);

        for row in 0..sheet.range.rows {
            let line = sheet
                .full_row_texts(row)
                .iter()
                .map(|text| self.quote(text))
                .collect::<Vec<_>>()
                .join(sep);

            writeln!(self.writer, "{}", line)
                .with_context(|| format!("Failed to write row {}", row))?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush writer")
    }

    fn quote(&self, text: &str) -> String {
        if text.contains(self.separator) || text.contains('"') || text.contains('\n') || text.contains('\r') {
            format!("\"{}\"", text.replace('"', "\"\""))
        } else {
            text.to_string()
        }
    }
}
