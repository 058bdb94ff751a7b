//! Quote-all CSV writer

use std::io::Write;

use crate::sink::record::{TweetRecord, CSV_COLUMNS};
use crate::sink::tokenize::Tokenizer;
use crate::sink::{OutputTarget, TweetSink};
use crate::types::{SearchMetadata, Tweet};
use crate::Result;

const BOM: &str = "\u{feff}";
const LINE_END: &str = "\r\n";

/// Writes one quoted CSV row per tweet
pub struct CsvSink<W: Write> {
    out: W,
    tokenizer: Option<Box<dyn Tokenizer>>,
    rows: u64,
}

impl<W: Write> CsvSink<W> {
    /// Wrap a writer, emitting the BOM and header first when asked
    pub fn new(mut out: W, bom: bool, header: bool) -> Result<Self> {
        if bom {
            out.write_all(BOM.as_bytes())?;
        }
        if header {
            write_row(&mut out, CSV_COLUMNS.iter().copied())?;
        }
        Ok(Self {
            out,
            tokenizer: None,
            rows: 0,
        })
    }

    pub fn with_tokenizer(mut self, tokenizer: Box<dyn Tokenizer>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    /// Rows written so far, header excluded
    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl CsvSink<OutputTarget> {
    /// BOM only on a fresh file; header only when requested and nothing precedes it
    pub fn for_target(target: OutputTarget, write_header: bool) -> Result<Self> {
        let bom = target.started_empty();
        let header = write_header && target.wants_header();
        Self::new(target, bom, header)
    }
}

impl<W: Write> TweetSink for CsvSink<W> {
    fn write(&mut self, tweet: &Tweet, _metadata: &SearchMetadata) -> Result<()> {
        let record = TweetRecord::from_tweet(tweet, self.tokenizer.as_deref())?;
        let fields = record.csv_fields();
        write_row(&mut self.out, fields.iter().map(String::as_str))?;
        self.rows += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

fn write_row<'a>(out: &mut impl Write, fields: impl Iterator<Item = &'a str>) -> Result<()> {
    let line = fields.map(quote).collect::<Vec<_>>().join(",");
    out.write_all(line.as_bytes())?;
    out.write_all(LINE_END.as_bytes())?;
    Ok(())
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
