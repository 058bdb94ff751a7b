//! Pretty JSON writer, one document per tweet

use std::io::Write;

use crate::sink::record::TweetRecord;
use crate::sink::tokenize::Tokenizer;
use crate::sink::TweetSink;
use crate::types::{SearchMetadata, Tweet};
use crate::Result;

pub struct JsonSink<W: Write> {
    out: W,
    tokenizer: Option<Box<dyn Tokenizer>>,
    documents: u64,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            tokenizer: None,
            documents: 0,
        }
    }

    /// Adds a `wakati` object to every document
    pub fn with_tokenizer(mut self, tokenizer: Box<dyn Tokenizer>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    pub fn documents(&self) -> u64 {
        self.documents
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TweetSink for JsonSink<W> {
    fn write(&mut self, tweet: &Tweet, metadata: &SearchMetadata) -> Result<()> {
        let record = TweetRecord::from_tweet(tweet, self.tokenizer.as_deref())?;
        let document = record.to_json(tweet, metadata)?;
        serde_json::to_writer_pretty(&mut self.out, &document)?;
        self.out.write_all(b"\n")?;
        self.documents += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
