//! Result sinks
//!
//! Every (tweet, metadata) pair the fetch engine yields is turned into an
//! output record and written before the next pair is pulled. [`CsvSink`]
//! and [`JsonSink`] write to any `io::Write`; [`OutputTarget`] picks stdout
//! or a file and remembers whether the file started empty, which decides
//! whether a BOM and header are written.

pub mod csv;
pub mod json;
pub mod record;
pub mod resume;
pub mod tokenize;

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::types::{SearchMetadata, Tweet};
use crate::{Error, Result};

pub use self::csv::CsvSink;
pub use self::json::JsonSink;
pub use record::{TweetRecord, CSV_COLUMNS};
pub use resume::{ResumeMarkers, ResumeStore};
pub use tokenize::{ScriptTokenizer, Tokenizer};

/// Path meaning "write to stdout"
pub const STDOUT_PATH: &str = "-";

/// Consumer of fetched tweets
pub trait TweetSink {
    fn write(&mut self, tweet: &Tweet, metadata: &SearchMetadata) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
}

impl<S: TweetSink + ?Sized> TweetSink for Box<S> {
    fn write(&mut self, tweet: &Tweet, metadata: &SearchMetadata) -> Result<()> {
        (**self).write(tweet, metadata)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// How an existing output file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Append,
    Truncate,
}

/// Where records end up
pub struct OutputTarget {
    writer: Box<dyn Write + Send>,
    path: Option<PathBuf>,
    started_empty: bool,
}

impl std::fmt::Debug for OutputTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputTarget")
            .field("path", &self.path)
            .field("started_empty", &self.started_empty)
            .finish()
    }
}

impl OutputTarget {
    pub fn stdout() -> Self {
        Self {
            writer: Box::new(io::stdout()),
            path: None,
            started_empty: false,
        }
    }

    /// Open `path` (or stdout for `-`)
    pub fn open(path: impl AsRef<Path>, mode: OutputMode) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str() == STDOUT_PATH {
            return Ok(Self::stdout());
        }
        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            OutputMode::Append => options.append(true),
            OutputMode::Truncate => options.write(true).truncate(true),
        };
        let file = options.open(path).map_err(|source| Error::Io {
            message: format!("cannot open output file {}: {}", path.display(), source),
            source,
        })?;
        let started_empty = file.metadata()?.len() == 0;
        tracing::debug!(path = %path.display(), ?mode, started_empty, "Output opened");
        Ok(Self {
            writer: Box::new(io::BufWriter::new(file)),
            path: Some(path.to_path_buf()),
            started_empty,
        })
    }

    /// Wrap an arbitrary writer
    pub fn from_writer(writer: impl Write + Send + 'static, started_empty: bool) -> Self {
        Self {
            writer: Box::new(writer),
            path: None,
            started_empty,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_stdout(&self) -> bool {
        self.path.is_none()
    }

    /// True for a file that had no content when opened
    pub fn started_empty(&self) -> bool {
        self.started_empty
    }

    /// A header belongs at the top of stdout or of an empty file
    pub fn wants_header(&self) -> bool {
        self.is_stdout() || self.started_empty
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_open_new_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let target = OutputTarget::open(&path, OutputMode::Append).unwrap();
        assert!(target.started_empty());
        assert!(target.wants_header());
        assert_eq!(target.path(), Some(path.as_path()));
    }

    #[test]
    fn test_append_keeps_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "old\n").unwrap();

        let mut target = OutputTarget::open(&path, OutputMode::Append).unwrap();
        assert!(!target.started_empty());
        target.write_all(b"new\n").unwrap();
        target.flush().unwrap();
        drop(target);
        assert_eq!(fs::read_to_string(&path).unwrap(), "old\nnew\n");
    }

    #[test]
    fn test_truncate_resets_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "old\n").unwrap();

        let target = OutputTarget::open(&path, OutputMode::Truncate).unwrap();
        assert!(target.started_empty());
        drop(target);
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_dash_means_stdout() {
        let target = OutputTarget::open("-", OutputMode::Truncate).unwrap();
        assert!(target.is_stdout());
        assert!(!target.started_empty());
        assert!(target.wants_header());
    }
}
