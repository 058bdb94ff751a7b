// Tests for console output routing
//
// Messages go to stderr, data to stdout; quiet mode silences messages only.

use super::*;
use serde_json::json;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn writer(quiet: bool) -> (OutputWriter, SharedBuf, SharedBuf) {
    let out = SharedBuf::default();
    let err = SharedBuf::default();
    let writer = OutputWriter::with_writers(Box::new(out.clone()), Box::new(err.clone()), false, quiet);
    (writer, out, err)
}

#[test]
fn test_messages_go_to_stderr() {
    let (mut output, out, err) = writer(false);
    output.info("get tweet: 1: 100").unwrap();
    output.success("Total: 1 items").unwrap();

    assert_eq!(out.contents(), "");
    assert_eq!(err.contents(), "get tweet: 1: 100\nTotal: 1 items\n");
}

#[test]
fn test_quiet_keeps_warnings_and_data() {
    let (mut output, out, err) = writer(true);
    output.info("hidden").unwrap();
    output.success("hidden").unwrap();
    output.warning("no rate limit entry").unwrap();
    output.line("limit: 450").unwrap();

    assert_eq!(err.contents(), "WARNING: no rate limit entry\n");
    assert_eq!(out.contents(), "limit: 450\n");
}

#[test]
fn test_data_is_pretty_json_and_unredacted() {
    let (mut output, out, _) = writer(false);
    output
        .data(&json!({"rate_limit_context": {"application": "dummykey"}}))
        .unwrap();

    assert_eq!(
        out.contents(),
        "{\n  \"rate_limit_context\": {\n    \"application\": \"dummykey\"\n  }\n}\n"
    );
}

#[test]
fn test_no_spinner_without_terminal() {
    let (output, _, _) = writer(false);
    assert!(!output.show_progress());
    assert!(output.spinner("fetching").is_none());
}
