//! Sequential object streaming into a response body

use super::error::ErrorKind;
use super::finish::ResponseWriter;
use super::path::join_key;
use crate::store::ObjectStore;

/// Key to stream for an entry of the file list
///
/// A leading `/` marks a key relative to the container root; other keys are
/// joined onto `base` when one is given.
pub fn stream_key(base: Option<&str>, file: &str) -> String {
    match (file.strip_prefix('/'), base) {
        (Some(absolute), _) => absolute.to_string(),
        (None, Some(base)) => join_key(base, file),
        (None, None) => file.to_string(),
    }
}

/// Stream every file in order, then end the body
///
/// The first failure stops the sequence; the body is left for the finisher
/// to terminate.
pub async fn stream_objects<W: ResponseWriter>(
    store: &dyn ObjectStore,
    container: &str,
    base: Option<&str>,
    files: &[String],
    writer: &mut W,
) -> Result<u64, ErrorKind> {
    let mut total = 0;
    for file in files {
        let key = stream_key(base, file);
        match store.stream_object(container, &key, writer).await {
            Ok(written) => total += written,
            Err(source) => return Err(ErrorKind::StreamFailure { key, source }),
        }
    }
    writer.end();
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serve::testing::{FailingStore, RecordingWriter};
    use crate::store::MemoryStore;

    #[test]
    fn test_stream_key() {
        assert_eq!(stream_key(None, "a.txt"), "a.txt");
        assert_eq!(stream_key(Some("docs"), "a.txt"), "docs/a.txt");
        assert_eq!(stream_key(Some("docs"), "/a.txt"), "a.txt");
        assert_eq!(stream_key(None, "/x/a.txt"), "x/a.txt");
    }

    #[tokio::test]
    async fn test_streams_files_in_order() {
        let store = MemoryStore::new();
        store.put("site", "parts/one.txt", "one,");
        store.put("site", "parts/two.txt", "two");

        let mut writer = RecordingWriter::default();
        let files = vec!["one.txt".to_string(), "two.txt".to_string()];
        let total = stream_objects(&store, "site", Some("parts"), &files, &mut writer)
            .await
            .unwrap();

        assert_eq!(total, 7);
        assert_eq!(writer.body, b"one,two");
        assert!(writer.ended);
    }

    #[tokio::test]
    async fn test_failure_stops_remaining_files() {
        let inner = MemoryStore::new();
        inner.put("site", "a.txt", "first");
        inner.put("site", "b.txt", "broken");
        inner.put("site", "c.txt", "never");
        let store = FailingStore::new(inner, "b.txt");

        let mut writer = RecordingWriter::default();
        let files = vec!["a.txt".to_string(), "b.txt".to_string(), "c.txt".to_string()];
        let err = stream_objects(&store, "site", None, &files, &mut writer)
            .await
            .unwrap_err();

        assert!(matches!(err, ErrorKind::StreamFailure { ref key, .. } if key == "b.txt"));
        assert_eq!(writer.body, b"first");
        assert!(!writer.ended);
    }
}
