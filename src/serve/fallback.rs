//! Directory fallback resolution
//!
//! A request key is tried as an exact object first, then as a directory holding
//! `index.html`, then `index.htm`. A directory hit requested without a trailing
//! slash is redirected so relative links inside the index resolve.

use super::observer::Observer;
use super::path::join_key;
use crate::store::{ObjectMeta, ObjectStore};

/// Lookup steps, tried in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackState {
    TryExact,
    TryIndexHtml,
    TryIndexHtm,
}

impl FallbackState {
    /// Key to look up in this state; `None` skips the state
    fn candidate(self, key: &str) -> Option<String> {
        match self {
            // The empty key names the container root, never an object
            Self::TryExact if key.is_empty() => None,
            Self::TryExact => Some(key.to_string()),
            Self::TryIndexHtml => Some(join_key(key, "index.html")),
            Self::TryIndexHtm => Some(join_key(key, "index.htm")),
        }
    }

    const fn next(self) -> Option<Self> {
        match self {
            Self::TryExact => Some(Self::TryIndexHtml),
            Self::TryIndexHtml => Some(Self::TryIndexHtm),
            Self::TryIndexHtm => None,
        }
    }

    const fn is_index(self) -> bool {
        !matches!(self, Self::TryExact)
    }
}

/// Terminal outcome of the fallback chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Serve this object
    Hit { key: String, meta: ObjectMeta },
    /// Directory index found; send the client to the slash-terminated path
    Redirect { location: String },
    NotFound,
}

/// Walk the fallback chain for `key`
///
/// `request_path` is the client's path as sent (still percent-encoded), used to
/// decide and build the trailing-slash redirect. Any lookup error advances to
/// the next state.
pub async fn resolve(
    store: &dyn ObjectStore,
    container: &str,
    key: &str,
    request_path: &str,
    observer: &dyn Observer,
) -> Resolution {
    let mut state = Some(FallbackState::TryExact);

    while let Some(current) = state {
        if let Some(candidate) = current.candidate(key) {
            match store.properties(container, &candidate).await {
                Ok(meta) => {
                    observer.info(&format!(
                        "{current:?}: found {container}/{candidate} ({} bytes)",
                        meta.size
                    ));
                    let needs_slash = !request_path.is_empty() && !request_path.ends_with('/');
                    if current.is_index() && needs_slash {
                        return Resolution::Redirect {
                            location: format!("{request_path}/"),
                        };
                    }
                    return Resolution::Hit {
                        key: candidate,
                        meta,
                    };
                }
                Err(e) => {
                    observer.info(&format!("{current:?}: {container}/{candidate} missed: {e}"));
                }
            }
        }
        state = current.next();
    }

    Resolution::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serve::observer::NullObserver;
    use crate::serve::testing::{CountingStore, FlakyStore};
    use crate::store::MemoryStore;

    fn store(keys: &[&str]) -> CountingStore {
        let inner = MemoryStore::new();
        for key in keys {
            inner.put("site", key, format!("content of {key}"));
        }
        CountingStore::new(inner)
    }

    async fn run(store: &CountingStore, key: &str, path: &str) -> Resolution {
        resolve(store, "site", key, path, &NullObserver).await
    }

    #[tokio::test]
    async fn test_exact_hit() {
        let store = store(&["a.txt", "a.txt/index.html"]);
        match run(&store, "a.txt", "/a.txt").await {
            Resolution::Hit { key, meta } => {
                assert_eq!(key, "a.txt");
                assert_eq!(meta.key, "a.txt");
            }
            other => panic!("Expected Hit, got {other:?}"),
        }
        assert_eq!(store.lookups(), 1);
    }

    #[tokio::test]
    async fn test_index_html_with_trailing_slash() {
        let store = store(&["docs/index.html"]);
        let resolution = run(&store, "docs/", "/docs/").await;
        assert!(matches!(resolution, Resolution::Hit { ref key, .. } if key == "docs/index.html"));
        assert_eq!(store.keys(), vec!["docs/", "docs/index.html"]);
    }

    #[tokio::test]
    async fn test_index_without_trailing_slash_redirects() {
        let store = store(&["docs/index.html"]);
        assert_eq!(
            run(&store, "docs", "/docs").await,
            Resolution::Redirect {
                location: "/docs/".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_falls_through_to_index_htm() {
        let store = store(&["old/index.htm"]);
        let resolution = run(&store, "old/", "/old/").await;
        assert!(matches!(resolution, Resolution::Hit { ref key, .. } if key == "old/index.htm"));
        assert_eq!(store.keys(), vec!["old/", "old/index.html", "old/index.htm"]);

        assert_eq!(
            run(&store, "old", "/old").await,
            Resolution::Redirect {
                location: "/old/".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_root_skips_exact_lookup() {
        let store = store(&["index.html"]);
        let resolution = run(&store, "", "/").await;
        assert!(matches!(resolution, Resolution::Hit { ref key, .. } if key == "index.html"));
        assert_eq!(store.keys(), vec!["index.html"]);
    }

    #[tokio::test]
    async fn test_not_found_after_all_states() {
        let store = store(&["other.txt"]);
        assert_eq!(run(&store, "missing", "/missing").await, Resolution::NotFound);
        assert_eq!(
            store.keys(),
            vec!["missing", "missing/index.html", "missing/index.htm"]
        );
    }

    #[tokio::test]
    async fn test_backend_errors_advance_the_chain() {
        let inner = MemoryStore::new();
        inner.put("site", "docs/index.html", "unreachable");
        inner.put("site", "docs/index.htm", "fallback");
        let store = FlakyStore::new(inner, &["docs/", "docs/index.html"]);

        let resolution = resolve(&store, "site", "docs/", "/docs/", &NullObserver).await;
        assert!(matches!(resolution, Resolution::Hit { ref key, .. } if key == "docs/index.htm"));
    }

    #[test]
    fn test_state_order() {
        assert_eq!(FallbackState::TryExact.next(), Some(FallbackState::TryIndexHtml));
        assert_eq!(FallbackState::TryIndexHtml.next(), Some(FallbackState::TryIndexHtm));
        assert_eq!(FallbackState::TryIndexHtm.next(), None);
        assert_eq!(FallbackState::TryExact.candidate(""), None);
        assert_eq!(
            FallbackState::TryIndexHtm.candidate("a/b/"),
            Some("a/b/index.htm".to_string())
        );
    }
}
