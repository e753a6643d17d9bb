//! Live-reloadable bypass-path matcher.
//!
//! Patterns come from an external configuration source and are compiled
//! into anchored regexes: exact paths, `*` (single segment), `**` (any
//! depth) and `{var}` (templated segment). The active collection is
//! swapped atomically so readers never observe a half-rebuilt list; each
//! process rebuilds independently on a change notification, so instances
//! converge rather than switch in lockstep.

use regex::Regex;
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

struct CompiledPattern {
    raw: String,
    regex: Regex,
}

/// Compiles and caches bypass-path patterns.
pub struct WhitelistMatcher {
    patterns: RwLock<Arc<Vec<CompiledPattern>>>,
}

impl Default for WhitelistMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl WhitelistMatcher {
    /// Create a matcher with no patterns (nothing whitelisted).
    #[must_use]
    pub fn new() -> Self {
        Self {
            patterns: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Create a matcher and build its first pattern set.
    #[must_use]
    pub fn with_patterns(raw_patterns: &[String]) -> Self {
        let matcher = Self::new();
        matcher.rebuild(raw_patterns);
        matcher
    }

    /// Compile `raw_patterns` and atomically replace the active set.
    ///
    /// Malformed patterns are skipped with a warning rather than
    /// aborting the rebuild.
    pub fn rebuild(&self, raw_patterns: &[String]) {
        let mut compiled = Vec::with_capacity(raw_patterns.len());
        for raw in raw_patterns {
            match compile_pattern(raw) {
                Ok(regex) => compiled.push(CompiledPattern {
                    raw: raw.clone(),
                    regex,
                }),
                Err(e) => warn!(pattern = %raw, error = %e, "Skipping malformed whitelist pattern"),
            }
        }
        info!(patterns = compiled.len(), "Rebuilt whitelist");

        let fresh = Arc::new(compiled);
        if let Ok(mut active) = self.patterns.write() {
            *active = fresh;
        }
    }

    /// Whether the path bypasses authentication.
    ///
    /// The path is normalized to a leading separator, then tested against
    /// every pattern; first match wins and there is no precedence among
    /// entries.
    #[must_use]
    pub fn is_whitelisted(&self, path: &str) -> bool {
        let normalized = normalize_path(path);
        let active = match self.patterns.read() {
            Ok(active) => Arc::clone(&active),
            Err(_) => return false,
        };
        active.iter().any(|p| p.regex.is_match(&normalized))
    }

    /// The raw patterns currently active, for diagnostics.
    #[must_use]
    pub fn active_patterns(&self) -> Vec<String> {
        match self.patterns.read() {
            Ok(active) => active.iter().map(|p| p.raw.clone()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Rebuild `matcher` whenever the configuration channel signals a new
/// pattern list. Event-driven; the task ends when the sender side is
/// dropped.
pub fn spawn_watcher(
    matcher: Arc<WhitelistMatcher>,
    mut rx: watch::Receiver<Vec<String>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let patterns = rx.borrow_and_update().clone();
            matcher.rebuild(&patterns);
        }
    })
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Translate one path pattern into an anchored regex.
fn compile_pattern(raw: &str) -> Result<Regex, regex::Error> {
    let pattern = normalize_path(raw.trim());
    let mut regex = String::with_capacity(pattern.len() * 2);
    regex.push('^');

    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    // Any depth, including none.
                    regex.push_str(".*");
                } else {
                    // Within one segment.
                    regex.push_str("[^/]*");
                }
            }
            '{' => {
                // Templated segment: consume through the closing brace.
                for inner in chars.by_ref() {
                    if inner == '}' {
                        break;
                    }
                }
                regex.push_str("[^/]+");
            }
            _ => regex.push_str(&regex::escape(&c.to_string())),
        }
    }

    regex.push('$');
    Regex::new(&regex)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(patterns: &[&str]) -> WhitelistMatcher {
        let raw: Vec<String> = patterns.iter().map(|s| (*s).to_string()).collect();
        WhitelistMatcher::with_patterns(&raw)
    }

    #[test]
    fn test_exact_match() {
        let m = matcher(&["/auth/login"]);
        assert!(m.is_whitelisted("/auth/login"));
        assert!(!m.is_whitelisted("/auth/login2"));
        assert!(!m.is_whitelisted("/auth"));
    }

    #[test]
    fn test_multi_segment_wildcard() {
        let m = matcher(&["/docs/**"]);
        assert!(m.is_whitelisted("/docs/a/b/c"));
        assert!(m.is_whitelisted("/docs/"));
        assert!(!m.is_whitelisted("/api/docs"));
    }

    #[test]
    fn test_single_segment_wildcard() {
        let m = matcher(&["/static/*.css"]);
        assert!(m.is_whitelisted("/static/site.css"));
        assert!(!m.is_whitelisted("/static/nested/site.css"));
    }

    #[test]
    fn test_templated_segment() {
        let m = matcher(&["/public/{file}"]);
        assert!(m.is_whitelisted("/public/logo.png"));
        assert!(!m.is_whitelisted("/public/a/b"));
        assert!(!m.is_whitelisted("/public/"));
    }

    #[test]
    fn test_leading_separator_normalization() {
        let m = matcher(&["auth/login"]);
        assert!(m.is_whitelisted("/auth/login"));
        assert!(m.is_whitelisted("auth/login"));
    }

    #[test]
    fn test_or_semantics_across_patterns() {
        let m = matcher(&["/auth/login", "/docs/**"]);
        assert!(m.is_whitelisted("/auth/login"));
        assert!(m.is_whitelisted("/docs/guide"));
        assert!(!m.is_whitelisted("/admin"));
    }

    #[test]
    fn test_regex_metachars_are_literal() {
        let m = matcher(&["/v1/health.check"]);
        assert!(m.is_whitelisted("/v1/health.check"));
        assert!(!m.is_whitelisted("/v1/healthXcheck"));
    }

    #[test]
    fn test_empty_set_whitelists_nothing() {
        let m = WhitelistMatcher::new();
        assert!(!m.is_whitelisted("/anything"));
    }

    #[tokio::test]
    async fn test_watcher_rebuilds_on_notification() {
        let matcher = Arc::new(WhitelistMatcher::new());
        let (tx, rx) = watch::channel(Vec::new());
        let handle = spawn_watcher(Arc::clone(&matcher), rx);

        assert!(!matcher.is_whitelisted("/auth/login"));

        tx.send(vec!["/auth/login".to_string()]).unwrap();
        // Give the watcher task a beat to apply the change.
        for _ in 0..50 {
            if matcher.is_whitelisted("/auth/login") {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(matcher.is_whitelisted("/auth/login"));

        drop(tx);
        handle.await.unwrap();
    }
}
