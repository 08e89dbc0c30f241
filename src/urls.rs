//! URL and path joining helpers shared by the resolution stages.

use std::sync::OnceLock;

use regex::Regex;

fn absolute_url_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"(?i)^[a-z][a-z0-9+.\-]+:/{0,3}[^/\s]").expect("invalid absolute url regex")
  })
}

/// Returns `true` for values that must never be rewritten: protocol-relative
/// (`//host/...`) and absolute (`scheme:...`) URIs.
///
/// Schemes are at least two characters long so Windows drive paths such as
/// `C:\cdn` stay relative.
pub fn is_literal_url(value: &str) -> bool {
  value.starts_with("//") || absolute_url_pattern().is_match(value)
}

/// Join a prefix and a suffix with exactly one `/` between them.
///
/// An empty suffix yields the prefix without its trailing slashes.
pub fn join_url(prefix: &str, suffix: &str) -> String {
  let head = prefix.trim_end_matches('/');
  let tail = suffix.trim_start_matches('/');
  if tail.is_empty() {
    head.to_string()
  } else {
    format!("{head}/{tail}")
  }
}

/// Join filesystem path segments using forward slashes.
///
/// Backslashes are normalised so manifests are identical on every platform.
pub fn join_path(base: &str, segment: &str) -> String {
  let base = base.replace('\\', "/");
  let segment = segment.replace('\\', "/");
  join_url(&base, &segment)
}
