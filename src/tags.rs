//! Rewriting of `@`-prefixed tags embedded in file names.
//!
//! A file value is either a literal URL (left untouched), a bare file name
//! (appended to the section URL) or starts with one of the tags below, in which
//! case the tag is replaced by the prefix it stands for and the remainder is
//! appended with exactly one `/`:
//!
//! | Tag | Prefix |
//! |---|---|
//! | `@thisComponentUrl` | the component URL |
//! | `@thisSectionUrl` | the section URL |
//! | `@alias(NAME)` | value of `NAME` in the configured alias table |
//! | `@yiiAlias(NAME)` | value the host resolves for the framework alias `NAME` |
//! | `@url(BASE)` | `BASE` verbatim |
//! | `@appUrl` | the configured application base URL |
//! | `@baseUrl` | the component URL |
//!
//! Tag names match case-insensitively. `@component...` references are not
//! handled here; they are placeholders rewritten once every component is parsed.

use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::{Captures, Regex};
use tracing::trace;

use crate::error::{ManifestError, Result};
use crate::host::Host;
use crate::urls::{is_literal_url, join_url};

/// Values a tag may expand to while resolving one file of one section.
#[derive(Clone, Copy)]
pub struct TagContext<'a> {
  /// Configured application base URL (`@appUrl`).
  pub app_url: &'a str,
  /// Effective component URL (`@baseUrl`, `@thisComponentUrl`).
  pub component_url: &'a str,
  /// Effective section URL (`@thisSectionUrl` and bare file names).
  pub section_url: &'a str,
  /// User supplied alias table (`@alias`).
  pub aliases: &'a IndexMap<String, String>,
  /// Host used for framework aliases (`@yiiAlias`).
  pub host: &'a dyn Host,
}

type TagHandler = fn(&Captures<'_>, &TagContext<'_>) -> Result<String>;

struct TagRule {
  name: &'static str,
  pattern: Regex,
  handler: TagHandler,
}

impl TagRule {
  fn new(name: &'static str, pattern: &str, handler: TagHandler) -> Self {
    Self {
      name,
      pattern: Regex::new(pattern).expect("invalid tag regex"),
      handler,
    }
  }
}

fn rules() -> &'static [TagRule] {
  static RULES: OnceLock<Vec<TagRule>> = OnceLock::new();
  RULES
    .get_or_init(|| {
      vec![
        TagRule::new(
          "thisComponentUrl",
          r"^@(?i:thisComponentUrl)(?P<rest>.*)$",
          |caps, ctx| Ok(join_url(ctx.component_url, rest(caps))),
        ),
        TagRule::new(
          "thisSectionUrl",
          r"^@(?i:thisSectionUrl)(?P<rest>.*)$",
          |caps, ctx| Ok(join_url(ctx.section_url, rest(caps))),
        ),
        TagRule::new(
          "alias",
          r"^@(?i:alias)\((?P<arg>[^)]+)\)(?P<rest>.*)$",
          |caps, ctx| {
            let name = arg(caps);
            let value = ctx
              .aliases
              .get(name)
              .ok_or_else(|| ManifestError::UnknownAlias(name.to_string()))?;
            Ok(join_url(value, rest(caps)))
          },
        ),
        TagRule::new(
          "yiiAlias",
          r"^@(?i:yiiAlias)\((?P<arg>[^)]+)\)(?P<rest>.*)$",
          |caps, ctx| {
            let name = arg(caps);
            let value = ctx
              .host
              .resolve_alias(name)
              .map_err(|source| ManifestError::FrameworkAlias {
                alias: name.to_string(),
                source,
              })?;
            Ok(join_url(&value, rest(caps)))
          },
        ),
        TagRule::new(
          "url",
          r"^@(?i:url)\((?P<arg>[^)]+)\)(?P<rest>.*)$",
          |caps, _| Ok(join_url(arg(caps), rest(caps))),
        ),
        TagRule::new(
          "appUrl",
          r"^@(?i:appUrl)(?P<rest>.*)$",
          |caps, ctx| Ok(join_url(ctx.app_url, rest(caps))),
        ),
        TagRule::new(
          "baseUrl",
          r"^@(?i:baseUrl)(?P<rest>.*)$",
          |caps, ctx| Ok(join_url(ctx.component_url, rest(caps))),
        ),
      ]
    })
    .as_slice()
}

fn arg<'h>(caps: &Captures<'h>) -> &'h str {
  caps.name("arg").map_or("", |m| m.as_str())
}

fn rest<'h>(caps: &Captures<'h>) -> &'h str {
  caps.name("rest").map_or("", |m| m.as_str())
}

fn component_reference_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"^@(?i:component)[A-Za-z]+").expect("invalid component regex"))
}

fn leading_tag_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"^@[A-Za-z]+(\([^)]*\))?").expect("invalid leading tag regex"))
}

/// Returns `true` when the value is a cross-component reference placeholder.
pub fn is_component_reference(value: &str) -> bool {
  component_reference_pattern().is_match(value)
}

/// Resolve a file value to its final URL.
pub fn resolve(raw: &str, ctx: &TagContext<'_>) -> Result<String> {
  if is_literal_url(raw) {
    return Ok(raw.to_string());
  }

  if !raw.starts_with('@') {
    return Ok(join_url(ctx.section_url, raw));
  }

  for rule in rules() {
    if let Some(caps) = rule.pattern.captures(raw) {
      let resolved = (rule.handler)(&caps, ctx)?;
      trace!(tag = rule.name, raw, %resolved, "resolved tag");
      return Ok(resolved);
    }
  }

  Err(ManifestError::UnknownTag(raw.to_string()))
}

/// Strip a leading tag (and its argument) from a file value, leaving the relative file name.
pub fn strip_tag(raw: &str) -> &str {
  if is_literal_url(raw) {
    return raw;
  }
  let remainder = match leading_tag_pattern().find(raw) {
    Some(tag) => &raw[tag.end()..],
    None => raw,
  };
  remainder.trim_start_matches(['/', '\\'])
}
