//! Allowlist pattern matching for snapshot downloads.
//!
//! Patterns use shell-style wildcard syntax matched against the full
//! repository-relative path: `*` matches any run of characters (including
//! path separators), `?` matches a single character, and `[...]` / `[!...]`
//! character classes are supported. A file is kept when any pattern matches
//! its path in full.

use regex::Regex;

use crate::error::HubError;

/// A compiled set of allowlist patterns.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<CompiledPattern>,
}

#[derive(Debug, Clone)]
struct CompiledPattern {
    source: String,
    regex: Regex,
}

impl PatternSet {
    /// Compile a list of wildcard patterns.
    ///
    /// # Errors
    ///
    /// Returns `HubError::InvalidPattern` if a pattern translates to an
    /// invalid regular expression (e.g. a malformed character class).
    pub fn new<I, S>(patterns: I) -> Result<Self, HubError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled = Vec::new();
        for pattern in patterns {
            let source = pattern.as_ref().to_string();
            let regex =
                Regex::new(&translate(&source)).map_err(|e| HubError::InvalidPattern {
                    pattern: source.clone(),
                    message: e.to_string(),
                })?;
            compiled.push(CompiledPattern { source, regex });
        }
        Ok(Self { patterns: compiled })
    }

    /// Whether any pattern matches the whole path.
    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.regex.is_match(path))
    }

    /// Number of patterns in the set.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the set contains no patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// The original pattern strings.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.source.as_str())
    }
}

/// Translate a wildcard pattern into an anchored regular expression.
///
/// Follows fnmatch rules: `*` becomes `.*` (it does NOT stop at `/`),
/// `?` becomes `.`, character classes pass through with `!` negation
/// rewritten to `^`, and an unterminated `[` is treated as a literal.
fn translate(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut regex = String::with_capacity(pattern.len() * 2);
    regex.push('^');

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '*' => regex.push_str(".*"),
            '?' => regex.push('.'),
            '[' => {
                let mut j = i + 1;
                if j < chars.len() && chars[j] == '!' {
                    j += 1;
                }
                if j < chars.len() && chars[j] == ']' {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }
                if j >= chars.len() {
                    regex.push_str("\\[");
                } else {
                    let inner: String = chars[i + 1..j].iter().collect();
                    let inner = inner.replace('\\', "\\\\");
                    regex.push('[');
                    if let Some(rest) = inner.strip_prefix('!') {
                        regex.push('^');
                        regex.push_str(rest);
                    } else if inner.starts_with('^') || inner.starts_with('[') {
                        regex.push('\\');
                        regex.push_str(&inner);
                    } else {
                        regex.push_str(&inner);
                    }
                    regex.push(']');
                    i = j;
                }
            }
            _ => regex.push_str(&regex::escape(&c.to_string())),
        }
        i += 1;
    }

    regex.push('$');
    regex
}
