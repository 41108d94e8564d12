//! Perceptual signs: opaque pointers deferred until a semantic step demands
//! transmutation.
//!
//! A sign's bit-exact textual form is `%{<norm>}<id>(<signifier>)`, where
//! `norm` matches `[A-Za-z_][A-Za-z0-9_-]*` (registered norms like
//! `file-location`/`prompt-location`/`script-location`/
//! `memorized-parameter` are hyphenated), `id` matches `[A-Za-z0-9]+`, and
//! `signifier` is an arbitrary string with literal parentheses doubled
//! (`((` / `))`).

use std::fmt;

/// A triple naming a perception norm, an opaque stable tag, and a payload
/// string whose interpretation is deferred to the [`PerceptionRouter`].
///
/// [`PerceptionRouter`]: https://docs.rs/normcode-perception
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PerceptualSign {
    pub norm: String,
    pub id: String,
    pub signifier: String,
}

/// Why a string failed to parse as a [`PerceptualSign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignParseError {
    MissingPrefix,
    UnterminatedNorm,
    InvalidNorm(String),
    InvalidId(String),
    MissingOpenParen,
    UnterminatedSignifier,
}

impl fmt::Display for SignParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignParseError::MissingPrefix => write!(f, "perceptual sign must start with '%{{'"),
            SignParseError::UnterminatedNorm => write!(f, "unterminated norm (missing '}}')"),
            SignParseError::InvalidNorm(s) => write!(f, "invalid norm: '{}'", s),
            SignParseError::InvalidId(s) => write!(f, "invalid id: '{}'", s),
            SignParseError::MissingOpenParen => write!(f, "expected '(' after id"),
            SignParseError::UnterminatedSignifier => write!(f, "unterminated signifier (missing ')')"),
        }
    }
}

impl std::error::Error for SignParseError {}

fn is_norm_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_norm_cont(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

impl PerceptualSign {
    pub fn new(norm: impl Into<String>, id: impl Into<String>, signifier: impl Into<String>) -> Self {
        Self { norm: norm.into(), id: id.into(), signifier: signifier.into() }
    }

    /// Renders the bit-exact textual form, doubling literal parentheses in
    /// the signifier.
    pub fn format(&self) -> String {
        let mut escaped = String::with_capacity(self.signifier.len());
        for c in self.signifier.chars() {
            if c == '(' || c == ')' {
                escaped.push(c);
                escaped.push(c);
            } else {
                escaped.push(c);
            }
        }
        format!("%{{{}}}{}({})", self.norm, self.id, escaped)
    }

    /// Parses the bit-exact textual form produced by [`Self::format`].
    pub fn parse(text: &str) -> Result<Self, SignParseError> {
        let rest = text.strip_prefix("%{").ok_or(SignParseError::MissingPrefix)?;
        let close = rest.find('}').ok_or(SignParseError::UnterminatedNorm)?;
        let norm = &rest[..close];
        if norm.is_empty() || !norm.chars().next().map(is_norm_start).unwrap_or(false)
            || !norm.chars().all(is_norm_cont)
        {
            return Err(SignParseError::InvalidNorm(norm.to_string()));
        }
        let rest = &rest[close + 1..];

        let id_end = rest.find('(').ok_or(SignParseError::MissingOpenParen)?;
        let id = &rest[..id_end];
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SignParseError::InvalidId(id.to_string()));
        }
        let rest = &rest[id_end + 1..];

        let signifier = unescape_signifier(rest)?;

        Ok(PerceptualSign { norm: norm.to_string(), id: id.to_string(), signifier })
    }
}

/// Consumes `"<escaped>)"` exactly (the closing paren must be the last
/// character), un-doubling `((`/`))` into literal parens.
fn unescape_signifier(body: &str) -> Result<String, SignParseError> {
    let chars: Vec<char> = body.chars().collect();
    let mut out = String::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '(' || c == ')' {
            let doubled = i + 1 < chars.len() && chars[i + 1] == c;
            if doubled {
                out.push(c);
                i += 2;
                continue;
            }
            if c == ')' && i == chars.len() - 1 {
                return Ok(out);
            }
            // A lone, undoubled paren that isn't the terminator is
            // malformed input.
            return Err(SignParseError::UnterminatedSignifier);
        }
        out.push(c);
        i += 1;
    }
    Err(SignParseError::UnterminatedSignifier)
}

impl fmt::Display for PerceptualSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}
