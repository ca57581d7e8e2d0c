//! Glob and regular expression patterns.

use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};

/// Named captures collected from matching conditions.
pub type CaptureMap = BTreeMap<String, String>;

/// How a pattern was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Shell-style wildcard, case-insensitive, matching the whole value.
    Glob,
    /// Regular expression searched anywhere in the value.
    Regex,
}

/// A compiled condition pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    kind: PatternKind,
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles a regular expression. Named groups may be written as
    /// `(?<name>…)` or `(?P<name>…)`.
    ///
    /// # Errors
    ///
    /// Returns the compiler's diagnostics if the expression is invalid.
    pub fn regex(source: &str) -> Result<Self, String> {
        let regex = Regex::new(source).map_err(|e| e.to_string())?;
        Ok(Self {
            kind: PatternKind::Regex,
            source: source.to_string(),
            regex,
        })
    }

    /// Compiles a glob.
    ///
    /// Supports `*`, `?`, `[...]` classes (`[!...]` negates), `{a,b}`
    /// alternatives and `\` escapes.
    ///
    /// # Errors
    ///
    /// Returns an error on an unclosed `{`.
    pub fn glob(source: &str) -> Result<Self, String> {
        let translated = glob_to_regex(source)?;
        let regex = RegexBuilder::new(&translated)
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| e.to_string())?;
        Ok(Self {
            kind: PatternKind::Glob,
            source: source.to_string(),
            regex,
        })
    }

    /// How the pattern was written.
    #[must_use]
    pub const fn kind(&self) -> PatternKind {
        self.kind
    }

    /// The pattern as configured.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if `text` matches.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Matches `text`, returning the named groups that took part in the
    /// match. Globs never capture.
    #[must_use]
    pub fn captures(&self, text: &str) -> Option<CaptureMap> {
        let caps = self.regex.captures(text)?;
        Some(
            self.regex
                .capture_names()
                .flatten()
                .filter_map(|name| {
                    caps.name(name)
                        .map(|m| (name.to_string(), m.as_str().to_string()))
                })
                .collect(),
        )
    }
}

/// Translates a glob into an anchored regular expression.
fn glob_to_regex(glob: &str) -> Result<String, String> {
    let chars: Vec<char> = glob.chars().collect();
    let mut out = String::from(r"\A(?:");
    let mut depth = 0_usize;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '\\' => {
                i += 1;
                push_literal(&mut out, chars.get(i).copied().unwrap_or('\\'));
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    push_class(&mut out, &chars[i + 1..end]);
                    i = end;
                }
                None => push_literal(&mut out, '['),
            },
            '{' => {
                depth += 1;
                out.push_str("(?:");
            }
            ',' if depth > 0 => out.push('|'),
            '}' if depth > 0 => {
                depth -= 1;
                out.push(')');
            }
            c => push_literal(&mut out, c),
        }
        i += 1;
    }

    if depth > 0 {
        return Err(format!("unclosed '{{' in glob {glob:?}"));
    }
    out.push_str(r")\z");
    Ok(out)
}

/// Index of the `]` closing the class opened at `start`, if any. A `]`
/// right after the opening (or its negation) is a member.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if matches!(chars.get(j), Some('!' | '^')) {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    chars[j.min(chars.len())..]
        .iter()
        .position(|&c| c == ']')
        .map(|offset| j + offset)
}

fn push_class(out: &mut String, body: &[char]) {
    out.push('[');
    let members = match body.split_first() {
        Some(('!' | '^', rest)) => {
            out.push('^');
            rest
        }
        _ => body,
    };
    let mut previous = None;
    for &c in members {
        // `--`, `&&` and `~~` are set operators to the regex crate
        let doubled = previous == Some(c) && matches!(c, '-' | '&' | '~');
        if doubled || matches!(c, '\\' | '[' | ']' | '^') {
            out.push('\\');
        }
        out.push(c);
        previous = Some(c);
    }
    out.push(']');
}

fn push_literal(out: &mut String, c: char) {
    let mut buf = [0_u8; 4];
    out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}
