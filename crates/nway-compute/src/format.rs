//! Parsing of textual diff output into hunks.
//!
//! Two formats are accepted, auto-detected from the first meaningful line of
//! each computation's output:
//!
//! - classic ed style: `{first}[,{last}]{a|c|d}{first}[,{last}]`
//! - unified style: `@@ -{start}[,{count}] +{start}[,{count}] @@`
//!   (produced with zero lines of context)
//!
//! A line that looks like a hunk header but does not parse is skipped with a
//! warning; it is never fatal to the computation.

use tracing::warn;

use nway_types::Hunk;

#[derive(Clone, Copy, PartialEq, Eq)]
enum DiffStyle {
    Unknown,
    Ed,
    Unified,
}

/// Parse a complete diff output into hunks, auto-detecting the format.
pub fn parse_diff_output(output: &str) -> Vec<Hunk> {
    let mut style = DiffStyle::Unknown;
    let mut hunks = Vec::new();

    for line in output.lines() {
        if style == DiffStyle::Unknown {
            // Determine the style from the first meaningful line.
            if line.starts_with(|c: char| c.is_ascii_digit()) {
                style = DiffStyle::Ed;
            } else if line.starts_with("@@ ") || line.starts_with("--- ") {
                style = DiffStyle::Unified;
            } else {
                continue;
            }
        }
        match style {
            DiffStyle::Ed => {
                if !line.starts_with(|c: char| c.is_ascii_digit()) {
                    continue; // hunk body or noise
                }
                match parse_ed_line(line) {
                    Some(hunk) => hunks.push(hunk),
                    None => warn!(line, "skipping malformed ed-style hunk line"),
                }
            }
            DiffStyle::Unified => {
                if !line.starts_with("@@ ") {
                    continue; // file headers and hunk body
                }
                match parse_unified_line(line) {
                    Some(hunk) => hunks.push(hunk),
                    None => warn!(line, "skipping malformed unified hunk header"),
                }
            }
            DiffStyle::Unknown => unreachable!(),
        }
    }

    hunks
}

/// Read a run of ASCII digits from the front of `s`, returning the value and
/// the rest.
fn take_digits(s: &str) -> Option<(i64, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let value = s[..end].parse().ok()?;
    Some((value, &s[end..]))
}

/// Parse one ed-style hunk line: `{f1}[,{l1}]{a|c|d}{f2}[,{l2}]`.
///
/// An `a` hunk has no lines in the original (insertion below `f1`), a `d`
/// hunk no lines in the new document.
fn parse_ed_line(line: &str) -> Option<Hunk> {
    let (f1, rest) = take_digits(line)?;
    let (l1, rest) = match rest.strip_prefix(',') {
        Some(rest) => take_digits(rest)?,
        None => (f1, rest),
    };
    let op = rest.chars().next()?;
    if !matches!(op, 'a' | 'c' | 'd') {
        return None;
    }
    let rest = &rest[1..];
    let (f2, rest) = take_digits(rest)?;
    let (l2, rest) = match rest.strip_prefix(',') {
        Some(rest) => take_digits(rest)?,
        None => (f2, rest),
    };
    if !rest.is_empty() || l1 < f1 || l2 < f2 {
        return None;
    }

    let (orig_start, orig_count) = if op == 'a' {
        (f1 + 1, 0)
    } else {
        (f1, l1 - f1 + 1)
    };
    let (new_start, new_count) = if op == 'd' {
        (f2 + 1, 0)
    } else {
        (f2, l2 - f2 + 1)
    };
    Some(Hunk::new(orig_start, orig_count, new_start, new_count))
}

/// Parse one unified hunk header: `@@ -{start}[,{count}] +{start}[,{count}] @@`.
///
/// A zero count marks the start as the line *before* the change, so it is
/// shifted down by one to match the ed-style convention.
fn parse_unified_line(line: &str) -> Option<Hunk> {
    let rest = line.strip_prefix("@@ -")?;
    let (mut orig_start, rest) = take_digits(rest)?;
    let (orig_count, rest) = match rest.strip_prefix(',') {
        Some(rest) => take_digits(rest)?,
        None => (1, rest),
    };
    let rest = rest.strip_prefix(" +")?;
    let (mut new_start, rest) = take_digits(rest)?;
    let (new_count, rest) = match rest.strip_prefix(',') {
        Some(rest) => take_digits(rest)?,
        None => (1, rest),
    };
    rest.strip_prefix(" @@")?;

    if orig_count == 0 {
        orig_start += 1;
    }
    if orig_start == 0 {
        orig_start = 1;
    }
    if new_count == 0 {
        new_start += 1;
    }
    if new_start == 0 {
        new_start = 1;
    }
    Some(Hunk::new(orig_start, orig_count, new_start, new_count))
}
