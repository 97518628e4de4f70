//! The diff option bag and its comma-separated token parser.
//!
//! Options arrive as a single string of comma-separated tokens (for example
//! `"internal,filler,algorithm:patience"`). Parsing is all-or-nothing: one
//! unrecognized token rejects the whole string, leaving the previous options
//! in effect at the caller.

use serde::{Deserialize, Serialize};

/// The sequence-alignment algorithm requested for the internal backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffAlgorithm {
    /// Standard Myers O(ND) alignment.
    #[default]
    Myers,
    /// Spend extra effort to find the smallest possible diff.
    Minimal,
    /// Patience alignment on unique common lines.
    Patience,
    /// Histogram alignment (patience extended to low-occurrence lines).
    Histogram,
}

/// Errors from parsing an options string.
#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    /// A token was not recognized. The whole string is rejected.
    #[error("unknown diff option: {0:?}")]
    UnknownToken(String),

    /// A token carried a numeric argument that did not parse.
    #[error("invalid number in diff option: {0:?}")]
    InvalidNumber(String),
}

/// Immutable snapshot of the diff options in effect for one computation.
///
/// Display-oriented tokens (`horizontal`, `vertical`, `foldcolumn`,
/// `hiddenoff`, `closeoff`, `followwrap`) are parsed and stored so that a
/// full options string round-trips, but are consumed by the window layer,
/// not by this engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffOptions {
    /// Show filler lines to keep text aligned across windows.
    pub filler: bool,
    /// Ignore case differences.
    pub icase: bool,
    /// Ignore changes in the amount of white space.
    pub iwhite: bool,
    /// Ignore all white space.
    pub iwhiteall: bool,
    /// Ignore white space at end of line.
    pub iwhiteeol: bool,
    /// Ignore changes where lines are all blank.
    pub iblank: bool,
    /// Use the internal diff backend rather than an external command.
    pub internal: bool,
    /// Use the indent heuristic when sliding hunk boundaries.
    pub indent_heuristic: bool,
    /// Number of context lines shown around a change when folding.
    pub context: i64,
    /// The alignment algorithm for the internal backend.
    pub algorithm: DiffAlgorithm,
    /// Split horizontally when opening a diff window.
    pub horizontal: bool,
    /// Split vertically when opening a diff window.
    pub vertical: bool,
    /// Width of the fold column in diff windows.
    pub foldcolumn: i64,
    /// Do not use diff mode for hidden buffers.
    pub hiddenoff: bool,
    /// Reset diff-related local options when the last diff window closes.
    pub closeoff: bool,
    /// Keep 'wrap' as-is when entering diff mode.
    pub followwrap: bool,
}

impl DiffOptions {
    /// The zeroed bag every parse starts from: all flags off, numeric
    /// defaults in place.
    pub fn empty() -> Self {
        Self {
            filler: false,
            icase: false,
            iwhite: false,
            iwhiteall: false,
            iwhiteeol: false,
            iblank: false,
            internal: false,
            indent_heuristic: false,
            context: 6,
            algorithm: DiffAlgorithm::Myers,
            horizontal: false,
            vertical: false,
            foldcolumn: 2,
            hiddenoff: false,
            closeoff: false,
            followwrap: false,
        }
    }

    /// Parse a comma-separated options string.
    ///
    /// An unrecognized token is a hard error for the whole string; nothing
    /// is applied partially.
    pub fn parse(s: &str) -> Result<Self, OptionsError> {
        let mut opts = Self::empty();
        for token in s.split(',') {
            if token.is_empty() {
                continue;
            }
            match token {
                "filler" => opts.filler = true,
                "icase" => opts.icase = true,
                "iwhite" => opts.iwhite = true,
                "iwhiteall" => opts.iwhiteall = true,
                "iwhiteeol" => opts.iwhiteeol = true,
                "iblank" => opts.iblank = true,
                "internal" => opts.internal = true,
                "indent-heuristic" => opts.indent_heuristic = true,
                "horizontal" => opts.horizontal = true,
                "vertical" => opts.vertical = true,
                "hiddenoff" => opts.hiddenoff = true,
                "closeoff" => opts.closeoff = true,
                "followwrap" => opts.followwrap = true,
                _ => {
                    if let Some(num) = token.strip_prefix("context:") {
                        opts.context = parse_num(num, token)?;
                    } else if let Some(num) = token.strip_prefix("foldcolumn:") {
                        opts.foldcolumn = parse_num(num, token)?;
                    } else if let Some(name) = token.strip_prefix("algorithm:") {
                        opts.algorithm = match name {
                            "myers" => DiffAlgorithm::Myers,
                            "minimal" => DiffAlgorithm::Minimal,
                            "patience" => DiffAlgorithm::Patience,
                            "histogram" => DiffAlgorithm::Histogram,
                            _ => return Err(OptionsError::UnknownToken(token.to_string())),
                        };
                    } else {
                        return Err(OptionsError::UnknownToken(token.to_string()));
                    }
                }
            }
        }
        Ok(opts)
    }

    /// Returns `true` if any flag changing line comparison is set.
    pub fn modifies_comparison(&self) -> bool {
        self.icase || self.iwhite || self.iwhiteall || self.iwhiteeol || self.iblank
    }

    /// Normalize a line into the key used for equality under these options.
    ///
    /// Two lines compare equal (ignoring `iblank`, which is not expressible
    /// as a per-line key) exactly when their keys are equal.
    pub fn comparison_key(&self, line: &str) -> String {
        let mut key = String::with_capacity(line.len());
        if self.iwhiteall {
            key.extend(line.chars().filter(|c| !c.is_whitespace()));
        } else if self.iwhite {
            // Collapse each whitespace run to a single space, drop a
            // trailing run entirely.
            let mut in_white = false;
            for c in line.chars() {
                if c.is_whitespace() {
                    in_white = true;
                } else {
                    if in_white {
                        key.push(' ');
                    }
                    in_white = false;
                    key.push(c);
                }
            }
        } else if self.iwhiteeol {
            key.push_str(line.trim_end());
        } else {
            key.push_str(line);
        }
        if self.icase {
            key = key.to_lowercase();
        }
        key
    }
}

impl Default for DiffOptions {
    fn default() -> Self {
        // The stock option string.
        Self::parse("internal,filler,closeoff").expect("default options parse")
    }
}

impl std::str::FromStr for DiffOptions {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_num(s: &str, token: &str) -> Result<i64, OptionsError> {
    s.parse()
        .map_err(|_| OptionsError::InvalidNumber(token.to_string()))
}

/// Compare two lines under the given options.
///
/// This is the single comparison routine used by the engine's equality
/// re-checks and by sub-line change detection.
pub fn lines_match(a: &str, b: &str, opts: &DiffOptions) -> bool {
    if opts.iblank && a.trim().is_empty() && b.trim().is_empty() {
        return true;
    }
    if !opts.modifies_comparison() {
        return a == b;
    }
    opts.comparison_key(a) == opts.comparison_key(b)
}
