//! Textual asset references as stored in host widgets: `[subfolder/]filename[ [type]]`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

pub const INPUT: &str = "input";
pub const OUTPUT: &str = "output";

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)(?:\s*\[([A-Za-z0-9_]+)\])?$").expect("reference grammar is valid")
});

/// Structured pointer into one of the server's storage areas.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    pub filename: String,
    #[serde(default)]
    pub subfolder: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl AssetRef {
    pub fn new(
        filename: impl Into<String>,
        subfolder: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            subfolder: subfolder.into(),
            kind: kind.into(),
        }
    }

    /// Reference into the `input` area, the only area uploads write to.
    pub fn input(filename: impl Into<String>, subfolder: impl Into<String>) -> Self {
        Self::new(filename, subfolder, INPUT)
    }

    /// Parses a widget value. `default_kind` applies when no `[type]` suffix is present.
    ///
    /// Returns `None` only when the text does not match the grammar at all
    /// (empty input, or a lone newline-bearing value).
    pub fn parse(text: &str, default_kind: &str) -> Option<Self> {
        let caps = REFERENCE.captures(text)?;
        let path = caps.get(1)?.as_str();
        let kind = caps
            .get(2)
            .map(|m| m.as_str())
            .unwrap_or(default_kind);

        let (subfolder, filename) = match path.rfind('/') {
            Some(idx) => (&path[..idx], &path[idx + 1..]),
            None => ("", path),
        };
        Some(Self::new(filename, subfolder, kind))
    }

    /// The widget value form, `subfolder/filename [type]`.
    pub fn to_widget_value(&self) -> String {
        self.to_string()
    }

    /// Storage area, falling back to `input` for records that omit it.
    pub fn kind_or_input(&self) -> &str {
        if self.kind.is_empty() { INPUT } else { &self.kind }
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.subfolder.is_empty() {
            write!(f, "{} [{}]", self.filename, self.kind_or_input())
        } else {
            write!(
                f,
                "{}/{} [{}]",
                self.subfolder,
                self.filename,
                self.kind_or_input()
            )
        }
    }
}
