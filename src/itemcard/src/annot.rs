//! Modifier-line annotations
//!
//! A modifier line can carry bracketed markers (`{variant:1,2}`,
//! `{range:0.35}`, `{crafted}`, `{custom}`, `{fractured}`, `{tags:a,b}`) and
//! trailing parenthetical suffixes (` (implicit)`, ` (enchant)`,
//! ` (crafted)`, ` (fractured)`). All markers are extracted into a
//! structured annotation up front; later logic never re-scans the text.

use std::collections::BTreeSet;

/// Structured form of every marker a line can carry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineAnnotations {
    pub crafted: bool,
    pub custom: bool,
    pub fractured: bool,
    pub implicit: bool,
    /// An `(enchant)` marker implies implicit-like classification as well
    pub enchant: bool,
    /// 1-based variant indices this line is active for
    pub variants: Option<BTreeSet<usize>>,
    /// Numeric range fraction for `(a-b)` templates in the line
    pub range: Option<f64>,
    /// Free-form classification tags
    pub tags: Vec<String>,
}

impl LineAnnotations {
    /// Strip all markers from `line`, returning the annotations and the
    /// remaining bare text
    pub fn strip(line: &str) -> (Self, String) {
        let mut annot = LineAnnotations::default();
        let mut rest = line.trim().to_string();

        // Leading bracketed markers, in any order and number
        loop {
            let Some(inner_end) = rest.starts_with('{').then(|| rest.find('}')).flatten() else {
                break;
            };
            let marker = rest[1..inner_end].to_string();
            if !annot.apply_marker(&marker) {
                break;
            }
            rest = rest[inner_end + 1..].trim_start().to_string();
        }

        // Trailing parenthetical suffixes; several may stack
        loop {
            let trimmed = rest.trim_end();
            let stripped = if let Some(s) = trimmed.strip_suffix("(implicit)") {
                annot.implicit = true;
                s
            } else if let Some(s) = trimmed.strip_suffix("(enchant)") {
                annot.enchant = true;
                s
            } else if let Some(s) = trimmed.strip_suffix("(crafted)") {
                annot.crafted = true;
                s
            } else if let Some(s) = trimmed.strip_suffix("(fractured)") {
                annot.fractured = true;
                s
            } else {
                break;
            };
            rest = stripped.trim_end().to_string();
        }

        (annot, rest)
    }

    /// Apply one `{...}` marker. Returns false for markers this module does
    /// not understand, which are left in the text.
    fn apply_marker(&mut self, marker: &str) -> bool {
        match marker {
            "crafted" => self.crafted = true,
            "custom" => self.custom = true,
            "fractured" => self.fractured = true,
            _ => {
                if let Some(spec) = marker.strip_prefix("variant:") {
                    let set: BTreeSet<usize> =
                        spec.split(',').filter_map(|v| v.trim().parse().ok()).collect();
                    self.variants = Some(set);
                } else if let Some(spec) = marker.strip_prefix("range:") {
                    if let Ok(fraction) = spec.trim().parse::<f64>() {
                        self.range = Some(fraction.clamp(0.0, 1.0));
                    }
                } else if let Some(spec) = marker.strip_prefix("tags:") {
                    self.tags = spec
                        .split(',')
                        .map(|t| t.trim().to_string())
                        .filter(|t| !t.is_empty())
                        .collect();
                } else {
                    return false;
                }
            }
        }
        true
    }

    /// Re-emit the bracketed markers in canonical order: range, crafted,
    /// custom, fractured, variant set, tags
    pub fn markers(&self) -> String {
        let mut out = String::new();
        if let Some(range) = self.range {
            out.push_str(&format!("{{range:{range}}}"));
        }
        if self.crafted {
            out.push_str("{crafted}");
        }
        if self.custom {
            out.push_str("{custom}");
        }
        if self.fractured {
            out.push_str("{fractured}");
        }
        if let Some(variants) = &self.variants {
            let list: Vec<String> = variants.iter().map(|v| v.to_string()).collect();
            out.push_str(&format!("{{variant:{}}}", list.join(",")));
        }
        if !self.tags.is_empty() {
            out.push_str(&format!("{{tags:{}}}", self.tags.join(",")));
        }
        out
    }
}
