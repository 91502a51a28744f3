//! Font ascent ratios used to convert a text baseline into a visual top.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Ratio used when a font is not in the table.
pub const DEFAULT_ASCENT_RATIO: f64 = 0.96;

/// Descent used for span heights when the font descriptor has none.
pub const DEFAULT_DESCENT_RATIO: f64 = -0.2;

static SUBSET_PREFIX: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[A-Z]{6}\+").ok());

/// Normalize a font name for table lookup.
///
/// Trims whitespace and a leading `/`, strips a six-letter subset prefix
/// such as `ABCDEF+`, and upper-cases the rest.
pub fn canonical_font_name(name: &str) -> String {
    let trimmed = name.trim().trim_matches('/');
    let stripped = match SUBSET_PREFIX.as_ref() {
        Some(re) => re.replace(trimmed, ""),
        None => trimmed.into(),
    };
    stripped.to_uppercase()
}

/// Immutable map from canonical font name to ascent ratio.
///
/// The ratio is the distance from baseline to the visual top of the
/// glyphs, as a fraction of the font size.
#[derive(Debug, Clone, PartialEq)]
pub struct FontAscentTable {
    ratios: HashMap<String, f64>,
    default_ratio: f64,
}

impl Default for FontAscentTable {
    fn default() -> Self {
        Self::new(
            [
                ("LATO", 0.960),
                ("LATO-REGULAR", 0.960),
                ("HELVETICA", 0.718),
                ("TIMES-ROMAN", 0.662),
            ],
            DEFAULT_ASCENT_RATIO,
        )
    }
}

impl FontAscentTable {
    /// Build a table; keys are canonicalized on insertion.
    pub fn new<K: AsRef<str>>(
        entries: impl IntoIterator<Item = (K, f64)>,
        default_ratio: f64,
    ) -> Self {
        let ratios = entries
            .into_iter()
            .map(|(name, ratio)| (canonical_font_name(name.as_ref()), ratio))
            .collect();
        Self {
            ratios,
            default_ratio,
        }
    }

    /// Return a copy with one more entry.
    pub fn with_entry(mut self, name: &str, ratio: f64) -> Self {
        self.ratios.insert(canonical_font_name(name), ratio);
        self
    }

    pub fn default_ratio(&self) -> f64 {
        self.default_ratio
    }

    /// Ratio for `font_name`, falling back to the default ratio.
    pub fn ratio_for(&self, font_name: &str) -> f64 {
        self.ratios
            .get(&canonical_font_name(font_name))
            .copied()
            .unwrap_or(self.default_ratio)
    }
}
