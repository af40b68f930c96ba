//! Qualifying-platform allow-list for competition scoring.
//!
//! Competitions need one auditable revenue definition across all
//! participants, regardless of how each driver labels their own income
//! sources. Only revenue from the allow-listed ride-hailing platforms
//! counts; everything else (tips, custom platforms, renamed entries) is
//! excluded before any aggregation.

/// A ride-hailing platform whose revenue qualifies for competition scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualifyingPlatform {
    Uber,
    NinetyNine,
    InDrive,
}

impl QualifyingPlatform {
    pub const ALL: [QualifyingPlatform; 3] = [
        QualifyingPlatform::Uber,
        QualifyingPlatform::NinetyNine,
        QualifyingPlatform::InDrive,
    ];

    /// Internal key, also the canonical allow-list entry.
    pub fn key(&self) -> &'static str {
        match self {
            QualifyingPlatform::Uber => "uber",
            QualifyingPlatform::NinetyNine => "99",
            QualifyingPlatform::InDrive => "indrive",
        }
    }

    /// Human display label used in breakdowns and daily summaries.
    pub fn label(&self) -> &'static str {
        match self {
            QualifyingPlatform::Uber => "Uber",
            QualifyingPlatform::NinetyNine => "99",
            QualifyingPlatform::InDrive => "InDrive",
        }
    }

    /// Match a platform key or display label, case- and accent-insensitively.
    ///
    /// Returns None for anything not on the allow-list.
    pub fn from_label(input: &str) -> Option<Self> {
        let folded = fold_label(input);
        QualifyingPlatform::ALL
            .into_iter()
            .find(|p| p.key() == folded)
    }
}

impl std::fmt::Display for QualifyingPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// True if revenue under this platform key/label counts toward scoring.
pub fn is_qualifying(platform: &str) -> bool {
    QualifyingPlatform::from_label(platform).is_some()
}

/// Lowercase, trim, and strip Latin diacritics so that user-renamed
/// labels like "ÚBER " still resolve to the canonical key.
fn fold_label(input: &str) -> String {
    input
        .trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(fold_char)
        .collect()
}

fn fold_char(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}
