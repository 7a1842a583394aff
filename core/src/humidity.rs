use serde::{Deserialize, Serialize};

/// Humidity band shown on plant cards, inferred from care notes or category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HumidityLevel {
    Low,
    Moderate,
    High,
}

impl HumidityLevel {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }

    /// Relative-humidity range associated with the band.
    #[must_use]
    pub fn range(self) -> &'static str {
        match self {
            Self::Low => "30–40%",
            Self::Moderate => "40–50%",
            Self::High => "60–80%",
        }
    }

    /// Combined display label, e.g. "Low (30–40%)".
    #[must_use]
    pub fn display_label(self) -> &'static str {
        match self {
            Self::Low => "Low (30–40%)",
            Self::Moderate => "Moderate (40–50%)",
            Self::High => "High (60–80%)",
        }
    }
}

/// Infer a humidity band from free-text care notes, falling back to the
/// plant's category when the notes say nothing about humidity.
///
/// Notes phrases are checked first, in priority order: low beats high
/// beats moderate. Matching is case-insensitive and tolerant of arbitrary
/// whitespace between words.
#[must_use]
pub fn infer_humidity(notes: &str, category: &str) -> HumidityLevel {
    let notes = normalize(notes);
    // "very low humidity" also matches the plain "low humidity" phrase.
    if notes.contains("low humidity") {
        return HumidityLevel::Low;
    }
    if notes.contains("high humidity")
        || notes.contains("humidity is essential")
        || notes.contains("essential humidity")
        || notes.contains("moderate to high")
    {
        return HumidityLevel::High;
    }
    if notes.contains("moderate humidity") || notes.contains("medium humidity") {
        return HumidityLevel::Moderate;
    }

    let category = category.to_lowercase();
    if category.contains("succulent") || category.contains("cacti") {
        HumidityLevel::Low
    } else if category.contains("tropical") {
        HumidityLevel::High
    } else {
        HumidityLevel::Moderate
    }
}

/// Lower-case and collapse whitespace runs so phrase matching works across
/// line breaks and double spaces.
fn normalize(text: &str) -> String {
    text.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}
