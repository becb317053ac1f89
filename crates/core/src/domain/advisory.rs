use serde::{Deserialize, Serialize};

/// Icon keys understood by the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionIcon {
    Leaf,
    Bus,
    Clock,
    Route,
    Umbrella,
    Walking,
    HourglassHalf,
    ChartLine,
    CheckCircle,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub icon: SuggestionIcon,
    pub title: String,
    pub description: String,
}

impl Suggestion {
    pub fn new(icon: SuggestionIcon, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { icon, title: title.into(), description: description.into() }
    }

    pub fn affirmation() -> Self {
        Self::new(
            SuggestionIcon::CheckCircle,
            "Great choice!",
            "Your current selection is already optimized for this trip.",
        )
    }
}
