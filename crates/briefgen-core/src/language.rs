use serde::{Deserialize, Serialize};

/// Output language requested from the brief service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputLanguage {
    #[default]
    English,
    Spanish,
    French,
    German,
    Hindi,
    Chinese,
}

impl OutputLanguage {
    /// Value sent in the multipart `language` field
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputLanguage::English => "English",
            OutputLanguage::Spanish => "Spanish",
            OutputLanguage::French => "French",
            OutputLanguage::German => "German",
            OutputLanguage::Hindi => "Hindi",
            OutputLanguage::Chinese => "Chinese",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "english" => Some(OutputLanguage::English),
            "spanish" => Some(OutputLanguage::Spanish),
            "french" => Some(OutputLanguage::French),
            "german" => Some(OutputLanguage::German),
            "hindi" => Some(OutputLanguage::Hindi),
            "chinese" => Some(OutputLanguage::Chinese),
            _ => None,
        }
    }

    pub fn all() -> Vec<OutputLanguage> {
        vec![
            OutputLanguage::English,
            OutputLanguage::Spanish,
            OutputLanguage::French,
            OutputLanguage::German,
            OutputLanguage::Hindi,
            OutputLanguage::Chinese,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OutputLanguage::English => "English",
            OutputLanguage::Spanish => "Español",
            OutputLanguage::French => "Français",
            OutputLanguage::German => "Deutsch",
            OutputLanguage::Hindi => "हिन्दी",
            OutputLanguage::Chinese => "中文",
        }
    }

    /// Next language in the fixed order, wrapping around
    pub fn next(&self) -> Self {
        let all = Self::all();
        let idx = all.iter().position(|l| l == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }

    pub fn prev(&self) -> Self {
        let all = Self::all();
        let idx = all.iter().position(|l| l == self).unwrap_or(0);
        all[(idx + all.len() - 1) % all.len()]
    }
}
