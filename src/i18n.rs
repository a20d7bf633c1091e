//! Page copy in the two supported languages.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "it")]
    It,
    #[serde(rename = "en")]
    En,
}

/// Every user-visible string for one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phrases {
    pub motto: &'static str,
    pub subtitle: &'static str,
    pub toggle_label: &'static str,
    pub share_label: &'static str,
    pub copied_label: &'static str,
    pub install_label: &'static str,
    pub speed_label: &'static str,
    pub trail_label: &'static str,
    pub precession_label: &'static str,
    pub hyper_label: &'static str,
    pub blend_label: &'static str,
    pub blend_additive: &'static str,
    pub blend_alpha: &'static str,
}

const ITALIAN: Phrases = Phrases {
    motto: "LA MATEMATICA TI COPRE LE SPALLE.",
    subtitle: "Math’s got your back.",
    toggle_label: "EN",
    share_label: "Condividi",
    copied_label: "Copiato",
    install_label: "Installa",
    speed_label: "Velocità",
    trail_label: "Scia",
    precession_label: "Precessione",
    hyper_label: "Scia densa",
    blend_label: "Fusione",
    blend_additive: "Additiva",
    blend_alpha: "Alfa",
};

const ENGLISH: Phrases = Phrases {
    motto: "MATH'S GOT YOUR BACK.",
    subtitle: "Math is on your side.",
    toggle_label: "IT",
    share_label: "Share",
    copied_label: "Copied",
    install_label: "Install",
    speed_label: "Speed",
    trail_label: "Trail",
    precession_label: "Precession",
    hyper_label: "Hyper trail",
    blend_label: "Blend",
    blend_additive: "Additive",
    blend_alpha: "Alpha",
};

impl Language {
    /// BCP 47 tag, also the stored preference value.
    pub fn code(self) -> &'static str {
        match self {
            Language::It => "it",
            Language::En => "en",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code.trim() {
            "it" => Some(Language::It),
            "en" => Some(Language::En),
            _ => None,
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Language::It => Language::En,
            Language::En => Language::It,
        }
    }

    pub fn phrases(self) -> &'static Phrases {
        match self {
            Language::It => &ITALIAN,
            Language::En => &ENGLISH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_between_languages() {
        assert_eq!(Language::It.toggle(), Language::En);
        assert_eq!(Language::En.toggle().toggle(), Language::En);
    }

    #[test]
    fn codes_round_trip() {
        for lang in [Language::It, Language::En] {
            assert_eq!(Language::parse(lang.code()), Some(lang));
        }
        assert_eq!(Language::parse("fr"), None);
    }

    #[test]
    fn toggle_label_names_the_other_language() {
        assert_eq!(Language::It.phrases().toggle_label, "EN");
        assert_eq!(Language::En.phrases().motto, "MATH'S GOT YOUR BACK.");
    }
}
