use std::fmt;
use std::str::FromStr;

/// CEFR proficiency level of the learner.
///
/// Serialized as its full label ("B1 - Intermediate"), which is also the
/// wording used inside prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum EnglishLevel {
    #[serde(rename = "A1 - Beginner")]
    A1,
    #[serde(rename = "A2 - Elementary")]
    A2,
    #[default]
    #[serde(rename = "B1 - Intermediate")]
    B1,
    #[serde(rename = "B2 - Upper-Intermediate")]
    B2,
    #[serde(rename = "C1 - Advanced")]
    C1,
    #[serde(rename = "C2 - Proficient")]
    C2,
}

impl EnglishLevel {
    pub const ALL: [EnglishLevel; 6] = [
        EnglishLevel::A1,
        EnglishLevel::A2,
        EnglishLevel::B1,
        EnglishLevel::B2,
        EnglishLevel::C1,
        EnglishLevel::C2,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            EnglishLevel::A1 => "A1",
            EnglishLevel::A2 => "A2",
            EnglishLevel::B1 => "B1",
            EnglishLevel::B2 => "B2",
            EnglishLevel::C1 => "C1",
            EnglishLevel::C2 => "C2",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EnglishLevel::A1 => "A1 - Beginner",
            EnglishLevel::A2 => "A2 - Elementary",
            EnglishLevel::B1 => "B1 - Intermediate",
            EnglishLevel::B2 => "B2 - Upper-Intermediate",
            EnglishLevel::C1 => "C1 - Advanced",
            EnglishLevel::C2 => "C2 - Proficient",
        }
    }
}

impl fmt::Display for EnglishLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("Unknown English level '{0}'. Expected one of A1, A2, B1, B2, C1, C2.")]
pub struct ParseLevelError(String);

impl FromStr for EnglishLevel {
    type Err = ParseLevelError;

    /// Accepts the short code ("b2") or the full label ("B2 - Upper-Intermediate").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|level| {
                level.code().eq_ignore_ascii_case(wanted) || level.label().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| ParseLevelError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_code_and_label() {
        assert_eq!("b2".parse::<EnglishLevel>(), Ok(EnglishLevel::B2));
        assert_eq!(" C1 ".parse::<EnglishLevel>(), Ok(EnglishLevel::C1));
        assert_eq!(
            "a2 - elementary".parse::<EnglishLevel>(),
            Ok(EnglishLevel::A2)
        );
        assert!("D1".parse::<EnglishLevel>().is_err());
    }

    #[test]
    fn test_serializes_as_label() {
        assert_eq!(
            serde_json::to_string(&EnglishLevel::C2).unwrap(),
            r#""C2 - Proficient""#
        );
        let level: EnglishLevel = serde_json::from_str(r#""A1 - Beginner""#).unwrap();
        assert_eq!(level, EnglishLevel::A1);
    }

    #[test]
    fn test_default_is_intermediate() {
        assert_eq!(EnglishLevel::default(), EnglishLevel::B1);
        assert_eq!(EnglishLevel::default().to_string(), "B1 - Intermediate");
    }
}
