use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type Id = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "MALE",
            Sex::Female => "FEMALE",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MALE" => Ok(Sex::Male),
            "FEMALE" => Ok(Sex::Female),
            other => Err(anyhow::anyhow!("Unknown sex value '{}'", other)),
        }
    }
}

/// Case-insensitive substring match used by the name filters.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sex_uses_upper_case_wire_format() {
        assert_eq!(serde_json::to_string(&Sex::Male).unwrap(), "\"MALE\"");
        let parsed: Sex = serde_json::from_str("\"FEMALE\"").unwrap();
        assert_eq!(parsed, Sex::Female);
        assert_eq!("MALE".parse::<Sex>().unwrap(), Sex::Male);
        assert!("male".parse::<Sex>().is_err());
    }

    #[test]
    fn substring_match_ignores_case() {
        assert!(contains_ignore_case("Charles II", "charles"));
        assert!(!contains_ignore_case("Maximilian I", "charles"));
    }
}
