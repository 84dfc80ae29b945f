//! Small validated value types shared across the observation service crates.

use std::fmt;
use std::str::FromStr;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input was not a recognisable locale tag
    #[error("Invalid locale: {0}")]
    InvalidLocale(String),
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
/// Void reasons and concept names are carried as `NonEmptyText`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// Returns `Err(TextError::Empty)` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A language tag used for locale-sensitive rendering.
///
/// Accepts `en`, `en_GB` and `en-GB` forms; the language part is lowercased and the
/// country part uppercased, so `EN-gb` and `en_GB` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale {
    language: String,
    country: Option<String>,
}

impl Locale {
    /// Parses a locale tag.
    pub fn parse(input: &str) -> Result<Self, TextError> {
        let trimmed = input.trim();
        let mut parts = trimmed.splitn(2, ['_', '-']);
        let language = parts.next().unwrap_or_default();

        let valid_language =
            (2..=3).contains(&language.len()) && language.bytes().all(|b| b.is_ascii_alphabetic());
        if !valid_language {
            return Err(TextError::InvalidLocale(input.to_string()));
        }

        let country = match parts.next() {
            Some(c) if c.len() == 2 && c.bytes().all(|b| b.is_ascii_alphabetic()) => {
                Some(c.to_ascii_uppercase())
            }
            Some(_) => return Err(TextError::InvalidLocale(input.to_string())),
            None => None,
        };

        Ok(Self {
            language: language.to_ascii_lowercase(),
            country,
        })
    }

    /// Picks the first usable tag from an `Accept-Language` header value.
    ///
    /// Quality weights are ignored; entries such as `*` are skipped.
    pub fn from_accept_language(header: &str) -> Option<Self> {
        header
            .split(',')
            .filter_map(|entry| entry.split(';').next())
            .find_map(|tag| Self::parse(tag).ok())
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// True when `other` has the same language, ignoring country.
    pub fn same_language(&self, other: &Locale) -> bool {
        self.language == other.language
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self {
            language: "en".into(),
            country: None,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.country {
            Some(country) => write!(f, "{}_{}", self.language, country),
            None => write!(f, "{}", self.language),
        }
    }
}

impl FromStr for Locale {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::parse(s)
    }
}

impl serde::Serialize for Locale {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Locale {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Locale::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  entered in error ").unwrap();
        assert_eq!(text.as_str(), "entered in error");
    }

    #[test]
    fn non_empty_text_rejects_whitespace() {
        assert_eq!(NonEmptyText::new("   "), Err(TextError::Empty));
    }

    #[test]
    fn non_empty_text_deserialize_rejects_empty() {
        let result: Result<NonEmptyText, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn locale_normalises_case_and_separator() {
        let a = Locale::parse("EN-gb").unwrap();
        let b = Locale::parse("en_GB").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "en_GB");
        assert_eq!(a.language(), "en");
        assert_eq!(a.country(), Some("GB"));
    }

    #[test]
    fn locale_rejects_garbage() {
        assert!(Locale::parse("").is_err());
        assert!(Locale::parse("english").is_err());
        assert!(Locale::parse("en_GBR").is_err());
        assert!(Locale::parse("e1").is_err());
    }

    #[test]
    fn accept_language_takes_first_valid_tag() {
        let locale = Locale::from_accept_language("*, fr-CA;q=0.9, en;q=0.8").unwrap();
        assert_eq!(locale.to_string(), "fr_CA");
        assert!(Locale::from_accept_language("*").is_none());
    }

    #[test]
    fn same_language_ignores_country() {
        let gb = Locale::parse("en_GB").unwrap();
        let us = Locale::parse("en_US").unwrap();
        let fr = Locale::parse("fr").unwrap();
        assert!(gb.same_language(&us));
        assert!(!gb.same_language(&fr));
    }

    #[test]
    fn locale_serde_uses_string_form() {
        let locale = Locale::parse("pt_BR").unwrap();
        let json = serde_json::to_string(&locale).unwrap();
        assert_eq!(json, "\"pt_BR\"");
        let back: Locale = serde_json::from_str(&json).unwrap();
        assert_eq!(back, locale);
    }
}
