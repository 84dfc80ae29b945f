use crate::{ReprError, ReprResult};
use obsrest_types::Locale;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of value an observation of a concept carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConceptDatatype {
    Numeric,
    Coded,
    Text,
    Boolean,
    Date,
    Datetime,
    Time,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl ConceptDatatype {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConceptDatatype::Numeric => "Numeric",
            ConceptDatatype::Coded => "Coded",
            ConceptDatatype::Text => "Text",
            ConceptDatatype::Boolean => "Boolean",
            ConceptDatatype::Date => "Date",
            ConceptDatatype::Datetime => "Datetime",
            ConceptDatatype::Time => "Time",
            ConceptDatatype::NotApplicable => "N/A",
        }
    }

    pub fn is_coded(&self) -> bool {
        matches!(self, ConceptDatatype::Coded)
    }
}

impl fmt::Display for ConceptDatatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConceptDatatype {
    type Err = ReprError;

    fn from_str(s: &str) -> ReprResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "numeric" => Ok(ConceptDatatype::Numeric),
            "coded" => Ok(ConceptDatatype::Coded),
            "text" => Ok(ConceptDatatype::Text),
            "boolean" => Ok(ConceptDatatype::Boolean),
            "date" => Ok(ConceptDatatype::Date),
            "datetime" => Ok(ConceptDatatype::Datetime),
            "time" => Ok(ConceptDatatype::Time),
            "n/a" | "na" => Ok(ConceptDatatype::NotApplicable),
            other => Err(ReprError::InvalidInput(format!(
                "unknown concept datatype: {other}"
            ))),
        }
    }
}

/// A name of a concept in one locale.
#[derive(Debug, Clone, PartialEq)]
pub struct ConceptName {
    pub name: String,
    pub locale: Locale,
    pub preferred: bool,
}

/// Extra attributes of a numeric concept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConceptNumeric {
    pub units: Option<String>,
    /// When false, values are rendered as integers.
    pub precise: bool,
    pub hi_normal: Option<f64>,
    pub low_normal: Option<f64>,
}

/// A vocabulary entry: the question an observation answers, or a coded answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Concept {
    pub uuid: String,
    pub names: Vec<ConceptName>,
    pub datatype: ConceptDatatype,
    pub concept_class: String,
    pub numeric: Option<ConceptNumeric>,
    /// Uuids of the concepts accepted as coded answers.
    pub answers: Vec<String>,
    pub retired: bool,
}

impl Concept {
    /// Best name for `locale`.
    ///
    /// Preference order: the preferred name in the exact locale, the preferred name in the
    /// same language, any name in the same language, then the first name recorded.
    pub fn name(&self, locale: &Locale) -> Option<&str> {
        self.names
            .iter()
            .find(|n| n.preferred && n.locale == *locale)
            .or_else(|| {
                self.names
                    .iter()
                    .find(|n| n.preferred && n.locale.same_language(locale))
            })
            .or_else(|| self.names.iter().find(|n| n.locale.same_language(locale)))
            .or_else(|| self.names.first())
            .map(|n| n.name.as_str())
    }

    pub fn is_numeric(&self) -> bool {
        self.datatype == ConceptDatatype::Numeric
    }

    pub fn units(&self) -> Option<&str> {
        self.numeric.as_ref().and_then(|n| n.units.as_deref())
    }

    /// Numeric concepts without numeric attributes count as precise.
    pub fn is_precise(&self) -> bool {
        self.numeric.as_ref().map_or(true, |n| n.precise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(name: &str, locale: &str, preferred: bool) -> ConceptName {
        ConceptName {
            name: name.into(),
            locale: Locale::parse(locale).unwrap(),
            preferred,
        }
    }

    fn concept(names: Vec<ConceptName>) -> Concept {
        Concept {
            uuid: "5089AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA".into(),
            names,
            datatype: ConceptDatatype::Numeric,
            concept_class: "Test".into(),
            numeric: None,
            answers: Vec::new(),
            retired: false,
        }
    }

    #[test]
    fn name_prefers_exact_locale_then_language() {
        let c = concept(vec![
            name("Weight", "en", false),
            name("Poids", "fr", true),
            name("Body weight", "en_GB", true),
        ]);
        let gb = Locale::parse("en_GB").unwrap();
        let us = Locale::parse("en_US").unwrap();
        let fr = Locale::parse("fr").unwrap();
        let de = Locale::parse("de").unwrap();
        assert_eq!(c.name(&gb), Some("Body weight"));
        assert_eq!(c.name(&us), Some("Body weight"));
        assert_eq!(c.name(&fr), Some("Poids"));
        assert_eq!(c.name(&de), Some("Weight"));
    }

    #[test]
    fn no_names_gives_none() {
        assert_eq!(concept(Vec::new()).name(&Locale::default()), None);
    }

    #[test]
    fn datatype_parses_case_insensitively() {
        assert_eq!("CODED".parse::<ConceptDatatype>().unwrap(), ConceptDatatype::Coded);
        assert_eq!("N/A".parse::<ConceptDatatype>().unwrap(), ConceptDatatype::NotApplicable);
        assert!("blob".parse::<ConceptDatatype>().is_err());
    }
}
