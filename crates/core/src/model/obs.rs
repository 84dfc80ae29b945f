use super::{AuditInfo, Concept, ConceptDatatype, Encounter, Location, Order, Person};
use crate::conversion::parse_datetime;
use crate::{ReprError, ReprResult};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use obsrest_types::Locale;
use obsrest_uuid::EntityUuid;
use std::sync::Arc;

/// Typed value of an observation. Which variant is meaningful depends on the datatype of
/// the observation's concept.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ObsValue {
    #[default]
    Empty,
    Numeric(f64),
    Coded(Arc<Concept>),
    Text(String),
    Boolean(bool),
    Date(NaiveDate),
    Datetime(DateTime<Utc>),
    Time(NaiveTime),
}

/// A single clinical observation, or a group of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Obs {
    pub uuid: String,
    pub person: Option<Arc<Person>>,
    pub concept: Option<Arc<Concept>>,
    pub value: ObsValue,
    pub obs_datetime: Option<DateTime<Utc>>,
    pub accession_number: Option<String>,
    /// Uuid of the grouping observation this one belongs to.
    pub obs_group: Option<String>,
    pub group_members: Vec<Arc<Obs>>,
    pub comment: Option<String>,
    pub location: Option<Arc<Location>>,
    pub order: Option<Arc<Order>>,
    pub encounter: Option<Arc<Encounter>>,
    pub voided: bool,
    pub void_reason: Option<String>,
    pub audit: AuditInfo,
}

impl Default for Obs {
    /// A fresh observation with a newly generated uuid and nothing else set.
    fn default() -> Self {
        Self {
            uuid: EntityUuid::new().to_string(),
            person: None,
            concept: None,
            value: ObsValue::Empty,
            obs_datetime: None,
            accession_number: None,
            obs_group: None,
            group_members: Vec::new(),
            comment: None,
            location: None,
            order: None,
            encounter: None,
            voided: false,
            void_reason: None,
            audit: AuditInfo::default(),
        }
    }
}

impl Obs {
    /// A grouping observation carries its content in its members, not in a value.
    pub fn is_obs_grouping(&self) -> bool {
        !self.group_members.is_empty()
    }

    /// The value rendered for `locale`.
    ///
    /// Numbers of non-precise concepts are truncated to integers. Coded answers render as
    /// the answer concept's name. Dates use day/month/year except for `en_US`.
    pub fn value_as_string(&self, locale: &Locale) -> String {
        match &self.value {
            ObsValue::Empty => String::new(),
            ObsValue::Numeric(v) => {
                let precise = self.concept.as_ref().map_or(true, |c| c.is_precise());
                if precise {
                    format_decimal(*v)
                } else {
                    (v.trunc() as i64).to_string()
                }
            }
            ObsValue::Coded(answer) => answer.name(locale).unwrap_or_default().to_string(),
            ObsValue::Text(text) => text.clone(),
            ObsValue::Boolean(b) => b.to_string(),
            ObsValue::Date(date) => date.format(date_pattern(locale)).to_string(),
            ObsValue::Datetime(dt) => {
                format!("{} {}", dt.format(date_pattern(locale)), dt.format("%H:%M"))
            }
            ObsValue::Time(time) => time.format("%H:%M").to_string(),
        }
    }

    /// Parses `raw` according to the concept's datatype and stores it.
    ///
    /// Coded values cannot be set from a string and concepts of type N/A take no value.
    pub fn set_value_as_string(&mut self, raw: &str) -> ReprResult<()> {
        let datatype = self
            .concept
            .as_ref()
            .map(|c| c.datatype)
            .ok_or_else(|| ReprError::InvalidInput("concept must be set before value".into()))?;
        let raw = raw.trim();

        self.value = match datatype {
            ConceptDatatype::Numeric => ObsValue::Numeric(raw.parse::<f64>().map_err(|_| {
                ReprError::InvalidInput(format!("{raw} is not a valid number"))
            })?),
            ConceptDatatype::Text => ObsValue::Text(raw.to_string()),
            ConceptDatatype::Boolean => ObsValue::Boolean(parse_boolean(raw)?),
            ConceptDatatype::Date => ObsValue::Date(parse_datetime(raw)?.date_naive()),
            ConceptDatatype::Datetime => ObsValue::Datetime(parse_datetime(raw)?),
            ConceptDatatype::Time => ObsValue::Time(parse_time(raw)?),
            ConceptDatatype::Coded | ConceptDatatype::NotApplicable => {
                return Err(ReprError::InvalidInput(format!(
                    "a {datatype} value cannot be set from a string"
                )))
            }
        };
        Ok(())
    }

    pub fn set_value_coded(&mut self, answer: Arc<Concept>) {
        self.value = ObsValue::Coded(answer);
    }
}

fn date_pattern(locale: &Locale) -> &'static str {
    if locale.language() == "en" && locale.country() == Some("US") {
        "%m/%d/%Y"
    } else {
        "%d/%m/%Y"
    }
}

/// Whole numbers keep one decimal place so `5.0` does not read as an integer.
fn format_decimal(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}

fn parse_boolean(raw: &str) -> ReprResult<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ReprError::InvalidInput(format!("{raw} is not a valid boolean"))),
    }
}

fn parse_time(raw: &str) -> ReprResult<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| ReprError::InvalidInput(format!("{raw} is not a valid time")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConceptName, ConceptNumeric};
    use chrono::TimeZone;

    fn concept(datatype: ConceptDatatype, precise: bool) -> Arc<Concept> {
        Arc::new(Concept {
            uuid: EntityUuid::new().to_string(),
            names: vec![ConceptName {
                name: "Question".into(),
                locale: Locale::default(),
                preferred: true,
            }],
            datatype,
            concept_class: "Question".into(),
            numeric: (datatype == ConceptDatatype::Numeric).then(|| ConceptNumeric {
                units: Some("mg".into()),
                precise,
                ..Default::default()
            }),
            answers: Vec::new(),
            retired: false,
        })
    }

    fn obs_of(datatype: ConceptDatatype) -> Obs {
        Obs {
            concept: Some(concept(datatype, true)),
            ..Default::default()
        }
    }

    #[test]
    fn default_obs_has_fresh_uuid() {
        let a = Obs::default();
        let b = Obs::default();
        assert!(EntityUuid::is_canonical(&a.uuid));
        assert_ne!(a.uuid, b.uuid);
    }

    #[test]
    fn numeric_rendering_depends_on_precision() {
        let mut obs = Obs {
            concept: Some(concept(ConceptDatatype::Numeric, false)),
            value: ObsValue::Numeric(12.7),
            ..Default::default()
        };
        assert_eq!(obs.value_as_string(&Locale::default()), "12");
        obs.concept = Some(concept(ConceptDatatype::Numeric, true));
        assert_eq!(obs.value_as_string(&Locale::default()), "12.7");
        obs.value = ObsValue::Numeric(5.0);
        assert_eq!(obs.value_as_string(&Locale::default()), "5.0");
    }

    #[test]
    fn dates_follow_locale() {
        let obs = Obs {
            value: ObsValue::Date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()),
            ..obs_of(ConceptDatatype::Date)
        };
        assert_eq!(obs.value_as_string(&Locale::parse("en_GB").unwrap()), "09/03/2024");
        assert_eq!(obs.value_as_string(&Locale::parse("en_US").unwrap()), "03/09/2024");

        let obs = Obs {
            value: ObsValue::Datetime(Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap()),
            ..obs_of(ConceptDatatype::Datetime)
        };
        assert_eq!(obs.value_as_string(&Locale::default()), "09/03/2024 14:05");
    }

    #[test]
    fn set_value_as_string_per_datatype() {
        let mut obs = obs_of(ConceptDatatype::Numeric);
        obs.set_value_as_string(" 7.5 ").unwrap();
        assert_eq!(obs.value, ObsValue::Numeric(7.5));
        assert!(obs.set_value_as_string("seven").is_err());

        let mut obs = obs_of(ConceptDatatype::Boolean);
        obs.set_value_as_string("TRUE").unwrap();
        assert_eq!(obs.value, ObsValue::Boolean(true));

        let mut obs = obs_of(ConceptDatatype::Time);
        obs.set_value_as_string("08:30").unwrap();
        assert_eq!(obs.value, ObsValue::Time(NaiveTime::from_hms_opt(8, 30, 0).unwrap()));

        let mut obs = obs_of(ConceptDatatype::Date);
        obs.set_value_as_string("2024-03-09").unwrap();
        assert_eq!(
            obs.value,
            ObsValue::Date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap())
        );

        let mut obs = obs_of(ConceptDatatype::Text);
        obs.set_value_as_string("  free text ").unwrap();
        assert_eq!(obs.value, ObsValue::Text("free text".into()));
    }

    #[test]
    fn coded_and_not_applicable_reject_strings() {
        assert!(obs_of(ConceptDatatype::Coded).set_value_as_string("x").is_err());
        assert!(obs_of(ConceptDatatype::NotApplicable)
            .set_value_as_string("x")
            .is_err());
    }

    #[test]
    fn value_without_concept_is_rejected() {
        let mut obs = Obs::default();
        assert!(matches!(
            obs.set_value_as_string("1"),
            Err(ReprError::InvalidInput(_))
        ));
    }
}
