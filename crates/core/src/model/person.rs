use super::AuditInfo;
use chrono::NaiveDate;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonName {
    pub given_name: String,
    pub middle_name: Option<String>,
    pub family_name: String,
    pub preferred: bool,
}

impl PersonName {
    /// Given, middle and family names joined with single spaces, skipping blanks.
    pub fn full_name(&self) -> String {
        [
            Some(self.given_name.as_str()),
            self.middle_name.as_deref(),
            Some(self.family_name.as_str()),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// A person; patients are people flagged with `is_patient`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    pub uuid: String,
    pub names: Vec<PersonName>,
    pub gender: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub is_patient: bool,
    pub voided: bool,
    pub audit: AuditInfo,
}

impl Person {
    pub fn preferred_name(&self) -> Option<&PersonName> {
        self.names
            .iter()
            .find(|n| n.preferred)
            .or_else(|| self.names.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferred_name_falls_back_to_first() {
        let mut person = Person {
            names: vec![
                PersonName {
                    given_name: "Jo".into(),
                    family_name: "Bloggs".into(),
                    ..Default::default()
                },
                PersonName {
                    given_name: "Joanna".into(),
                    middle_name: Some(" ".into()),
                    family_name: "Bloggs".into(),
                    preferred: true,
                },
            ],
            ..Default::default()
        };
        assert_eq!(person.preferred_name().unwrap().full_name(), "Joanna Bloggs");
        person.names[1].preferred = false;
        assert_eq!(person.preferred_name().unwrap().full_name(), "Jo Bloggs");
    }
}
