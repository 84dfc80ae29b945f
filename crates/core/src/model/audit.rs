use crate::conversion::format_datetime;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Who created and last changed an entity, and when.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditInfo {
    pub creator: Option<String>,
    pub date_created: Option<DateTime<Utc>>,
    pub changed_by: Option<String>,
    pub date_changed: Option<DateTime<Utc>>,
}

impl AuditInfo {
    pub fn created(by: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            creator: Some(by.into()),
            date_created: Some(at),
            changed_by: None,
            date_changed: None,
        }
    }

    /// Records a change. The first call on a never-saved entity records creation instead.
    pub fn touch(&mut self, by: impl Into<String>, at: DateTime<Utc>) {
        let by = by.into();
        if self.date_created.is_none() {
            self.creator = Some(by);
            self.date_created = Some(at);
        } else {
            self.changed_by = Some(by);
            self.date_changed = Some(at);
        }
    }

    /// `{"creator", "dateCreated", "changedBy", "dateChanged"}` with unset members left out.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if let Some(creator) = &self.creator {
            map.insert("creator".into(), Value::from(creator.as_str()));
        }
        if let Some(at) = &self.date_created {
            map.insert("dateCreated".into(), Value::from(format_datetime(at)));
        }
        if let Some(by) = &self.changed_by {
            map.insert("changedBy".into(), Value::from(by.as_str()));
        }
        if let Some(at) = &self.date_changed {
            map.insert("dateChanged".into(), Value::from(format_datetime(at)));
        }
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn touch_records_creation_then_change() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap();
        let mut audit = AuditInfo::default();
        audit.touch("admin", t0);
        audit.touch("nurse", t1);
        assert_eq!(
            audit.to_value(),
            json!({
                "creator": "admin",
                "dateCreated": "2024-01-01T08:00:00.000+0000",
                "changedBy": "nurse",
                "dateChanged": "2024-01-02T08:00:00.000+0000",
            })
        );
    }

    #[test]
    fn unset_members_are_omitted() {
        assert_eq!(AuditInfo::default().to_value(), json!({}));
    }
}
