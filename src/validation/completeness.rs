use crate::models::{Face, IdentityRecord};

pub struct CompletenessValidator;

impl CompletenessValidator {
    /// Whether every field required for `face` was recovered.
    pub fn is_complete(record: &IdentityRecord, face: Face) -> bool {
        Self::missing_fields(record, face).is_empty()
    }

    /// Same as [`is_complete`](Self::is_complete) for a face given by name;
    /// an unrecognised name is never complete.
    pub fn is_complete_for(record: &IdentityRecord, face: &str) -> bool {
        face.parse::<Face>()
            .map(|face| Self::is_complete(record, face))
            .unwrap_or(false)
    }

    /// Names of the required fields that are absent or empty.
    pub fn missing_fields(record: &IdentityRecord, face: Face) -> Vec<&'static str> {
        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());

        let required: Vec<(&'static str, bool)> = match face {
            Face::Front => vec![
                ("name", present(&record.name)),
                ("surname", present(&record.surname)),
                ("date_of_birth", record.date_of_birth.is_some()),
                ("identity_no", present(&record.identity_no)),
                ("gender", record.gender.is_some()),
                ("document_no", present(&record.document_no)),
                ("valid_until", record.valid_until.is_some()),
            ],
            Face::Back => vec![
                ("mother_name", present(&record.mother_name)),
                ("father_name", present(&record.father_name)),
            ],
        };

        required
            .into_iter()
            .filter(|(_, ok)| !ok)
            .map(|(field, _)| field)
            .collect()
    }
}
