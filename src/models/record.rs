use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::IdCardError;

/// Format dates are printed in on the card, and in serialized records.
pub const CARD_DATE_FORMAT: &str = "%d.%m.%Y";

/// Side of the identity card an image shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Face {
    Front,
    Back,
}

impl Face {
    pub fn as_str(&self) -> &'static str {
        match self {
            Face::Front => "front",
            Face::Back => "back",
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Face {
    type Err = IdCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "front" => Ok(Face::Front),
            "back" => Ok(Face::Back),
            _ => Err(IdCardError::UnknownFace(s.to_string())),
        }
    }
}

/// Gender as printed on the card: Turkish initial, then English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "E/M")]
    Male,
    #[serde(rename = "K/F")]
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "E/M",
            Gender::Female => "K/F",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields recovered from one face of the card.
///
/// Built fresh for every extraction call. The front scan fills everything
/// except the parental names, the back scan fills only those two.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub identity_no: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    #[serde(default, with = "card_date")]
    pub date_of_birth: Option<NaiveDate>,
    pub document_no: Option<String>,
    pub gender: Option<Gender>,
    #[serde(default, with = "card_date")]
    pub valid_until: Option<NaiveDate>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
}

impl IdentityRecord {
    pub fn new() -> Self {
        Self::default()
    }
}

mod card_date {
    use super::CARD_DATE_FORMAT;
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_some(&date.format(CARD_DATE_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| NaiveDate::parse_from_str(&s, CARD_DATE_FORMAT).map_err(de::Error::custom))
            .transpose()
    }
}
