// Token classification for both faces of the identity card.
//
// The OCR engine hands back text fragments in reading order. Most of them are
// noise (labels in two languages, card titles, partial words), so every
// classifier here is total: a token either matches a rule or is skipped.

use chrono::{Datelike, Local, NaiveDate};
use log::{debug, trace};

use crate::models::{Face, IdentityRecord};
use crate::validation::fields::{self, GenderMark};

const SURNAME_LABEL: &str = "surname";
const NAME_LABEL: &str = "name(s)";
const MOTHER_LABEL: &str = "mother";
const FATHER_LABEL: &str = "father";

/// What a single front-face token was recognised as.
///
/// Rules are tried in declaration order and the first match wins: the exact
/// length numeric shapes come before the free-text label checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrontToken<'a> {
    IdentityNo(&'a str),
    DocumentNo(&'a str),
    SurnameLabel,
    NameLabel,
    BirthDate(NaiveDate),
    ValidUntil(NaiveDate),
    Gender(GenderMark),
    Unrecognized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackToken<'a> {
    MotherLabel,
    FatherLabel,
    Name(&'a str),
    Other,
}

/// Progress through the parental-name block on the back face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackScan {
    AwaitingMotherLabel { father_seen: bool },
    AwaitingMotherName { father_seen: bool },
    AwaitingFatherLabel,
    AwaitingFatherName,
    Done,
}

impl BackScan {
    fn start() -> Self {
        BackScan::AwaitingMotherLabel { father_seen: false }
    }

    fn step(self, token: BackToken<'_>, record: &mut IdentityRecord) -> Self {
        use BackScan::*;

        match (self, token) {
            (AwaitingMotherLabel { father_seen }, BackToken::MotherLabel) => {
                AwaitingMotherName { father_seen }
            }
            (AwaitingMotherLabel { .. }, BackToken::FatherLabel) => {
                AwaitingMotherLabel { father_seen: true }
            }
            (AwaitingMotherName { .. }, BackToken::FatherLabel) => {
                AwaitingMotherName { father_seen: true }
            }
            (AwaitingMotherName { father_seen }, BackToken::Name(name)) => {
                debug!("mother_name <- {:?}", name);
                record.mother_name = Some(name.to_string());
                if father_seen {
                    AwaitingFatherName
                } else {
                    AwaitingFatherLabel
                }
            }
            (AwaitingFatherLabel, BackToken::FatherLabel) => AwaitingFatherName,
            (AwaitingFatherName, BackToken::Name(name)) => {
                debug!("father_name <- {:?}", name);
                record.father_name = Some(name.to_string());
                Done
            }
            (state, _) => state,
        }
    }
}

/// Builds an [`IdentityRecord`] from one face's OCR tokens.
///
/// Dates are split into birth and validity dates by comparing against the
/// current year. Unless pinned with [`for_year`](Self::for_year), that year
/// is read from the local clock on every call, so a long-lived extractor
/// keeps working across a year boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldExtractor {
    pinned_year: Option<i32>,
}

impl FieldExtractor {
    /// Extractor following the local clock.
    pub fn new() -> Self {
        FieldExtractor { pinned_year: None }
    }

    /// Extractor that always compares dates against `year`.
    pub fn for_year(year: i32) -> Self {
        FieldExtractor {
            pinned_year: Some(year),
        }
    }

    pub fn pinned_year(&self) -> Option<i32> {
        self.pinned_year
    }

    /// Year dates are compared against at this moment.
    pub fn current_year(&self) -> i32 {
        self.pinned_year.unwrap_or_else(|| Local::now().year())
    }

    pub fn extract<S: AsRef<str>>(&self, tokens: &[S], face: Face) -> IdentityRecord {
        debug!("Extracting {} face from {} tokens", face, tokens.len());
        match face {
            Face::Front => extract_front(tokens, self.current_year()),
            Face::Back => extract_back(tokens),
        }
    }
}

fn extract_front<S: AsRef<str>>(tokens: &[S], current_year: i32) -> IdentityRecord {
    let mut record = IdentityRecord::new();

    for (index, token) in tokens.iter().enumerate() {
        let token = token.as_ref();
        let lookahead = || {
            tokens
                .get(index + 1)
                .map(|next| next.as_ref().trim().to_string())
                .filter(|next| !next.is_empty())
        };

        match classify_front(token, current_year) {
            FrontToken::IdentityNo(value) => {
                debug!("identity_no <- {:?}", value);
                record.identity_no = Some(value.to_string());
            }
            FrontToken::DocumentNo(value) => {
                debug!("document_no <- {:?}", value);
                record.document_no = Some(value.to_string());
            }
            FrontToken::SurnameLabel => assign_once(&mut record.surname, lookahead(), "surname"),
            FrontToken::NameLabel => assign_once(&mut record.name, lookahead(), "name"),
            FrontToken::BirthDate(date) => {
                assign_once(&mut record.date_of_birth, Some(date), "date_of_birth")
            }
            FrontToken::ValidUntil(date) => {
                assign_once(&mut record.valid_until, Some(date), "valid_until")
            }
            FrontToken::Gender(GenderMark::Known(gender)) => {
                assign_once(&mut record.gender, Some(gender), "gender")
            }
            FrontToken::Gender(GenderMark::Unresolved) => {
                trace!("Unresolved gender mark {:?}", token);
            }
            FrontToken::Unrecognized => trace!("Skipping token {:?}", token),
        }
    }

    record
}

fn extract_back<S: AsRef<str>>(tokens: &[S]) -> IdentityRecord {
    let mut record = IdentityRecord::new();
    let mut scan = BackScan::start();

    for token in tokens {
        let token = token.as_ref();
        scan = scan.step(classify_back(token), &mut record);
        if scan == BackScan::Done {
            break;
        }
    }

    record
}

fn classify_front(token: &str, current_year: i32) -> FrontToken<'_> {
    if let Some(value) = fields::identity_no(token) {
        return FrontToken::IdentityNo(value);
    }
    if let Some(value) = fields::document_no(token) {
        return FrontToken::DocumentNo(value);
    }

    let lower = token.to_lowercase();
    if lower.contains(SURNAME_LABEL) {
        return FrontToken::SurnameLabel;
    }
    if lower.contains(NAME_LABEL) {
        return FrontToken::NameLabel;
    }

    if let Some(date) = fields::card_date(token) {
        return if date.year() < current_year {
            FrontToken::BirthDate(date)
        } else {
            FrontToken::ValidUntil(date)
        };
    }

    match fields::gender_mark(token) {
        Some(mark) => FrontToken::Gender(mark),
        None => FrontToken::Unrecognized,
    }
}

fn classify_back(token: &str) -> BackToken<'_> {
    let lower = token.to_lowercase();
    if lower.contains(MOTHER_LABEL) {
        BackToken::MotherLabel
    } else if lower.contains(FATHER_LABEL) {
        BackToken::FatherLabel
    } else if let Some(name) = fields::upper_case_word(token) {
        BackToken::Name(name)
    } else {
        BackToken::Other
    }
}

fn assign_once<T: std::fmt::Debug>(slot: &mut Option<T>, value: Option<T>, field: &str) {
    if slot.is_some() {
        return;
    }
    if let Some(value) = value {
        debug!("{} <- {:?}", field, value);
        *slot = Some(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use crate::validation::CompletenessValidator;

    fn extractor() -> FieldExtractor {
        FieldExtractor::for_year(2024)
    }

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn front_face_full_card() {
        let tokens = [
            "SURNAME", "DOE", "NAME(S)", "JANE", "12345678901", "A12B34567",
            "01.01.1990", "01.01.2030", "E",
        ];
        let record = extractor().extract(&tokens, Face::Front);

        assert_eq!(record.surname.as_deref(), Some("DOE"));
        assert_eq!(record.name.as_deref(), Some("JANE"));
        assert_eq!(record.identity_no.as_deref(), Some("12345678901"));
        assert_eq!(record.document_no.as_deref(), Some("A12B34567"));
        assert_eq!(record.date_of_birth, date(1990, 1, 1));
        assert_eq!(record.valid_until, date(2030, 1, 1));
        assert_eq!(record.gender, Some(Gender::Male));
        assert!(record.mother_name.is_none());
        assert!(record.father_name.is_none());
        assert!(CompletenessValidator::is_complete(&record, Face::Front));
    }

    #[test]
    fn bilingual_labels_are_matched_case_insensitively() {
        let tokens = [
            "TÜRKİYE CUMHURİYETİ KİMLİK KARTI",
            "Soyadı / Surname",
            "YILMAZ",
            "Adı / Given Name(s)",
            "AYŞE",
            "Cinsiyeti / Gender",
            "K / F",
        ];
        let record = extractor().extract(&tokens, Face::Front);

        assert_eq!(record.surname.as_deref(), Some("YILMAZ"));
        assert_eq!(record.name.as_deref(), Some("AYŞE"));
        assert_eq!(record.gender, Some(Gender::Female));
    }

    #[test]
    fn date_year_decides_field() {
        let record = extractor().extract(&["15.03.1990"], Face::Front);
        assert_eq!(record.date_of_birth, date(1990, 3, 15));
        assert!(record.valid_until.is_none());

        // the current year itself counts as validity
        let record = extractor().extract(&["31.12.2024"], Face::Front);
        assert!(record.date_of_birth.is_none());
        assert_eq!(record.valid_until, date(2024, 12, 31));

        let record = extractor().extract(&["2030-01-01"], Face::Front);
        assert_eq!(record, IdentityRecord::default());
    }

    #[test]
    fn label_without_lookahead_leaves_field_unset() {
        let record = extractor().extract(&["JANE", "Surname"], Face::Front);
        assert!(record.surname.is_none());

        let record = extractor().extract(&["given name(s)"], Face::Front);
        assert!(record.name.is_none());
    }

    #[test]
    fn numbers_keep_last_match_other_fields_keep_first() {
        let tokens = [
            "11111111111", "A11A11111", "Surname", "FIRST", "01.01.1980", "E",
            "22222222222", "B22B22222", "Surname", "SECOND", "01.01.1970", "K",
        ];
        let record = extractor().extract(&tokens, Face::Front);

        assert_eq!(record.identity_no.as_deref(), Some("22222222222"));
        assert_eq!(record.document_no.as_deref(), Some("B22B22222"));
        assert_eq!(record.surname.as_deref(), Some("FIRST"));
        assert_eq!(record.date_of_birth, date(1980, 1, 1));
        assert_eq!(record.gender, Some(Gender::Male));
    }

    #[test]
    fn classification_precedence() {
        let classify = |token| classify_front(token, 2024);
        assert_eq!(classify("12345678901"), FrontToken::IdentityNo("12345678901"));
        assert_eq!(classify("A12B34567"), FrontToken::DocumentNo("A12B34567"));
        // "surname" also contains "name", but not "name(s)"
        assert_eq!(classify("SURNAME"), FrontToken::SurnameLabel);
        assert_eq!(classify("Name(s)"), FrontToken::NameLabel);
        assert_eq!(classify("15.03.2023"), FrontToken::BirthDate(date(2023, 3, 15).unwrap()));
        assert_eq!(classify("15.03.2024"), FrontToken::ValidUntil(date(2024, 3, 15).unwrap()));
        assert_eq!(classify("m"), FrontToken::Gender(GenderMark::Unresolved));
        assert_eq!(classify("X"), FrontToken::Unrecognized);
        assert_eq!(classify("1234567890"), FrontToken::Unrecognized);
    }

    #[test]
    fn unpinned_extractor_follows_the_clock() {
        let ex = FieldExtractor::new();
        assert_eq!(ex.pinned_year(), None);
        assert_eq!(ex, FieldExtractor::default());
        assert_eq!(ex.current_year(), Local::now().year());

        let this_year = Local::now().year();
        let last_year = format!("15.03.{}", this_year - 1);
        let record = ex.extract(&[last_year.as_str()], Face::Front);
        assert_eq!(record.date_of_birth, date(this_year - 1, 3, 15));
        assert!(record.valid_until.is_none());
    }

    #[test]
    fn pinned_year_is_kept() {
        let ex = FieldExtractor::for_year(2025);
        assert_eq!(ex.pinned_year(), Some(2025));
        assert_eq!(ex.current_year(), 2025);

        let record = ex.extract(&["15.03.2025"], Face::Front);
        assert_eq!(record.valid_until, date(2025, 3, 15));

        let record = FieldExtractor::for_year(2026).extract(&["15.03.2025"], Face::Front);
        assert_eq!(record.date_of_birth, date(2025, 3, 15));
    }

    #[test]
    fn unresolved_gender_mark_assigns_nothing() {
        let record = extractor().extract(&["M", "F"], Face::Front);
        assert!(record.gender.is_none());
    }

    #[test]
    fn front_scan_never_fills_parent_names() {
        let tokens = ["Mother", "AYŞE", "Father", "MEHMET"];
        let record = extractor().extract(&tokens, Face::Front);
        assert!(record.mother_name.is_none());
        assert!(record.father_name.is_none());
    }

    #[test]
    fn back_face_parent_names() {
        let tokens = ["MOTHER", "JANEDOE", "FATHER", "JOHNDOE"];
        let record = extractor().extract(&tokens, Face::Back);

        assert_eq!(record.mother_name.as_deref(), Some("JANEDOE"));
        assert_eq!(record.father_name.as_deref(), Some("JOHNDOE"));
        assert!(record.identity_no.is_none());
        assert!(CompletenessValidator::is_complete(&record, Face::Back));
    }

    #[test]
    fn back_face_skips_lower_case_candidates() {
        let tokens = ["MOTHER", "JANEDOE", "FATHER", "johndoe"];
        let record = extractor().extract(&tokens, Face::Back);

        assert_eq!(record.mother_name.as_deref(), Some("JANEDOE"));
        assert!(record.father_name.is_none());
        assert!(!CompletenessValidator::is_complete(&record, Face::Back));
    }

    #[test]
    fn back_face_with_bilingual_labels_and_noise() {
        let tokens = [
            "Anne Adı / Mother's Name",
            "Soyadı",
            "AYŞE",
            "ZEYNEP",
            "Baba Adı / Father's Name",
            "MEHMET",
            "ALİ",
        ];
        let record = extractor().extract(&tokens, Face::Back);

        assert_eq!(record.mother_name.as_deref(), Some("AYŞE"));
        assert_eq!(record.father_name.as_deref(), Some("MEHMET"));
    }

    #[test]
    fn father_label_before_mother_name() {
        let tokens = ["Mother's Name", "Father's Name", "AYŞE", "MEHMET"];
        let record = extractor().extract(&tokens, Face::Back);

        assert_eq!(record.mother_name.as_deref(), Some("AYŞE"));
        assert_eq!(record.father_name.as_deref(), Some("MEHMET"));
    }

    #[test]
    fn names_before_any_label_are_ignored() {
        let tokens = ["KIMLIK", "Father", "MEHMET"];
        let record = extractor().extract(&tokens, Face::Back);
        assert_eq!(record, IdentityRecord::default());
    }

    #[test]
    fn back_scan_transitions() {
        let mut record = IdentityRecord::new();
        let state = BackScan::start()
            .step(BackToken::Name("AYŞE"), &mut record)
            .step(BackToken::MotherLabel, &mut record);
        assert_eq!(state, BackScan::AwaitingMotherName { father_seen: false });
        assert!(record.mother_name.is_none());

        let state = state.step(BackToken::Name("AYŞE"), &mut record);
        assert_eq!(state, BackScan::AwaitingFatherLabel);
        let state = state
            .step(BackToken::MotherLabel, &mut record)
            .step(BackToken::FatherLabel, &mut record)
            .step(BackToken::Other, &mut record)
            .step(BackToken::Name("MEHMET"), &mut record);
        assert_eq!(state, BackScan::Done);
        assert_eq!(record.father_name.as_deref(), Some("MEHMET"));
    }

    #[test]
    fn extraction_is_repeatable() {
        let ex = extractor();
        let tokens = vec!["Surname".to_string(), "DOE".to_string(), "01.01.1990".to_string()];
        assert_eq!(ex.extract(&tokens, Face::Front), ex.extract(&tokens, Face::Front));
    }
}
