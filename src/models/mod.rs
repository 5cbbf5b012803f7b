pub mod record;

pub use record::{Face, Gender, IdentityRecord, CARD_DATE_FORMAT};
