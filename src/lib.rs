pub mod id_card_reader;
pub mod models;
pub mod processing;
pub mod utils;
pub mod validation;

pub use id_card_reader::{Extraction, IdCardReader};
pub use models::{Face, Gender, IdentityRecord};
pub use utils::IdCardError;
