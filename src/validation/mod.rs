pub mod completeness;
pub mod fields;

pub use completeness::CompletenessValidator;
pub use fields::GenderMark;
