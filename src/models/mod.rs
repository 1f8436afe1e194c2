pub mod condition;
pub mod enums;
pub mod symptom;

pub use condition::{Condition, MatchCriteria, SymptomWeight};
pub use symptom::{DoshaProfile, UserProfile, UserSymptomData};
