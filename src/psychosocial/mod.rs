//! Emotional follow-up: emotion logs and check-ins, wellbeing
//! recommendations and the patient's data-sharing consent.

pub mod consent;
pub mod emotions;
pub mod recommendations;

pub use consent::*;
pub use emotions::*;
pub use recommendations::*;
