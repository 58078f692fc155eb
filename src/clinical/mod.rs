//! Clinical follow-up: alerts for the care team, symptom reports and the
//! patient's clinical timeline.

pub mod alerts;
pub mod symptoms;
pub mod timeline;

pub use alerts::*;
pub use symptoms::*;
pub use timeline::*;
