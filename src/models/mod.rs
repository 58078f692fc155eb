pub mod alert;
pub mod chat;
pub mod consent;
pub mod emotion;
pub mod enums;
pub mod recommendation;
pub mod symptom;
pub mod timeline;
pub mod user;

pub use alert::*;
pub use chat::*;
pub use consent::*;
pub use emotion::*;
pub use recommendation::*;
pub use symptom::*;
pub use timeline::*;
pub use user::*;
