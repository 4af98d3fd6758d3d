pub mod aggregate;
pub mod events;
pub mod value_object;

pub use aggregate::{ConfirmationSession, SessionSnapshot};
pub use events::{SessionEvent, SessionEventPayload, StatementOrigin};
pub use value_object::{ConfirmationToken, ExplainReport, Statement, UsedUris, ValidationReport};
