pub mod clock;
pub mod http;
pub mod prompt;

pub use clock::{ManualClock, SystemClock};
pub use http::HttpRemoteService;
pub use prompt::{AutoConfirm, TerminalPrompt};
