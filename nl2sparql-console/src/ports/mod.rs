pub mod clock_port;
pub mod prompt_port;
pub mod remote_port;

pub use clock_port::Clock;
pub use prompt_port::{ConfirmRequest, ConfirmSubject, ConfirmationPrompt};
pub use remote_port::{
    ExecuteResponse, GenerateRequest, GenerateResponse, HealthStatus, PreviewResponse,
    RecentLogs, RemoteError, RemoteResult, RemoteServicePort, SelectResponse, UndoRequest,
    UndoResponse,
};
