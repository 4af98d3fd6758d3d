pub mod countdown;
pub mod error;
pub mod model;
pub mod notices;
pub mod orchestrator;
pub mod polling;
pub mod templates;
pub mod view;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{ConsoleError, ConsoleResult, Precondition};
pub use model::ActionKind;
pub use orchestrator::ActionOrchestrator;
pub use polling::PollingLoops;
pub use view::ConsoleViewModel;
