pub mod adapters;
pub mod app;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;

use app::orchestrator::ActionOrchestrator;
use app::polling::PollingLoops;
use app::view::ConsoleViewModel;
use config::ConsoleSettings;
use ports::clock_port::Clock;
use ports::prompt_port::ConfirmationPrompt;
use ports::remote_port::RemoteServicePort;
use std::sync::Arc;
use tracing::info;

/// A running console: the orchestrator plus its activity feeds.
pub struct Console {
    orchestrator: Arc<ActionOrchestrator>,
    polling: PollingLoops,
}

impl Console {
    /// Starts the polling workers and wires the log refresh into the
    /// orchestrator. Must be called from within a Tokio runtime.
    pub fn start(
        remote: Arc<dyn RemoteServicePort>,
        prompt: Arc<dyn ConfirmationPrompt>,
        clock: Arc<dyn Clock>,
        settings: &ConsoleSettings,
    ) -> Self {
        let orchestrator = Arc::new(ActionOrchestrator::new(
            Arc::clone(&remote),
            prompt,
            clock,
            settings,
        ));
        let polling = PollingLoops::start(remote, settings);
        orchestrator.attach_log_refresh(polling.log_refresh());
        info!(policy = %settings.failure_policy, "console started");
        Self {
            orchestrator,
            polling,
        }
    }

    pub fn orchestrator(&self) -> &Arc<ActionOrchestrator> {
        &self.orchestrator
    }

    pub fn polling(&self) -> &PollingLoops {
        &self.polling
    }

    pub fn view(&self) -> ConsoleViewModel {
        self.orchestrator.view().with_activity(&self.polling)
    }

    pub async fn shutdown(self) {
        self.orchestrator.shutdown();
        self.polling.shutdown().await;
        info!("console stopped");
    }
}
