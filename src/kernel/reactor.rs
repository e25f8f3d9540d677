use std::collections::VecDeque;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::command::Command;
use super::scopes::{ApplicationScope, Dependencies, Effects};
use super::telemetry::recorder::TelemetryRecorder;

/// Owns the scope tree and serializes every command through it.
pub struct Monitor {
    pub receiver: mpsc::Receiver<Command>,
    pub application: ApplicationScope,
    pub telemetry: TelemetryRecorder,
    deps: Dependencies,
}

impl Monitor {
    pub fn new(receiver: mpsc::Receiver<Command>, deps: Dependencies) -> Self {
        Self {
            receiver,
            application: ApplicationScope::new(&deps.application_id),
            telemetry: TelemetryRecorder::new(),
            deps,
        }
    }

    /// Monitor plus the sender used by the instrumentation layer.
    pub fn channel(deps: Dependencies, capacity: usize) -> (Self, mpsc::Sender<Command>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(rx, deps), tx)
    }

    pub fn deps(&self) -> &Dependencies {
        &self.deps
    }

    /// Pure step: pushes one command through the tree, then every mapping notice it caused.
    /// Notices carry the triggering command's time and are delivered before the next
    /// external command. MUST NOT await.
    pub fn process(&mut self, command: Command) {
        let mut queue = VecDeque::from([command]);

        while let Some(command) = queue.pop_front() {
            let mut effects = Effects::new(&self.deps, &mut self.telemetry);
            self.application.process(&command, &mut effects);

            for notice in effects.take_notices() {
                queue.push_back(Command::event_mapped(command.time, notice));
            }
        }
    }

    /// Async driver: processes commands in arrival order until every sender is dropped.
    pub async fn run(&mut self) {
        info!("RUM monitor started");

        while let Some(command) = self.receiver.recv().await {
            debug!("Processing {}", command.name());
            self.process(command);
        }

        info!("RUM monitor stopped, command channel closed");
    }
}
