use std::time::Duration;

use thiserror::Error;

use crate::adapters::invoke::PlotTrigger;
use crate::adapters::object_store::ContainerObjects;
use crate::handlers::response::HandlerResponse;

const COMPONENT: &str = "driver";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverStep {
    Put { key: String, body: String },
    Delete { key: String },
}

impl DriverStep {
    pub fn put(key: &str, body: &str) -> Self {
        Self::Put {
            key: key.to_string(),
            body: body.to_string(),
        }
    }

    pub fn delete(key: &str) -> Self {
        Self::Delete {
            key: key.to_string(),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Put { key, body } => format!("put '{key}' ({} bytes)", body.len()),
            Self::Delete { key } => format!("delete '{key}'"),
        }
    }
}

/// Mutations that each change the bucket size so the tracker has something to record.
pub fn default_driver_script() -> Vec<DriverStep> {
    vec![
        DriverStep::put("assignment1.txt", "Empty Assignment 1"),
        DriverStep::put("assignment1.txt", "Empty Assignment 2222222222"),
        DriverStep::delete("assignment1.txt"),
        DriverStep::put("assignment2.txt", "33"),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    pub container_id: String,
    pub plotting_api_url: String,
    /// Pause after every mutation, giving notification-triggered recorders time to run.
    pub step_delay: Duration,
    pub script: Vec<DriverStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    #[error("step {step} failed: {message}")]
    Mutation { step: String, message: String },
    #[error("Error calling plotting API: {0}")]
    Request(String),
}

/// Outcome of the plotting call; a non-2xx answer is reported but does not fail the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverRun {
    pub steps_completed: usize,
    pub plot_status_code: u16,
}

pub fn run_driver_script(
    config: &DriverConfig,
    containers: &impl ContainerObjects,
    trigger: &impl PlotTrigger,
    sleep: &mut dyn FnMut(Duration),
) -> Result<DriverRun, DriverError> {
    for step in &config.script {
        let result = match step {
            DriverStep::Put { key, body } => {
                containers.put_object(&config.container_id, key, body.as_bytes(), None)
            }
            DriverStep::Delete { key } => containers.delete_object(&config.container_id, key),
        };
        result.map_err(|message| DriverError::Mutation {
            step: step.describe(),
            message,
        })?;
        tracing::info!(
            component = COMPONENT,
            event = "step_completed",
            container_id = %config.container_id,
            step = %step.describe(),
        );
        sleep(config.step_delay);
    }

    let response = trigger
        .trigger(&config.plotting_api_url)
        .map_err(DriverError::Request)?;
    if response.is_success() {
        tracing::info!(
            component = COMPONENT,
            event = "plot_requested",
            status_code = response.status_code,
        );
    } else {
        tracing::warn!(
            component = COMPONENT,
            event = "plot_request_failed",
            status_code = response.status_code,
            response_body = %response.body,
        );
    }

    Ok(DriverRun {
        steps_completed: config.script.len(),
        plot_status_code: response.status_code,
    })
}

pub fn handle_driver_event(
    config: &DriverConfig,
    containers: &impl ContainerObjects,
    trigger: &impl PlotTrigger,
    sleep: &mut dyn FnMut(Duration),
) -> HandlerResponse {
    match run_driver_script(config, containers, trigger, sleep) {
        Ok(_) => HandlerResponse::message(200, "Driver lambda executed successfully"),
        Err(error) => {
            tracing::error!(
                component = COMPONENT,
                event = "driver_failed",
                container_id = %config.container_id,
                error = %error,
            );
            HandlerResponse::message(500, &format!("Error: {error}"))
        }
    }
}

/// Runs the script with real step delays, moving the sleeping thread off the async workers.
///
/// Requires the multi-threaded Tokio runtime.
pub fn handle_driver_event_blocking(
    config: &DriverConfig,
    containers: &impl ContainerObjects,
    trigger: &impl PlotTrigger,
) -> HandlerResponse {
    tokio::task::block_in_place(|| {
        handle_driver_event(config, containers, trigger, &mut std::thread::sleep)
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{mpsc, Mutex};

    use super::*;
    use crate::adapters::invoke::TriggerResponse;
    use crate::adapters::object_store::ObjectSummary;

    #[derive(Default)]
    struct RecordingContainer {
        operations: Mutex<Vec<String>>,
        fail_deletes: bool,
    }

    impl RecordingContainer {
        fn operations(&self) -> Vec<String> {
            self.operations.lock().expect("poisoned mutex").clone()
        }
    }

    impl ContainerObjects for RecordingContainer {
        fn list_objects(&self, _container_id: &str) -> Result<Vec<ObjectSummary>, String> {
            Ok(Vec::new())
        }

        fn put_object(
            &self,
            container_id: &str,
            key: &str,
            body: &[u8],
            _content_type: Option<&str>,
        ) -> Result<(), String> {
            self.operations.lock().expect("poisoned mutex").push(format!(
                "put {container_id}/{key}={}",
                String::from_utf8_lossy(body)
            ));
            Ok(())
        }

        fn delete_object(&self, container_id: &str, key: &str) -> Result<(), String> {
            if self.fail_deletes {
                return Err("AccessDenied".to_string());
            }
            self.operations
                .lock()
                .expect("poisoned mutex")
                .push(format!("delete {container_id}/{key}"));
            Ok(())
        }
    }

    struct StubTrigger {
        outcome: Result<TriggerResponse, String>,
        calls: Mutex<Vec<String>>,
    }

    impl StubTrigger {
        fn responding(status_code: u16) -> Self {
            Self {
                outcome: Ok(TriggerResponse {
                    status_code,
                    body: "{}".to_string(),
                }),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl PlotTrigger for StubTrigger {
        fn trigger(&self, url: &str) -> Result<TriggerResponse, String> {
            self.calls.lock().expect("poisoned mutex").push(url.to_string());
            self.outcome.clone()
        }
    }

    fn config() -> DriverConfig {
        DriverConfig {
            container_id: "testbucket".to_string(),
            plotting_api_url: "https://plot.example/dev".to_string(),
            step_delay: Duration::from_millis(1_500),
            script: default_driver_script(),
        }
    }

    #[test]
    fn runs_mutations_in_order_then_requests_plot() {
        let container = RecordingContainer::default();
        let trigger = StubTrigger::responding(200);
        let mut delays = Vec::new();

        let response =
            handle_driver_event(&config(), &container, &trigger, &mut |delay| delays.push(delay));

        assert_eq!(response.status_code, 200);
        assert_eq!(
            container.operations(),
            vec![
                "put testbucket/assignment1.txt=Empty Assignment 1",
                "put testbucket/assignment1.txt=Empty Assignment 2222222222",
                "delete testbucket/assignment1.txt",
                "put testbucket/assignment2.txt=33",
            ]
        );
        assert_eq!(delays, vec![Duration::from_millis(1_500); 4]);
        assert_eq!(
            *trigger.calls.lock().expect("poisoned mutex"),
            vec!["https://plot.example/dev".to_string()]
        );
    }

    #[test]
    fn non_success_plot_status_still_succeeds() {
        let run = run_driver_script(
            &config(),
            &RecordingContainer::default(),
            &StubTrigger::responding(404),
            &mut |_| {},
        )
        .expect("driver should not fail on plot status");

        assert_eq!(run.plot_status_code, 404);
        assert_eq!(run.steps_completed, 4);
    }

    #[test]
    fn transport_failure_returns_server_error() {
        let trigger = StubTrigger {
            outcome: Err("connection refused".to_string()),
            calls: Mutex::new(Vec::new()),
        };

        let response = handle_driver_event(
            &config(),
            &RecordingContainer::default(),
            &trigger,
            &mut |_| {},
        );

        assert_eq!(response.status_code, 500);
        assert!(response.body.contains("Error calling plotting API"));
    }

    #[test]
    fn mutation_failure_stops_before_plot_request() {
        let container = RecordingContainer {
            fail_deletes: true,
            ..RecordingContainer::default()
        };
        let trigger = StubTrigger::responding(200);

        let error = run_driver_script(&config(), &container, &trigger, &mut |_| {})
            .expect_err("delete failure should surface");

        assert!(matches!(error, DriverError::Mutation { .. }));
        assert_eq!(container.operations().len(), 2);
        assert!(trigger.calls.lock().expect("poisoned mutex").is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn step_delays_leave_the_runtime_free_for_other_tasks() {
        let (started_tx, started_rx) = mpsc::channel();
        let driver = tokio::spawn(async move {
            let mut config = config();
            config.step_delay = Duration::from_millis(150);
            let container = RecordingContainer::default();
            let trigger = StubTrigger::responding(200);
            started_tx.send(()).expect("signal start");
            handle_driver_event_blocking(&config, &container, &trigger).status_code
        });
        started_rx.recv().expect("driver should start");

        let (done_tx, done_rx) = mpsc::channel();
        tokio::spawn(async move {
            let _ = done_tx.send(());
        });

        assert!(
            done_rx.recv_timeout(Duration::from_millis(400)).is_ok(),
            "a sleeping driver run must not starve the only worker"
        );
        assert_eq!(driver.await.expect("driver task"), 200);
    }
}
