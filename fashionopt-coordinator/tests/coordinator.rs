//! Lifecycle tests for the coordinator against an in-memory pricing service.
//!
//! All tests run on a paused clock, so polling intervals and timeouts elapse
//! instantly and deterministically.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    FakeApi, combined, completed, drain, finals, finished, running, server_error, submission,
};
use fashionopt_client::ClientError;
use fashionopt_coordinator::{Coordinator, CoordinatorConfig, CoordinatorEvent, SimulationError};
use fashionopt_core::domain::message::Severity;
use fashionopt_core::domain::simulation::{Algorithm, OverallStatus, SimulationId};
use fashionopt_core::lifecycle::COMPLETED_MESSAGE;

fn coordinator(api: &Arc<FakeApi>) -> (Coordinator, tokio::sync::mpsc::UnboundedReceiver<CoordinatorEvent>) {
    Coordinator::new(api.clone(), CoordinatorConfig::default())
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn completes_after_reporting_progress() {
    let api = Arc::new(FakeApi::new(|id, attempt| {
        if attempt < 2 {
            Ok(running(id, 12.0, 30.0))
        } else {
            Ok(completed(id))
        }
    }));
    let (coordinator, mut events) = coordinator(&api);

    let id = coordinator.start_simulation(submission()).await.unwrap();
    assert_eq!(id.as_str(), "sim-a");
    assert!(coordinator.is_active());

    coordinator.wait().await;
    assert!(!coordinator.is_active());

    let events = drain(&mut events);
    assert!(matches!(&events[0], CoordinatorEvent::Submitted { simulation_id } if *simulation_id == id));

    let progress: Vec<&String> = events
        .iter()
        .filter_map(|e| match e {
            CoordinatorEvent::Progress { message, .. } => Some(message),
            _ => None,
        })
        .collect();
    assert_eq!(progress.len(), 2);
    assert_eq!(
        progress[0],
        "Simulation is running... Estimated time remaining: 30 seconds"
    );

    let reports = finals(&events);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].severity, Severity::Success);
    assert_eq!(reports[0].message, COMPLETED_MESSAGE);
    assert_eq!(reports[0].result, Some(combined(1000.0, 800.0)));
    assert!(reports[0].error.is_none());

    assert_eq!(api.fetch_count("sim-a"), 3);
    assert_eq!(api.cleanups(), vec![id]);
}

#[tokio::test(start_paused = true)]
async fn invisible_solution_keeps_results_as_warning() {
    let api = Arc::new(FakeApi::new(|id, _| {
        let mut status = finished(id, OverallStatus::InvisibleSolution);
        status.result = Some(combined(0.0, 120.0));
        Ok(status)
    }));
    let (coordinator, mut events) = coordinator(&api);

    coordinator.start_simulation(submission()).await.unwrap();
    coordinator.wait().await;

    let events = drain(&mut events);
    let report = finals(&events)[0];
    assert_eq!(report.severity, Severity::Warning);
    assert!(report.result.is_some());
    assert!(matches!(report.error, Some(SimulationError::Infeasible(_))));
}

// ---------------------------------------------------------------------------
// Concurrency guard
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn rejects_second_submission_while_active() {
    let api = Arc::new(FakeApi::new(|id, attempt| {
        if attempt < 3 {
            Ok(running(id, 5.0, 5.0))
        } else {
            Ok(completed(id))
        }
    }));
    let (coordinator, mut events) = coordinator(&api);

    coordinator.start_simulation(submission()).await.unwrap();
    let err = coordinator.start_simulation(submission()).await.unwrap_err();
    assert_eq!(err, SimulationError::AlreadyActive);
    assert_eq!(api.submit_count(), 1);

    coordinator.wait().await;

    // The rejection itself produces no message
    assert_eq!(finals(&drain(&mut events)).len(), 1);

    // Once the first run is over the guard is released
    let id = coordinator.start_simulation(submission()).await.unwrap();
    assert_eq!(id.as_str(), "sim-b");
    coordinator.wait().await;
    assert_eq!(api.submit_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn rejects_submission_while_one_is_in_flight() {
    let api = Arc::new(
        FakeApi::new(|id, _| Ok(completed(id))).with_submit_delay(Duration::from_secs(5)),
    );
    let (coordinator, _events) = coordinator(&api);
    let coordinator = Arc::new(coordinator);

    let first = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.start_simulation(submission()).await })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(coordinator.is_active());
    assert_eq!(coordinator.active_simulation(), None);

    let err = coordinator.start_simulation(submission()).await.unwrap_err();
    assert_eq!(err, SimulationError::AlreadyActive);

    let id = first.await.unwrap().unwrap();
    assert_eq!(id.as_str(), "sim-a");
    assert_eq!(api.submit_count(), 1);
    coordinator.wait().await;
}

// ---------------------------------------------------------------------------
// Submission failures
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn submission_timeout_is_reported_and_releases_guard() {
    let api = Arc::new(
        FakeApi::new(|id, _| Ok(completed(id))).with_submit_delay(Duration::from_secs(60)),
    );
    let (coordinator, mut events) = coordinator(&api);

    let err = coordinator.start_simulation(submission()).await.unwrap_err();
    assert_eq!(err, SimulationError::SubmissionTimeout(Duration::from_secs(30)));
    assert!(err.is_submission_error());
    assert!(!coordinator.is_active());

    let events = drain(&mut events);
    let reports = finals(&events);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].simulation_id, None);
    assert_eq!(reports[0].severity, Severity::Error);
    assert_eq!(
        reports[0].message,
        "Simulation request timed out after 30 seconds. Please try again."
    );
    assert!(api.cleanups().is_empty());
}

#[tokio::test(start_paused = true)]
async fn server_rejection_surfaces_body_message() {
    let api = Arc::new(
        FakeApi::new(|id, _| Ok(completed(id)))
            .with_submit_error(ClientError::api_error(400, "File is empty")),
    );
    let (coordinator, mut events) = coordinator(&api);

    let err = coordinator.start_simulation(submission()).await.unwrap_err();
    assert_eq!(err, SimulationError::Submission("File is empty".to_string()));

    let events = drain(&mut events);
    assert_eq!(finals(&events)[0].message, "Error starting simulation: File is empty");
    assert!(!coordinator.is_active());
}

#[tokio::test(start_paused = true)]
async fn invalid_input_is_rejected_before_submitting() {
    let api = Arc::new(FakeApi::new(|id, _| Ok(completed(id))));
    let (coordinator, _events) = coordinator(&api);

    let mut bad = submission();
    bad.file.clear();
    bad.parameters.chromosome_bits = 0;

    let err = coordinator.start_simulation(bad).await.unwrap_err();
    assert_eq!(
        err,
        SimulationError::InvalidInput(
            "Please upload a product file first. Chromosome Bits must be at least 1.".to_string()
        )
    );
    assert_eq!(api.submit_count(), 0);
    assert!(!coordinator.is_active());
}

// ---------------------------------------------------------------------------
// Terminal error statuses
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn shelf_space_error_uses_server_message_and_drops_result() {
    let api = Arc::new(FakeApi::new(|id, _| {
        let mut status = finished(id, OverallStatus::ShelfSpaceError);
        status.error_message = Some("capacity exceeded".to_string());
        status.result = Some(combined(10.0, 10.0));
        Ok(status)
    }));
    let (coordinator, mut events) = coordinator(&api);

    let id = coordinator.start_simulation(submission()).await.unwrap();
    coordinator.wait().await;

    let events = drain(&mut events);
    let reports = finals(&events);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].severity, Severity::Error);
    assert_eq!(reports[0].message, "capacity exceeded");
    assert!(reports[0].result.is_none());
    assert_eq!(
        reports[0].error,
        Some(SimulationError::Algorithm {
            status: OverallStatus::ShelfSpaceError,
            message: "capacity exceeded".to_string(),
        })
    );
    assert_eq!(api.cleanups(), vec![id]);
}

#[tokio::test(start_paused = true)]
async fn algorithm_errors_surface_once_across_polls() {
    let api = Arc::new(FakeApi::new(|id, attempt| {
        let mut status = if attempt < 3 {
            running(id, 3.0, 3.0)
        } else {
            finished(id, OverallStatus::Error)
        };
        status.ga_has_error = true;
        status.error_message = Some("GA Error: bad column".to_string());
        Ok(status)
    }));
    let (coordinator, mut events) = coordinator(&api);

    coordinator.start_simulation(submission()).await.unwrap();
    coordinator.wait().await;

    let events = drain(&mut events);
    let surfaced: Vec<(&Algorithm, &String)> = events
        .iter()
        .filter_map(|e| match e {
            CoordinatorEvent::AlgorithmError {
                algorithm, message, ..
            } => Some((algorithm, message)),
            _ => None,
        })
        .collect();
    assert_eq!(surfaced.len(), 1);
    assert_eq!(*surfaced[0].0, Algorithm::Genetic);
    assert_eq!(surfaced[0].1, "Genetic Algorithm Error: bad column");

    let reports = finals(&events);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].severity, Severity::Error);
    assert_eq!(reports[0].message, "GA Error: bad column");
    assert_eq!(reports[0].algorithm_errors.len(), 1);
    assert_eq!(api.cleanups().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn algorithm_errors_surface_once_each_as_both_fail() {
    let api = Arc::new(FakeApi::new(|id, attempt| {
        let mut status = if attempt < 2 {
            let mut status = running(id, 3.0, 3.0);
            status.error_message = Some("GA Error: boom".to_string());
            status
        } else {
            let mut status = finished(id, OverallStatus::Error);
            status.aco_has_error = true;
            status.error_message = Some("GA Error: boom\nACO Error: timeout".to_string());
            status
        };
        status.ga_has_error = true;
        Ok(status)
    }));
    let (coordinator, mut events) = coordinator(&api);

    coordinator.start_simulation(submission()).await.unwrap();
    coordinator.wait().await;

    let events = drain(&mut events);
    let surfaced: Vec<(Algorithm, String)> = events
        .iter()
        .filter_map(|e| match e {
            CoordinatorEvent::AlgorithmError {
                algorithm, message, ..
            } => Some((*algorithm, message.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        surfaced,
        vec![
            (Algorithm::Genetic, "Genetic Algorithm Error: boom".to_string()),
            (
                Algorithm::AntColony,
                "Ant Colony Optimization Error: timeout".to_string()
            ),
        ]
    );

    let reports = finals(&events);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].algorithm_errors.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn finished_flags_with_running_status_end_with_warning() {
    let api = Arc::new(FakeApi::new(|id, _| Ok(finished(id, OverallStatus::Running))));
    let (coordinator, mut events) = coordinator(&api);

    coordinator.start_simulation(submission()).await.unwrap();
    coordinator.wait().await;

    let events = drain(&mut events);
    let report = finals(&events)[0];
    assert_eq!(report.severity, Severity::Warning);
    assert_eq!(report.message, "Simulation finished with overall status: RUNNING");
}

#[tokio::test(start_paused = true)]
async fn terminal_status_keeps_polling_until_both_flags_are_set() {
    let api = Arc::new(FakeApi::new(|id, attempt| {
        let mut status = completed(id);
        if attempt == 0 {
            status.aco_finished = false;
        }
        Ok(status)
    }));
    let (coordinator, _events) = coordinator(&api);

    coordinator.start_simulation(submission()).await.unwrap();
    coordinator.wait().await;

    assert_eq!(api.fetch_count("sim-a"), 2);
    assert_eq!(api.cleanups().len(), 1);
}

// ---------------------------------------------------------------------------
// Transport failures
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn not_found_terminates_and_nothing_is_polled_afterwards() {
    let api = Arc::new(FakeApi::new(|id, attempt| {
        if attempt == 0 {
            Err(ClientError::NotFound(id.to_string()))
        } else {
            Ok(completed(id))
        }
    }));
    let (coordinator, mut events) = coordinator(&api);

    let id = coordinator.start_simulation(submission()).await.unwrap();
    coordinator.wait().await;
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(api.fetch_count("sim-a"), 1);

    let events = drain(&mut events);
    let reports = finals(&events);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].message, "Simulation ID sim-a expired or not found.");
    assert_eq!(reports[0].error, Some(SimulationError::JobNotFound(id.clone())));
    assert_eq!(api.cleanups(), vec![id]);
    assert!(!coordinator.is_active());
}

#[tokio::test(start_paused = true)]
async fn transport_failure_is_terminal_by_default() {
    let api = Arc::new(FakeApi::new(|_, _| Err(server_error("db down"))));
    let (coordinator, mut events) = coordinator(&api);

    coordinator.start_simulation(submission()).await.unwrap();
    coordinator.wait().await;

    assert_eq!(api.fetch_count("sim-a"), 1);
    let events = drain(&mut events);
    assert_eq!(
        finals(&events)[0].message,
        "Error fetching simulation status: db down"
    );
}

#[tokio::test(start_paused = true)]
async fn retry_policy_tolerates_transient_failures() {
    let api = Arc::new(FakeApi::new(|id, attempt| match attempt {
        0 | 1 | 3 | 4 => Err(server_error("flaky proxy")),
        2 => Ok(running(id, 1.0, 1.0)),
        _ => Ok(completed(id)),
    }));
    let config = CoordinatorConfig::default().with_status_retry_limit(2);
    let (coordinator, mut events) = Coordinator::new(api.clone(), config);

    coordinator.start_simulation(submission()).await.unwrap();
    coordinator.wait().await;

    assert_eq!(api.fetch_count("sim-a"), 6);
    let events = drain(&mut events);
    assert_eq!(finals(&events)[0].severity, Severity::Success);
}

#[tokio::test(start_paused = true)]
async fn retry_policy_gives_up_after_limit() {
    let api = Arc::new(FakeApi::new(|_, _| Err(server_error("flaky proxy"))));
    let config = CoordinatorConfig::default().with_status_retry_limit(2);
    let (coordinator, mut events) = Coordinator::new(api.clone(), config);

    coordinator.start_simulation(submission()).await.unwrap();
    coordinator.wait().await;

    assert_eq!(api.fetch_count("sim-a"), 3);
    let events = drain(&mut events);
    assert_eq!(finals(&events).len(), 1);
    assert_eq!(api.cleanups().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn malformed_payload_is_never_retried() {
    let api = Arc::new(FakeApi::new(|_, _| {
        Err(ClientError::MalformedStatus {
            detail: "expected value at line 1 column 1".to_string(),
            payload: "<html>".to_string(),
        })
    }));
    let config = CoordinatorConfig::default().with_status_retry_limit(5);
    let (coordinator, mut events) = Coordinator::new(api.clone(), config);

    coordinator.start_simulation(submission()).await.unwrap();
    coordinator.wait().await;

    assert_eq!(api.fetch_count("sim-a"), 1);
    let events = drain(&mut events);
    let report = finals(&events)[0];
    assert_eq!(
        report.message,
        "Failed to parse status response: expected value at line 1 column 1. Raw response: <html>"
    );
}

// ---------------------------------------------------------------------------
// Staleness and idempotent termination
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn late_response_for_replaced_job_is_ignored() {
    let api = Arc::new(
        FakeApi::new(|id, attempt| {
            if id.as_str() == "sim-a" || attempt >= 10 {
                Ok(completed(id))
            } else {
                Ok(running(id, 8.0, 8.0))
            }
        })
        .with_fetch_delay("sim-a", Duration::from_secs(5)),
    );
    let (coordinator, mut events) = coordinator(&api);

    // sim-a's first status request is still in flight when it is cancelled
    let a = coordinator.start_simulation(submission()).await.unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(api.fetch_count("sim-a"), 1);
    assert!(coordinator.cancel().await);

    let b = coordinator.start_simulation(submission()).await.unwrap();
    assert_eq!(b.as_str(), "sim-b");

    // sim-a's completed payload arrives while sim-b is active
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(coordinator.active_simulation(), Some(b.clone()));

    coordinator.wait().await;

    let events = drain(&mut events);
    let for_a: Vec<&CoordinatorEvent> = events
        .iter()
        .filter(|e| match e {
            CoordinatorEvent::Submitted { simulation_id } => *simulation_id == a,
            CoordinatorEvent::Progress { simulation_id, .. } => *simulation_id == a,
            CoordinatorEvent::AlgorithmError { simulation_id, .. } => *simulation_id == a,
            CoordinatorEvent::Finished(report) => report.simulation_id.as_ref() == Some(&a),
        })
        .collect();
    assert_eq!(for_a.len(), 2);

    let reports = finals(&events);
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].simulation_id, Some(a.clone()));
    assert_eq!(reports[0].severity, Severity::Info);
    assert_eq!(reports[1].simulation_id, Some(b.clone()));
    assert_eq!(reports[1].severity, Severity::Success);

    assert_eq!(api.fetch_count("sim-a"), 1);
    assert_eq!(api.cleanups(), vec![a, b]);
}

#[tokio::test(start_paused = true)]
async fn termination_happens_once() {
    let api = Arc::new(FakeApi::new(|id, _| Ok(completed(id))));
    let (coordinator, mut events) = coordinator(&api);

    coordinator.start_simulation(submission()).await.unwrap();
    coordinator.wait().await;

    assert!(!coordinator.cancel().await);
    coordinator.wait().await;

    let events = drain(&mut events);
    assert_eq!(finals(&events).len(), 1);
    assert_eq!(api.cleanups(), vec![SimulationId::from("sim-a")]);
}
