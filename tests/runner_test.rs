//! TopologyRunner against local TCP listeners.

mod common;

use common::{service, LocalOrchestrator};
use service_topology::workflow::WorkflowInvocation;
use service_topology::{
    LookupError, ReadinessSettings, StartupError, Topology, TopologyRunner, WorkflowError,
};
use std::sync::Arc;
use std::time::Duration;

fn fast_readiness() -> ReadinessSettings {
    ReadinessSettings {
        interval: Duration::from_millis(20),
        timeout: Duration::from_millis(500),
        connect_timeout: Duration::from_millis(200),
    }
}

fn runner(topology: Topology, orchestrator: Arc<LocalOrchestrator>) -> TopologyRunner {
    TopologyRunner::new(Arc::new(topology), orchestrator).with_readiness(fast_readiness())
}

fn ci_topology() -> Topology {
    Topology::new(vec![
        service("zookeeper", "2181"),
        service("kafka", "30123:9092"),
        service("schema-registry", "8081"),
        service("postgres", "5432"),
    ])
    .unwrap()
}

#[tokio::test]
async fn end_to_end_ci_topology() {
    let orchestrator = Arc::new(LocalOrchestrator::new());
    let runner = runner(ci_topology(), orchestrator.clone());

    let invocation = WorkflowInvocation::new(
        "default",
        ["zookeeper", "kafka", "schema-registry", "postgres"],
        ["sh", "-c", r#"test "$KAFKA_ADDRS" = "localhost:30123""#],
    )
    .env("KAFKA_ADDRS", "localhost:{{port:kafka}}")
    .unwrap();

    let report = runner.run_workflow(&invocation).await.unwrap();
    assert_eq!(report.exit_code, 0);
    assert_eq!(report.services.len(), 4);
    assert_eq!(runner.default_port("kafka").unwrap(), 30123);

    runner.teardown().await;
}

#[tokio::test]
async fn start_and_wait_then_default_port_is_stable() {
    let orchestrator = Arc::new(LocalOrchestrator::new());
    let runner = runner(
        Topology::new(vec![service("postgres", "5432"), service("zookeeper", "2181")]).unwrap(),
        orchestrator,
    );

    runner.start_and_wait(&["postgres", "zookeeper"]).await.unwrap();
    let first = runner.default_port("postgres").unwrap();
    let second = runner.default_port("postgres").unwrap();
    assert_eq!(first, second);
    assert_eq!(runner.resolved_host("postgres").unwrap(), "127.0.0.1");

    runner.teardown().await;
}

#[tokio::test]
async fn exit_code_is_propagated() {
    let runner = runner(
        Topology::new(vec![service("postgres", "5432")]).unwrap(),
        Arc::new(LocalOrchestrator::new()),
    );
    let invocation = WorkflowInvocation::new("fail", ["postgres"], ["sh", "-c", "exit 3"]);

    let err = runner.run_workflow(&invocation).await.unwrap_err();
    assert!(matches!(err, WorkflowError::UpstreamFailure(3)));
    runner.teardown().await;
}

#[tokio::test]
async fn overlay_wins_over_process_environment() {
    let runner = runner(
        Topology::new(vec![service("postgres", "5432")]).unwrap(),
        Arc::new(LocalOrchestrator::new()),
    );
    let invocation = WorkflowInvocation::new(
        "env",
        ["postgres"],
        ["sh", "-c", r#"test "$HOME" = /overlay && test -n "$PATH""#],
    )
    .env("HOME", "/overlay")
    .unwrap();

    runner.run_workflow(&invocation).await.unwrap();
    runner.teardown().await;
}

#[tokio::test]
async fn unknown_service_fails_before_any_start() {
    let orchestrator = Arc::new(LocalOrchestrator::new());
    let runner = runner(ci_topology(), orchestrator.clone());

    let err = runner.start_and_wait(&["postgres", "redis"]).await.unwrap_err();
    assert!(matches!(&err, StartupError::UnknownService(name) if name == "redis"));
    assert!(orchestrator.calls().is_empty());
}

#[tokio::test]
async fn lookups_distinguish_unknown_and_not_started() {
    let runner = runner(ci_topology(), Arc::new(LocalOrchestrator::new()));

    assert_eq!(
        runner.default_port("redis"),
        Err(LookupError::UnknownService("redis".to_string()))
    );
    assert_eq!(
        runner.default_port("postgres"),
        Err(LookupError::NotStarted("postgres".to_string()))
    );
}

#[tokio::test]
async fn timeout_names_exactly_one_service() {
    let orchestrator = Arc::new(LocalOrchestrator::new().silent("schema-registry"));
    let runner = runner(ci_topology(), orchestrator);

    let err = runner
        .start_and_wait(&["zookeeper", "schema-registry", "postgres"])
        .await
        .unwrap_err();
    match err {
        StartupError::Timeout { service, .. } => assert_eq!(service, "schema-registry"),
        other => panic!("expected timeout, got {:?}", other),
    }
    runner.teardown().await;
}

#[tokio::test]
async fn start_failure_names_service_and_stops_there() {
    let orchestrator = Arc::new(LocalOrchestrator::new().failing("kafka"));
    let runner = runner(ci_topology(), orchestrator.clone());

    let err = runner
        .start_and_wait(&["zookeeper", "kafka", "postgres"])
        .await
        .unwrap_err();
    assert!(matches!(
        &err,
        StartupError::OrchestratorFailure { service, .. } if service == "kafka"
    ));
    assert_eq!(orchestrator.calls(), vec!["start zookeeper", "start kafka"]);

    // No rollback: zookeeper is still up until teardown.
    assert!(runner.default_port("zookeeper").is_ok());
    runner.teardown().await;
    assert_eq!(orchestrator.calls().last().map(String::as_str), Some("stop zookeeper"));
}

#[tokio::test]
async fn teardown_stops_in_reverse_start_order() {
    let orchestrator = Arc::new(LocalOrchestrator::new());
    let runner = runner(ci_topology(), orchestrator.clone());

    runner
        .start_and_wait(&["postgres", "zookeeper", "postgres"])
        .await
        .unwrap();
    runner.teardown().await;

    assert_eq!(
        orchestrator.calls(),
        vec!["start postgres", "start zookeeper", "stop zookeeper", "stop postgres"]
    );
    assert_eq!(
        runner.default_port("postgres"),
        Err(LookupError::NotStarted("postgres".to_string()))
    );
}

#[tokio::test]
async fn attach_running_only_records_running_services() {
    let orchestrator = Arc::new(LocalOrchestrator::new());
    let first = runner(ci_topology(), orchestrator.clone());
    first.start_and_wait(&["postgres"]).await.unwrap();
    let port = first.default_port("postgres").unwrap();

    // A second invocation sharing the orchestrator sees what is running.
    let second = runner(ci_topology(), orchestrator.clone());
    let attached = second.attach_running(&["postgres", "zookeeper"]).await.unwrap();
    assert_eq!(attached, vec!["postgres"]);
    assert_eq!(second.default_port("postgres").unwrap(), port);
    assert_eq!(
        second.default_port("zookeeper"),
        Err(LookupError::NotStarted("zookeeper".to_string()))
    );

    // Attaching starts nothing, so the second runner has nothing to stop.
    second.teardown().await;
    assert!(!orchestrator.calls().iter().any(|c| c.starts_with("stop")));
    first.teardown().await;
}

#[tokio::test]
async fn spawn_failure_is_reported() {
    let runner = runner(
        Topology::new(vec![service("postgres", "5432")]).unwrap(),
        Arc::new(LocalOrchestrator::new()),
    );
    let invocation =
        WorkflowInvocation::new("missing", ["postgres"], ["topo-test-no-such-program"]);

    let err = runner.run_workflow(&invocation).await.unwrap_err();
    assert!(matches!(
        &err,
        WorkflowError::SpawnFailure { program, .. } if program == "topo-test-no-such-program"
    ));
    runner.teardown().await;
}

#[tokio::test]
async fn cancellation_interrupts_readiness() {
    let orchestrator = Arc::new(LocalOrchestrator::new().silent("postgres"));
    let runner = TopologyRunner::new(Arc::new(ci_topology()), orchestrator).with_readiness(
        ReadinessSettings {
            timeout: Duration::from_secs(30),
            ..fast_readiness()
        },
    );
    let cancel = runner.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });

    let started = std::time::Instant::now();
    let err = runner.start_and_wait(&["postgres"]).await.unwrap_err();
    assert!(matches!(err, StartupError::Cancelled(_)));
    assert!(started.elapsed() < Duration::from_secs(10));
    runner.teardown().await;
}

/// Waits until `path` exists and holds a pid, then returns it.
#[cfg(unix)]
async fn read_pid_file(path: &std::path::Path) -> i32 {
    loop {
        if let Ok(text) = std::fs::read_to_string(path) {
            if let Ok(pid) = text.trim().parse() {
                return pid;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[cfg(unix)]
#[tokio::test]
async fn cancellation_kills_running_command() {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let temp = tempfile::TempDir::new().unwrap();
    let pid_file = temp.path().join("pid");
    let orchestrator = Arc::new(LocalOrchestrator::new());
    let runner = runner(
        Topology::new(vec![service("postgres", "5432")]).unwrap(),
        orchestrator.clone(),
    );
    let invocation = WorkflowInvocation::new(
        "long",
        vec!["postgres".to_string()],
        vec![
            "sh".to_string(),
            "-c".to_string(),
            format!("echo $$ > '{}'; exec sleep 30", pid_file.display()),
        ],
    );

    let cancel = runner.cancellation_token();
    let pid = tokio::spawn(async move {
        let pid = read_pid_file(&pid_file).await;
        cancel.cancel();
        pid
    });

    let started = std::time::Instant::now();
    let err = runner.run_workflow(&invocation).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(5));

    // killed and reaped before run_workflow returned
    let pid = pid.await.unwrap();
    assert!(kill(Pid::from_raw(pid), None).is_err());

    runner.teardown().await;
    assert_eq!(orchestrator.calls(), vec!["start postgres", "stop postgres"]);
}
