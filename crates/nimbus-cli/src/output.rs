//! Console rendering of build and deployment progress.

use anyhow::Result;
use serde_json::json;

use nimbus_core::build::BuildObserver;
use nimbus_core::commands::DeployReport;
use nimbus_core::monitor::MonitorObserver;
use nimbus_core::remote::{Deployment, DeploymentStep};

pub struct ConsoleBuildObserver;

impl BuildObserver for ConsoleBuildObserver {
    fn step_started(&self, index: usize, total: usize, description: &str) {
        println!("• [{}/{}] {}", index + 1, total, description);
    }
}

pub struct ConsoleMonitorObserver;

impl MonitorObserver for ConsoleMonitorObserver {
    fn deployment_started(&self, deployment_id: u64) {
        println!("• Deployment {} started (Ctrl+C to cancel)", deployment_id);
    }

    fn step_started(&self, index: usize, total: usize, step: &DeploymentStep) {
        println!("• [{}/{}] {}", index + 1, total, step.task_name);
    }

    fn step_finished(&self, _index: usize, _total: usize, step: &DeploymentStep) {
        println!("  ✓ {}", step.task_name);
    }

    fn cancelling(&self, deployment_id: u64) {
        println!("⚠ Cancelling deployment {}...", deployment_id);
    }

    fn cancelled(&self, deployment: &Deployment) {
        println!(
            "✓ Deployment {} is now {}",
            deployment.id, deployment.status
        );
    }
}

pub fn print_deploy_report(report: &DeployReport) {
    let sync = &report.sync;
    if sync.skipped {
        println!("• Assets unchanged since the last deployment, skipped upload");
    } else {
        println!(
            "✓ Assets: {} uploaded, {} copied",
            sync.stored, sync.copied
        );
    }
    if !sync.unprocessed.is_empty() {
        println!("  ⚠ Unable to process {} asset file(s):", sync.unprocessed.len());
        for path in &sync.unprocessed {
            println!("    {}", path);
        }
    }

    println!(
        "✓ Deployment {} {} in {:.1}s",
        report.deployment.id,
        report.deployment.status,
        report.elapsed.as_secs_f64()
    );
}

pub fn deploy_report_json(report: &DeployReport) -> Result<String> {
    let value = json!({
        "deployment": report.deployment.id,
        "status": report.deployment.status,
        "steps": report
            .deployment
            .steps
            .iter()
            .map(|step| json!({ "task": step.task_name, "status": step.status }))
            .collect::<Vec<_>>(),
        "build_steps": report.build_steps,
        "assets": {
            "skipped": report.sync.skipped,
            "stored": report.sync.stored,
            "copied": report.sync.copied,
            "unprocessed": report.sync.unprocessed,
        },
        "elapsed_secs": report.elapsed.as_secs_f64(),
    });
    Ok(serde_json::to_string_pretty(&value)?)
}
