//! End-to-end tests for the deploy and cancel commands

mod support;

use std::path::Path;

use tempfile::TempDir;

use nimbus_core::commands::{CancelCommand, DeployCommand, DeployOptions};
use nimbus_core::error::DeployError;
use nimbus_core::fs::hash_tree;
use nimbus_core::remote::{CreateDeploymentRequest, Deployment};
use nimbus_core::types::{Architecture, DeploymentStatus, DeploymentType, StepStatus};

use support::{Call, FakeImageBuilder, FakeRemote, FakeUploader, deployment, fast_policy, write_file};

const ID: u64 = 42;

fn project(root: &Path, project_type: &str, environment_table: &str) {
    write_file(
        &root.join("nimbus.toml"),
        &format!(
            "id = 9\nname = \"storefront\"\ntype = \"{project_type}\"\n\n{environment_table}"
        ),
    );
    write_file(&root.join("server.js"), "listen()");
    write_file(&root.join("public").join("app.js"), "console.log('app')");
    write_file(&root.join("dist").join("index.html"), "<html></html>");
}

fn finished_run() -> Vec<Deployment> {
    vec![
        deployment(ID, DeploymentStatus::Running, &[(1, "UpdateFunction", StepStatus::Running)]),
        deployment(ID, DeploymentStatus::Running, &[(1, "UpdateFunction", StepStatus::Finished)]),
        deployment(ID, DeploymentStatus::Finished, &[(1, "UpdateFunction", StepStatus::Finished)]),
    ]
}

fn created_request(remote: &FakeRemote) -> (u64, String, CreateDeploymentRequest) {
    remote
        .calls()
        .into_iter()
        .find_map(|call| match call {
            Call::Create {
                project_id,
                environment,
                request,
            } => Some((project_id, environment, request)),
            _ => None,
        })
        .expect("deployment created")
}

#[test]
fn zip_deploy_ships_artifact_syncs_assets_and_follows_the_deployment() {
    let tmp = TempDir::new().unwrap();
    project(
        tmp.path(),
        "node",
        "[environments.production]\narchitecture = \"arm64\"\n",
    );
    let remote = FakeRemote::new(ID).with_polls(finished_run());
    let uploader = FakeUploader::new();
    let builder = FakeImageBuilder::default();

    let report = DeployCommand::new(tmp.path().to_path_buf(), &remote, &uploader, &builder)
        .with_policy(fast_policy())
        .execute(&DeployOptions::new("production").with_message("release 1.2"))
        .unwrap();

    assert_eq!(report.deployment.status, DeploymentStatus::Finished);
    assert_eq!(report.build_steps.last().unwrap(), "Compressing application");
    assert_eq!(report.sync.stored, 1);

    let (project_id, environment, request) = created_request(&remote);
    assert_eq!(project_id, 9);
    assert_eq!(environment, "production");
    let assets = tmp.path().join(".nimbus").join("build").join("assets");
    assert_eq!(request.assets_hash, Some(hash_tree(&assets).unwrap()));
    assert_eq!(request.deployment_type, Some(DeploymentType::Zip));
    assert_eq!(request.architecture, Architecture::Arm64);
    assert_eq!(request.message.as_deref(), Some("release 1.2"));

    let files = uploader.uploaded_files();
    assert_eq!(files.len(), 1);
    assert!(files[0].0.ends_with("app.zip"));
    assert_eq!(files[0].1, format!("https://artifacts.nimbus.test/{ID}.zip"));

    let calls = remote.calls();
    let artifact = calls.iter().position(|c| matches!(c, Call::ArtifactUrl(_))).unwrap();
    let signing = calls.iter().position(|c| matches!(c, Call::SignAssets(_))).unwrap();
    let start = calls.iter().position(|c| matches!(c, Call::Start(_))).unwrap();
    assert!(artifact < signing && signing < start);
    assert!(builder.pushes.lock().unwrap().is_empty());
}

#[test]
fn image_deploy_pushes_the_local_tag() {
    let tmp = TempDir::new().unwrap();
    project(
        tmp.path(),
        "node",
        "[environments.production]\ndeployment_type = \"image\"\n",
    );
    write_file(&tmp.path().join("production.Dockerfile"), "FROM node:20\n");
    let remote = FakeRemote::new(ID).with_polls(finished_run());
    let uploader = FakeUploader::new();
    let builder = FakeImageBuilder::default();

    DeployCommand::new(tmp.path().to_path_buf(), &remote, &uploader, &builder)
        .with_policy(fast_policy())
        .execute(&DeployOptions::new("production"))
        .unwrap();

    assert_eq!(
        *builder.pushes.lock().unwrap(),
        vec![(
            "storefront:production".to_string(),
            "registry.nimbus.test/storefront:42".to_string()
        )]
    );
    assert_eq!(remote.count(|c| matches!(c, Call::ArtifactUrl(_))), 0);
    assert!(uploader.uploaded_files().is_empty());
}

#[test]
fn missing_registry_credentials_stop_before_start() {
    let tmp = TempDir::new().unwrap();
    project(
        tmp.path(),
        "node",
        "[environments.production]\ndeployment_type = \"image\"\n",
    );
    write_file(&tmp.path().join("production.Dockerfile"), "FROM node:20\n");
    let remote = FakeRemote::new(ID)
        .with_polls(finished_run())
        .without_image_credentials();
    let uploader = FakeUploader::new();
    let builder = FakeImageBuilder::default();

    let err = DeployCommand::new(tmp.path().to_path_buf(), &remote, &uploader, &builder)
        .with_policy(fast_policy())
        .execute(&DeployOptions::new("production"))
        .unwrap_err();

    assert!(matches!(err, DeployError::Communication(_)));
    assert_eq!(remote.count(|c| matches!(c, Call::Start(_))), 0);
    assert!(builder.pushes.lock().unwrap().is_empty());
}

#[test]
fn static_deploy_ships_only_assets() {
    let tmp = TempDir::new().unwrap();
    project(tmp.path(), "static", "[environments.production]\n");
    let remote = FakeRemote::new(ID).with_polls(finished_run());
    let uploader = FakeUploader::new();
    let builder = FakeImageBuilder::default();

    let report = DeployCommand::new(tmp.path().to_path_buf(), &remote, &uploader, &builder)
        .with_policy(fast_policy())
        .execute(&DeployOptions::new("production"))
        .unwrap();

    let (_, _, request) = created_request(&remote);
    assert_eq!(request.deployment_type, None);
    assert!(request.assets_hash.is_some());
    assert_eq!(remote.count(|c| matches!(c, Call::ArtifactUrl(_) | Call::Image(_))), 0);
    assert_eq!(
        remote.signed_manifest().unwrap()[0].path,
        "index.html"
    );
    assert_eq!(report.sync.stored, 1);
}

#[test]
fn remote_failure_surfaces_after_the_build() {
    let tmp = TempDir::new().unwrap();
    project(tmp.path(), "node", "[environments.production]\n");
    let mut failed = deployment(ID, DeploymentStatus::Failed, &[]);
    failed.status_message = Some("Function exceeds memory limit".to_string());
    let remote = FakeRemote::new(ID).with_polls(vec![failed]);
    let uploader = FakeUploader::new();
    let builder = FakeImageBuilder::default();

    let err = DeployCommand::new(tmp.path().to_path_buf(), &remote, &uploader, &builder)
        .with_policy(fast_policy())
        .execute(&DeployOptions::new("production"))
        .unwrap_err();

    assert_eq!(err.to_string(), "deployment failed: Function exceeds memory limit");
}

#[test]
fn cancel_command_waits_for_confirmation() {
    let remote = FakeRemote::new(ID)
        .with_polls(vec![deployment(ID, DeploymentStatus::Running, &[])])
        .with_cancel_polls(vec![
            deployment(ID, DeploymentStatus::Cancelling, &[]),
            deployment(ID, DeploymentStatus::Cancelled, &[]),
        ]);

    let report = CancelCommand::new(&remote)
        .with_policy(fast_policy())
        .execute(ID)
        .unwrap();

    assert!(!report.already_terminal);
    assert_eq!(report.deployment.status, DeploymentStatus::Cancelled);
    assert_eq!(remote.count(|c| matches!(c, Call::Cancel(ID))), 1);
}

#[test]
fn cancel_command_leaves_finished_deployments_alone() {
    let remote =
        FakeRemote::new(ID).with_polls(vec![deployment(ID, DeploymentStatus::Finished, &[])]);

    let report = CancelCommand::new(&remote).execute(ID).unwrap();

    assert!(report.already_terminal);
    assert_eq!(remote.count(|c| matches!(c, Call::Cancel(_))), 0);
}
