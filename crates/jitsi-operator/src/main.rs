//! Jitsi Operator - converges multi-component Jitsi deployments
//!
//! Watches `Jitsi` custom resources and keeps each instance's object
//! graph (Deployments, Services, PodMonitors) in sync with the declared
//! spec. The reconciliation engine lives in `jitsi-reconciler`; this
//! binary wires it to the cluster.

use std::sync::Arc;

use clap::Parser;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use kube::api::{Api, Patch, PatchParams};
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::{Client, CustomResourceExt};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use jitsi_common::crd::Jitsi;
use jitsi_common::{kube_utils, FIELD_MANAGER};
use jitsi_reconciler::controller::{error_policy, reconcile, Context};

/// CRD-driven operator for Jitsi Meet deployments
#[derive(Parser, Debug)]
#[command(name = "jitsi-operator", version, about, long_about = None)]
struct Cli {
    /// Generate the CRD manifest and exit
    #[arg(long)]
    crd: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.crd {
        let crd = serde_yaml::to_string(&Jitsi::crd())
            .map_err(|e| anyhow::anyhow!("failed to serialize CRD: {e}"))?;
        println!("{crd}");
        return Ok(());
    }

    run_controller().await
}

/// Ensure the Jitsi CRD is installed
///
/// The operator installs its own CRD on startup using server-side apply,
/// so the CRD version always matches the operator version.
async fn ensure_crd_installed(client: &Client) -> anyhow::Result<()> {
    use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;

    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    let params = PatchParams::apply(FIELD_MANAGER).force();

    tracing::info!("installing Jitsi CRD");
    crds.patch("jitsis.jitsi.dev", &params, &Patch::Apply(&Jitsi::crd()))
        .await
        .map_err(|e| anyhow::anyhow!("failed to install Jitsi CRD: {e}"))?;

    Ok(())
}

async fn run_controller() -> anyhow::Result<()> {
    let client = kube_utils::create_client()
        .await
        .map_err(|e| anyhow::anyhow!("failed to create kube client: {e}"))?;

    ensure_crd_installed(&client).await?;

    let jitsis: Api<Jitsi> = Api::all(client.clone());
    let deployments: Api<Deployment> = Api::all(client.clone());
    let services: Api<Service> = Api::all(client.clone());

    let ctx = Arc::new(Context::from_client(client));

    tracing::info!("starting Jitsi controller");
    Controller::new(jitsis, WatcherConfig::default())
        .owns(deployments, WatcherConfig::default())
        .owns(services, WatcherConfig::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok((obj, _)) => tracing::debug!(instance = %obj.name, "reconciled"),
                Err(e) => tracing::warn!(error = %e, "reconcile failed"),
            }
        })
        .await;

    tracing::info!("controller terminated");
    Ok(())
}
