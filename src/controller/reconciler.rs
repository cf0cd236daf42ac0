//! Reconciliation engine and controller wrapper for AtlasInfra resources.
//!
//! `reconcile_infra` is one full convergence cycle: probe capability, take
//! desired and deployed snapshots, diff, dispatch. The surrounding
//! kube-runtime controller re-invokes it on every watch event and resync;
//! per-object retry lives there, never inside the cycle.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use k8s_openapi::api::core::v1::Event;
use kube::{
    api::{Api, ObjectMeta, Patch, PatchParams, PostParams},
    client::Client,
    runtime::{
        controller::{Action, Controller},
        watcher::Config,
    },
    Resource, ResourceExt,
};
use tracing::{debug, error, info, instrument, warn};

use crate::crd::{AtlasInfra, AtlasInfraStatus, CycleSummary};
use crate::error::{Error, Result};

use super::capability::probe_capability;
use super::cluster::{ClusterHandle, KubeClusterHandle, FIELD_MANAGER};
use super::conditions::{
    set_condition, CONDITION_STATUS_FALSE, CONDITION_STATUS_TRUE, CONDITION_TYPE_DEGRADED,
    CONDITION_TYPE_READY,
};
use super::deployed::read_deployed;
use super::desired::build_desired;
use super::diff::{compute_diff, DiffAction};
use super::resources::{ManagedKind, ObjectKey};

/// A per-object apply failure. The rest of the cycle proceeds around it.
#[derive(Debug)]
pub struct ApplyFailure {
    pub key: ObjectKey,
    pub error: Error,
}

impl fmt::Display for ApplyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.error)
    }
}

/// Summary of one reconciliation cycle
#[derive(Debug, Default)]
pub struct ReconciliationResult {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    /// Per-object apply failures; empty means full success
    pub failures: Vec<ApplyFailure>,
    /// Objects whose dispatch was skipped after cancellation
    pub not_attempted: Vec<ObjectKey>,
}

impl ReconciliationResult {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.not_attempted.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "created {} updated {} deleted {} unchanged {} failed {}",
            self.created,
            self.updated,
            self.deleted,
            self.unchanged,
            self.failures.len()
        )
    }

    fn cycle_summary(&self) -> CycleSummary {
        CycleSummary {
            created: self.created as i32,
            updated: self.updated as i32,
            deleted: self.deleted as i32,
            unchanged: self.unchanged as i32,
            failed: self.failures.len() as i32,
        }
    }
}

/// Run one reconciliation cycle for `infra`.
///
/// Capability is probed once for the cycle. The desired and deployed
/// snapshots are taken and diffed in full before anything is dispatched; a
/// configuration or read failure aborts the cycle with no actions taken.
/// Dispatch failures are contained per object and aggregated into the
/// result. `cancel` is honored between dispatches: the in-flight call
/// finishes, remaining actions are reported as not attempted.
#[instrument(skip(handle, infra, cancel), fields(name = %infra.name_any(), namespace = infra.namespace()))]
pub async fn reconcile_infra(
    handle: &dyn ClusterHandle,
    infra: &AtlasInfra,
    cancel: &AtomicBool,
) -> Result<ReconciliationResult> {
    let capable = probe_capability(handle, ManagedKind::MessagingCluster).await;

    let desired = build_desired(infra, capable)?;
    let deployed = read_deployed(handle, infra, capable).await?;

    let diff = compute_diff(&desired, &deployed);
    info!(
        capable,
        desired = desired.len(),
        deployed = deployed.len(),
        actions = diff.actions.len(),
        unchanged = diff.unchanged,
        "computed convergence diff"
    );

    let mut result = ReconciliationResult {
        unchanged: diff.unchanged,
        ..Default::default()
    };

    for action in diff.actions {
        let key = action.key();

        if cancel.load(Ordering::Relaxed) {
            result.not_attempted.push(key);
            continue;
        }

        let outcome = match &action {
            DiffAction::Create(object) => handle.create(object).await,
            DiffAction::Update(object) => handle.update(object).await,
            DiffAction::Delete(object) => handle.delete(object).await,
        };

        match outcome {
            Ok(()) => {
                debug!(%key, verb = action.verb(), "dispatched");
                match action {
                    DiffAction::Create(_) => result.created += 1,
                    DiffAction::Update(_) => result.updated += 1,
                    DiffAction::Delete(_) => result.deleted += 1,
                }
            }
            Err(err) => {
                warn!(%key, verb = action.verb(), error = %err, "apply failed, continuing with remaining objects");
                result.failures.push(ApplyFailure {
                    key,
                    error: Error::ApplyError(err),
                });
            }
        }
    }

    Ok(result)
}

/// Shared state for the controller
pub struct ControllerState {
    pub client: Client,
    pub is_leader: Arc<AtomicBool>,
}

/// Main entry point to start the controller
pub async fn run_controller(state: Arc<ControllerState>) -> Result<()> {
    let client = state.client.clone();
    let infras: Api<AtlasInfra> = Api::all(client.clone());

    info!("Starting AtlasInfra controller");

    // Verify CRD exists
    match infras.list(&Default::default()).await {
        Ok(_) => info!("AtlasInfra CRD is available"),
        Err(e) => {
            error!(
                "AtlasInfra CRD not found. Please install the CRD first: {:?}",
                e
            );
            return Err(Error::ConfigurationError(
                "AtlasInfra CRD not installed".to_string(),
            ));
        }
    }

    // The managed kinds are optional CRDs that may not be registered, so
    // there is no owns() watch on them; periodic requeue picks up drift.
    Controller::new(infras, Config::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, state)
        .for_each(|res| async move {
            match res {
                Ok(obj) => info!("Reconciled: {:?}", obj),
                Err(e) => error!("Reconcile error: {:?}", e),
            }
        })
        .await;

    Ok(())
}

/// Reconcile entry invoked on every watch event and periodic resync
#[instrument(skip(ctx), fields(name = %infra.name_any(), namespace = infra.namespace()))]
async fn reconcile(infra: Arc<AtlasInfra>, ctx: Arc<ControllerState>) -> Result<Action> {
    if !ctx.is_leader.load(Ordering::Relaxed) {
        debug!("not the leader, skipping reconciliation");
        return Ok(Action::requeue(Duration::from_secs(15)));
    }

    // Owned objects are cascade-deleted through their owner references, so a
    // terminating owner needs no convergence work.
    if infra.metadata.deletion_timestamp.is_some() {
        debug!("AtlasInfra {} is terminating, nothing to do", infra.name_any());
        return Ok(Action::await_change());
    }

    info!(
        "Reconciling AtlasInfra {}/{} (installMessaging: {})",
        infra.namespace().as_deref().unwrap_or("default"),
        infra.name_any(),
        infra.spec.install_messaging
    );

    let handle = KubeClusterHandle::new(ctx.client.clone());
    let cancel = AtomicBool::new(false);

    match reconcile_infra(&handle, &infra, &cancel).await {
        Ok(result) => {
            if !result.failures.is_empty() {
                let detail = result
                    .failures
                    .iter()
                    .map(ApplyFailure::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                warn!(
                    "{} object(s) failed to apply for {}: {}",
                    result.failures.len(),
                    infra.name_any(),
                    detail
                );
                emit_event(
                    &ctx.client,
                    &infra,
                    "Warning",
                    "ApplyFailed",
                    &format!("Some managed objects failed to apply: {detail}"),
                )
                .await?;
            }

            update_status(&ctx.client, &infra, &result).await?;

            // Converged owners are checked less frequently; a degraded cycle
            // requeues sooner so failed applies are retried.
            let requeue = if result.is_success() {
                Duration::from_secs(300)
            } else {
                Duration::from_secs(30)
            };
            Ok(Action::requeue(requeue))
        }
        Err(err) => {
            if let Err(status_err) = update_status_failed(&ctx.client, &infra, &err).await {
                warn!(
                    "Failed to record error status for {}: {:?}",
                    infra.name_any(),
                    status_err
                );
            }
            Err(err)
        }
    }
}

/// Helper to emit a Kubernetes Event
async fn emit_event(
    client: &Client,
    infra: &AtlasInfra,
    event_type: &str,
    reason: &str,
    message: &str,
) -> Result<()> {
    let namespace = infra.namespace().unwrap_or_else(|| "default".to_string());
    let events: Api<Event> = Api::namespaced(client.clone(), &namespace);

    let time = chrono::Utc::now();
    let event = Event {
        metadata: ObjectMeta {
            generate_name: Some(format!("{}-event-", infra.name_any())),
            ..Default::default()
        },
        type_: Some(event_type.to_string()),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        involved_object: infra.object_ref(&()),
        first_timestamp: Some(k8s_openapi::apimachinery::pkg::apis::meta::v1::Time(time)),
        last_timestamp: Some(k8s_openapi::apimachinery::pkg::apis::meta::v1::Time(time)),
        count: Some(1),
        ..Default::default()
    };

    events
        .create(&PostParams::default(), &event)
        .await
        .map_err(Error::KubeError)?;
    Ok(())
}

/// Update the status subresource with the outcome of a completed cycle
async fn update_status(
    client: &Client,
    infra: &AtlasInfra,
    result: &ReconciliationResult,
) -> Result<()> {
    let mut conditions = infra
        .status
        .as_ref()
        .map(|s| s.conditions.clone())
        .unwrap_or_default();

    if result.failures.is_empty() {
        set_condition(
            &mut conditions,
            CONDITION_TYPE_READY,
            CONDITION_STATUS_TRUE,
            "Converged",
            &result.summary(),
        );
        set_condition(
            &mut conditions,
            CONDITION_TYPE_DEGRADED,
            CONDITION_STATUS_FALSE,
            "NoFailures",
            "all dispatched actions succeeded",
        );
    } else {
        let detail = result
            .failures
            .iter()
            .map(ApplyFailure::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        set_condition(
            &mut conditions,
            CONDITION_TYPE_READY,
            CONDITION_STATUS_FALSE,
            "ApplyFailed",
            &result.summary(),
        );
        set_condition(
            &mut conditions,
            CONDITION_TYPE_DEGRADED,
            CONDITION_STATUS_TRUE,
            "ApplyFailed",
            &detail,
        );
    }

    let status = AtlasInfraStatus {
        message: Some(result.summary()),
        observed_generation: infra.metadata.generation,
        conditions,
        last_cycle: Some(result.cycle_summary()),
    };

    patch_status(client, infra, &status).await
}

/// Record a cycle-aborting error on the status subresource
async fn update_status_failed(client: &Client, infra: &AtlasInfra, err: &Error) -> Result<()> {
    let mut conditions = infra
        .status
        .as_ref()
        .map(|s| s.conditions.clone())
        .unwrap_or_default();

    let reason = if err.is_retriable() {
        "CycleAborted"
    } else {
        "InvalidConfiguration"
    };
    set_condition(
        &mut conditions,
        CONDITION_TYPE_READY,
        CONDITION_STATUS_FALSE,
        reason,
        &err.to_string(),
    );

    let status = AtlasInfraStatus {
        message: Some(err.to_string()),
        // Not bumped: the declared generation has not been converged
        observed_generation: infra
            .status
            .as_ref()
            .and_then(|s| s.observed_generation),
        conditions,
        last_cycle: infra.status.as_ref().and_then(|s| s.last_cycle.clone()),
    };

    patch_status(client, infra, &status).await
}

async fn patch_status(client: &Client, infra: &AtlasInfra, status: &AtlasInfraStatus) -> Result<()> {
    let namespace = infra.namespace().unwrap_or_else(|| "default".to_string());
    let api: Api<AtlasInfra> = Api::namespaced(client.clone(), &namespace);

    let patch = serde_json::json!({ "status": status });
    api.patch_status(
        &infra.name_any(),
        &PatchParams::apply(FIELD_MANAGER),
        &Patch::Merge(&patch),
    )
    .await
    .map_err(Error::KubeError)?;

    Ok(())
}

/// Error policy determines how to handle reconciliation errors
fn error_policy(infra: Arc<AtlasInfra>, error: &Error, _ctx: Arc<ControllerState>) -> Action {
    error!("Reconciliation error for {}: {:?}", infra.name_any(), error);

    // Use shorter retry for retriable errors
    let retry_duration = if error.is_retriable() {
        Duration::from_secs(15)
    } else {
        Duration::from_secs(60)
    };

    Action::requeue(retry_duration)
}
