use controllers::nexus::NexusController;
use envconfig::Envconfig;
use futures::stream::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use kube::{Resource, ResourceExt};
use kube::{api::ListParams, client::Client, Api};
use kube_runtime::controller::{Context, ReconcilerAction};
use kube_runtime::Controller;
use log::{error, info, warn};
use tokio::time::Duration;

mod controllers;
mod models;
mod resources;
mod utils;

use models::nexus::Nexus;
use utils::config::OperatorConfig;
use utils::error::Error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Operator settings come from the environment; a malformed value stops the operator
    // before it touches the cluster.
    let config = OperatorConfig::init_from_env()?;
    info!("Starting nexus-operator with {:?}", config);

    // First, a Kubernetes client must be obtained using the `kube` crate.
    // The client will later be moved to the custom controller
    let kubernetes_client: Client = Client::try_default().await?;

    // Preparation of resources used by the `kube_runtime::Controller`

    let nexus_api: Api<Nexus> = Api::all(kubernetes_client.clone());
    let deployment_api: Api<Deployment> = Api::all(kubernetes_client.clone());
    let context: Context<ContextData> =
        Context::new(ContextData::new(kubernetes_client, &config));

    // The controller comes from the `kube_runtime` crate and manages the reconciliation process.
    // It requires the following information:
    // - `kube::Api<T>` this controller "owns". In this case, `T = Nexus`,
    // - `owns` with the `Deployment` API. Deployments carry a controller reference to their
    //   Nexus, so a change or deletion of one requeues the owning instance,
    // - `reconcile` function with the logic to be called each time a `Nexus` is created/updated/deleted,
    // - `on_error` function to call whenever reconciliation fails.
    Controller::new(nexus_api, ListParams::default())
        .owns(deployment_api, ListParams::default())
        .run(reconcile, on_error, context)
        .for_each(|reconciliation_result| async move {
            match reconciliation_result {
                Ok((nexus, _)) => {
                    info!("Reconciliation successful. Resource: {:?}", nexus);
                }
                Err(reconciliation_err) => {
                    warn!("Reconciliation error: {:?}", reconciliation_err)
                }
            }
        })
        .await;

    Ok(())
}

/// Context injected with each `reconcile` and `on_error` method invocation.
struct ContextData {
    controller: NexusController,
    requeue_after: Duration,
}

impl ContextData {
    /// Constructs a new instance of ContextData.
    ///
    /// # Arguments:
    /// - `client`: A Kubernetes client to make Kubernetes REST API requests with.
    /// - `config`: Operator settings read at start-up.
    pub fn new(client: Client, config: &OperatorConfig) -> Self {
        ContextData {
            controller: NexusController::new(client, config),
            requeue_after: Duration::from_secs(config.reconcile_interval_seconds),
        }
    }
}

async fn reconcile(nexus: Nexus, context: Context<ContextData>) -> Result<ReconcilerAction, Error> {
    let context_data = context.get_ref();

    // Deletion is left to the garbage collector through the owner reference.
    if nexus.meta().deletion_timestamp.is_some() {
        return Ok(ReconcilerAction {
            requeue_after: None,
        });
    }

    let namespace: String = match nexus.namespace() {
        None => {
            return Err(Error::UserInputError(
                "Expected Nexus resource to be namespaced. Can't deploy to an unknown namespace."
                    .to_owned(),
            ));
        }
        Some(namespace) => namespace,
    };

    // Build the Deployment from the Nexus spec and apply it. The builder never writes
    // into `nexus`; whatever it defaulted comes back as `resolved`.
    let resolved = context_data
        .controller
        .apply_deployment(&nexus, &namespace)
        .await?;

    // Only writes to the Nexus when enabled and when the resolved image differs.
    context_data
        .controller
        .persist_resolved_defaults(&nexus, &namespace, &resolved)
        .await?;

    Ok(ReconcilerAction {
        requeue_after: Some(context_data.requeue_after),
    })
}

/// Actions to be taken when a reconciliation fails - for whatever reason.
/// Logs the error and requeues the resource for another reconciliation after
/// five seconds.
///
/// # Arguments
/// - `error`: A reference to the `Error` that occurred during reconciliation.
/// - `_context`: Unused argument. Context Data "injected" automatically by kube-rs.
fn on_error(error: &Error, _context: Context<ContextData>) -> ReconcilerAction {
    error!("Reconciliation error:\n{:?}", error);
    ReconcilerAction {
        requeue_after: Some(Duration::from_secs(5)),
    }
}
