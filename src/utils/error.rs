/// Utility enum that covers all possible errors during reconciliation
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Any error originating from the `kube-rs` crate
    #[error("Kubernetes reported error: {source}")]
    KubeError {
        #[from]
        source: kube::Error,
    },

    /// Error in user input or Nexus resource definition, typically missing fields.
    #[error("Invalid Nexus resource: {0}")]
    UserInputError(String),

    #[error("Configuration error: {source}")]
    ConfigError {
        #[from]
        source: envconfig::Error,
    },
}
