use thiserror::Error;

/// Failure of a pipeline run, split by how the process should exit.
#[derive(Error, Debug)]
pub enum EtlError {
    /// Configuration or warehouse schema could not be set up.
    #[error("Setup failed: {0:#}")]
    Setup(#[source] anyhow::Error),

    /// The run started but could not complete, e.g. a storage write failed.
    #[error("Run failed: {0:#}")]
    Run(#[source] anyhow::Error),
}

impl EtlError {
    pub fn exit_code(&self) -> u8 {
        match self {
            EtlError::Setup(_) => 2,
            EtlError::Run(_) => 1,
        }
    }
}
