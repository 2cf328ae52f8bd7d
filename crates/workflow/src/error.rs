use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("no entry point set")]
    MissingEntryPoint,

    #[error("conditional edge at '{0}' routed to unregistered branch '{1}'")]
    UnregisteredBranch(String, String),
}

impl From<WorkflowError> for hr_rag_core::Error {
    fn from(err: WorkflowError) -> Self {
        hr_rag_core::Error::Workflow(err.to_string())
    }
}
