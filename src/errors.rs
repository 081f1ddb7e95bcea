use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("cannot move a node into its own subtree")]
    MoveIntoDescendant,

    #[error("filter worker did not complete")]
    FilterTask(#[source] tokio::task::JoinError),
}

pub type TreeResult<T> = Result<T, TreeError>;
