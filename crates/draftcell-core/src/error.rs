use futures::task::SpawnError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("frame tick re-entered from inside a running task")]
    ReentrantTick,
    #[error("task pool is gone: thread is shutting down")]
    RuntimeGone,
    #[error("could not spawn local task: {0}")]
    Spawn(#[from] SpawnError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
