#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("graph is already built; call reset() before make()")]
    AlreadyBuilt,
    #[error("graph has no nodes; call make() before initializing physics")]
    EmptyGraph,
    #[error("integrator stepped before initialize()")]
    NotInitialized,
}
