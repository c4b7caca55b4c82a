/// Identifier for a node in a [`crate::web::WebGraph`].
///
/// This is an index into the graph's node table, and is only meaningful
/// within the lifetime of a given `WebGraph` build.
pub type NodeId = usize;
