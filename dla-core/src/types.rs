/// Identifier for a node in a [`crate::cluster::Cluster`].
///
/// This is an index into the cluster's node sequence, and is only
/// meaningful within the lifetime of a given `Cluster` instance (stable
/// until the next reset, since nodes are never removed).
pub type NodeId = usize;
