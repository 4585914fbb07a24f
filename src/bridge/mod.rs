//! The node/document identity-and-lifecycle bridge.
//!
//! This layer keeps the bijection between engine tree nodes and host-side
//! wrapper objects:
//!
//! - [`registry`] records bindings in the per-node slot the engine reserves
//!   for exactly this purpose (O(1) lookup, no side table);
//! - [`hook`] is the process-wide construction callback the engine invokes
//!   for every node it allocates, eagerly creating and registering the
//!   matching binding before the allocating call returns;
//! - [`lifecycle`] owns the one-time process-wide installation of the hook
//!   and the corresponding teardown marker.
//!
//! All structural queries in the wrapper layer resolve through the
//! registry, never by re-wrapping, so the same logical node is never
//! represented by two wrapper instances.

pub(crate) mod hook;
pub mod lifecycle;
pub(crate) mod registry;
