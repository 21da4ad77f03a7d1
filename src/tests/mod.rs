//! Test modules for the Banyan RPC runtime.
//!
//! Cross-cutting tests live here; component tests live next to their
//! components, and the JSON-RPC layer keeps its own suite under
//! `protocol/jsonrpc/tests`.
