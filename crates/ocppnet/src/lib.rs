//! Top-level facade crate for ocppnet.
//!
//! Re-exports the protocol core and the networking node so users can depend on a single crate.

pub mod core {
    pub use ocppnet_core::*;
}

pub mod node {
    pub use ocppnet_node::*;
}
