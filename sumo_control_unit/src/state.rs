//! State machine module root.
//!
//! A single flat machine: SEARCH, LOCKON, APPROACH, PUSH and the transient
//! RECOVER, with the edge override checked ahead of all of them.

pub mod machine;
