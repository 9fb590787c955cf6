// Thin re-export module: implementation is in `blockchain/core.rs`, split into
// block/chain management, the stake table and chain verification.

pub mod core;
pub use self::core::*;
