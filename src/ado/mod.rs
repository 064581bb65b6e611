//! Andromeda Digital Objects: message types, code-ID resolution, the
//! instantiation fallback ladder and the multi-step product flows.

pub mod flows;
pub mod messages;
pub mod registry;
pub mod strategies;
