pub mod args;
pub mod dispatch;
pub mod handler;
pub mod protocol;
pub mod registry;
pub mod validation;
