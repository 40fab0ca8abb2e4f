//! Subcommands of the surql binary.

pub mod connect;
pub mod health;
pub mod input;
pub mod output;
pub mod plan;
pub mod run;
pub mod variables;
