//! Application module

pub mod cli;
pub mod relay;
pub mod startup;
