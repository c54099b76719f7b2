//! Broker integration test modules

mod lifecycle;
mod relay;
