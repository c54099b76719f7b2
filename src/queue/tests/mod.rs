//! Test modules for the blocking queue
//!
//! Tests are organized by functional area.
