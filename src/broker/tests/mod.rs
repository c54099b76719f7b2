//! Test modules for the message broker
//!
//! `consumer` drives the consumer loop synchronously against prepared state;
//! `lifecycle` exercises the process-wide broker and must run serially.
