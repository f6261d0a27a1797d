//! End-to-end tests against mock devices.

pub mod connection_tests;
pub mod device_tests;
pub mod terminal_tests;
