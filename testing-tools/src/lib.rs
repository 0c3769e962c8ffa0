// Testing Tools Library
//
// This crate provides testing utilities and tools for DevRadar.
// Currently includes:
// - presence-test-client: realtime presence integration testing tool

pub mod api_client;
pub mod output;
pub mod scenarios;
pub mod sse_client;
