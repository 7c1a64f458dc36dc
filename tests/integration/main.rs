//! Integration test harness
//!
//! Every module here runs the pipeline against wiremock servers.

mod crawl_tests;
mod download_tests;
mod resolver_tests;
