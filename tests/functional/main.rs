//! Functional test suite: drives the router in-process with fake provider
//! clients, plus wiremock-backed tests of the real clients.

mod download_test;
mod helpers;
mod upload_test;
