//! Transport client for the remote analysis service

pub mod client;
pub mod request;
pub(crate) mod response;

#[cfg(test)]
mod client_tests;

pub use client::TpServiceClient;
pub use request::{CheckOptions, ComplianceOptions, Endpoint};
