//! Azure DevOps build service adapter.
//!
//! Implements [`svn_ci_core::BuildService`] against the Azure DevOps build
//! REST API: definition inventory, build history, and build queueing. All
//! calls authenticate with a personal access token over basic auth.

mod client;
mod wire;

pub use client::AzureBuildClient;
