//! Scripts for compiling the storage contract, deploying it, and exercising
//! the deployed instance with one read / write round trip.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifact;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod constants;
pub mod contract;
pub mod errors;
pub mod solc;
pub mod types;
