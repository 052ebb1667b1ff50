//! HTTP relay in front of the notarization contract

mod client;

pub use client::{NotaryClient, NotaryConfig};
