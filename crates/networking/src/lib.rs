//! CarePoints Networking - On-chain notarization relay client

pub mod http;
pub mod notary;

pub use http::{NotaryClient, NotaryConfig};
pub use notary::{content_hash, notarize_gratitude, NotarizationReceipt, NotarizationRequest, Notarizer};
