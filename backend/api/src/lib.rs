//! Digital Product Passport backend for construction materials.
//!
//! Tracks materials from procurement through installation to
//! enrichment, one passport per material batch, with wallet-based
//! role permissions, IPFS-pinned documents, and best-effort ledger
//! anchoring on top of SQLite.

pub mod api;
pub mod auth;
pub mod clients;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod pagination;
pub mod scoring;
