//! Card-spend platform integration

pub mod client;
pub mod resolvers;
pub mod source;

pub use client::{CardClient, FetchMode, PageLimits, TransactionBatch, TransactionQuery};
pub use source::{CardSyncRequest, CardWorkSetSource};
