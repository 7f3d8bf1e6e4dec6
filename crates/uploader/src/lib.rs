//! Chunked upload pipeline and batch orchestration.
//!
//! This crate implements the business logic of a batch upload run. It is
//! a library crate with no transport dependencies: the network side is
//! reached through the [`PartTransport`] and [`GatewayApi`] traits, which
//! `fastpush-client` implements over WebSockets and tests implement with
//! mocks.
//!
//! # Pipeline
//!
//! 1. **Catalog**: enumerate video files in deterministic order
//! 2. **Upload**: split each file into 512 KiB parts and drive the
//!    parallel-connection transport, metering throughput
//! 3. **Send**: hand the finalized descriptor to the messaging target
//! 4. **Summarize**: fold per-file bytes and seconds into batch totals

pub mod batch;
pub mod error;
pub mod gateway;
pub mod pipeline;

pub use batch::{BatchReport, BatchRunner};
pub use error::UploadError;
pub use gateway::{BoxFuture, GatewayApi, PartTransport, Peer};
pub use pipeline::{upload_file, FileIdSource, RandomFileIds};
