//! Blob storage client.
//!
//! This crate provides:
//! - The `BlobStore` seam used by the API and the processing workflow
//! - An S3-compatible implementation (upload, delete by public URL)
//! - Plain HTTP download of public object URLs

pub mod client;
pub mod error;
pub mod store;

pub use client::{key_from_url, BlobStoreConfig, S3BlobClient};
pub use error::{StorageError, StorageResult};
pub use store::{thumbnail_key, Access, BlobStore, UploadedBlob};
