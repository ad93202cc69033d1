//! Filesystem-backed storage: blobs and session documents

pub mod blob;
pub mod session;
