//! Marker types.

/// Marker type describing an entity upload.
#[derive(Clone, Copy, Debug)]
pub struct Upload;

/// Marker type describing an entity issuing.
#[derive(Clone, Copy, Debug)]
pub struct Issue;

/// Marker type describing an entity expiration.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;
