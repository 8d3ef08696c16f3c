//! Utility functions and supporting infrastructure.
//!
//! Provides big-endian serialisation, checked byte spans, flag-byte codecs,
//! EBCDIC transcoding and error handling used by the codec engine.

pub mod byteorder;
pub mod charset;
pub mod errors;
pub mod flags;
pub mod span;
