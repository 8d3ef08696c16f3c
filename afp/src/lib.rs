#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! ### Document Organization
//!
//! **Envelope**: every structured field starts with an optional `0x5A`
//! carriage-control byte, a 2-byte length, a 3-byte type identifier, a flag
//! byte and two reserved bytes. An optional extension and trailing padding
//! are framed by the envelope, never by the record body.
//!
//! **Nesting**: record bodies hold fixed prefixes followed by collections of
//! sub-records. Triplets, repeating groups, image self-defining fields and
//! chained control sequences share a single iterator with a per-family
//! framing policy.
//!
//! ### Sibling State
//!
//! Some records are only decodable after an earlier sibling. A Code Page
//! Index, for instance, takes its element width from the preceding Code Page
//! Control. This state lives in a per-document
//! [`DecodeContext`](process::context::DecodeContext).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use afp::process::{read::Reader, write::Writer, EXAMPLE_DATA};
//!
//! let mut reader = Reader::default();
//! reader.set_fail_level(log::Level::Warn);
//!
//! let document = reader.read_document(EXAMPLE_DATA)?;
//!
//! for field in &document.fields {
//!     println!("{} {}", field.type_id(), field.record.name());
//! }
//!
//! let bytes = Writer::default().write_document(&document)?;
//! assert_eq!(bytes, EXAMPLE_DATA);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Document processing.
///
/// 1. **Context** ([`process::context`]): Per-document sibling state and options.
///
/// 2. **Iteration** ([`process::iterate`]): Walking nested self-describing
///    sub-records.
///
/// 3. **Dispatch** ([`process::registry`]): Type code to variant tables.
///
/// 4. **Reading and Writing** ([`process::read`], [`process::write`]): Whole
///    document decode and encode.
pub mod process;

/// Data structures representing AFP records.
///
/// - **Structured Fields** ([`structs::field`]): Envelope and type identifiers
/// - **Records** ([`structs::record`]): Closed set of structured field bodies
/// - **Triplets** ([`structs::triplet`]): Attribute sub-records
/// - **Code Pages** ([`structs::code_page`]): Descriptor, control and index
/// - **Presentation Text** ([`structs::text`]): Control-sequence chains
/// - **Images** ([`structs::image`]): Image self-defining fields
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Byte Order** ([`utils::byteorder`]): Big-endian serialisation
/// - **Spans** ([`utils::span`]): Checked byte views and readers
/// - **Flags** ([`utils::flags`]): Flag byte codecs
/// - **Charsets** ([`utils::charset`]): EBCDIC transcoding
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
