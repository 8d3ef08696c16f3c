//! Data structures representing AFP records.
//!
//! Contains the structured field envelope, the record bodies it carries and
//! the nested sub-records (triplets, repeating groups, control sequences and
//! image self-defining fields) used throughout decoding and encoding.

pub mod begin_end;
pub mod code_page;
pub mod field;
pub mod font_map;
pub mod image;
pub mod record;
pub mod text;
pub mod triplet;
