use std::any::Any;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use anyhow::Result;
use log::debug;

use crate::utils::charset::Charset;
use crate::utils::errors::CodecError;

/// Kinds of sibling state a record can leave behind for later records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKind {
    /// Repeating-group layout announced by the latest Code Page Control.
    CodePageLayout,
}

impl Display for ContextKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextKind::CodePageLayout => f.write_str("code page layout"),
        }
    }
}

/// A value stored in the [`DecodeContext`] under its kind.
pub trait ContextValue: Any + Send + Sync + std::fmt::Debug {
    const KIND: ContextKind;
}

/// Options consumed by the codec.
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Table used for every name and description field.
    pub charset: Charset,
    /// Diagnostics at or above this level abort the document.
    ///
    /// - `log::Level::Error`: tolerate short trailing elements (default)
    /// - `log::Level::Warn`: strict length checking
    pub fail_level: log::Level,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            charset: Charset::default(),
            fail_level: log::Level::Error,
        }
    }
}

/// Per-document state carried from earlier records to later ones.
///
/// Created empty for each document and dropped with it. The most recent
/// writer of a kind wins, mirroring how the latest control record governs
/// the data records after it. Encoding threads the same context so that
/// bodies are written against the control record that precedes them.
#[derive(Debug, Default)]
pub struct DecodeContext {
    pub config: DecoderConfig,
    entries: HashMap<ContextKind, Box<dyn Any + Send + Sync>>,
}

impl DecodeContext {
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
        }
    }

    pub fn put<T: ContextValue>(&mut self, value: T) {
        debug!("Context {} <- {value:?}", T::KIND);
        self.entries.insert(T::KIND, Box::new(value));
    }

    pub fn get<T: ContextValue>(&self) -> Result<&T> {
        self.entries
            .get(&T::KIND)
            .and_then(|value| value.downcast_ref::<T>())
            .ok_or_else(|| CodecError::MissingContext(T::KIND).into())
    }

    pub fn contains(&self, kind: ContextKind) -> bool {
        self.entries.contains_key(&kind)
    }

    pub fn charset(&self) -> Charset {
        self.config.charset
    }
}
