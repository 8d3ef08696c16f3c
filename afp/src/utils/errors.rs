use crate::process::context::ContextKind;

/// Logs `$err` at `$level`, or returns it when `$level` is at or above the
/// configured fail level of `$state`.
#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err.into());
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

/// Failures raised by the codec engine. Offsets are absolute positions in
/// the document buffer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error(
        "Truncated record at offset {offset:#X}: {required} bytes required, {available} available"
    )]
    TruncatedRecord {
        offset: usize,
        required: usize,
        available: usize,
    },

    #[error(
        "Sub-record at {offset:#X} declares {declared} bytes, {remaining} left in its parent"
    )]
    OverrunSubRecord {
        offset: usize,
        declared: usize,
        remaining: usize,
    },

    #[error("No {0} was decoded before a record that depends on it")]
    MissingContext(ContextKind),

    #[error("Flag byte {byte:#04X} has no defined flag for group mask {mask:#04X}")]
    UnsupportedFlagPattern { byte: u8, mask: u8 },

    #[error(
        "Trailing {remaining} bytes at offset {offset:#X} do not fill a {stride}-byte element"
    )]
    PartialElement {
        offset: usize,
        remaining: usize,
        stride: usize,
    },

    #[error("{remaining} bytes at offset {offset:#X} follow the {count} counted elements")]
    SurplusBytes {
        offset: usize,
        remaining: usize,
        count: usize,
    },

    #[error("Repeating group length {0} is not supported")]
    UnsupportedGroupLength(u8),

    #[error("Structured field at offset {offset:#X} declares length {length}, minimum is 8")]
    InvalidFieldLength { offset: usize, length: usize },

    #[error(
        "Padding of {padding} bytes at {offset:#X} exceeds the {available} bytes after the header"
    )]
    InvalidPadding {
        offset: usize,
        padding: usize,
        available: usize,
    },

    #[error("{what} of {length} does not fit its limit of {max}")]
    ValueTooLarge {
        what: &'static str,
        length: usize,
        max: usize,
    },

    #[error("Control sequence at offset {offset:#X} lacks the 0x2BD3 prefix, read {read:#06X}")]
    IntroducerMismatch { offset: usize, read: u16 },
}

/// A fatal failure while decoding or encoding one document.
///
/// `index` is the position of the offending structured field and `offset`
/// the byte where that field starts. Nothing after it is decoded.
#[derive(thiserror::Error, Debug)]
#[error("Structured field {index} at offset {offset:#X}: {error:#}")]
pub struct DocumentError {
    pub index: usize,
    pub offset: usize,
    pub error: anyhow::Error,
}

impl DocumentError {
    /// The engine error behind this failure, if it came from the engine.
    pub fn codec_error(&self) -> Option<&CodecError> {
        self.error.downcast_ref::<CodecError>()
    }
}
