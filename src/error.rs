use std::error;
use std::fmt;

/// An error that occurred while compiling a pattern.
///
/// An error can come from the parser (a malformed pattern), from a feature
/// this crate doesn't implement (such as Unicode classes), or from one of the
/// engines refusing to build. The last category is usually handled
/// internally: when an engine rejects a pattern, the router falls through to
/// the next engine. The only engine-level errors that reach callers of
/// [`Regex::new`](crate::meta::Regex::new) are resource limits of the NFA
/// fallback, since nothing can execute a pattern the NFA can't hold.
///
/// Callers who build individual engines directly see every error kind.
#[derive(Clone, Debug)]
pub struct Error {
    kind: ErrorKind,
}

#[derive(Clone, Debug)]
enum ErrorKind {
    /// The pattern failed to parse.
    Syntax(regex_syntax::ast::Error),
    /// The pattern parsed, but uses a feature that isn't supported.
    Unsupported(&'static str),
    /// An eager DFA cannot represent the pattern exactly.
    TooComplex(&'static str),
    /// A one-pass DFA was asked to track more groups than it has room for.
    CaptureSlotOverflow { groups: usize, limit: usize },
    /// The Thompson NFA exceeded its configured size limit.
    TooManyStates { limit: usize },
    /// An engine declined the pattern for a structural reason.
    Rejected(&'static str),
}

impl Error {
    pub(crate) fn syntax(err: regex_syntax::ast::Error) -> Error {
        Error { kind: ErrorKind::Syntax(err) }
    }

    pub(crate) fn unsupported(what: &'static str) -> Error {
        Error { kind: ErrorKind::Unsupported(what) }
    }

    pub(crate) fn too_complex(why: &'static str) -> Error {
        Error { kind: ErrorKind::TooComplex(why) }
    }

    pub(crate) fn capture_slot_overflow(groups: usize, limit: usize) -> Error {
        Error { kind: ErrorKind::CaptureSlotOverflow { groups, limit } }
    }

    pub(crate) fn too_many_states(limit: usize) -> Error {
        Error { kind: ErrorKind::TooManyStates { limit } }
    }

    pub(crate) fn rejected(why: &'static str) -> Error {
        Error { kind: ErrorKind::Rejected(why) }
    }

    /// Returns true if this error came from parsing the pattern.
    pub fn is_syntax(&self) -> bool {
        matches!(self.kind, ErrorKind::Syntax(_))
    }

    /// Returns true if this error occurred because the pattern uses a
    /// feature this crate doesn't support.
    pub fn is_unsupported(&self) -> bool {
        matches!(self.kind, ErrorKind::Unsupported(_))
    }

    /// Returns true if an eager DFA could not represent the pattern exactly.
    pub fn is_too_complex(&self) -> bool {
        matches!(self.kind, ErrorKind::TooComplex(_))
    }

    /// Returns true if a one-pass DFA ran out of capture slots.
    pub fn is_capture_slot_overflow(&self) -> bool {
        matches!(self.kind, ErrorKind::CaptureSlotOverflow { .. })
    }

    /// Returns true if the NFA grew past its configured size limit.
    pub fn is_too_many_states(&self) -> bool {
        matches!(self.kind, ErrorKind::TooManyStates { .. })
    }

    /// Returns true if an engine declined to handle the pattern.
    pub fn is_rejected(&self) -> bool {
        matches!(self.kind, ErrorKind::Rejected(_))
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.kind {
            ErrorKind::Syntax(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            ErrorKind::Syntax(ref err) => err.fmt(f),
            ErrorKind::Unsupported(what) => {
                write!(f, "unsupported regex feature: {}", what)
            }
            ErrorKind::TooComplex(why) => {
                write!(f, "pattern too complex for an eager DFA: {}", why)
            }
            ErrorKind::CaptureSlotOverflow { groups, limit } => write!(
                f,
                "pattern has {} capture groups, but a one-pass DFA \
                 supports at most {}",
                groups, limit,
            ),
            ErrorKind::TooManyStates { limit } => write!(
                f,
                "compiled NFA exceeds the size limit of {} states",
                limit,
            ),
            ErrorKind::Rejected(why) => write!(f, "engine rejected: {}", why),
        }
    }
}
