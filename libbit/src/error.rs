use crate::checkout::CheckoutConflicts;
use crate::obj::{BitId, BitObjType, Oid, PartialOid};
use crate::refs::SymbolicRef;
use crate::status::BitStatus;
use owo_colors::OwoColorize;
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

pub type BitResult<T> = Result<T, BitGenericError>;
pub type BitGenericError = anyhow::Error;

// usually we can just use anyhow for errors, but sometimes its nice to have a "rust" representation we can test or match against
// consider not even using an enum and just have top level structs as this is resulting in extra unnecessary indirection
#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub enum BitError {
    ObjectNotFound(BitId),
    /// object `{0}` not found in pack index but could be inserted at `{1}`
    ObjectNotFoundInPackIndex(Oid, u64),
    AmbiguousPrefix(PartialOid, Vec<Oid>),
    NonExistentSymRef(SymbolicRef),
    CheckoutConflict(CheckoutConflicts),
    ExpectedCommit(Oid, BitObjType),
    PackBackendWrite,
}

pub trait BitErrorExt {
    fn try_into_obj_not_found_in_pack_index_err(self) -> BitResult<(Oid, u64)>;
    fn try_into_obj_not_found_err(self) -> BitResult<BitId>;
    fn try_into_nonexistent_symref_err(self) -> BitResult<SymbolicRef>;
    fn try_into_bit_error(self) -> BitResult<BitError>;
    fn try_into_status_error(self) -> BitResult<BitStatus>;
    fn try_into_expected_commit_error(self) -> BitResult<(Oid, BitObjType)>;
    fn try_into_checkout_conflict(self) -> BitResult<CheckoutConflicts>;
}

impl BitErrorExt for BitGenericError {
    /// tries to convert generic error into specific error and just returns previous error on failure
    // this pattern feels pretty shit, not sure of a better way atm
    // usually don't have to catch errors that often so its not too bad (yet?)
    fn try_into_obj_not_found_in_pack_index_err(self) -> BitResult<(Oid, u64)> {
        match self.try_into_bit_error()? {
            BitError::ObjectNotFoundInPackIndex(oid, idx) => Ok((oid, idx)),
            err => Err(anyhow!(err)),
        }
    }

    fn try_into_checkout_conflict(self) -> BitResult<CheckoutConflicts> {
        match self.try_into_bit_error()? {
            BitError::CheckoutConflict(checkout_conflict) => Ok(checkout_conflict),
            err => Err(anyhow!(err)),
        }
    }

    fn try_into_nonexistent_symref_err(self) -> BitResult<SymbolicRef> {
        match self.try_into_bit_error()? {
            BitError::NonExistentSymRef(sym) => Ok(sym),
            err => Err(anyhow!(err)),
        }
    }

    fn try_into_bit_error(self) -> BitResult<BitError> {
        match self.downcast::<BitError>() {
            Ok(bit_error) => Ok(bit_error),
            Err(cast_failed_err) => Err(cast_failed_err),
        }
    }

    fn try_into_status_error(self) -> BitResult<BitStatus> {
        self.downcast()
    }

    fn try_into_obj_not_found_err(self) -> BitResult<BitId> {
        match self.try_into_bit_error()? {
            BitError::ObjectNotFound(id) => Ok(id),
            err => Err(anyhow!(err)),
        }
    }

    fn try_into_expected_commit_error(self) -> BitResult<(Oid, BitObjType)> {
        match self.try_into_bit_error()? {
            BitError::ExpectedCommit(oid, obj_type) => Ok((oid, obj_type)),
            err => Err(anyhow!(err)),
        }
    }
}

pub trait BitResultExt {
    fn is_not_found_err(&self) -> bool;
    fn is_fatal(&self) -> bool;
}

macro_rules! error_ext_is_method {
    ($method:ident) => {
        fn $method(&self) -> bool {
            match self {
                Ok(..) => false,
                Err(err) => err.$method(),
            }
        }
    };
}

impl<T> BitResultExt for BitResult<T> {
    error_ext_is_method!(is_not_found_err);

    error_ext_is_method!(is_fatal);
}

impl BitResultExt for BitGenericError {
    fn is_not_found_err(&self) -> bool {
        if let Some(err) = self.downcast_ref::<BitError>() {
            return matches!(
                err,
                BitError::ObjectNotFound(..) | BitError::ObjectNotFoundInPackIndex(..)
            );
        }
        if let Some(kind) = self.downcast_ref::<ErrorKind>() {
            return matches!(kind, ErrorKind::ObjectMissing(..));
        }
        false
    }

    fn is_fatal(&self) -> bool {
        if let Some(err) = self.downcast_ref::<BitError>() {
            return !matches!(
                err,
                BitError::ObjectNotFound(..)
                    | BitError::ObjectNotFoundInPackIndex(..)
                    | BitError::CheckoutConflict(..)
                    | BitError::PackBackendWrite
            );
        }
        if let Some(kind) = self.downcast_ref::<ErrorKind>() {
            return !matches!(kind, ErrorKind::ObjectMissing(..) | ErrorKind::Remote { .. });
        }
        true
    }
}

macro_rules! write_hint {
    ($f:expr, $($args:tt)*) => {{
        write!($f, "{}: ", "hint".yellow())?;
        writeln!($f, $($args)*)
    }};
}

impl Display for BitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BitError::ObjectNotFound(id) => write!(f, "bit object with hash `{}` not found", id),
            BitError::AmbiguousPrefix(prefix, candidates) => {
                writeln!(f, "prefix oid `{}` is ambiguous", prefix)?;
                write_hint!(f, "the candidates are:")?;
                for candidate in candidates {
                    write_hint!(f, "  {}", candidate.yellow())?;
                }
                Ok(())
            }
            BitError::NonExistentSymRef(sym) =>
                write!(f, "failed to resolve symbolic reference `{}`", sym),
            BitError::PackBackendWrite | BitError::ObjectNotFoundInPackIndex(..) =>
                bug!("not a user facing error"),
            BitError::CheckoutConflict(conflicts) => {
                // TODO
                writeln!(f, "some checkout conflicts: {:?}", conflicts)
            }
            BitError::ExpectedCommit(oid, obj_type) =>
                writeln!(f, "`{}` is a {}, expected commit", oid, obj_type),
        }
    }
}

/// Structured kinds for everything that can go wrong talking to a remote:
/// negotiating a transport, parsing its responses, and applying the result.
/// Downcast via [`ErrorKindExt`] the same way [`BitError`] is downcast via
/// [`BitErrorExt`]; the bare [`BitResult`] alias is still what call sites that
/// don't care about the distinction should return and propagate with `?`.
#[derive(Debug, Error)]
#[cfg_attr(test, derive(PartialEq))]
pub enum ErrorKind {
    #[error("failed to parse {what}: {detail}")]
    Parse { what: &'static str, detail: String },
    #[error("transport error talking to `{url}`: {detail}")]
    Transport { url: String, detail: String },
    #[error("authentication to `{url}` was cancelled or rejected")]
    Auth { url: String },
    #[error("remote does not support capability `{capability}`")]
    Capability { capability: String },
    #[error("remote rejected {reference}: {reason}")]
    Remote { reference: String, reason: String },
    #[error("integrity check failed: {detail}")]
    Integrity { detail: String },
    #[error("object `{0}` missing from pack index")]
    ObjectMissing(Oid),
    #[error("{0}")]
    State(String),
    #[error("fatal error from remote: {0}")]
    Fatal(String),
}

impl ErrorKind {
    pub fn transport(url: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Transport { url: url.into(), detail: detail.into() }
    }

    pub fn parse(what: &'static str, detail: impl Into<String>) -> Self {
        Self::Parse { what, detail: detail.into() }
    }

    pub fn auth(url: impl Into<String>) -> Self {
        Self::Auth { url: url.into() }
    }

    pub fn capability(capability: impl Into<String>) -> Self {
        Self::Capability { capability: capability.into() }
    }

    pub fn remote(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Remote { reference: reference.into(), reason: reason.into() }
    }

    pub fn integrity(detail: impl Into<String>) -> Self {
        Self::Integrity { detail: detail.into() }
    }

    pub fn is_retryable_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

pub trait ErrorKindExt {
    fn try_into_error_kind(self) -> BitResult<ErrorKind>;
    fn error_kind(&self) -> Option<&ErrorKind>;
}

impl ErrorKindExt for BitGenericError {
    fn try_into_error_kind(self) -> BitResult<ErrorKind> {
        self.downcast::<ErrorKind>()
    }

    fn error_kind(&self) -> Option<&ErrorKind> {
        self.downcast_ref::<ErrorKind>()
    }
}
