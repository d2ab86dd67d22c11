use std::fmt;

use thiserror::Error;

use crate::{interpolate::InterpolateError, tag::TagError};

/// Error type returned by user supplied hooks and resolvers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Any error produced by `xcmd`: either the grammar could not be built, or
/// the arguments did not match it.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// A structural problem with the declared schema.
///
/// Always fatal: no partially built grammar is ever handed out.
#[derive(Debug, Error)]
#[error("{container}: `{field}`: {kind}")]
pub struct BuildError {
    /// The node that owns the offending field, e.g. ``command `user` ``.
    pub container: String,
    /// Identifier of the offending field.
    pub field: String,
    pub kind: BuildErrorKind,
}

#[derive(Debug, Error)]
pub enum BuildErrorKind {
    #[error("{0}")]
    Tag(#[from] TagError),
    #[error("{0}")]
    Interpolate(#[from] InterpolateError),
    #[error("duplicate flag {0}")]
    DuplicateFlag(String),
    #[error("field declared twice")]
    DuplicateField,
    #[error("branching argument must contain at least one positional argument")]
    BranchWithoutPositional,
    #[error("first positional of a branching argument must be named `{expected}`, got `{actual}`")]
    BranchNameMismatch { expected: String, actual: String },
    #[error("required positional `{0}` can't follow an optional one")]
    RequiredAfterOptional(String),
    #[error("a node can't have both positional arguments and subcommands")]
    PositionalsAndChildren,
    #[error("no decoder for type `{0}`")]
    UnknownType(String),
    #[error("invalid default value: {0}")]
    Default(DecodeError),
    #[error("enum value must either be required or have a default")]
    EnumWithoutDefault,
    #[error("nested group must be tagged `cmd`, `arg` or `embed`")]
    UntaggedGroup,
    #[error("`{0}` is only valid on a nested group")]
    NotAGroup(&'static str),
    #[error("`{0}` and `{1}` are mutually exclusive")]
    Exclusive(&'static str, &'static str),
    #[error("`negatable` is only valid on boolean flags")]
    NegatableNotBool,
}

/// The arguments don't fit the grammar.
///
/// These are user errors: each variant carries enough context (the flag or
/// positional name, the offending literal) to render an actionable message.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unknown flag {flag}{}", DidYouMean(.suggestion))]
    UnknownFlag { flag: String, suggestion: Option<String> },
    #[error("unexpected flag argument {0:?}")]
    UnexpectedFlagArgument(String),
    #[error("unexpected positional argument {0:?}")]
    UnexpectedPositional(String),
    #[error("missing positional arguments {}", .0.join(" "))]
    MissingPositionals(Vec<String>),
    #[error("expected {}", OneOf(.0))]
    ExpectedOneOf(Vec<String>),
    #[error("missing flags: {}", .0.join(", "))]
    MissingFlags(Vec<String>),
    #[error("{name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: DecodeError,
    },
    #[error("{name}: resolving value: {source}")]
    Resolve {
        name: String,
        #[source]
        source: BoxError,
    },
    #[error("{name}: {source}")]
    Hook {
        name: String,
        #[source]
        source: BoxError,
    },
}

/// Failure inside a [`Decoder`](crate::Decoder).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("expected {context} value but got `{token}`")]
    ExpectedValue { context: String, token: String },
    #[error("expected {expected} but got {value:?} ({reason})")]
    Invalid { expected: &'static str, value: String, reason: String },
    #[error("{value:?} must be one of {}", .allowed.join(","))]
    NotInEnum { value: String, allowed: Vec<String> },
    #[error("expected `key=value` but got {0:?}")]
    MapEntry(String),
    #[error("{0}")]
    Custom(String),
}

struct DidYouMean<'a>(&'a Option<String>);

impl fmt::Display for DidYouMean<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(it) => write!(f, ", did you mean {it:?}?"),
            None => Ok(()),
        }
    }
}

struct OneOf<'a>(&'a [String]);

impl fmt::Display for OneOf<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted = self.0.iter().map(|it| format!("{it:?}")).collect::<Vec<_>>();
        match quoted.as_slice() {
            [single] => f.write_str(single),
            _ => write!(f, "one of {}", quoted.join(", ")),
        }
    }
}
