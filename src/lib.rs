//! `xcmd` builds a command line grammar out of a declarative field tree and
//! parses arguments against it.
//!
//! ```
//! let schema = xcmd::schema! {
//!     /// Be chatty.
//!     verbose: bool "short=v"
//!     user "cmd" {
//!         create "cmd" {
//!             id: int "arg"
//!             first: string "arg"
//!             last: string "arg"
//!         }
//!     }
//! };
//!
//! let grammar = xcmd::Grammar::build(schema, xcmd::Config::new("app")).unwrap();
//! let mut bindings = grammar.bindings();
//! let ctx = grammar.parse(["user", "create", "10", "Alec", "Thomas"], &mut bindings).unwrap();
//!
//! assert_eq!(ctx.command(), "user create <id> <first> <last>");
//! assert_eq!(bindings.get("user.create.id"), Some(&xcmd::Val::Int(10)));
//! ```
//!
//! Building is fallible: a schema with conflicting flags, misordered
//! positionals or a malformed tag never turns into a [`Grammar`]. Once built,
//! a grammar is immutable and can drive any number of parses, each writing
//! into its own [`Bindings`].

mod build;
mod config;
mod context;
mod decode;
mod error;
mod interpolate;
mod model;
mod resolve;
mod scanner;
mod schema;
mod tag;

pub use xcmd_macros::schema;

pub use crate::{
    config::Config,
    context::{Context, Match, Trace},
    decode::{from_str, split_escaped, DecodeContext, Decoder, Registry},
    error::{BoxError, BuildError, BuildErrorKind, DecodeError, Error, ParseError},
    interpolate::{interpolate, InterpolateError, Vars},
    model::{
        Bindings, Flag, Grammar, HookFn, HookKind, Node, NodeId, NodeKind, Slot, Target, Val,
        Value,
    },
    resolve::{Env, Resolver},
    scanner::{Scanner, Token, TokenType},
    schema::{name_from_ident, Field, Schema, Type},
    tag::{parse_items, Tag, TagError, TagItems},
};

pub type Result<T, E = Error> = std::result::Result<T, E>;
