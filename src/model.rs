use std::{collections::BTreeMap, fmt, ops, path::PathBuf, sync::Arc};

use crate::{
    decode::{DecodeContext, Decoder},
    resolve::{Env, Resolver},
    scanner::{Scanner, Token, TokenType},
    BoxError, DecodeError, ParseError,
};

/// A decoded value held in a [`Bindings`] slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    Path(PathBuf),
    List(Vec<Val>),
    Map(Vec<(String, Val)>),
}

impl Val {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Val::Bool(it) => Some(*it),
            _ => None,
        }
    }
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Val::Int(it) => Some(*it),
            _ => None,
        }
    }
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Val::Uint(it) => Some(*it),
            _ => None,
        }
    }
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Val::Float(it) => Some(*it),
            _ => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Val::Str(it) => Some(it),
            _ => None,
        }
    }
    pub fn as_path(&self) -> Option<&std::path::Path> {
        match self {
            Val::Path(it) => Some(it),
            _ => None,
        }
    }
    pub fn as_list(&self) -> Option<&[Val]> {
        match self {
            Val::List(it) => Some(it),
            _ => None,
        }
    }
    pub fn as_map(&self) -> Option<&[(String, Val)]> {
        match self {
            Val::Map(it) => Some(it),
            _ => None,
        }
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::Bool(it) => write!(f, "{it}"),
            Val::Int(it) => write!(f, "{it}"),
            Val::Uint(it) => write!(f, "{it}"),
            Val::Float(it) => write!(f, "{it}"),
            Val::Str(it) => f.write_str(it),
            Val::Path(it) => write!(f, "{}", it.display()),
            Val::List(items) => {
                let items = items.iter().map(Val::to_string).collect::<Vec<_>>();
                f.write_str(&items.join(","))
            }
            Val::Map(entries) => {
                let entries = entries.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>();
                f.write_str(&entries.join(";"))
            }
        }
    }
}

/// Opaque handle to a slot in [`Bindings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Target(pub(crate) usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub val: Val,
    /// Whether the value was supplied on the command line or by a resolver.
    /// Defaults don't count.
    pub set: bool,
}

impl Slot {
    pub(crate) fn new(val: Val) -> Slot {
        Slot { val, set: false }
    }
}

/// Storage the parser writes into.
///
/// This is the one place where parsing mutates shared state: every
/// [`Value`] of a grammar aliases exactly one slot here through its
/// [`Target`]. A scalar slot is overwritten by each occurrence of its flag,
/// list and map slots accumulate in encounter order.
#[derive(Debug, Clone, PartialEq)]
pub struct Bindings {
    slots: Vec<Slot>,
    keys: Arc<BTreeMap<String, Target>>,
}

impl Bindings {
    /// Value bound to the field at `key`, a dotted path of field identifiers
    /// such as `user.create.id`.
    pub fn get(&self, key: &str) -> Option<&Val> {
        self.keys.get(key).map(|&t| &self.slot(t).val)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Val> {
        let t = *self.keys.get(key)?;
        Some(&mut self.slot_mut(t).val)
    }

    pub fn is_set(&self, key: &str) -> bool {
        self.keys.get(key).map_or(false, |&t| self.slot(t).set)
    }

    pub fn slot(&self, target: Target) -> &Slot {
        &self.slots[target.0]
    }

    pub fn slot_mut(&mut self, target: Target) -> &mut Slot {
        &mut self.slots[target.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Slot)> + '_ {
        self.keys.iter().map(|(k, &t)| (k.as_str(), self.slot(t)))
    }
}

/// Lifecycle phases a hook can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    BeforeReset,
    BeforeResolve,
    BeforeApply,
    AfterApply,
}

pub type HookFn = Box<dyn Fn(&mut Bindings) -> Result<(), BoxError> + Send + Sync>;

#[derive(Default)]
pub struct Hooks(Vec<(HookKind, HookFn)>);

impl Hooks {
    pub(crate) fn push(&mut self, kind: HookKind, f: HookFn) {
        self.0.push((kind, f))
    }

    pub(crate) fn extend(&mut self, other: Hooks) {
        self.0.extend(other.0)
    }

    pub(crate) fn run(
        &self,
        kind: HookKind,
        bindings: &mut Bindings,
        name: impl Fn() -> String,
    ) -> Result<(), ParseError> {
        for (_, f) in self.0.iter().filter(|(k, _)| *k == kind) {
            f(bindings).map_err(|source| ParseError::Hook { name: name(), source })?;
        }
        Ok(())
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter().map(|(kind, _)| kind)).finish()
    }
}

/// A flag or a positional argument.
#[derive(Debug)]
pub struct Value {
    pub name: String,
    /// Dotted path of field identifiers, the key in [`Bindings`].
    pub key: String,
    pub help: Option<String>,
    /// Default, after interpolation.
    pub default: Option<String>,
    pub format: Option<String>,
    pub required: bool,
    /// Ordinal among the positionals of the owning node.
    pub position: usize,
    pub enum_values: Vec<String>,
    pub sep: Option<char>,
    pub map_sep: Option<char>,
    pub target: Target,
    pub(crate) flag: bool,
    pub(crate) decoder: Arc<dyn Decoder>,
    pub(crate) hooks: Hooks,
}

impl Value {
    pub fn is_flag(&self) -> bool {
        self.flag
    }

    pub fn is_bool(&self) -> bool {
        self.decoder.is_bool()
    }

    /// `--name` for flags, `<name>` for positionals.
    pub fn summary(&self) -> String {
        if self.flag {
            format!("--{}", self.name)
        } else {
            format!("<{}>", self.name)
        }
    }

    /// Zeroes the slot, then applies the default through the same decoder
    /// live input goes through. A default leaves the slot unset.
    pub fn reset(&self, slot: &mut Slot) -> Result<(), DecodeError> {
        slot.val = self.decoder.zero();
        slot.set = false;
        if let Some(default) = &self.default {
            let mut scan = Scanner::typed(TokenType::FlagValue, [default.as_str()]);
            self.decode(&mut scan, &mut slot.val)?;
        }
        Ok(())
    }

    /// Decodes the next value from `scan` into `slot` and marks it set.
    pub fn parse(&self, scan: &mut Scanner, slot: &mut Slot) -> Result<(), ParseError> {
        self.decode(scan, &mut slot.val)
            .map_err(|source| ParseError::Decode { name: self.summary(), source })?;
        slot.set = true;
        Ok(())
    }

    /// Like [`Value::parse`], but for a single literal that replaces whatever
    /// the slot held.
    pub(crate) fn apply_literal(&self, literal: &str, slot: &mut Slot) -> Result<(), ParseError> {
        slot.val = self.decoder.zero();
        let mut scan = Scanner::from_tokens([Token::new(TokenType::FlagValue, literal)]);
        self.parse(&mut scan, slot)
    }

    fn decode(&self, scan: &mut Scanner, val: &mut Val) -> Result<(), DecodeError> {
        let mut ctx = DecodeContext { scan, value: self };
        self.decoder.decode(&mut ctx, val)?;
        self.check_enum(val)
    }

    fn check_enum(&self, val: &Val) -> Result<(), DecodeError> {
        if self.enum_values.is_empty() {
            return Ok(());
        }
        let check = |val: &Val| {
            let value = val.to_string();
            if self.enum_values.contains(&value) {
                Ok(())
            } else {
                Err(DecodeError::NotInEnum { value, allowed: self.enum_values.clone() })
            }
        };
        match val {
            Val::List(items) => items.iter().try_for_each(check),
            Val::Map(entries) => entries.iter().try_for_each(|(_, v)| check(v)),
            _ => check(val),
        }
    }
}

/// A [`Value`] matched by `--name` or `-s` rather than by position.
#[derive(Debug)]
pub struct Flag {
    pub value: Value,
    pub short: Option<char>,
    pub placeholder: String,
    pub envs: Vec<String>,
    pub aliases: Vec<String>,
    pub hidden: bool,
    pub negatable: bool,
}

impl Flag {
    /// Returns `Some(negated)` if `token` names this flag.
    pub(crate) fn matches(&self, token: &Token) -> Option<bool> {
        match token.ty {
            TokenType::LongFlag => {
                if token.value == self.name || self.aliases.contains(&token.value) {
                    return Some(false);
                }
                let negated = self.negatable
                    && token.value.strip_prefix("no-").map_or(false, |it| it == self.name);
                negated.then_some(true)
            }
            TokenType::ShortFlag => {
                let mut chars = token.value.chars();
                let c = chars.next();
                (chars.next().is_none() && c.is_some() && c == self.short).then_some(false)
            }
            _ => None,
        }
    }

    /// Every spelling this flag answers to.
    pub(crate) fn spellings(&self) -> Vec<String> {
        let mut res = vec![format!("--{}", self.name)];
        res.extend(self.short.map(|it| format!("-{it}")));
        if self.negatable {
            res.push(format!("--no-{}", self.name));
        }
        res.extend(self.aliases.iter().map(|it| format!("--{it}")));
        res
    }
}

impl ops::Deref for Flag {
    type Target = Value;

    fn deref(&self) -> &Value {
        &self.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    App,
    Command,
    /// A positional that, once consumed, exposes its own subcommands.
    Argument,
}

#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub name: String,
    pub key: String,
    pub help: Option<String>,
    pub parent: Option<NodeId>,
    pub flags: Vec<Flag>,
    pub positional: Vec<Value>,
    pub children: Vec<NodeId>,
    /// The promoted positional of a branching argument.
    pub argument: Option<Value>,
    pub aliases: Vec<String>,
    pub hidden: bool,
    /// Boolean slot, `true` once the node is selected.
    pub target: Target,
    pub(crate) hooks: Hooks,
}

impl Node {
    /// `name` for commands, `<name>` for branching arguments.
    pub fn summary(&self) -> String {
        match self.kind {
            NodeKind::Argument => format!("<{}>", self.name),
            NodeKind::App | NodeKind::Command => self.name.clone(),
        }
    }

    /// Every value owned by this node: the promoted argument, positionals,
    /// then flags.
    pub fn values(&self) -> impl Iterator<Item = &Value> + '_ {
        self.argument.iter().chain(&self.positional).chain(self.flags.iter().map(|it| &it.value))
    }
}

/// The built command graph. Immutable once built, it can drive any number
/// of parses.
#[derive(Debug)]
pub struct Grammar {
    pub(crate) nodes: Vec<Node>,
    pub(crate) keys: Arc<BTreeMap<String, Target>>,
    pub(crate) resolvers: Vec<Box<dyn Resolver>>,
    pub(crate) env: Env,
}

impl Grammar {
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    /// Fresh storage for one parse.
    pub fn bindings(&self) -> Bindings {
        let mut slots = vec![Slot::new(Val::Bool(false)); self.keys.len()];
        for node in &self.nodes {
            for value in node.values() {
                slots[value.target.0] = Slot::new(value.decoder.zero());
            }
        }
        Bindings { slots, keys: Arc::clone(&self.keys) }
    }
}
