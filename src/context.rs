use std::collections::HashSet;

use crate::{
    model::{Bindings, Flag, Grammar, HookKind, Node, NodeId, NodeKind, Target, Val, Value},
    resolve::Resolver,
    scanner::{Scanner, Token, TokenType},
    ParseError,
};

/// One matched grammar element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trace {
    App(NodeId),
    Command(NodeId),
    /// A branching argument, its promoted positional was consumed.
    Argument(NodeId),
    Positional { node: NodeId, index: usize },
    Flag { node: NodeId, index: usize },
}

/// A [`Trace`] entry resolved against its grammar.
#[derive(Debug, Clone, Copy)]
pub enum Match<'g> {
    App(&'g Node),
    Command(&'g Node),
    Argument(&'g Node),
    Positional(&'g Value),
    Flag(&'g Flag),
}

/// State of a single parse.
///
/// A context is cheap and meant to be thrown away; the grammar it borrows
/// holds no per-parse state, so any number of contexts can be run against it
/// one after another.
#[derive(Debug)]
pub struct Context<'g> {
    grammar: &'g Grammar,
    scan: Scanner,
    path: Vec<Trace>,
    /// Flags matchable at the current depth, inherited from all ancestors.
    flags: Vec<(NodeId, usize)>,
    /// Slots written from the command line during this parse.
    touched: HashSet<Target>,
}

impl Grammar {
    /// Parses `args` into `bindings`.
    ///
    /// On failure, values decoded before the offending token stay applied.
    /// Use [`Context::run`] directly to inspect the partial trace.
    pub fn parse<I, S>(&self, args: I, bindings: &mut Bindings) -> Result<Context<'_>, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ctx = Context::new(self, args);
        ctx.run(bindings)?;
        Ok(ctx)
    }

    pub fn parse_env(&self, bindings: &mut Bindings) -> Result<Context<'_>, ParseError> {
        self.parse(std::env::args().skip(1), bindings)
    }
}

impl<'g> Context<'g> {
    pub fn new<I, S>(grammar: &'g Grammar, args: I) -> Context<'g>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Context {
            grammar,
            scan: Scanner::new(args),
            path: Vec::new(),
            flags: Vec::new(),
            touched: HashSet::new(),
        }
    }

    pub fn run(&mut self, bindings: &mut Bindings) -> Result<(), ParseError> {
        self.reset(bindings)?;
        self.resolve(bindings)?;

        let root = self.grammar.root();
        select(self.grammar.node(root), bindings);
        self.path.push(Trace::App(root));
        self.trace(root, bindings)?;

        self.apply(HookKind::BeforeApply, bindings)?;
        self.apply(HookKind::AfterApply, bindings)
    }

    /// Everything matched so far, in order.
    pub fn path(&self) -> &[Trace] {
        &self.path
    }

    pub fn matches(&self) -> Vec<Match<'g>> {
        self.path.iter().map(|&it| self.lookup(it)).collect()
    }

    /// The selected commands and arguments, e.g. `user create <id> <first>`.
    pub fn command(&self) -> String {
        let words = self.matches().into_iter().filter_map(|it| match it {
            Match::Command(node) | Match::Argument(node) => Some(node.summary()),
            Match::Positional(value) => Some(value.summary()),
            Match::App(_) | Match::Flag(_) => None,
        });
        words.collect::<Vec<_>>().join(" ")
    }

    /// The deepest selected node.
    pub fn selected(&self) -> &'g Node {
        let id = self.path.iter().rev().find_map(|it| match *it {
            Trace::App(id) | Trace::Command(id) | Trace::Argument(id) => Some(id),
            Trace::Positional { .. } | Trace::Flag { .. } => None,
        });
        self.grammar.node(id.unwrap_or_else(|| self.grammar.root()))
    }

    /// Flags matchable at the point the parse stopped.
    pub fn flags(&self) -> Vec<&'g Flag> {
        self.flags.iter().map(|&(node, index)| &self.grammar.node(node).flags[index]).collect()
    }

    fn lookup(&self, trace: Trace) -> Match<'g> {
        let g = self.grammar;
        match trace {
            Trace::App(id) => Match::App(g.node(id)),
            Trace::Command(id) => Match::Command(g.node(id)),
            Trace::Argument(id) => Match::Argument(g.node(id)),
            Trace::Positional { node, index } => Match::Positional(&g.node(node).positional[index]),
            Trace::Flag { node, index } => Match::Flag(&g.node(node).flags[index]),
        }
    }

    fn reset(&self, bindings: &mut Bindings) -> Result<(), ParseError> {
        self.run_all(HookKind::BeforeReset, bindings)?;
        for (_, node) in self.grammar.nodes() {
            let slot = bindings.slot_mut(node.target);
            slot.val = Val::Bool(false);
            slot.set = false;
            for value in node.values() {
                value
                    .reset(bindings.slot_mut(value.target))
                    .map_err(|source| ParseError::Decode { name: value.summary(), source })?;
            }
        }
        Ok(())
    }

    /// Values from resolvers, before any token is scanned. The `env` tag
    /// outranks config resolvers.
    fn resolve(&self, bindings: &mut Bindings) -> Result<(), ParseError> {
        self.run_all(HookKind::BeforeResolve, bindings)?;
        let g = self.grammar;
        for (_, node) in g.nodes() {
            for flag in &node.flags {
                let mut resolved = g
                    .env
                    .resolve(flag)
                    .map_err(|source| ParseError::Resolve { name: flag.summary(), source })?;
                for resolver in &g.resolvers {
                    if resolved.is_some() {
                        break;
                    }
                    resolved = resolver
                        .resolve(flag)
                        .map_err(|source| ParseError::Resolve { name: flag.summary(), source })?;
                }
                if let Some(literal) = resolved {
                    tracing::debug!(flag = %flag.summary(), "resolved");
                    flag.apply_literal(&literal, bindings.slot_mut(flag.target))?;
                }
            }
        }
        Ok(())
    }

    fn trace(&mut self, id: NodeId, bindings: &mut Bindings) -> Result<(), ParseError> {
        let g = self.grammar;
        let node = g.node(id);
        self.flags.extend((0..node.flags.len()).map(|index| (id, index)));

        let mut positional = 0;
        loop {
            let token = self.scan.peek();
            tracing::trace!(node = %node.name, token = ?token, "dispatch");
            match token.ty {
                TokenType::EndOfInput => break,
                TokenType::Untyped => {
                    self.scan.pop();
                    self.split(token.value);
                }
                TokenType::ShortFlagTail => {
                    self.scan.pop();
                    let mut chars = token.value.chars();
                    if let Some(first) = chars.next() {
                        let rest = chars.as_str();
                        if !rest.is_empty() {
                            self.scan.push_typed(rest, TokenType::ShortFlagTail);
                        }
                        self.scan.push_typed(first.to_string(), TokenType::ShortFlag);
                    }
                }
                TokenType::LongFlag | TokenType::ShortFlag => {
                    self.scan.pop();
                    self.flag(&token, bindings)?;
                }
                TokenType::FlagValue => {
                    return Err(ParseError::UnexpectedFlagArgument(token.value));
                }
                TokenType::Positional => {
                    if let Some(value) = node.positional.get(positional) {
                        self.decode(value, bindings)?;
                        self.path.push(Trace::Positional { node: id, index: positional });
                        positional += 1;
                        continue;
                    }
                    if let Some(child) = self.branch(node, &token, bindings) {
                        return self.trace(child, bindings);
                    }
                    return Err(ParseError::UnexpectedPositional(token.value));
                }
            }
        }
        self.finish(node, positional, bindings)
    }

    /// Refines an untyped token and pushes the pieces back.
    fn split(&mut self, arg: String) {
        if arg == "--" {
            self.scan.retype_remaining(TokenType::Positional);
        } else if let Some(long) = arg.strip_prefix("--") {
            match long.split_once('=') {
                Some((name, value)) => {
                    self.scan.push_typed(value, TokenType::FlagValue);
                    self.scan.push_typed(name, TokenType::LongFlag);
                }
                None => self.scan.push_typed(long, TokenType::LongFlag),
            }
        } else if arg.len() > 1 && arg.starts_with('-') {
            let mut chars = arg[1..].chars();
            if let Some(first) = chars.next() {
                let tail = chars.as_str();
                if !tail.is_empty() {
                    self.scan.push_typed(tail, TokenType::ShortFlagTail);
                }
                self.scan.push_typed(first.to_string(), TokenType::ShortFlag);
            }
        } else {
            self.scan.push_typed(arg, TokenType::Positional);
        }
    }

    fn flag(&mut self, token: &Token, bindings: &mut Bindings) -> Result<(), ParseError> {
        let g = self.grammar;
        let found = self.flags.iter().find_map(|&(node, index)| {
            let flag = &g.node(node).flags[index];
            flag.matches(token).map(|negated| (node, index, negated))
        });
        let Some((node, index, negated)) = found else {
            let flag = token.to_string();
            let suggestion = match token.ty {
                TokenType::LongFlag => self.suggest(&flag),
                _ => None,
            };
            return Err(ParseError::UnknownFlag { flag, suggestion });
        };

        let flag = &g.node(node).flags[index];
        self.decode(flag, bindings)?;
        if negated {
            if let Val::Bool(it) = &mut bindings.slot_mut(flag.target).val {
                *it = !*it;
            }
        }
        self.path.push(Trace::Flag { node, index });
        Ok(())
    }

    /// Decodes the next command line value into `value`'s slot. The first
    /// occurrence replaces whatever a default or a resolver put there.
    fn decode(&mut self, value: &Value, bindings: &mut Bindings) -> Result<(), ParseError> {
        let slot = bindings.slot_mut(value.target);
        if self.touched.insert(value.target) {
            slot.val = value.decoder.zero();
        }
        value.parse(&mut self.scan, slot)
    }

    /// Picks the child a positional token leads to, in declaration order.
    ///
    /// A branching argument is tried by decoding its promoted positional; on
    /// failure the scanner and the slot are restored and the next child is
    /// tried.
    fn branch(&mut self, node: &Node, token: &Token, bindings: &mut Bindings) -> Option<NodeId> {
        let g = self.grammar;
        for &child_id in &node.children {
            let child = g.node(child_id);
            match child.kind {
                NodeKind::Command => {
                    if child.name == token.value || child.aliases.contains(&token.value) {
                        self.scan.pop();
                        select(child, bindings);
                        self.path.push(Trace::Command(child_id));
                        return Some(child_id);
                    }
                }
                NodeKind::Argument => {
                    let Some(arg) = &child.argument else { continue };
                    let scan = self.scan.clone();
                    let slot = bindings.slot(arg.target).clone();
                    match self.decode(arg, bindings) {
                        Ok(()) => {
                            select(child, bindings);
                            self.path.push(Trace::Argument(child_id));
                            return Some(child_id);
                        }
                        Err(err) => {
                            tracing::debug!(argument = %child.name, %err, "backtracking");
                            self.scan = scan;
                            self.touched.remove(&arg.target);
                            *bindings.slot_mut(arg.target) = slot;
                        }
                    }
                }
                NodeKind::App => (),
            }
        }
        None
    }

    fn finish(
        &self,
        node: &Node,
        positional: usize,
        bindings: &Bindings,
    ) -> Result<(), ParseError> {
        let missing = node.positional[positional..]
            .iter()
            .filter(|it| it.required)
            .map(Value::summary)
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(ParseError::MissingPositionals(missing));
        }

        if !node.children.is_empty() {
            if positional == 0 {
                let expected = node
                    .children
                    .iter()
                    .map(|&id| self.grammar.node(id))
                    .filter(|child| match child.kind {
                        NodeKind::Argument => {
                            child.argument.as_ref().map_or(false, |it| it.required)
                        }
                        NodeKind::App | NodeKind::Command => !child.hidden,
                    })
                    .map(Node::summary)
                    .collect::<Vec<_>>();
                if !expected.is_empty() {
                    return Err(ParseError::ExpectedOneOf(expected));
                }
            }
            return Ok(());
        }

        let missing = self
            .flags()
            .into_iter()
            .filter(|it| it.required && !bindings.slot(it.target).set)
            .map(|it| it.summary())
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(ParseError::MissingFlags(missing));
        }
        Ok(())
    }

    fn suggest(&self, flag: &str) -> Option<String> {
        self.flags()
            .into_iter()
            .flat_map(|it| it.spellings())
            .filter(|it| it.starts_with("--"))
            .map(|candidate| (edit_distance(flag, &candidate), candidate))
            .filter(|(d, _)| *d <= 2)
            .min_by_key(|(d, _)| *d)
            .map(|(_, candidate)| candidate)
    }

    /// Runs `kind` hooks of every node and value in the grammar.
    fn run_all(&self, kind: HookKind, bindings: &mut Bindings) -> Result<(), ParseError> {
        for (_, node) in self.grammar.nodes() {
            node.hooks.run(kind, bindings, || node.summary())?;
            for value in node.values() {
                value.hooks.run(kind, bindings, || value.summary())?;
            }
        }
        Ok(())
    }

    /// Runs `kind` hooks of the matched elements, in trace order.
    fn apply(&self, kind: HookKind, bindings: &mut Bindings) -> Result<(), ParseError> {
        for m in self.matches() {
            match m {
                Match::App(node) | Match::Command(node) => {
                    node.hooks.run(kind, bindings, || node.summary())?
                }
                Match::Argument(node) => {
                    node.hooks.run(kind, bindings, || node.summary())?;
                    if let Some(arg) = &node.argument {
                        arg.hooks.run(kind, bindings, || arg.summary())?;
                    }
                }
                Match::Positional(value) => value.hooks.run(kind, bindings, || value.summary())?,
                Match::Flag(flag) => flag.hooks.run(kind, bindings, || flag.summary())?,
            }
        }
        Ok(())
    }
}

fn select(node: &Node, bindings: &mut Bindings) {
    let slot = bindings.slot_mut(node.target);
    slot.val = Val::Bool(true);
    slot.set = true;
}

fn edit_distance(a: &str, b: &str) -> usize {
    let b = b.chars().collect::<Vec<_>>();
    let mut prev = (0..=b.len()).collect::<Vec<_>>();
    for (i, ca) in a.chars().enumerate() {
        let mut curr = vec![i + 1; b.len() + 1];
        for (j, &cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        prev = curr;
    }
    prev[b.len()]
}
