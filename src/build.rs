use std::{
    collections::{btree_map::Entry, BTreeMap, HashSet},
    sync::Arc,
};

use crate::{
    config::Config,
    interpolate::{interpolate, Vars},
    model::{Flag, Grammar, Hooks, Node, NodeId, NodeKind, Slot, Target, Value},
    schema::{name_from_ident, Field, FieldKind, Schema, Type},
    tag::Tag,
    BuildError, BuildErrorKind,
};

impl Grammar {
    /// Builds the command graph for `schema`.
    ///
    /// Every structural problem is reported here, before any parsing.
    pub fn build(schema: Schema, config: Config) -> Result<Grammar, BuildError> {
        let (nodes, keys) = {
            let mut b = Builder {
                config: &config,
                nodes: Vec::new(),
                keys: BTreeMap::new(),
                seen: HashSet::new(),
            };
            let root = Pending {
                kind: NodeKind::App,
                ident: config.name.clone(),
                name: config.name.clone(),
                key: String::new(),
                help: b.interpolate_help(config.help.as_deref(), &config.name, &config.name)?,
                aliases: Vec::new(),
                hidden: false,
                hooks: Hooks::default(),
                schema,
            };
            b.node(root, None)?;
            (b.nodes, b.keys)
        };
        tracing::debug!(
            name = %config.name,
            nodes = nodes.len(),
            slots = keys.len(),
            "built grammar"
        );
        Ok(Grammar { nodes, keys: Arc::new(keys), resolvers: config.resolvers, env: config.env })
    }
}

/// A command or branching argument whose fields are yet to be built.
struct Pending {
    kind: NodeKind,
    ident: String,
    name: String,
    key: String,
    help: Option<String>,
    aliases: Vec<String>,
    hidden: bool,
    hooks: Hooks,
    schema: Schema,
}

/// What the fields of one node (embedded groups included) add up to.
#[derive(Default)]
struct Acc {
    flags: Vec<Flag>,
    positional: Vec<Value>,
    groups: Vec<Pending>,
    hooks: Hooks,
    /// Flag spellings this node added to the active path.
    seen: Vec<String>,
}

struct Builder<'a> {
    config: &'a Config,
    nodes: Vec<Node>,
    keys: BTreeMap<String, Target>,
    /// Flag spellings on the path from the root to the node being built.
    seen: HashSet<String>,
}

fn err(container: &str, field: &str, kind: impl Into<BuildErrorKind>) -> BuildError {
    BuildError { container: container.to_string(), field: field.to_string(), kind: kind.into() }
}

impl Builder<'_> {
    fn node(&mut self, pending: Pending, parent: Option<NodeId>) -> Result<NodeId, BuildError> {
        let Pending { kind, ident, name, key, help, aliases, hidden, hooks, schema } = pending;
        let container = match kind {
            NodeKind::App => format!("application `{name}`"),
            NodeKind::Command => format!("command `{name}`"),
            NodeKind::Argument => format!("argument `{name}`"),
        };

        let id = NodeId(self.nodes.len());
        let target = self.target(key.clone(), &container, &ident)?;
        self.nodes.push(Node {
            kind,
            name: name.clone(),
            key: key.clone(),
            help,
            parent,
            flags: Vec::new(),
            positional: Vec::new(),
            children: Vec::new(),
            argument: None,
            aliases,
            hidden,
            target,
            hooks,
        });

        // Terminal fields first, so that every flag of this node is on the
        // active path while the children are built.
        let mut acc = Acc::default();
        self.fields(&container, &key, "", schema.fields, &mut acc)?;
        let mut children = Vec::new();
        for group in std::mem::take(&mut acc.groups) {
            children.push(self.node(group, Some(id))?);
        }
        for spelling in &acc.seen {
            self.seen.remove(spelling);
        }

        let mut positional = acc.positional;
        let mut argument = None;
        if kind == NodeKind::Argument {
            if positional.is_empty() {
                return Err(err(&container, &ident, BuildErrorKind::BranchWithoutPositional));
            }
            let arg = positional.remove(0);
            if arg.name != name {
                let kind = BuildErrorKind::BranchNameMismatch { expected: name, actual: arg.name };
                return Err(err(&container, &ident, kind));
            }
            argument = Some(arg);
        }

        let mut seen_optional = false;
        for (i, value) in positional.iter_mut().enumerate() {
            value.position = i;
            if !value.required {
                seen_optional = true;
            } else if seen_optional {
                let kind = BuildErrorKind::RequiredAfterOptional(value.name.clone());
                return Err(err(&container, field_ident(&value.key), kind));
            }
        }
        if !positional.is_empty() && !children.is_empty() {
            return Err(err(&container, &ident, BuildErrorKind::PositionalsAndChildren));
        }

        let node = &mut self.nodes[id.0];
        node.flags = acc.flags;
        node.positional = positional;
        node.children = children;
        node.argument = argument;
        node.hooks.extend(acc.hooks);
        Ok(id)
    }

    fn fields(
        &mut self,
        container: &str,
        key_prefix: &str,
        name_prefix: &str,
        fields: Vec<Field>,
        acc: &mut Acc,
    ) -> Result<(), BuildError> {
        for field in fields {
            let Field { ident, kind, tag, help, hooks } = field;
            let tag = Tag::parse(&tag).map_err(|e| err(container, &ident, e))?;
            if tag.cmd && tag.arg {
                return Err(err(container, &ident, BuildErrorKind::Exclusive("cmd", "arg")));
            }
            if tag.required && tag.optional {
                let kind = BuildErrorKind::Exclusive("required", "optional");
                return Err(err(container, &ident, kind));
            }
            let key = if key_prefix.is_empty() {
                ident.clone()
            } else {
                format!("{key_prefix}.{ident}")
            };
            let name =
                tag.name.clone().unwrap_or_else(|| name_from_ident(&ident, self.config.separator));

            match kind {
                FieldKind::Group(schema) if tag.cmd || tag.arg => {
                    let help = self.interpolate_help(
                        tag.help.as_deref().or(help.as_deref()),
                        container,
                        &ident,
                    )?;
                    acc.groups.push(Pending {
                        kind: if tag.cmd { NodeKind::Command } else { NodeKind::Argument },
                        ident,
                        name,
                        key,
                        help,
                        aliases: tag.aliases,
                        hidden: tag.hidden,
                        hooks,
                        schema,
                    });
                }
                FieldKind::Group(schema) if tag.embed => {
                    acc.hooks.extend(hooks);
                    let prefix = format!("{name_prefix}{}", tag.prefix.as_deref().unwrap_or(""));
                    self.fields(container, &key, &prefix, schema.fields, acc)?;
                }
                FieldKind::Group(_) => {
                    return Err(err(container, &ident, BuildErrorKind::UntaggedGroup));
                }
                FieldKind::Value(_) if tag.cmd => {
                    return Err(err(container, &ident, BuildErrorKind::NotAGroup("cmd")));
                }
                FieldKind::Value(_) if tag.embed => {
                    return Err(err(container, &ident, BuildErrorKind::NotAGroup("embed")));
                }
                FieldKind::Value(ty) if tag.arg => {
                    let value =
                        self.value(container, &ident, key, name, &tag, &ty, help, hooks, false)?;
                    acc.positional.push(value);
                }
                FieldKind::Value(ty) => {
                    let name = format!("{name_prefix}{name}");
                    let value =
                        self.value(container, &ident, key, name, &tag, &ty, help, hooks, true)?;
                    let flag = Flag {
                        placeholder: tag
                            .placeholder
                            .clone()
                            .unwrap_or_else(|| value.name.replace('-', "_").to_uppercase()),
                        value,
                        short: tag.short,
                        envs: tag.envs,
                        aliases: tag.aliases,
                        hidden: tag.hidden,
                        negatable: tag.negatable,
                    };
                    for spelling in flag.spellings() {
                        if !self.seen.insert(spelling.clone()) {
                            let kind = BuildErrorKind::DuplicateFlag(spelling);
                            return Err(err(container, &ident, kind));
                        }
                        acc.seen.push(spelling);
                    }
                    acc.flags.push(flag);
                }
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn value(
        &mut self,
        container: &str,
        ident: &str,
        key: String,
        name: String,
        tag: &Tag,
        ty: &Type,
        help: Option<String>,
        hooks: Hooks,
        flag: bool,
    ) -> Result<Value, BuildError> {
        let fail = |kind: BuildErrorKind| err(container, ident, kind);

        let decoder = self.config.registry.resolve(tag.ty.as_deref(), ty).ok_or_else(|| {
            let name = tag.ty.clone().unwrap_or_else(|| describe(ty));
            fail(BuildErrorKind::UnknownType(name))
        })?;
        if tag.negatable && !(flag && decoder.is_bool()) {
            return Err(fail(BuildErrorKind::NegatableNotBool));
        }

        let vars = &self.config.vars;
        let default = match &tag.default {
            Some(it) => Some(interpolate(it, &[vars]).map_err(|e| fail(e.into()))?),
            None => None,
        };
        let mut enum_values = Vec::new();
        for it in &tag.enum_values {
            let it = interpolate(it, &[vars]).map_err(|e| fail(e.into()))?;
            enum_values.extend(
                it.split(',').map(str::trim).filter(|it| !it.is_empty()).map(String::from),
            );
        }
        let required = if flag {
            tag.required
        } else {
            tag.required || !(tag.optional || default.is_some())
        };
        if !enum_values.is_empty() && !required && default.is_none() {
            return Err(fail(BuildErrorKind::EnumWithoutDefault));
        }

        let mut local = Vars::new();
        local.insert("default".to_string(), default.clone().unwrap_or_default());
        local.insert("enum".to_string(), enum_values.join(","));
        local.insert("env".to_string(), tag.envs.first().cloned().unwrap_or_default());
        let help = match tag.help.as_ref().or(help.as_ref()) {
            Some(it) => Some(interpolate(it, &[vars, &local]).map_err(|e| fail(e.into()))?),
            None => None,
        };

        let target = self.target(key.clone(), container, ident)?;
        let value = Value {
            name,
            key,
            help,
            default,
            format: tag.format.clone(),
            required,
            position: 0,
            enum_values,
            sep: tag.sep,
            map_sep: tag.map_sep,
            target,
            flag,
            decoder,
            hooks,
        };
        let mut scratch = Slot::new(value.decoder.zero());
        value.reset(&mut scratch).map_err(|e| fail(BuildErrorKind::Default(e)))?;
        Ok(value)
    }

    fn interpolate_help(
        &self,
        help: Option<&str>,
        container: &str,
        ident: &str,
    ) -> Result<Option<String>, BuildError> {
        help.map(|it| interpolate(it, &[&self.config.vars]))
            .transpose()
            .map_err(|e| err(container, ident, e))
    }

    fn target(&mut self, key: String, container: &str, ident: &str) -> Result<Target, BuildError> {
        let target = Target(self.keys.len());
        match self.keys.entry(key) {
            Entry::Vacant(it) => {
                it.insert(target);
                Ok(target)
            }
            Entry::Occupied(_) => Err(err(container, ident, BuildErrorKind::DuplicateField)),
        }
    }
}

fn field_ident(key: &str) -> &str {
    key.rsplit('.').next().unwrap_or(key)
}

fn describe(ty: &Type) -> String {
    match ty {
        Type::Bool => "bool".to_string(),
        Type::Int => "int".to_string(),
        Type::Uint => "uint".to_string(),
        Type::Float => "float".to_string(),
        Type::String => "string".to_string(),
        Type::Path => "path".to_string(),
        Type::Named(name) => name.clone(),
        Type::List(elem) => format!("[{}]", describe(elem)),
        Type::Map(elem) => format!("map[{}]", describe(elem)),
    }
}
