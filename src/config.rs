use crate::{
    decode::{Decoder, Registry},
    interpolate::Vars,
    resolve::{Env, Resolver},
};

/// Settings for building a [`Grammar`](crate::Grammar) and for every parse
/// it drives.
#[derive(Debug)]
pub struct Config {
    pub(crate) name: String,
    pub(crate) help: Option<String>,
    pub(crate) separator: char,
    pub(crate) vars: Vars,
    pub(crate) registry: Registry,
    pub(crate) resolvers: Vec<Box<dyn Resolver>>,
    pub(crate) env: Env,
}

impl Config {
    pub fn new(name: impl Into<String>) -> Config {
        Config {
            name: name.into(),
            help: None,
            separator: '-',
            vars: Vars::new(),
            registry: Registry::new(),
            resolvers: Vec::new(),
            env: Env::process(),
        }
    }

    pub fn help(mut self, help: impl Into<String>) -> Config {
        self.help = Some(help.into());
        self
    }

    /// Joins the words of derived names, `-` by default.
    pub fn separator(mut self, sep: char) -> Config {
        self.separator = sep;
        self
    }

    /// Defines `${name}` for help, default and enum strings.
    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Config {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn decoder(mut self, name: impl Into<String>, decoder: impl Decoder + 'static) -> Config {
        self.registry.register(name, decoder);
        self
    }

    pub fn registry(mut self, registry: Registry) -> Config {
        self.registry = registry;
        self
    }

    /// Resolvers are consulted in registration order, the first hit wins.
    /// `env` tags take precedence over all of them.
    pub fn resolver(mut self, resolver: impl Resolver + 'static) -> Config {
        self.resolvers.push(Box::new(resolver));
        self
    }

    pub fn env(mut self, env: Env) -> Config {
        self.env = env;
        self
    }
}
