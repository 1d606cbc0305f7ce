//! Declarative command descriptors.
//!
//! A command is described once, when it is built, as a tree of plain data:
//! verbs, their operands and flags, and help samples. Each verb carries the
//! closure that runs it, so dispatch never needs runtime introspection.
//!
//! ```ignore
//! let cmd = CommandDescriptor::new("net", "Network diagnostics")
//!     .verb(
//!         Verb::describe("ping", "Ping a host")
//!             .operand(Operand::new("host", "Host to ping", ValueType::String))
//!             .flag(Flag::new("verbose", "Print every reply").alias('v').optional())
//!             .sample("net ping --host 10.0.0.1", "Ping the router")
//!             .handle(|call, out| { /* ... */ Ok(()) }),
//!     );
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use helm_types::ConsoleSink;
use serde::Serialize;

use crate::error::RegistryError;
use crate::resolver::BoundCall;
use crate::value::ValueType;

/// Verb implementation.
pub type Handler = Arc<dyn Fn(&BoundCall, &mut dyn ConsoleSink) -> anyhow::Result<()> + Send + Sync>;

/// An object that can be added to a dispatcher.
///
/// Returning `None` from [`descriptor`](Command::descriptor) marks a type that
/// was never declared as a command; adding it fails with `NoDescriptorFound`.
pub trait Command: Send + Sync {
    fn descriptor(&self) -> Option<&CommandDescriptor>;
}

/// A required, typed argument of a verb.
#[derive(Debug, Clone, Serialize)]
pub struct Operand {
    pub name: String,
    pub help: String,
    /// Index among the verb's parameters (operands and flags together).
    pub position: usize,
    #[serde(rename = "type")]
    pub value_type: ValueType,
}

impl Operand {
    /// An operand named `name`. An empty name receives the line's unnamed default value.
    pub fn new(name: &str, help: &str, value_type: ValueType) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            help: help.to_string(),
            position: 0,
            value_type,
        }
    }
}

/// A named boolean argument of a verb.
#[derive(Debug, Clone, Serialize)]
pub struct Flag {
    pub name: String,
    pub alias: Option<char>,
    pub help: String,
    /// An optional flag that is absent binds `false` instead of failing the match.
    pub optional: bool,
    pub position: usize,
}

impl Flag {
    pub fn new(name: &str, help: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            alias: None,
            help: help.to_string(),
            optional: false,
            position: 0,
        }
    }

    pub fn alias(mut self, alias: char) -> Self {
        self.alias = Some(alias.to_ascii_lowercase());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Whether a lower-cased argument key names this flag.
    pub fn is_named(&self, key: &str) -> bool {
        self.name == key || self.alias.is_some_and(|a| key.len() == a.len_utf8() && key.starts_with(a))
    }
}

/// Example invocation shown in verb help.
#[derive(Debug, Clone, Serialize)]
pub struct Sample {
    pub invocation: String,
    pub description: String,
}

/// A named action of a command with one signature.
#[derive(Clone, Serialize)]
pub struct Verb {
    pub name: String,
    pub alias: Option<String>,
    pub help: String,
    /// Used when the line names no verb.
    pub is_default: bool,
    pub operands: Vec<Operand>,
    pub flags: Vec<Flag>,
    pub samples: Vec<Sample>,
    #[serde(skip)]
    pub handler: Handler,
}

impl Verb {
    /// Start describing a verb.
    pub fn describe(name: &str, help: &str) -> VerbBuilder {
        VerbBuilder {
            name: name.to_string(),
            alias: None,
            help: help.to_string(),
            is_default: false,
            operands: Vec::new(),
            flags: Vec::new(),
            samples: Vec::new(),
            next_position: 0,
        }
    }

    /// Total declared parameters.
    pub fn param_count(&self) -> usize {
        self.operands.len() + self.flags.len()
    }

    pub fn optional_flag_count(&self) -> usize {
        self.flags.iter().filter(|f| f.optional).count()
    }

    /// Case-insensitive match against the verb name or its alias.
    pub fn answers_to(&self, text: &str) -> bool {
        self.name.eq_ignore_ascii_case(text)
            || self
                .alias
                .as_deref()
                .is_some_and(|a| a.eq_ignore_ascii_case(text))
    }

    fn validate(&self) -> Result<(), RegistryError> {
        let mut seen = HashSet::new();
        let keys = self
            .operands
            .iter()
            .map(|o| o.name.clone())
            .chain(self.flags.iter().map(|f| f.name.clone()))
            .chain(self.flags.iter().filter_map(|f| f.alias.map(String::from)));
        for key in keys {
            if !seen.insert(key.clone()) {
                return Err(RegistryError::DuplicateParameter {
                    verb: self.name.clone(),
                    name: key,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verb")
            .field("name", &self.name)
            .field("alias", &self.alias)
            .field("is_default", &self.is_default)
            .field("operands", &self.operands)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// Builder returned by [`Verb::describe`]. Finished with [`handle`](VerbBuilder::handle).
#[derive(Debug, Clone)]
pub struct VerbBuilder {
    name: String,
    alias: Option<String>,
    help: String,
    is_default: bool,
    operands: Vec<Operand>,
    flags: Vec<Flag>,
    samples: Vec<Sample>,
    next_position: usize,
}

impl VerbBuilder {
    /// Short alternative name, e.g. `"1"` or `"st"`.
    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    /// Mark this verb as the command's default.
    pub fn default_verb(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Append an operand. Positions follow declaration order.
    pub fn operand(mut self, mut operand: Operand) -> Self {
        operand.position = self.next_position;
        self.next_position += 1;
        self.operands.push(operand);
        self
    }

    /// Append a flag. Positions follow declaration order.
    pub fn flag(mut self, mut flag: Flag) -> Self {
        flag.position = self.next_position;
        self.next_position += 1;
        self.flags.push(flag);
        self
    }

    pub fn sample(mut self, invocation: &str, description: &str) -> Self {
        self.samples.push(Sample {
            invocation: invocation.to_string(),
            description: description.to_string(),
        });
        self
    }

    /// Attach the implementation and finish the verb.
    pub fn handle<F>(self, handler: F) -> Verb
    where
        F: Fn(&BoundCall, &mut dyn ConsoleSink) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Verb {
            name: self.name,
            alias: self.alias,
            help: self.help,
            is_default: self.is_default,
            operands: self.operands,
            flags: self.flags,
            samples: self.samples,
            handler: Arc::new(handler),
        }
    }
}

/// Everything a dispatcher needs to know about one command.
#[derive(Debug, Clone, Serialize)]
pub struct CommandDescriptor {
    pub name: String,
    pub alias: Option<String>,
    pub help: String,
    pub verbs: Vec<Verb>,
}

impl CommandDescriptor {
    pub fn new(name: &str, help: &str) -> Self {
        Self {
            name: name.to_string(),
            alias: None,
            help: help.to_string(),
            verbs: Vec::new(),
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    /// Append a verb. Verbs sharing a name are overloads, tried in this order.
    pub fn verb(mut self, verb: Verb) -> Self {
        self.verbs.push(verb);
        self
    }

    /// Verbs marked as default, in declaration order.
    pub fn default_verbs(&self) -> impl Iterator<Item = (usize, &Verb)> {
        self.verbs.iter().enumerate().filter(|(_, v)| v.is_default)
    }

    /// Verbs answering to `text`, with their signature index.
    pub fn verbs_named<'a, 'b>(
        &'a self,
        text: &'b str,
    ) -> impl Iterator<Item = (usize, &'a Verb)> + use<'a, 'b> {
        self.verbs.iter().enumerate().filter(move |(_, v)| v.answers_to(text))
    }

    /// Distinct verb names in declaration order, each with its first overload.
    pub fn distinct_verbs(&self) -> Vec<&Verb> {
        let mut seen = HashSet::new();
        self.verbs
            .iter()
            .filter(|v| seen.insert(v.name.to_ascii_lowercase()))
            .collect()
    }

    /// Check that every verb's parameter names are unique.
    pub fn validate(&self) -> Result<(), RegistryError> {
        self.verbs.iter().try_for_each(Verb::validate)
    }
}

impl Command for CommandDescriptor {
    fn descriptor(&self) -> Option<&CommandDescriptor> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &BoundCall, _: &mut dyn ConsoleSink) -> anyhow::Result<()> {
        Ok(())
    }

    #[test]
    fn positions_follow_declaration_order() {
        let verb = Verb::describe("set", "Set a value")
            .operand(Operand::new("key", "Key", ValueType::String))
            .flag(Flag::new("force", "Overwrite"))
            .operand(Operand::new("value", "Value", ValueType::Int32))
            .handle(noop);
        assert_eq!(verb.operands[0].position, 0);
        assert_eq!(verb.flags[0].position, 1);
        assert_eq!(verb.operands[1].position, 2);
        assert_eq!(verb.param_count(), 3);
    }

    #[test]
    fn names_are_lowercased() {
        let op = Operand::new("HostName", "", ValueType::String);
        assert_eq!(op.name, "hostname");
        let flag = Flag::new("Verbose", "").alias('V');
        assert_eq!(flag.name, "verbose");
        assert!(flag.is_named("v"));
        assert!(flag.is_named("verbose"));
        assert!(!flag.is_named("ve"));
    }

    #[test]
    fn verb_answers_to_alias() {
        let verb = Verb::describe("status", "").alias("1").handle(noop);
        assert!(verb.answers_to("STATUS"));
        assert!(verb.answers_to("1"));
        assert!(!verb.answers_to("stat"));
    }

    #[test]
    fn optional_flags_are_counted() {
        let verb = Verb::describe("run", "")
            .flag(Flag::new("a", "").optional())
            .flag(Flag::new("b", ""))
            .flag(Flag::new("c", "").optional())
            .handle(noop);
        assert_eq!(verb.optional_flag_count(), 2);
    }

    #[test]
    fn duplicate_parameter_names_fail_validation() {
        let cmd = CommandDescriptor::new("x", "").verb(
            Verb::describe("v", "")
                .operand(Operand::new("name", "", ValueType::String))
                .flag(Flag::new("Name", ""))
                .handle(noop),
        );
        let err = cmd.validate().unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateParameter { ref name, .. } if name == "name"));
    }

    #[test]
    fn flag_alias_clashing_with_operand_fails_validation() {
        let cmd = CommandDescriptor::new("x", "").verb(
            Verb::describe("v", "")
                .operand(Operand::new("f", "", ValueType::String))
                .flag(Flag::new("force", "").alias('f'))
                .handle(noop),
        );
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn distinct_verbs_collapse_overloads() {
        let cmd = CommandDescriptor::new("x", "")
            .verb(Verb::describe("some", "first").handle(noop))
            .verb(Verb::describe("Some", "second").handle(noop))
            .verb(Verb::describe("other", "").handle(noop));
        let names: Vec<&str> = cmd.distinct_verbs().iter().map(|v| v.help.as_str()).collect();
        assert_eq!(names, vec!["first", ""]);
        assert_eq!(cmd.verbs_named("SOME").count(), 2);
    }

    #[test]
    fn verbs_named_outlive_the_query_text() {
        let cmd = CommandDescriptor::new("x", "")
            .verb(Verb::describe("some", "first").handle(noop))
            .verb(Verb::describe("some", "second").handle(noop));
        let found: Vec<&Verb> = {
            let text = String::from("SOME");
            cmd.verbs_named(&text).map(|(_, v)| v).collect()
        };
        let help: Vec<&str> = found.iter().map(|v| v.help.as_str()).collect();
        assert_eq!(help, vec!["first", "second"]);
    }

    #[test]
    fn descriptor_is_a_command() {
        let cmd = CommandDescriptor::new("x", "help");
        assert_eq!(cmd.descriptor().map(|d| d.name.as_str()), Some("x"));
    }

    #[test]
    fn serializes_without_handler() {
        let cmd = CommandDescriptor::new("x", "help").verb(
            Verb::describe("v", "do it")
                .operand(Operand::new("n", "count", ValueType::UInt32))
                .handle(noop),
        );
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["verbs"][0]["operands"][0]["type"], "u32");
        assert!(json["verbs"][0].get("handler").is_none());
    }
}
