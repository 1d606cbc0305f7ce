//! Dispatchers and the registry that routes console lines to them.
//!
//! A [`Registry`] is created by the host at startup and handed to each
//! console transport. Mutation needs `&mut`, dispatch only `&`, so
//! registration can never interleave with a running command.

use std::fmt;
use std::sync::Arc;

use helm_types::{AccessLevel, ConsoleSink};

use crate::describe::{CommandSummary, DispatcherSummary};
use crate::descriptor::{Command, Verb};
use crate::error::{CommandException, DispatchError, RegistryError};
use crate::help::{self, CommandEntry, HelpFormatter};
use crate::invoker::invoke;
use crate::resolver::{Resolved, resolve};
use crate::tokenizer::{Tokenized, tokenize};

/// Dispatcher names must be shorter than this many characters.
pub const MAX_NAME_LEN: usize = 23;

/// Dispatcher help longer than this is truncated and gets `...` appended.
pub const MAX_HELP_LEN: usize = 76;

/// Receives handler failures instead of the caller.
pub type ExceptionHandler = Box<dyn Fn(&CommandException) + Send + Sync>;

fn validate_name(name: &str) -> Result<String, RegistryError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RegistryError::NameEmpty);
    }
    if name.chars().count() >= MAX_NAME_LEN {
        return Err(RegistryError::NameTooLong {
            name: name.to_string(),
            max: MAX_NAME_LEN,
        });
    }
    Ok(name.to_string())
}

fn truncate_help(help: &str) -> String {
    if help.chars().count() > MAX_HELP_LEN {
        let mut short: String = help.chars().take(MAX_HELP_LEN).collect();
        short.push_str("...");
        short
    } else {
        help.to_string()
    }
}

struct Registration {
    name: String,
    key: String,
    alias: Option<String>,
    command: Arc<dyn Command>,
}

impl Registration {
    fn answers_to(&self, key: &str) -> bool {
        self.key == key || self.alias.as_deref() == Some(key)
    }
}

enum Action<'a> {
    GlobalHelp,
    CommandHelp(&'a Registration),
    VerbHelp(Vec<&'a Verb>),
    Invoke(Resolved<'a>),
}

/// A named console entry point owning a set of commands.
pub struct Dispatcher {
    name: String,
    help: String,
    access: AccessLevel,
    commands: Vec<Registration>,
    formatter: HelpFormatter,
    on_exception: Option<ExceptionHandler>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("name", &self.name)
            .field("help", &self.help)
            .field("access", &self.access)
            .field("commands", &self.command_names())
            .field("formatter", &self.formatter)
            .field("on_exception", &self.on_exception.is_some())
            .finish()
    }
}

impl Dispatcher {
    /// Create a dispatcher. Help longer than [`MAX_HELP_LEN`] is truncated.
    pub fn new(name: &str, help: &str, access: AccessLevel) -> Result<Self, RegistryError> {
        Ok(Self {
            name: validate_name(name)?,
            help: truncate_help(help),
            access,
            commands: Vec::new(),
            formatter: HelpFormatter::default(),
            on_exception: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn access(&self) -> AccessLevel {
        self.access
    }

    pub fn formatter(&self) -> &HelpFormatter {
        &self.formatter
    }

    pub fn formatter_mut(&mut self) -> &mut HelpFormatter {
        &mut self.formatter
    }

    /// Deliver handler failures to `handler` instead of returning them.
    pub fn on_command_exception<F>(&mut self, handler: F)
    where
        F: Fn(&CommandException) + Send + Sync + 'static,
    {
        self.on_exception = Some(Box::new(handler));
    }

    pub fn clear_command_exception(&mut self) {
        self.on_exception = None;
    }

    /// Register `command` under its descriptor name, or `name_override`.
    pub fn add_command(
        &mut self,
        command: Arc<dyn Command>,
        name_override: Option<&str>,
    ) -> Result<(), RegistryError> {
        let descriptor = command.descriptor().ok_or(RegistryError::NoDescriptorFound)?;
        descriptor.validate()?;

        let name = name_override.unwrap_or(descriptor.name.as_str()).trim().to_string();
        if name.is_empty() {
            return Err(RegistryError::NameEmpty);
        }
        let key = name.to_lowercase();
        let alias = descriptor
            .alias
            .as_deref()
            .map(str::to_lowercase)
            .filter(|a| !a.is_empty() && *a != key);

        let clash = self.commands.iter().any(|r| {
            r.answers_to(&key) || alias.as_deref().is_some_and(|a| r.answers_to(a))
        });
        if clash {
            log::warn!("{}: command name '{name}' is already registered", self.name);
            return Err(RegistryError::NameAlreadyExists(name));
        }

        log::info!("{}: added command '{name}'", self.name);
        self.commands.push(Registration {
            name,
            key,
            alias,
            command,
        });
        Ok(())
    }

    /// Remove every registration of `command`. False if it was not registered.
    pub fn remove_command(&mut self, command: &Arc<dyn Command>) -> bool {
        let before = self.commands.len();
        self.commands.retain(|r| !Arc::ptr_eq(&r.command, command));
        let removed = self.commands.len() != before;
        if removed {
            log::info!("{}: removed command", self.name);
        }
        removed
    }

    /// Remove the command registered as `name` (or with that alias).
    pub fn remove_command_named(&mut self, name: &str) -> bool {
        let key = name.trim().to_lowercase();
        match self.commands.iter().position(|r| r.answers_to(&key)) {
            Some(index) => {
                let reg = self.commands.remove(index);
                log::info!("{}: removed command '{}'", self.name, reg.name);
                true
            },
            None => false,
        }
    }

    pub fn is_registered(&self, command: &Arc<dyn Command>) -> bool {
        self.commands.iter().any(|r| Arc::ptr_eq(&r.command, command))
    }

    /// Registered command names in registration order.
    pub fn command_names(&self) -> Vec<&str> {
        self.commands.iter().map(|r| r.name.as_str()).collect()
    }

    /// Remove every command.
    pub fn clear(&mut self) {
        for reg in self.commands.drain(..) {
            log::info!("{}: removed command '{}'", self.name, reg.name);
        }
    }

    fn find(&self, name: &str) -> Option<&Registration> {
        let key = name.to_lowercase();
        self.commands.iter().find(|r| r.answers_to(&key))
    }

    /// Tokenize, resolve, and run one line.
    ///
    /// Rejected lines produce exactly one error line on `sink` and return
    /// `Ok`. A failing handler returns `Err` unless an exception handler is
    /// installed, in which case it receives the exception instead.
    pub fn execute_command(
        &self,
        line: &str,
        sink: &mut dyn ConsoleSink,
    ) -> Result<(), CommandException> {
        let action = match self.prepare(line) {
            Ok(action) => action,
            Err(e) => {
                log::warn!("{}: rejected '{}': {e}", self.name, line.trim());
                sink.write_error(&e.to_string());
                return Ok(());
            },
        };

        match action {
            Action::GlobalHelp => {
                let entries: Vec<CommandEntry<'_>> = self
                    .commands
                    .iter()
                    .map(|r| CommandEntry {
                        name: &r.name,
                        alias: r.command.descriptor().and_then(|d| d.alias.as_deref()),
                        help: r.command.descriptor().map_or("", |d| d.help.as_str()),
                    })
                    .collect();
                write_lines(
                    sink,
                    help::render_global(&self.formatter, &self.name, &self.help, &entries),
                );
            },
            Action::CommandHelp(reg) => {
                if let Some(descriptor) = reg.command.descriptor() {
                    write_lines(
                        sink,
                        help::render_command(&self.formatter, &reg.name, descriptor),
                    );
                }
            },
            Action::VerbHelp(overloads) => {
                write_lines(sink, help::render_verb(&self.formatter, &overloads));
            },
            Action::Invoke(resolved) => {
                if let Err(source) = invoke(resolved.verb, &resolved.call, sink) {
                    let exception = CommandException {
                        line: line.trim().to_string(),
                        source,
                    };
                    match &self.on_exception {
                        Some(handler) => {
                            log::error!("{}: {exception}", self.name);
                            handler(&exception);
                        },
                        None => return Err(exception),
                    }
                }
            },
        }
        Ok(())
    }

    fn prepare(&self, line: &str) -> Result<Action<'_>, DispatchError> {
        let parsed = match tokenize(line)? {
            Tokenized::GlobalHelp => return Ok(Action::GlobalHelp),
            Tokenized::Invocation(parsed) => parsed,
        };

        let reg = self
            .find(&parsed.command)
            .ok_or_else(|| DispatchError::UnknownCommand(parsed.command.clone()))?;
        let descriptor = reg
            .command
            .descriptor()
            .ok_or(RegistryError::NoDescriptorFound)?;
        let args = parsed.argument_map()?;
        let wants_help = args.contains("help") || args.contains("h");

        if parsed.verb.is_empty() {
            if wants_help && args.len() == 1 && parsed.default_value.is_empty() {
                return Ok(Action::CommandHelp(reg));
            }
        } else {
            let overloads: Vec<&Verb> = descriptor
                .verbs_named(&parsed.verb)
                .map(|(_, v)| v)
                .collect();
            if overloads.is_empty() && parsed.verb.eq_ignore_ascii_case("help") {
                return Ok(Action::CommandHelp(reg));
            }
            if wants_help {
                if overloads.is_empty() {
                    return Err(DispatchError::NoSuchVerb {
                        command: parsed.command.clone(),
                        verb: parsed.verb.clone(),
                    });
                }
                return Ok(Action::VerbHelp(overloads));
            }
        }

        let resolved = resolve(
            &parsed.command,
            descriptor,
            &parsed.verb,
            &args,
            &parsed.default_value,
        )?;
        Ok(Action::Invoke(resolved))
    }

    /// Serializable summary of every registered command.
    pub fn describe(&self) -> DispatcherSummary<'_> {
        DispatcherSummary {
            name: &self.name,
            help: &self.help,
            access: self.access,
            commands: self
                .commands
                .iter()
                .filter_map(|r| {
                    r.command.descriptor().map(|command| CommandSummary {
                        name: &r.name,
                        command,
                    })
                })
                .collect(),
        }
    }

    /// [`describe`](Self::describe) rendered as pretty JSON.
    pub fn describe_json(&self) -> helm_types::Result<String> {
        Ok(serde_json::to_string_pretty(&self.describe())?)
    }
}

fn write_lines(sink: &mut dyn ConsoleSink, lines: Vec<String>) {
    for line in lines {
        sink.write_line(&line);
    }
}

/// All dispatchers known to a console, in registration order.
#[derive(Debug, Default)]
pub struct Registry {
    dispatchers: Vec<Dispatcher>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a dispatcher. Names are unique case-insensitively.
    pub fn register_dispatcher(
        &mut self,
        name: &str,
        help: &str,
        access: AccessLevel,
    ) -> Result<&mut Dispatcher, RegistryError> {
        let dispatcher = Dispatcher::new(name, help, access).inspect_err(|e| {
            log::warn!("Rejected dispatcher '{name}': {e}");
        })?;
        if self.dispatcher(dispatcher.name()).is_some() {
            log::warn!("Dispatcher '{}' is already registered", dispatcher.name());
            return Err(RegistryError::AlreadyExists(dispatcher.name));
        }
        log::info!("Registered dispatcher '{}' ({})", dispatcher.name, dispatcher.access);
        let index = self.dispatchers.len();
        self.dispatchers.push(dispatcher);
        Ok(&mut self.dispatchers[index])
    }

    /// Remove a dispatcher and all of its commands. False if it was not registered.
    pub fn unregister_dispatcher(&mut self, name: &str) -> bool {
        let key = name.trim();
        match self
            .dispatchers
            .iter()
            .position(|d| d.name.eq_ignore_ascii_case(key))
        {
            Some(index) => {
                let mut dispatcher = self.dispatchers.remove(index);
                dispatcher.clear();
                log::info!("Unregistered dispatcher '{}'", dispatcher.name);
                true
            },
            None => false,
        }
    }

    pub fn dispatcher(&self, name: &str) -> Option<&Dispatcher> {
        let key = name.trim();
        self.dispatchers
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(key))
    }

    pub fn dispatcher_mut(&mut self, name: &str) -> Option<&mut Dispatcher> {
        let key = name.trim();
        self.dispatchers
            .iter_mut()
            .find(|d| d.name.eq_ignore_ascii_case(key))
    }

    pub fn dispatcher_names(&self) -> Vec<&str> {
        self.dispatchers.iter().map(|d| d.name.as_str()).collect()
    }

    /// Add `command` to the named dispatcher.
    pub fn add_command(
        &mut self,
        dispatcher: &str,
        command: Arc<dyn Command>,
        name_override: Option<&str>,
    ) -> Result<(), RegistryError> {
        self.dispatcher_mut(dispatcher)
            .ok_or_else(|| RegistryError::DispatcherNotFound(dispatcher.to_string()))?
            .add_command(command, name_override)
    }

    /// Remove `command` from the named dispatcher.
    pub fn remove_command(&mut self, dispatcher: &str, command: &Arc<dyn Command>) -> bool {
        self.dispatcher_mut(dispatcher)
            .is_some_and(|d| d.remove_command(command))
    }

    /// Whether `command` is registered under the named dispatcher.
    pub fn is_registered(&self, dispatcher: &str, command: &Arc<dyn Command>) -> bool {
        self.dispatcher(dispatcher)
            .is_some_and(|d| d.is_registered(command))
    }

    /// Route a line with full access.
    pub fn execute(&self, line: &str, sink: &mut dyn ConsoleSink) -> Result<(), CommandException> {
        self.execute_as(line, AccessLevel::Administrator, sink)
    }

    /// Route a line to the dispatcher named by its first word.
    ///
    /// An empty line does nothing. `--help` (or `help`) as the first word
    /// lists the dispatchers `access` may use.
    pub fn execute_as(
        &self,
        line: &str,
        access: AccessLevel,
        sink: &mut dyn ConsoleSink,
    ) -> Result<(), CommandException> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(());
        }
        let (name, rest) = trimmed
            .split_once(char::is_whitespace)
            .unwrap_or((trimmed, ""));

        if matches!(name, "--help" | "-h") || name.eq_ignore_ascii_case("help") {
            let entries: Vec<CommandEntry<'_>> = self
                .dispatchers
                .iter()
                .filter(|d| access.permits(d.access))
                .map(|d| CommandEntry {
                    name: &d.name,
                    alias: None,
                    help: &d.help,
                })
                .collect();
            write_lines(
                sink,
                help::render_global(&HelpFormatter::default(), "console", "", &entries),
            );
            return Ok(());
        }

        let Some(dispatcher) = self.dispatcher(name) else {
            let e = DispatchError::from(RegistryError::DispatcherNotFound(name.to_string()));
            log::warn!("Rejected '{trimmed}': {e}");
            sink.write_error(&e.to_string());
            return Ok(());
        };
        if !access.permits(dispatcher.access) {
            let e = DispatchError::AccessDenied {
                name: dispatcher.name.clone(),
                required: dispatcher.access,
            };
            log::warn!("Rejected '{trimmed}': {e}");
            sink.write_error(&e.to_string());
            return Ok(());
        }
        dispatcher.execute_command(rest, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{CommandDescriptor, Flag, Operand};
    use crate::resolver::BoundCall;
    use crate::value::ValueType;
    use helm_types::BufferSink;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn noop(_: &BoundCall, _: &mut dyn ConsoleSink) -> anyhow::Result<()> {
        Ok(())
    }

    fn echo_command() -> Arc<dyn Command> {
        Arc::new(
            CommandDescriptor::new("echo", "Echo text").alias("e").verb(
                Verb::describe("say", "Say something")
                    .default_verb()
                    .operand(Operand::new("", "Text", ValueType::String))
                    .handle(|call, out| {
                        out.write_line(call.get_str("").unwrap_or_default());
                        Ok(())
                    }),
            ),
        )
    }

    struct Undeclared;
    impl Command for Undeclared {
        fn descriptor(&self) -> Option<&CommandDescriptor> {
            None
        }
    }

    #[test]
    fn name_length_limit() {
        let err = Dispatcher::new(&"a".repeat(23), "", AccessLevel::Operator).unwrap_err();
        assert!(matches!(err, RegistryError::NameTooLong { max: 23, .. }));
        assert!(Dispatcher::new(&"a".repeat(22), "", AccessLevel::Operator).is_ok());
    }

    #[test]
    fn empty_name_rejected() {
        assert_eq!(
            Dispatcher::new("  ", "", AccessLevel::Operator).err(),
            Some(RegistryError::NameEmpty)
        );
    }

    #[test]
    fn help_truncation() {
        let long = "x".repeat(80);
        let d = Dispatcher::new("sys", &long, AccessLevel::Operator).unwrap();
        assert_eq!(d.help(), format!("{}...", "x".repeat(76)));

        let exact = "y".repeat(76);
        let d = Dispatcher::new("sys", &exact, AccessLevel::Operator).unwrap();
        assert_eq!(d.help(), exact);

        let d = Dispatcher::new("sys", "short", AccessLevel::Operator).unwrap();
        assert_eq!(d.help(), "short");
    }

    #[test]
    fn duplicate_dispatcher_rejected_case_insensitively() {
        let mut reg = Registry::new();
        reg.register_dispatcher("Sys", "", AccessLevel::Operator).unwrap();
        let err = reg
            .register_dispatcher("SYS", "", AccessLevel::Operator)
            .err();
        assert_eq!(err, Some(RegistryError::AlreadyExists("SYS".into())));
        assert_eq!(reg.dispatcher_names(), vec!["Sys"]);
    }

    #[test]
    fn add_command_without_descriptor() {
        let mut d = Dispatcher::new("sys", "", AccessLevel::Operator).unwrap();
        let err = d.add_command(Arc::new(Undeclared), None).unwrap_err();
        assert_eq!(err, RegistryError::NoDescriptorFound);
    }

    #[test]
    fn add_command_name_collision() {
        let mut d = Dispatcher::new("sys", "", AccessLevel::Operator).unwrap();
        d.add_command(echo_command(), None).unwrap();
        assert_eq!(
            d.add_command(echo_command(), None).unwrap_err(),
            RegistryError::NameAlreadyExists("echo".into())
        );
        // The alias "e" also collides.
        assert!(d.add_command(echo_command(), Some("E")).is_err());
        d.add_command(echo_command(), Some("echo2")).unwrap_err();
        assert_eq!(d.command_names(), vec!["echo"]);
    }

    #[test]
    fn add_command_with_override() {
        let mut d = Dispatcher::new("sys", "", AccessLevel::Operator).unwrap();
        let plain: Arc<dyn Command> = Arc::new(CommandDescriptor::new("x", "").verb(
            Verb::describe("v", "").handle(noop),
        ));
        d.add_command(Arc::clone(&plain), Some("first")).unwrap();
        d.add_command(Arc::clone(&plain), Some("second")).unwrap();
        assert_eq!(d.command_names(), vec!["first", "second"]);
        assert!(d.remove_command(&plain));
        assert!(d.command_names().is_empty());
        assert!(!d.remove_command(&plain));
    }

    #[test]
    fn invalid_descriptor_rejected() {
        let mut d = Dispatcher::new("sys", "", AccessLevel::Operator).unwrap();
        let bad = CommandDescriptor::new("bad", "").verb(
            Verb::describe("v", "")
                .flag(Flag::new("a", ""))
                .flag(Flag::new("A", ""))
                .handle(noop),
        );
        assert!(matches!(
            d.add_command(Arc::new(bad), None),
            Err(RegistryError::DuplicateParameter { .. })
        ));
    }

    #[test]
    fn shared_command_across_dispatchers() {
        let mut reg = Registry::new();
        reg.register_dispatcher("a", "", AccessLevel::Operator).unwrap();
        reg.register_dispatcher("b", "", AccessLevel::Operator).unwrap();
        let cmd = echo_command();
        reg.add_command("a", Arc::clone(&cmd), None).unwrap();
        reg.add_command("b", Arc::clone(&cmd), None).unwrap();
        assert!(reg.is_registered("a", &cmd));
        assert!(reg.is_registered("b", &cmd));
        assert!(reg.remove_command("a", &cmd));
        assert!(!reg.is_registered("a", &cmd));
        assert!(reg.is_registered("b", &cmd));
    }

    #[test]
    fn add_to_missing_dispatcher() {
        let mut reg = Registry::new();
        assert_eq!(
            reg.add_command("nope", echo_command(), None),
            Err(RegistryError::DispatcherNotFound("nope".into()))
        );
    }

    #[test]
    fn remove_command_by_name_or_alias() {
        let mut d = Dispatcher::new("sys", "", AccessLevel::Operator).unwrap();
        d.add_command(echo_command(), None).unwrap();
        assert!(d.remove_command_named("E"));
        assert!(!d.remove_command_named("echo"));
    }

    #[test]
    fn unregister_removes_everything() {
        let mut reg = Registry::new();
        reg.register_dispatcher("d", "", AccessLevel::Operator).unwrap();
        let cmd = echo_command();
        reg.add_command("d", Arc::clone(&cmd), None).unwrap();
        assert!(reg.unregister_dispatcher("D"));
        assert!(!reg.is_registered("d", &cmd));
        assert!(!reg.unregister_dispatcher("d"));
        assert_eq!(Arc::strong_count(&cmd), 1);
    }

    #[test]
    fn execute_by_name_and_alias() {
        let mut d = Dispatcher::new("sys", "", AccessLevel::Operator).unwrap();
        d.add_command(echo_command(), None).unwrap();
        let mut sink = BufferSink::new();
        d.execute_command("echo say hello", &mut sink).unwrap();
        d.execute_command("E \"two words\"", &mut sink).unwrap();
        assert_eq!(sink.lines(), vec!["hello", "two words"]);
        assert!(sink.errors.is_empty());
    }

    #[test]
    fn unknown_command_writes_one_error() {
        let d = Dispatcher::new("sys", "", AccessLevel::Operator).unwrap();
        let mut sink = BufferSink::new();
        d.execute_command("ghost run", &mut sink).unwrap();
        assert_eq!(
            sink.errors,
            vec![
                "No command with the name 'ghost' exists. Enter '--help' to view all available commands."
                    .to_string()
            ]
        );
        assert!(sink.output.is_empty());
    }

    #[test]
    fn help_paths() {
        let mut d = Dispatcher::new("sys", "System", AccessLevel::Operator).unwrap();
        d.add_command(echo_command(), None).unwrap();

        let mut sink = BufferSink::new();
        d.execute_command("--help", &mut sink).unwrap();
        assert!(sink.output.contains("echo (e)"));

        sink.clear();
        d.execute_command("echo --help", &mut sink).unwrap();
        assert!(sink.lines()[0].starts_with("echo: Echo text"));

        sink.clear();
        d.execute_command("echo -h", &mut sink).unwrap();
        assert!(sink.output.contains("Verbs:"));

        sink.clear();
        d.execute_command("echo help", &mut sink).unwrap();
        assert!(sink.output.contains("Verbs:"));

        sink.clear();
        d.execute_command("echo say --help", &mut sink).unwrap();
        assert!(sink.lines()[0].starts_with("say: Say something"));

        sink.clear();
        d.execute_command("echo shout --help", &mut sink).unwrap();
        assert_eq!(sink.errors.len(), 1);
        assert!(sink.errors[0].starts_with("No verb with the specified name 'shout'"));
    }

    #[test]
    fn handler_error_without_subscriber_is_returned() {
        let mut d = Dispatcher::new("sys", "", AccessLevel::Operator).unwrap();
        d.add_command(
            Arc::new(CommandDescriptor::new("fail", "").verb(
                Verb::describe("now", "").handle(|_, _| anyhow::bail!("relay fault")),
            )),
            None,
        )
        .unwrap();
        let mut sink = BufferSink::new();
        let err = d.execute_command("fail now", &mut sink).unwrap_err();
        assert_eq!(err.line, "fail now");
        assert!(err.to_string().contains("relay fault"));
    }

    #[test]
    fn handler_error_with_subscriber_is_swallowed() {
        let mut d = Dispatcher::new("sys", "", AccessLevel::Operator).unwrap();
        d.add_command(
            Arc::new(CommandDescriptor::new("fail", "").verb(
                Verb::describe("now", "").handle(|_, _| panic!("bad state")),
            )),
            None,
        )
        .unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in = Arc::clone(&seen);
        d.on_command_exception(move |e| {
            seen_in.lock().unwrap().push(e.line.clone());
        });
        let mut sink = BufferSink::new();
        d.execute_command("fail now", &mut sink).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["fail now".to_string()]);

        d.clear_command_exception();
        assert!(d.execute_command("fail now", &mut sink).is_err());
    }

    #[test]
    fn registry_routes_by_first_word() {
        let mut reg = Registry::new();
        reg.register_dispatcher("sys", "System", AccessLevel::Operator)
            .unwrap()
            .add_command(echo_command(), None)
            .unwrap();
        let mut sink = BufferSink::new();
        reg.execute("SYS echo say hi", &mut sink).unwrap();
        assert_eq!(sink.lines(), vec!["hi"]);

        sink.clear();
        reg.execute("nope echo", &mut sink).unwrap();
        assert_eq!(
            sink.errors,
            vec!["No console command with the name 'nope' exists.".to_string()]
        );

        sink.clear();
        reg.execute("   ", &mut sink).unwrap();
        assert!(sink.output.is_empty() && sink.errors.is_empty());

        sink.clear();
        reg.execute("--help", &mut sink).unwrap();
        assert!(sink.output.contains("  sys  System"));
    }

    #[test]
    fn registry_enforces_access() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let mut reg = Registry::new();
        reg.register_dispatcher("admin", "", AccessLevel::Administrator)
            .unwrap()
            .add_command(
                Arc::new(CommandDescriptor::new("reboot", "").verb(
                    Verb::describe("now", "").handle(move |_, _| {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }),
                )),
                None,
            )
            .unwrap();

        let mut sink = BufferSink::new();
        reg.execute_as("admin reboot now", AccessLevel::Operator, &mut sink)
            .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(
            sink.errors,
            vec!["Access denied. The 'admin' command requires Administrator access.".to_string()]
        );

        reg.execute_as("help", AccessLevel::Operator, &mut sink).unwrap();
        assert!(!sink.output.contains("admin"));

        reg.execute_as("admin reboot now", AccessLevel::Administrator, &mut sink)
            .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_dispatch_from_many_threads() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let mut reg = Registry::new();
        reg.register_dispatcher("sys", "", AccessLevel::Operator)
            .unwrap()
            .add_command(
                Arc::new(CommandDescriptor::new("tick", "").verb(
                    Verb::describe("once", "").handle(move |_, _| {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }),
                )),
                None,
            )
            .unwrap();
        let reg = &reg;
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(move || {
                    let mut sink = BufferSink::new();
                    for _ in 0..25 {
                        reg.execute("sys tick once", &mut sink).unwrap();
                    }
                });
            }
        });
        assert_eq!(count.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn describe_json_lists_commands() {
        let mut d = Dispatcher::new("sys", "System", AccessLevel::Programmer).unwrap();
        d.add_command(echo_command(), Some("say")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&d.describe_json().unwrap()).unwrap();
        assert_eq!(json["name"], "sys");
        assert_eq!(json["access"], "programmer");
        assert_eq!(json["commands"][0]["name"], "say");
        assert_eq!(json["commands"][0]["command"]["name"], "echo");
        assert_eq!(
            json["commands"][0]["command"]["verbs"][0]["operands"][0]["type"],
            "String"
        );
    }
}
