//! Help text rendering.
//!
//! Every piece of text passes through a per-element formatting function so
//! a presentation layer can add color or markup. Unset functions are the
//! identity. Column alignment is computed on the plain text, before
//! formatting, so escape codes never skew the layout.

use std::fmt;
use std::sync::Arc;

use crate::descriptor::{CommandDescriptor, Verb};

/// Formatting function for one kind of help text.
pub type FormatFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Kinds of text in help output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpElement {
    Command,
    Verb,
    Operand,
    Flag,
    Sample,
    Text,
}

/// Per-element formatting functions.
#[derive(Clone, Default)]
pub struct HelpFormatter {
    command: Option<FormatFn>,
    verb: Option<FormatFn>,
    operand: Option<FormatFn>,
    flag: Option<FormatFn>,
    sample: Option<FormatFn>,
    text: Option<FormatFn>,
}

impl fmt::Debug for HelpFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelpFormatter")
            .field("command", &self.command.is_some())
            .field("verb", &self.verb.is_some())
            .field("operand", &self.operand.is_some())
            .field("flag", &self.flag.is_some())
            .field("sample", &self.sample.is_some())
            .field("text", &self.text.is_some())
            .finish()
    }
}

impl HelpFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the function for `element`. `None` restores the identity.
    pub fn set(&mut self, element: HelpElement, format: Option<FormatFn>) {
        *self.slot(element) = format;
    }

    /// Builder form of [`set`](Self::set).
    pub fn with<F>(mut self, element: HelpElement, format: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.set(element, Some(Arc::new(format)));
        self
    }

    pub fn format(&self, element: HelpElement, text: &str) -> String {
        let slot = match element {
            HelpElement::Command => &self.command,
            HelpElement::Verb => &self.verb,
            HelpElement::Operand => &self.operand,
            HelpElement::Flag => &self.flag,
            HelpElement::Sample => &self.sample,
            HelpElement::Text => &self.text,
        };
        match slot {
            Some(f) => f(text),
            None => text.to_string(),
        }
    }

    fn slot(&mut self, element: HelpElement) -> &mut Option<FormatFn> {
        match element {
            HelpElement::Command => &mut self.command,
            HelpElement::Verb => &mut self.verb,
            HelpElement::Operand => &mut self.operand,
            HelpElement::Flag => &mut self.flag,
            HelpElement::Sample => &mut self.sample,
            HelpElement::Text => &mut self.text,
        }
    }

    /// One aligned row: formatted label padded to `width`, then formatted help.
    fn row(&self, element: HelpElement, label: &str, width: usize, help: &str) -> String {
        let pad = width.saturating_sub(label.chars().count()) + 2;
        format!(
            "  {}{}{}",
            self.format(element, label),
            " ".repeat(pad),
            self.format(HelpElement::Text, help)
        )
    }
}

/// A registered command as listed in global help.
#[derive(Debug, Clone, Copy)]
pub struct CommandEntry<'a> {
    pub name: &'a str,
    pub alias: Option<&'a str>,
    pub help: &'a str,
}

fn labelled(name: &str, alias: Option<&str>) -> String {
    match alias {
        Some(a) => format!("{name} ({a})"),
        None => name.to_string(),
    }
}

fn widest<'a>(labels: impl Iterator<Item = &'a String>) -> usize {
    labels.map(|l| l.chars().count()).max().unwrap_or(0)
}

/// Global help: every command with its alias and help, in registration order.
pub fn render_global(
    fmt: &HelpFormatter,
    dispatcher: &str,
    dispatcher_help: &str,
    commands: &[CommandEntry<'_>],
) -> Vec<String> {
    let mut lines = Vec::new();
    if !dispatcher_help.is_empty() {
        lines.push(fmt.format(HelpElement::Text, dispatcher_help));
    }
    if commands.is_empty() {
        lines.push(fmt.format(
            HelpElement::Text,
            &format!("No commands are registered under '{dispatcher}'."),
        ));
        return lines;
    }
    lines.push(fmt.format(HelpElement::Text, "Commands:"));
    let labels: Vec<String> = commands.iter().map(|c| labelled(c.name, c.alias)).collect();
    let width = widest(labels.iter());
    for (label, entry) in labels.iter().zip(commands) {
        lines.push(fmt.row(HelpElement::Command, label, width, entry.help));
    }
    lines.push(fmt.format(
        HelpElement::Text,
        "Enter '<command> --help' for more information on a command.",
    ));
    lines
}

/// Command help: each distinct verb plus the synthetic `Help` entry.
pub fn render_command(fmt: &HelpFormatter, name: &str, command: &CommandDescriptor) -> Vec<String> {
    let mut lines = vec![format!(
        "{}: {}",
        fmt.format(HelpElement::Command, name),
        fmt.format(HelpElement::Text, &command.help)
    )];
    lines.push(fmt.format(HelpElement::Text, "Verbs:"));

    let mut rows: Vec<(String, &str)> = command
        .distinct_verbs()
        .into_iter()
        .map(|v| {
            let label = if v.is_default {
                format!("{} [default]", labelled(&v.name, v.alias.as_deref()))
            } else {
                labelled(&v.name, v.alias.as_deref())
            };
            (label, v.help.as_str())
        })
        .collect();
    rows.push(("Help".to_string(), "Displays help for this command or one of its verbs."));

    let width = widest(rows.iter().map(|(l, _)| l));
    for (label, help) in &rows {
        lines.push(fmt.row(HelpElement::Verb, label, width, help));
    }
    lines.push(fmt.format(
        HelpElement::Text,
        &format!("Enter '{name} <verb> --help' for more information on a verb."),
    ));
    lines
}

/// Verb help for every overload of one verb name.
pub fn render_verb(fmt: &HelpFormatter, overloads: &[&Verb]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, verb) in overloads.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        render_signature(fmt, verb, &mut lines);
    }
    lines
}

fn render_signature(fmt: &HelpFormatter, verb: &Verb, lines: &mut Vec<String>) {
    lines.push(format!(
        "{}: {}",
        fmt.format(HelpElement::Verb, &verb.name),
        fmt.format(HelpElement::Text, &verb.help)
    ));

    if !verb.samples.is_empty() {
        lines.push(fmt.format(HelpElement::Text, "Samples:"));
        for sample in &verb.samples {
            lines.push(format!("  {}", fmt.format(HelpElement::Sample, &sample.invocation)));
            lines.push(format!("    {}", fmt.format(HelpElement::Text, &sample.description)));
        }
    }

    let operand_labels: Vec<String> = verb
        .operands
        .iter()
        .map(|o| {
            if o.name.is_empty() {
                format!("<value> <{}>", o.value_type.name())
            } else {
                format!("--{} <{}>", o.name, o.value_type.name())
            }
        })
        .collect();
    let flag_labels: Vec<String> = verb
        .flags
        .iter()
        .map(|f| match f.alias {
            Some(a) => format!("--{}, -{a}", f.name),
            None => format!("--{}", f.name),
        })
        .collect();
    let width = widest(operand_labels.iter().chain(flag_labels.iter()));

    if !verb.operands.is_empty() {
        lines.push(fmt.format(HelpElement::Text, "Operands:"));
        for (label, operand) in operand_labels.iter().zip(&verb.operands) {
            lines.push(fmt.row(HelpElement::Operand, label, width, &operand.help));
        }
    }
    if !verb.flags.is_empty() {
        lines.push(fmt.format(HelpElement::Text, "Flags:"));
        for (label, flag) in flag_labels.iter().zip(&verb.flags) {
            let help = if flag.optional {
                format!("{} (optional)", flag.help)
            } else {
                flag.help.clone()
            };
            lines.push(fmt.row(HelpElement::Flag, label, width, &help));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Flag, Operand};
    use crate::resolver::BoundCall;
    use crate::value::ValueType;
    use helm_types::ConsoleSink;

    fn noop(_: &BoundCall, _: &mut dyn ConsoleSink) -> anyhow::Result<()> {
        Ok(())
    }

    fn sample_command() -> CommandDescriptor {
        CommandDescriptor::new("net", "Network diagnostics")
            .verb(
                Verb::describe("ping", "Ping a host")
                    .operand(Operand::new("host", "Host to ping", ValueType::String))
                    .flag(Flag::new("verbose", "Print every reply").alias('v').optional())
                    .sample("net ping --host 10.0.0.1", "Ping the router")
                    .handle(noop),
            )
            .verb(
                Verb::describe("ping", "Ping a host repeatedly")
                    .operand(Operand::new("host", "Host to ping", ValueType::String))
                    .operand(Operand::new("count", "Number of pings", ValueType::UInt16))
                    .handle(noop),
            )
            .verb(Verb::describe("status", "Show link status").default_verb().handle(noop))
    }

    #[test]
    fn global_help_is_column_aligned() {
        let fmt = HelpFormatter::new();
        let lines = render_global(
            &fmt,
            "sys",
            "System commands",
            &[
                CommandEntry {
                    name: "net",
                    alias: Some("n"),
                    help: "Network",
                },
                CommandEntry {
                    name: "clock",
                    alias: None,
                    help: "Clock",
                },
            ],
        );
        assert_eq!(lines[0], "System commands");
        assert_eq!(lines[1], "Commands:");
        assert_eq!(lines[2], "  net (n)  Network");
        assert_eq!(lines[3], "  clock    Clock");
        assert!(lines[4].contains("--help"));
    }

    #[test]
    fn global_help_without_commands() {
        let lines = render_global(&HelpFormatter::new(), "sys", "", &[]);
        assert_eq!(lines, vec!["No commands are registered under 'sys'.".to_string()]);
    }

    #[test]
    fn command_help_lists_distinct_verbs_and_help() {
        let lines = render_command(&HelpFormatter::new(), "net", &sample_command());
        assert_eq!(lines[0], "net: Network diagnostics");
        let body = lines.join("\n");
        assert_eq!(body.matches("ping").count(), 1);
        assert!(body.contains("status [default]"));
        assert!(body.contains("  Help "));
    }

    #[test]
    fn verb_help_shows_samples_operands_and_flags() {
        let cmd = sample_command();
        let overloads: Vec<&Verb> = cmd.verbs_named("ping").map(|(_, v)| v).collect();
        let lines = render_verb(&HelpFormatter::new(), &overloads);
        let body = lines.join("\n");
        assert!(body.starts_with("ping: Ping a host"));
        assert!(body.contains("  net ping --host 10.0.0.1\n    Ping the router"));
        assert!(body.contains("  --host <String>  Host to ping"));
        assert!(body.contains("  --verbose, -v    Print every reply (optional)"));
        assert!(body.contains("ping: Ping a host repeatedly"));
        assert!(body.contains("--count <u16>"));
    }

    #[test]
    fn formatters_apply_per_element() {
        let fmt = HelpFormatter::new()
            .with(HelpElement::Command, |s| format!("<c>{s}</c>"))
            .with(HelpElement::Text, str::to_uppercase);
        let lines = render_global(
            &fmt,
            "sys",
            "",
            &[CommandEntry {
                name: "net",
                alias: None,
                help: "network",
            }],
        );
        assert_eq!(lines[0], "COMMANDS:");
        assert_eq!(lines[1], "  <c>net</c>  NETWORK");
    }

    #[test]
    fn none_restores_identity() {
        let mut fmt = HelpFormatter::new().with(HelpElement::Verb, |s| format!("*{s}*"));
        assert_eq!(fmt.format(HelpElement::Verb, "ping"), "*ping*");
        fmt.set(HelpElement::Verb, None);
        assert_eq!(fmt.format(HelpElement::Verb, "ping"), "ping");
        assert_eq!(fmt.format(HelpElement::Sample, "x"), "x");
    }

    #[test]
    fn unnamed_operand_has_placeholder_label() {
        let verb = Verb::describe("echo", "Echo text")
            .operand(Operand::new("", "Text to echo", ValueType::String))
            .handle(noop);
        let lines = render_verb(&HelpFormatter::new(), &[&verb]);
        assert!(lines.iter().any(|l| l == "  <value> <String>  Text to echo"));
    }
}
