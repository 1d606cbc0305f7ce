//! Console command dispatcher.
//!
//! A console line flows through the [`tokenizer`], is routed by the
//! [`Registry`] to a [`Dispatcher`], resolved against a command's verb
//! overloads by the [`resolver`] (converting values with [`coerce`]), and
//! finally run by the [`invoker`]. Rejected lines produce a single error
//! line; help requests are rendered by [`help`].

pub mod coerce;
pub mod describe;
pub mod descriptor;
pub mod error;
pub mod help;
pub mod invoker;
pub mod registry;
pub mod resolver;
pub mod tokenizer;
pub mod value;

/// Declarative command, verb, operand, and flag descriptors.
pub use descriptor::{Command, CommandDescriptor, Flag, Handler, Operand, Sample, Verb, VerbBuilder};
/// Dispatch, registration, and handler errors.
pub use error::{CommandException, DispatchError, HandlerError, RegistryError};
/// Pluggable help formatting.
pub use help::{FormatFn, HelpElement, HelpFormatter};
/// Dispatchers and the registry that routes lines to them.
pub use registry::{Dispatcher, MAX_HELP_LEN, MAX_NAME_LEN, Registry};
/// Bound arguments handed to verb handlers.
pub use resolver::{BoundCall, BoundParam};
/// Tokenized console lines.
pub use tokenizer::{Arguments, ParsedInvocation, Tokenized, tokenize};
/// Operand types and converted values.
pub use value::{Value, ValueType};

pub use helm_types::{AccessLevel, BufferSink, ConsoleSink};
