//! Dispatch and registration errors.
//!
//! Every variant of [`DispatchError`] is recovered inside the dispatcher:
//! its `Display` text is the single line written to the error sink. Only
//! [`CommandException`] ever leaves `execute_command`.

use helm_types::AccessLevel;

/// Registration failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("The name must not be empty.")]
    NameEmpty,

    #[error("The name '{name}' is too long. Names must be shorter than {max} characters.")]
    NameTooLong { name: String, max: usize },

    #[error("A dispatcher named '{0}' is already registered.")]
    AlreadyExists(String),

    #[error("The command does not expose a command descriptor.")]
    NoDescriptorFound,

    #[error("A command named '{0}' is already registered.")]
    NameAlreadyExists(String),

    #[error("The verb '{verb}' declares the operand or flag '{name}' more than once.")]
    DuplicateParameter { verb: String, name: String },

    #[error("No console command with the name '{0}' exists.")]
    DispatcherNotFound(String),
}

/// Locally recovered dispatch failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("invalid command syntax")]
    Syntax,

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(
        "The '{0}' operand or flag was used more than once.\r\nDuplicate operand or flag names are not allowed!"
    )]
    DuplicateArgument(String),

    #[error(
        "No command with the name '{0}' exists. Enter '--help' to view all available commands."
    )]
    UnknownCommand(String),

    #[error(
        "The command '{0}' requires a verb. Enter '{0} --help' to view all available verbs."
    )]
    RequiresVerb(String),

    #[error(
        "No verb with the specified name '{verb}' exists. Enter '{command} --help' to view all available verbs."
    )]
    NoSuchVerb { command: String, verb: String },

    #[error(
        "The verb '{0}' requires a different combination of operands than what was provided."
    )]
    NoMatchingSignature(String),

    #[error(
        "Unable to convert the operand '{operand}' with the value '{value}' to the expected type value '{type_name}'."
    )]
    ConversionFailure {
        operand: String,
        value: String,
        type_name: String,
    },

    #[error("Access denied. The '{name}' command requires {required} access.")]
    AccessDenied { name: String, required: AccessLevel },
}

/// Failure raised by a verb implementation.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(#[source] anyhow::Error),

    #[error("handler panicked: {0}")]
    Panicked(String),
}

/// A handler failure together with the line that triggered it.
#[derive(Debug, thiserror::Error)]
#[error("The command '{line}' failed: {source}")]
pub struct CommandException {
    pub line: String,
    #[source]
    pub source: HandlerError,
}
