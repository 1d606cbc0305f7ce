//! Verb overload resolution and argument binding.
//!
//! Overloads sharing a verb name are tried in declaration order and the
//! first one whose signature the arguments satisfy wins. There is no
//! "most specific match" search.

use std::any::Any;

use crate::coerce::{coerce, coerce_bool};
use crate::descriptor::{CommandDescriptor, Flag, Verb};
use crate::error::DispatchError;
use crate::tokenizer::Arguments;
use crate::value::Value;

/// One bound parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParam {
    pub name: String,
    pub position: usize,
    pub value: Value,
}

/// Fully converted arguments for one verb overload, ordered by position.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundCall {
    verb: String,
    signature: usize,
    params: Vec<BoundParam>,
}

impl BoundCall {
    /// Name of the resolved verb.
    pub fn verb(&self) -> &str {
        &self.verb
    }

    /// Index of the winning overload among the command's verbs.
    pub fn signature(&self) -> usize {
        self.signature
    }

    pub fn params(&self) -> &[BoundParam] {
        &self.params
    }

    /// Value at a parameter position.
    pub fn value(&self, position: usize) -> Option<&Value> {
        self.params.get(position).map(|p| &p.value)
    }

    /// Value of a named parameter (case-insensitive). The default operand is named `""`.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let key = name.to_ascii_lowercase();
        self.params.iter().find(|p| p.name == key).map(|p| &p.value)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.lookup(name).and_then(Value::as_bool)
    }

    pub fn get_i32(&self, name: &str) -> Option<i32> {
        self.lookup(name).and_then(Value::as_i32)
    }

    pub fn get_u16(&self, name: &str) -> Option<u16> {
        self.lookup(name).and_then(Value::as_u16)
    }

    pub fn get_u32(&self, name: &str) -> Option<u32> {
        self.lookup(name).and_then(Value::as_u32)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.lookup(name).and_then(Value::as_f64)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.lookup(name).and_then(Value::as_str)
    }

    /// Value of a fallback-typed operand.
    pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
        self.lookup(name).and_then(Value::downcast_ref::<T>)
    }
}

/// A resolved verb together with its bound arguments.
#[derive(Debug)]
pub struct Resolved<'a> {
    pub verb: &'a Verb,
    pub call: BoundCall,
}

/// Select the overload for `verb_text` and bind `args` to it.
///
/// `command_name` is the name the command was invoked by; it only appears
/// in error text.
pub fn resolve<'a>(
    command_name: &str,
    command: &'a CommandDescriptor,
    verb_text: &str,
    args: &Arguments,
    default_value: &str,
) -> Result<Resolved<'a>, DispatchError> {
    let candidates: Vec<(usize, &Verb)> = if verb_text.is_empty() {
        let defaults: Vec<_> = command.default_verbs().collect();
        if defaults.is_empty() {
            return Err(DispatchError::RequiresVerb(command_name.to_string()));
        }
        defaults
    } else {
        let named: Vec<_> = command.verbs_named(verb_text).collect();
        if named.is_empty() {
            return Err(DispatchError::NoSuchVerb {
                command: command_name.to_string(),
                verb: verb_text.to_string(),
            });
        }
        named
    };

    let mut args = args.clone();
    if !default_value.is_empty() {
        args.insert("", default_value);
    }

    let (signature, verb) = candidates
        .into_iter()
        .find(|(_, verb)| signature_matches(verb, &args))
        .ok_or_else(|| {
            let name = if verb_text.is_empty() {
                command.default_verbs().next().map_or("", |(_, v)| v.name.as_str())
            } else {
                verb_text
            };
            DispatchError::NoMatchingSignature(name.to_string())
        })?;

    let call = bind(verb, signature, &args)?;
    log::debug!(
        "Resolved {command_name} {} to signature {signature}",
        verb.name
    );
    Ok(Resolved { verb, call })
}

/// Whether `args` satisfies `verb`'s signature.
///
/// A parameter counts as matched when its name (or flag alias) is present,
/// or when it is an optional flag. The verb matches if every parameter is
/// matched and no extra arguments were given, or if the shortfall is no
/// larger than the verb's optional flag count.
pub fn signature_matches(verb: &Verb, args: &Arguments) -> bool {
    let operands = verb.operands.iter().filter(|o| args.contains(&o.name)).count();
    let flags = verb
        .flags
        .iter()
        .filter(|f| f.optional || flag_value(f, args).is_some())
        .count();
    let matched = operands + flags;
    let params = verb.param_count();
    let optional = verb.optional_flag_count();

    (matched == params && matched == args.len())
        || (optional > 0 && params.saturating_sub(matched) <= optional)
}

fn flag_value<'a>(flag: &Flag, args: &'a Arguments) -> Option<&'a str> {
    args.iter().find(|(k, _)| flag.is_named(k)).map(|(_, v)| v)
}

fn bind(verb: &Verb, signature: usize, args: &Arguments) -> Result<BoundCall, DispatchError> {
    // A flag given by both its name and its alias is a repeat.
    if let Some(flag) = verb
        .flags
        .iter()
        .find(|f| args.iter().filter(|(k, _)| f.is_named(k)).count() > 1)
    {
        return Err(DispatchError::DuplicateArgument(flag.name.clone()));
    }

    let mut params = Vec::with_capacity(verb.param_count());

    for operand in &verb.operands {
        let raw = args.get(&operand.name).unwrap_or_default();
        let value = coerce(raw, &operand.value_type).strict().ok_or_else(|| {
            DispatchError::ConversionFailure {
                operand: operand.name.clone(),
                value: raw.to_string(),
                type_name: operand.value_type.name().to_string(),
            }
        })?;
        params.push(BoundParam {
            name: operand.name.clone(),
            position: operand.position,
            value,
        });
    }

    for flag in &verb.flags {
        let set = match flag_value(flag, args) {
            None => false,
            Some("") => true,
            Some(raw) => coerce_bool(raw),
        };
        params.push(BoundParam {
            name: flag.name.clone(),
            position: flag.position,
            value: Value::Bool(set),
        });
    }

    params.sort_by_key(|p| p.position);
    Ok(BoundCall {
        verb: verb.name.clone(),
        signature,
        params,
    })
}
