//! Synchronous handler invocation.
//!
//! Handlers run on the caller's thread. A returned error or a panic is
//! turned into a [`HandlerError`]; nothing escapes as an unwind.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use helm_types::ConsoleSink;

use crate::descriptor::Verb;
use crate::error::HandlerError;
use crate::resolver::BoundCall;

/// Run `verb`'s handler with a bound call.
pub fn invoke(verb: &Verb, call: &BoundCall, sink: &mut dyn ConsoleSink) -> Result<(), HandlerError> {
    let handler = &verb.handler;
    match panic::catch_unwind(AssertUnwindSafe(|| handler(call, sink))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(HandlerError::Failed(e)),
        Err(payload) => Err(HandlerError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
