//! Console commands shipped with the HELM binary.

use std::sync::{Arc, Mutex};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, bail};
use helm_console::{
    AccessLevel, CommandDescriptor, Flag, Operand, Registry, RegistryError, ValueType, Verb,
};
use helm_types::ConsoleConfig;

/// Number of relay outputs on the controller.
pub const RELAY_COUNT: usize = 8;

/// Register the `sys` and `admin` dispatchers with their commands.
pub fn register_all(reg: &mut Registry, config: &ConsoleConfig) -> Result<(), RegistryError> {
    let sys = reg.register_dispatcher(
        "sys",
        "System information, diagnostics, and I/O control",
        AccessLevel::Operator,
    )?;
    sys.add_command(Arc::new(echo_command()), None)?;
    sys.add_command(Arc::new(clock_command(Instant::now())), None)?;
    sys.add_command(Arc::new(math_command()), None)?;
    sys.add_command(Arc::new(relay_command(Arc::new(Mutex::new([false; RELAY_COUNT])))), None)?;

    let admin = reg.register_dispatcher("admin", "Console administration", AccessLevel::Administrator)?;
    admin.on_command_exception(|e| log::error!("admin command failed: {e}"));
    admin.add_command(Arc::new(log_command()), None)?;
    admin.add_command(Arc::new(config_command(config.clone())), None)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// echo
// ---------------------------------------------------------------------------

fn echo_command() -> CommandDescriptor {
    CommandDescriptor::new("echo", "Print text back to the console")
        .alias("e")
        .verb(
            Verb::describe("say", "Print the given text")
                .default_verb()
                .operand(Operand::new("", "Text to print", ValueType::String))
                .flag(Flag::new("upper", "Print in upper case").alias('u').optional())
                .sample("echo \"hello there\"", "Print 'hello there'")
                .sample("echo say hi -u", "Print 'HI'")
                .handle(|call, out| {
                    let text = call.get_str("").unwrap_or_default();
                    if call.get_bool("upper").unwrap_or(false) {
                        out.write_line(&text.to_uppercase());
                    } else {
                        out.write_line(text);
                    }
                    Ok(())
                }),
        )
}

// ---------------------------------------------------------------------------
// clock
// ---------------------------------------------------------------------------

fn clock_command(started: Instant) -> CommandDescriptor {
    CommandDescriptor::new("clock", "Show system time and uptime")
        .verb(
            Verb::describe("uptime", "Seconds since the console started")
                .default_verb()
                .handle(move |_, out| {
                    out.write_line(&format!("up {}s", started.elapsed().as_secs()));
                    Ok(())
                }),
        )
        .verb(
            Verb::describe("now", "Current time as seconds since the UNIX epoch").handle(|_, out| {
                let secs = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
                out.write_line(&secs.to_string());
                Ok(())
            }),
        )
}

// ---------------------------------------------------------------------------
// math
// ---------------------------------------------------------------------------

fn math_command() -> CommandDescriptor {
    CommandDescriptor::new("math", "Integer and floating point arithmetic")
        .verb(
            Verb::describe("add", "Add two integers")
                .operand(Operand::new("a", "First addend", ValueType::Int32))
                .operand(Operand::new("b", "Second addend", ValueType::Int32))
                .sample("math add -a 2 -b 3", "Print 5")
                .handle(|call, out| {
                    let a = call.get_i32("a").unwrap_or(0);
                    let b = call.get_i32("b").unwrap_or(0);
                    let sum = a.checked_add(b).ok_or_else(|| anyhow!("overflow"))?;
                    out.write_line(&sum.to_string());
                    Ok(())
                }),
        )
        .verb(
            Verb::describe("add", "Add three integers")
                .operand(Operand::new("a", "First addend", ValueType::Int32))
                .operand(Operand::new("b", "Second addend", ValueType::Int32))
                .operand(Operand::new("c", "Third addend", ValueType::Int32))
                .handle(|call, out| {
                    let sum = ["a", "b", "c"]
                        .iter()
                        .map(|n| i64::from(call.get_i32(n).unwrap_or(0)))
                        .sum::<i64>();
                    out.write_line(&sum.to_string());
                    Ok(())
                }),
        )
        .verb(
            Verb::describe("div", "Divide two numbers")
                .operand(Operand::new("a", "Dividend", ValueType::Double))
                .operand(Operand::new("b", "Divisor", ValueType::Double))
                .handle(|call, out| {
                    let a = call.get_f64("a").unwrap_or(0.0);
                    let b = call.get_f64("b").unwrap_or(0.0);
                    if b == 0.0 {
                        bail!("division by zero");
                    }
                    out.write_line(&format!("{}", a / b));
                    Ok(())
                }),
        )
}

// ---------------------------------------------------------------------------
// relay
// ---------------------------------------------------------------------------

type RelayBank = Arc<Mutex<[bool; RELAY_COUNT]>>;

fn relay_command(bank: RelayBank) -> CommandDescriptor {
    let show_bank = Arc::clone(&bank);
    CommandDescriptor::new("relay", "Control relay outputs")
        .alias("rl")
        .verb(
            Verb::describe("show", "List every relay and its state")
                .default_verb()
                .handle(move |_, out| {
                    let relays = show_bank
                        .lock()
                        .map_err(|_| anyhow!("relay state is poisoned"))?;
                    for (i, on) in relays.iter().enumerate() {
                        out.write_line(&format!("relay {}: {}", i + 1, if *on { "on" } else { "off" }));
                    }
                    Ok(())
                }),
        )
        .verb(
            Verb::describe("set", "Switch one relay")
                .alias("s")
                .operand(Operand::new("", "Relay number (1-8)", ValueType::UInt16))
                .operand(Operand::new("state", "on or off", ValueType::Bool))
                .sample("relay set 3 --state on", "Close relay 3")
                .handle(move |call, out| {
                    let channel = usize::from(call.get_u16("").unwrap_or(0));
                    if channel == 0 || channel > RELAY_COUNT {
                        bail!("relay {channel} does not exist (1-{RELAY_COUNT})");
                    }
                    let state = call.get_bool("state").unwrap_or(false);
                    let mut relays = bank
                        .lock()
                        .map_err(|_| anyhow!("relay state is poisoned"))?;
                    relays[channel - 1] = state;
                    log::info!("relay {channel} switched {}", if state { "on" } else { "off" });
                    out.write_line(&format!("relay {channel}: {}", if state { "on" } else { "off" }));
                    Ok(())
                }),
        )
}

// ---------------------------------------------------------------------------
// log
// ---------------------------------------------------------------------------

fn log_command() -> CommandDescriptor {
    CommandDescriptor::new("log", "Inspect or change the log level")
        .verb(
            Verb::describe("show", "Print the current maximum log level")
                .default_verb()
                .handle(|_, out| {
                    out.write_line(&log::max_level().to_string());
                    Ok(())
                }),
        )
        .verb(
            Verb::describe("level", "Set the maximum log level")
                .operand(Operand::new(
                    "",
                    "off, error, warn, info, debug, or trace",
                    ValueType::parsed::<log::LevelFilter>(),
                ))
                .sample("log level debug", "Enable debug logging")
                .handle(|call, out| {
                    let level = call
                        .get::<log::LevelFilter>("")
                        .copied()
                        .ok_or_else(|| anyhow!("missing level"))?;
                    log::set_max_level(level);
                    out.write_line(&format!("log level set to {level}"));
                    Ok(())
                }),
        )
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn config_command(config: ConsoleConfig) -> CommandDescriptor {
    CommandDescriptor::new("config", "Show the console configuration").verb(
        Verb::describe("show", "Print the active configuration as TOML")
            .default_verb()
            .handle(move |_, out| {
                out.write_response(&config.to_toml_string()?);
                Ok(())
            }),
    )
}
