//! Serial console command table.
//!
//! Commands are registered by name into a fixed-size table and dispatched
//! case-insensitively. Handlers write their output to any [`fmt::Write`], so
//! the same table serves the UART console on the board and a `String` in tests.
//!
//! ```rust
//! use rs_rmpp::cli::{default_console, StatusContext};
//! use rs_rmpp::state::OutputState;
//! use rs_rmpp::telemetry::StatusReport;
//!
//! let console = default_console();
//! let mut ctx = StatusContext {
//!     state: OutputState::new(),
//!     report: StatusReport { input_voltage_v: 12.0, duty: 0, cpu_temperature_c: 40.0 },
//! };
//! let mut out = String::new();
//! console.dispatch("rmpp", &mut ctx, &mut out).unwrap();
//! assert!(out.starts_with("Input Voltage   : 12.00 V"));
//! ```

use core::fmt;

use heapless::Vec as HVec;
use thiserror::Error;

use crate::state::OutputState;
use crate::telemetry::StatusReport;

/// Maximum number of whitespace-separated arguments per line.
pub const MAX_ARGS: usize = 8;

/// Command handler: context, arguments (without the name), output.
pub type Handler<C> = fn(&mut C, &[&str], &mut dyn fmt::Write) -> fmt::Result;

/// Console failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConsoleError {
    /// No room left in the command table.
    #[error("command table full")]
    TableFull,
    /// A command with this name is already registered.
    #[error("command already registered")]
    Duplicate,
    /// No command matches the first word of the line.
    #[error("unknown command")]
    UnknownCommand,
    /// The output sink refused a write.
    #[error("console output failed")]
    Output,
}

impl From<fmt::Error> for ConsoleError {
    fn from(_: fmt::Error) -> Self {
        ConsoleError::Output
    }
}

/// One table entry.
pub struct ConsoleCommand<C> {
    /// Command word.
    pub name: &'static str,
    /// One-line description shown by `?`.
    pub help: &'static str,
    /// Handler.
    pub handler: Handler<C>,
}

/// Fixed-capacity command table over context type `C`.
pub struct Console<C, const N: usize> {
    commands: HVec<ConsoleCommand<C>, N>,
}

impl<C, const N: usize> Default for Console<C, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, const N: usize> Console<C, N> {
    /// Empty table.
    pub const fn new() -> Self {
        Self {
            commands: HVec::new(),
        }
    }

    /// Add a command.
    pub fn register(
        &mut self,
        name: &'static str,
        help: &'static str,
        handler: Handler<C>,
    ) -> Result<(), ConsoleError> {
        if self.find(name).is_some() {
            return Err(ConsoleError::Duplicate);
        }
        self.commands
            .push(ConsoleCommand {
                name,
                help,
                handler,
            })
            .map_err(|_| ConsoleError::TableFull)
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Run one input line. Blank lines do nothing; `?` lists the commands.
    pub fn dispatch(
        &self,
        line: &str,
        ctx: &mut C,
        out: &mut dyn fmt::Write,
    ) -> Result<(), ConsoleError> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(());
        };
        if name == "?" {
            return self.list(out);
        }

        let command = self.find(name).ok_or(ConsoleError::UnknownCommand)?;
        let args: HVec<&str, MAX_ARGS> = words.take(MAX_ARGS).collect();
        (command.handler)(ctx, &args, out)?;
        Ok(())
    }

    fn find(&self, name: &str) -> Option<&ConsoleCommand<C>> {
        self.commands
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    fn list(&self, out: &mut dyn fmt::Write) -> Result<(), ConsoleError> {
        for c in &self.commands {
            writeln!(out, "{:<8}{}", c.name, c.help)?;
        }
        Ok(())
    }
}

// ============================================================================
// Built-in commands
// ============================================================================

/// Data available to the built-in commands.
#[derive(Debug, Clone, Copy)]
pub struct StatusContext {
    /// Output state at the time of the command.
    pub state: OutputState,
    /// Fresh sensor readings.
    pub report: StatusReport,
}

/// The console the control task runs: `RMPP` and `MODE`.
pub type StatusConsole = Console<StatusContext, 4>;

fn cmd_rmpp(ctx: &mut StatusContext, _args: &[&str], out: &mut dyn fmt::Write) -> fmt::Result {
    write!(out, "{}", ctx.report)
}

fn cmd_mode(ctx: &mut StatusContext, _args: &[&str], out: &mut dyn fmt::Write) -> fmt::Result {
    let state = &ctx.state;
    writeln!(
        out,
        "Output Mode     : {} ({})",
        state.mode(),
        state.direction()
    )?;
    writeln!(out, "Over Current    : {}", state.over_current())
}

/// Console with the built-in commands registered.
pub fn default_console() -> StatusConsole {
    let mut console = StatusConsole::new();
    // Capacity 4 with two entries cannot fail.
    let _ = console.register("RMPP", "print power pack status", cmd_rmpp);
    let _ = console.register("MODE", "print output mode", cmd_mode);
    console
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use crate::state::OutputMode;

    fn ctx() -> StatusContext {
        StatusContext {
            state: OutputState {
                mode: OutputMode::Off,
                ..OutputState::new()
            },
            report: StatusReport {
                input_voltage_v: 11.95,
                duty: 1200,
                cpu_temperature_c: 47.25,
            },
        }
    }

    #[test]
    fn rmpp_prints_report() {
        let mut out = String::new();
        default_console()
            .dispatch("RMPP", &mut ctx(), &mut out)
            .unwrap();
        assert_eq!(
            out,
            "Input Voltage   : 11.95 V\nOutput Duty     : 1200\nCPU Temperature : 47.25 deg\n"
        );
    }

    #[test]
    fn names_are_case_insensitive() {
        let mut out = String::new();
        default_console()
            .dispatch("  mode  ", &mut ctx(), &mut out)
            .unwrap();
        assert!(out.starts_with("Output Mode     : off (none)"));
    }

    #[test]
    fn question_mark_lists_commands() {
        let mut out = String::new();
        default_console().dispatch("?", &mut ctx(), &mut out).unwrap();
        assert!(out.contains("RMPP    print power pack status"));
        assert!(out.contains("MODE"));
    }

    #[test]
    fn unknown_and_blank_lines() {
        let mut out = String::new();
        let console = default_console();
        assert_eq!(
            console.dispatch("reboot", &mut ctx(), &mut out),
            Err(ConsoleError::UnknownCommand)
        );
        assert_eq!(console.dispatch("   ", &mut ctx(), &mut out), Ok(()));
        assert!(out.is_empty());
    }

    #[test]
    fn table_capacity_and_duplicates() {
        fn noop(_: &mut (), _: &[&str], _: &mut dyn fmt::Write) -> fmt::Result {
            Ok(())
        }
        let mut console: Console<(), 1> = Console::new();
        console.register("a", "", noop).unwrap();
        assert_eq!(console.register("A", "", noop), Err(ConsoleError::Duplicate));
        assert_eq!(console.register("b", "", noop), Err(ConsoleError::TableFull));
        assert_eq!(console.len(), 1);
    }
}
