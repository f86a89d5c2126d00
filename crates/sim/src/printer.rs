//! The visualization interface and its plain-text implementations
//!
//! A printer observes the simulation: the time marker when global time
//! advances, every committed signal transition, and the output of print
//! statements. The record of operations mirrors the original printer table;
//! the trait object lives inside the simulation state so the engine can
//! drive it while holding the state lock.

use crate::design::Design;
use crate::ir::SignalId;
use volt_core::Value;

/// Output selection for a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutMode {
    /// Plain-text trace on stdout.
    Standard,
    /// No trace output; print statements still reach stdout.
    Mute,
    /// VCD waveform trace in `<name>.vcd`.
    Vcd,
}

/// The simulation trace interface.
pub trait Printer: Send {
    /// Global time advanced to `time` (in ps).
    fn print_time(&mut self, design: &Design, time: u64);

    /// Prints a signal's name.
    fn print_name(&mut self, design: &Design, signal: SignalId);

    /// Prints a bare value.
    fn print_value(&mut self, design: &Design, value: &Value);

    /// A committed transition: `signal` now carries `value`.
    fn print_signal(&mut self, design: &Design, signal: SignalId, value: &Value);

    /// Output of a print statement: a string argument.
    fn print_string(&mut self, design: &Design, text: &str);

    /// Output of a print statement: a signal name argument.
    fn print_string_name(&mut self, design: &Design, signal: SignalId);

    /// Output of a print statement: an expression argument's value.
    fn print_string_value(&mut self, design: &Design, value: &Value);
}

/// The default plain-text printer.
pub struct TextPrinter;

impl Printer for TextPrinter {
    fn print_time(&mut self, _design: &Design, time: u64) {
        println!("# {time}ps");
    }

    fn print_name(&mut self, design: &Design, signal: SignalId) {
        print!("{}", design.signal_full_name(signal));
    }

    fn print_value(&mut self, _design: &Design, value: &Value) {
        print!("{value}");
    }

    fn print_signal(&mut self, design: &Design, signal: SignalId, value: &Value) {
        println!("{}: {}", design.signal_full_name(signal), value);
    }

    fn print_string(&mut self, _design: &Design, text: &str) {
        print!("{text}");
    }

    fn print_string_name(&mut self, design: &Design, signal: SignalId) {
        print!("{}", design.signal_full_name(signal));
    }

    fn print_string_value(&mut self, _design: &Design, value: &Value) {
        print!("{value}");
    }
}

/// Discards the trace; print statements still go to stdout.
pub struct MutePrinter;

impl Printer for MutePrinter {
    fn print_time(&mut self, _design: &Design, _time: u64) {}

    fn print_name(&mut self, _design: &Design, _signal: SignalId) {}

    fn print_value(&mut self, _design: &Design, _value: &Value) {}

    fn print_signal(&mut self, _design: &Design, _signal: SignalId, _value: &Value) {}

    fn print_string(&mut self, _design: &Design, text: &str) {
        print!("{text}");
    }

    fn print_string_name(&mut self, design: &Design, signal: SignalId) {
        print!("{}", design.signal_full_name(signal));
    }

    fn print_string_value(&mut self, _design: &Design, value: &Value) {
        print!("{value}");
    }
}
