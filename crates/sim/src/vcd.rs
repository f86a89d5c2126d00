//! VCD waveform output
//!
//! Writes a `<name>.vcd` file: a declarative header mirroring the design
//! hierarchy, a `$dumpvars` block with the initial values, then `#<time>`
//! markers and value-change records as propagation commits transitions.
//!
//! Identifiers are the base-94 printable-ASCII encoding (`'!'..'~'`) of the
//! dense signal id, least-significant digit first, so they are unique and
//! stable across runs of the same design. Signal ids are assigned at
//! registration and never reused. `:` in names is sanitized to `$` for
//! waveform tooling.

use crate::design::Design;
use crate::engine::SignalState;
use crate::error::SimError;
use crate::ir::{BehaviorId, ScopeId, SignalId, SystemTId};
use crate::printer::Printer;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use volt_core::Value;

/// The time scale unit in ps.
const TIMEUNIT: u64 = 1;

/// Encodes a signal id as a VCD identifier, least-significant digit first.
pub(crate) fn vcd_id(id: u64) -> String {
    let mut out = String::new();
    let mut id = id;
    loop {
        out.push(((id % 94) as u8 + b'!') as char);
        id /= 94;
        if id == 0 {
            break;
        }
    }
    out
}

/// Replaces `:` with `$` so hierarchical host names stay legal VCD words.
pub(crate) fn sanitize(name: &str) -> String {
    name.replace(':', "$")
}

fn format_value(value: &Value) -> String {
    let width = value.width();
    let mut out = String::new();
    if width > 1 {
        out.push('b');
    }
    for i in (0..width).rev() {
        out.push(value.sym(i) as char);
    }
    if width > 1 {
        out.push(' ');
    }
    out
}

pub(crate) struct VcdPrinter {
    out: BufWriter<File>,
}

impl VcdPrinter {
    /// Creates `<name>.vcd` and writes the full header, including the
    /// hierarchy of the top system and the initial value dump.
    pub fn create(
        name: &str,
        design: &Design,
        top: SystemTId,
        signals: &[SignalState],
    ) -> Result<VcdPrinter, SimError> {
        let mut path = PathBuf::from(name);
        let file_name = match path.file_name() {
            Some(f) => format!("{}.vcd", f.to_string_lossy()),
            None => "sim.vcd".to_string(),
        };
        path.set_file_name(file_name);
        let file = File::create(&path)?;
        let mut printer = VcdPrinter {
            out: BufWriter::new(file),
        };
        printer.write_header(design, top, signals)?;
        Ok(printer)
    }

    fn write_header(
        &mut self,
        design: &Design,
        top: SystemTId,
        signals: &[SignalState],
    ) -> Result<(), SimError> {
        let epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        writeln!(self.out, "$date")?;
        writeln!(self.out, "   unix time {epoch}")?;
        writeln!(self.out, "$end")?;
        writeln!(self.out, "$version")?;
        writeln!(self.out, "   Generated from Volt simulator")?;
        writeln!(self.out, "$end")?;
        writeln!(self.out, "$comment")?;
        writeln!(self.out, "   All times in ps")?;
        writeln!(self.out, "$end")?;
        writeln!(self.out, "$timescale 1ps $end")?;

        self.write_system(design, top)?;
        writeln!(self.out, "$enddefinitions $end")?;

        writeln!(self.out, "$dumpvars")?;
        for (i, s) in signals.iter().enumerate() {
            writeln!(
                self.out,
                "{}{}",
                format_value(&s.c_value),
                vcd_id(i as u64)
            )?;
        }
        writeln!(self.out, "$end")?;
        self.out.flush()?;
        Ok(())
    }

    fn write_var(&mut self, design: &Design, signal: SignalId) -> Result<(), SimError> {
        writeln!(
            self.out,
            "$var wire {} {} {} $end",
            design.signal_type(signal).width(),
            vcd_id(signal.as_u64()),
            sanitize(design.signal_name(signal)),
        )?;
        Ok(())
    }

    fn write_system(&mut self, design: &Design, system: SystemTId) -> Result<(), SimError> {
        let node = &design.systems[system.index()];
        writeln!(self.out, "$scope module {} $end", sanitize(&node.name))?;
        self.write_system_content(design, system)?;
        writeln!(self.out, "$upscope $end")?;
        Ok(())
    }

    fn write_system_content(&mut self, design: &Design, system: SystemTId) -> Result<(), SimError> {
        let node = &design.systems[system.index()];
        for &sig in node
            .inputs
            .iter()
            .chain(node.outputs.iter())
            .chain(node.inouts.iter())
        {
            self.write_var(design, sig)?;
        }
        if let Some(scope) = node.scope {
            self.write_scope_content(design, scope)?;
        }
        Ok(())
    }

    fn write_scope_content(&mut self, design: &Design, scope: ScopeId) -> Result<(), SimError> {
        let node = &design.scopes[scope.index()];
        for &sig in &node.inners {
            self.write_var(design, sig)?;
        }
        for &inst in &node.instances {
            let inst_node = &design.instances[inst.index()];
            writeln!(self.out, "$scope module {} $end", sanitize(&inst_node.name))?;
            if let Some(&sys) = inst_node.systems.first() {
                self.write_system_content(design, sys)?;
            }
            writeln!(self.out, "$upscope $end")?;
        }
        for &sub in &node.scopes {
            self.write_scope(design, sub)?;
        }
        for &beh in &node.behaviors {
            self.write_behavior_block(design, beh)?;
        }
        Ok(())
    }

    fn write_scope(&mut self, design: &Design, scope: ScopeId) -> Result<(), SimError> {
        let node = &design.scopes[scope.index()];
        if node.inners.is_empty() && node.scopes.is_empty() && node.behaviors.is_empty() {
            return Ok(());
        }
        writeln!(self.out, "$scope module {} $end", sanitize(&node.name))?;
        self.write_scope_content(design, scope)?;
        writeln!(self.out, "$upscope $end")?;
        Ok(())
    }

    fn write_behavior_block(&mut self, design: &Design, behavior: BehaviorId) -> Result<(), SimError> {
        let Some(block) = design.behaviors[behavior.index()].block.as_ref() else {
            return Ok(());
        };
        if block.inners.is_empty() {
            return Ok(());
        }
        writeln!(self.out, "$scope module beh{} $end", behavior.as_u64())?;
        for &sig in &block.inners {
            self.write_var(design, sig)?;
        }
        writeln!(self.out, "$upscope $end")?;
        Ok(())
    }
}

impl Printer for VcdPrinter {
    fn print_time(&mut self, _design: &Design, time: u64) {
        let _ = writeln!(self.out, "#{}", time / TIMEUNIT);
        let _ = self.out.flush();
    }

    fn print_name(&mut self, design: &Design, signal: SignalId) {
        let _ = write!(self.out, "{}", sanitize(&design.signal_full_name(signal)));
    }

    fn print_value(&mut self, _design: &Design, value: &Value) {
        let _ = write!(self.out, "{}", format_value(value));
    }

    fn print_signal(&mut self, _design: &Design, signal: SignalId, value: &Value) {
        let _ = writeln!(self.out, "{}{}", format_value(value), vcd_id(signal.as_u64()));
    }

    // Print statements keep going to stdout in VCD mode, as with the text
    // printer.
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

impl Drop for VcdPrinter {
    fn drop(&mut self) {
        let _ = self.out.flush();
    }
}
