//! Host-side port access
//!
//! The view of the simulation that host scripts and external-code
//! callbacks get: resolve a signal handle by name, read its committed
//! value, write through the sequential path. Writes enqueue the signal for
//! the next propagation round exactly like a sequential transmit inside a
//! behavior.

use crate::design::Design;
use crate::engine::SimState;
use crate::error::SimError;
use crate::ir::SignalId;
use volt_core::Value;

/// Port-level access to a running simulation.
pub struct PortAccess<'a> {
    design: &'a Design,
    state: &'a mut SimState,
}

impl<'a> PortAccess<'a> {
    pub(crate) fn new(design: &'a Design, state: &'a mut SimState) -> PortAccess<'a> {
        PortAccess { design, state }
    }

    /// Resolves a signal handle by name, in registration order.
    pub fn find_port(&self, name: &str) -> Result<SignalId, SimError> {
        self.design
            .find_signal(name)
            .ok_or_else(|| SimError::UnknownPort(name.to_string()))
    }

    /// The committed value of a port as an unsigned word.
    pub fn read_port(&self, port: SignalId) -> u64 {
        self.state.signals[port.index()].c_value.to_u64()
    }

    /// A clone of the committed value of a port.
    pub fn read_port_value(&self, port: SignalId) -> Value {
        self.state.signals[port.index()].c_value.clone()
    }

    /// True when the port's tentative future value equals its committed
    /// value, i.e. propagation has settled for this signal.
    pub fn is_settled(&self, port: SignalId) -> bool {
        let s = &self.state.signals[port.index()];
        s.c_value.same_content(&s.f_value)
    }

    /// Writes a word to a port through the sequential path.
    pub fn write_port(&mut self, port: SignalId, data: u64) {
        let value = Value::numeric(self.design.signal_type(port), data);
        self.state.transmit_seq(&value, port);
    }

    /// Writes a four-state value to a port through the sequential path.
    pub fn write_port_value(&mut self, port: SignalId, value: &Value) {
        self.state.transmit_seq(value, port);
    }
}
