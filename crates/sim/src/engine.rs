//! The signal/event engine: run state, write paths and propagation
//!
//! Each signal carries a committed *current* value and a tentative *future*
//! value. Parallel writes only touch the future value; the propagation loop
//! commits them, emits trace records and activates subscribers until no
//! queue holds work. Sequential writes commit immediately and only enqueue
//! for activation.
//!
//! The `fading` flag implements multi-driver high-impedance defaults: at
//! the start of every time step a signal accepts any driver, including `z`;
//! after the first write of the step, `z` positions no longer override.

use crate::design::{Design, Subscriber};
use crate::eval::{Control, execute_block};
use crate::ir::{CodeId, InstanceId, SignalId, SystemTId};
use crate::ports::PortAccess;
use crate::printer::Printer;
use crate::scheduler::Exec;
use std::collections::VecDeque;
use tracing::trace;
use volt_core::value::{copy_value, copy_value_no_z};
use volt_core::{Type, Value, range};

pub(crate) struct SignalState {
    pub c_value: Value,
    pub f_value: Value,
    pub fading: bool,
}

impl SignalState {
    fn new(typ: Type) -> SignalState {
        SignalState {
            c_value: Value::undefined(typ),
            f_value: Value::undefined(typ),
            fading: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ExecFlags {
    pub enabled: bool,
    pub activated: bool,
}

/// All mutable simulation state, guarded by the core's state mutex.
pub(crate) struct SimState {
    pub signals: Vec<SignalState>,
    pub behaviors: Vec<ExecFlags>,
    pub codes: Vec<ExecFlags>,
    pub code_hooks: Vec<Option<crate::design::CodeHook>>,
    pub instance_current: Vec<usize>,
    pub touched: VecDeque<SignalId>,
    pub touched_seq: VecDeque<SignalId>,
    pub activated: VecDeque<Subscriber>,
    pub printer: Box<dyn Printer>,
}

impl SimState {
    pub fn new(design: &mut Design, printer: Box<dyn Printer>) -> SimState {
        let signals = design
            .signals
            .iter()
            .map(|node| SignalState::new(node.typ))
            .collect();
        let behaviors = design
            .behaviors
            .iter()
            .map(|_| ExecFlags {
                enabled: false,
                activated: false,
            })
            .collect();
        let codes = design
            .codes
            .iter()
            .map(|_| ExecFlags {
                enabled: true,
                activated: false,
            })
            .collect();
        // Callbacks need mutable state access at run time, so they move out
        // of the immutable design into the run state.
        let code_hooks = design
            .codes
            .iter_mut()
            .map(|node| node.hook.take())
            .collect();
        let instance_current = design.instances.iter().map(|_| 0).collect();
        SimState {
            signals,
            behaviors,
            codes,
            code_hooks,
            instance_current,
            touched: VecDeque::new(),
            touched_seq: VecDeque::new(),
            activated: VecDeque::new(),
            printer,
        }
    }

    /// Enqueues a signal on the parallel touched queue; the signal stops
    /// fading for the rest of the step.
    pub fn touch(&mut self, signal: SignalId) {
        self.touched.push_back(signal);
        self.signals[signal.index()].fading = false;
    }

    /// Commits the future value and enqueues on the sequential queue, but
    /// only when the value actually changed.
    pub fn touch_seq(&mut self, signal: SignalId) {
        let s = &mut self.signals[signal.index()];
        if s.c_value.same_content(&s.f_value) {
            return;
        }
        let SignalState {
            c_value,
            f_value,
            fading,
        } = s;
        copy_value(f_value, c_value);
        *fading = false;
        self.touched_seq.push_back(signal);
    }

    /// Parallel write: the value lands in the future value only.
    pub fn transmit(&mut self, value: &Value, signal: SignalId) {
        let s = &mut self.signals[signal.index()];
        if s.fading {
            copy_value(value, &mut s.f_value);
        } else {
            copy_value_no_z(value, &mut s.f_value);
        }
        self.touch(signal);
    }

    /// Sequential write: the value lands in the future value and commits
    /// immediately when it differs from the current value.
    pub fn transmit_seq(&mut self, value: &Value, signal: SignalId) {
        let s = &mut self.signals[signal.index()];
        if s.fading {
            copy_value(value, &mut s.f_value);
        } else {
            copy_value_no_z(value, &mut s.f_value);
        }
        self.touch_seq(signal);
    }

    /// Parallel write into an element range of the signal.
    pub fn transmit_range(
        &mut self,
        value: &Value,
        signal: SignalId,
        first: i64,
        last: i64,
        base: Type,
    ) {
        let s = &mut self.signals[signal.index()];
        if s.fading {
            range::write_range(value, first, last, base, &mut s.f_value);
        } else {
            range::write_range_no_z(value, first, last, base, &mut s.f_value);
        }
        self.touch(signal);
    }

    /// Sequential write into an element range of the signal.
    pub fn transmit_range_seq(
        &mut self,
        value: &Value,
        signal: SignalId,
        first: i64,
        last: i64,
        base: Type,
    ) {
        let s = &mut self.signals[signal.index()];
        if s.fading {
            range::write_range(value, first, last, base, &mut s.f_value);
        } else {
            range::write_range_no_z(value, first, last, base, &mut s.f_value);
        }
        self.touch_seq(signal);
    }

    fn activate(&mut self, sub: Subscriber) {
        match sub {
            Subscriber::Behavior(b) => self.behaviors[b.index()].activated = true,
            Subscriber::Code(c) => self.codes[c.index()].activated = true,
        }
        self.activated.push_back(sub);
    }

    /// Marks every signal fading again; called when global time advances.
    pub fn fade_all(&mut self) {
        for s in &mut self.signals {
            s.fading = true;
        }
    }

    /// Enqueues every signal on the parallel queue; used once at time zero
    /// so initial values publish.
    pub fn touch_all(&mut self) {
        for i in 0..self.signals.len() {
            self.touch(SignalId(i as u32));
        }
    }
}

/// Activates the subscribers of a committed signal according to the new
/// current level: `any` always, `pos` when non-zero, `neg` when zero.
fn activate_subscribers(design: &Design, state: &mut SimState, signal: SignalId) {
    let node = &design.signals[signal.index()];
    for &sub in &node.any {
        state.activate(sub);
    }
    let zero = state.signals[signal.index()].c_value.is_zero();
    if !zero {
        for &sub in &node.pos {
            state.activate(sub);
        }
    } else {
        for &sub in &node.neg {
            state.activate(sub);
        }
    }
}

/// Runs signal propagation to fixed point: commits parallel writes, records
/// transitions, and executes the untimed behaviors and code callbacks they
/// wake up, which may enqueue further writes.
pub(crate) fn update_signals(exec: &mut Exec<'_>) {
    let core = exec.core;
    let design = &core.design;
    loop {
        {
            let state = exec.state();
            if state.touched.is_empty() && state.touched_seq.is_empty() {
                break;
            }
        }

        // Parallel model: commit future values that changed.
        while let Some(signal) = {
            let state = exec.state();
            state.touched.pop_front()
        } {
            let state = exec.state();
            let i = signal.index();
            {
                let s = &state.signals[i];
                if s.c_value.same_content(&s.f_value) {
                    continue;
                }
            }
            trace!(signal = i, "committing signal transition");
            let SimState {
                signals, printer, ..
            } = &mut *state;
            printer.print_signal(design, signal, &signals[i].f_value);
            let SignalState {
                c_value, f_value, ..
            } = &mut signals[i];
            copy_value(f_value, c_value);
            activate_subscribers(design, state, signal);
        }

        // Sequential model: values are committed already, only record and
        // activate.
        while let Some(signal) = {
            let state = exec.state();
            state.touched_seq.pop_front()
        } {
            let state = exec.state();
            let i = signal.index();
            let SimState {
                signals, printer, ..
            } = &mut *state;
            printer.print_signal(design, signal, &signals[i].f_value);
            activate_subscribers(design, state, signal);
        }

        // Execute whatever the transitions woke up.
        while let Some(sub) = {
            let state = exec.state();
            state.activated.pop_front()
        } {
            match sub {
                Subscriber::Behavior(b) => {
                    let flags = exec.state().behaviors[b.index()];
                    if flags.enabled && flags.activated {
                        if let Some(block) = design.behaviors[b.index()].block.as_ref() {
                            if let Control::Terminate = execute_block(exec, block, Some(b)) {
                                return;
                            }
                        }
                        exec.state().behaviors[b.index()].activated = false;
                    }
                }
                Subscriber::Code(c) => {
                    if run_code(exec, design, c) {
                        exec.state().codes[c.index()].activated = false;
                    }
                }
            }
        }
    }
}

/// Runs an external-code callback with port access. Returns false when the
/// node was not enabled or activated.
fn run_code(exec: &mut Exec<'_>, design: &Design, code: CodeId) -> bool {
    let flags = exec.state().codes[code.index()];
    if !(flags.enabled && flags.activated) {
        return false;
    }
    let mut hook = exec.state().code_hooks[code.index()].take();
    if let Some(h) = hook.as_mut() {
        let state = exec.state();
        let mut ports = PortAccess::new(design, state);
        h(&mut ports);
    }
    if let Some(h) = hook {
        exec.state().code_hooks[code.index()] = Some(h);
    }
    true
}

/// Sets the enable status of every behavior reachable from a system type,
/// recursing through sub-scopes and through the currently configured system
/// of each instance.
pub(crate) fn set_enable_system(
    design: &Design,
    state: &mut SimState,
    system: SystemTId,
    status: bool,
) {
    if let Some(scope) = design.systems[system.index()].scope {
        set_enable_scope(design, state, scope, status);
    }
}

fn set_enable_scope(design: &Design, state: &mut SimState, scope: crate::ir::ScopeId, status: bool) {
    let node = &design.scopes[scope.index()];
    for &b in &node.behaviors {
        state.behaviors[b.index()].enabled = status;
    }
    for &s in &node.scopes {
        set_enable_scope(design, state, s, status);
    }
    for &i in &node.instances {
        let current = state.instance_current[i.index()];
        if let Some(&sys) = design.instances[i.index()].systems.get(current) {
            set_enable_system(design, state, sys, status);
        }
    }
}

/// Reconfigures a system instance: selects the target system type, enables
/// its behaviors and disables the alternatives.
pub(crate) fn configure(design: &Design, state: &mut SimState, instance: InstanceId, idx: usize) {
    state.instance_current[instance.index()] = idx;
    let systems = &design.instances[instance.index()].systems;
    for (j, &sys) in systems.iter().enumerate() {
        if j != idx {
            set_enable_system(design, state, sys, false);
        }
    }
    if let Some(&sys) = systems.get(idx) {
        set_enable_system(design, state, sys, true);
    }
}
