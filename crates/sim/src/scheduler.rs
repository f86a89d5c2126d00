//! The timed-behavior scheduler
//!
//! Timed behaviors are cooperative workers. With a single timed behavior
//! the simulation runs entirely on the calling thread: each wait advances
//! that behavior's clock, propagates, and moves global time forward.
//!
//! With several timed behaviors, each one gets its own OS thread and the
//! calling thread becomes the scheduler. A barrier loop alternates between
//! the two sides: workers execute until every one of them reaches its next
//! wait, then the scheduler propagates signals, advances global time to the
//! earliest wake-up, and releases the workers due at that time. One mutex
//! guards the shared counters (`active`, `running`, `can_run`, global time
//! and the per-behavior wake-up times); two condition variables pair the
//! hand-offs. Workers own the simulation state only while executing, via a
//! lazily taken lock that is always released across waits.

use crate::design::Design;
use crate::engine::{self, SimState, update_signals};
use crate::error::SimError;
use crate::eval::{Control, execute_block};
use crate::ir::{BehaviorId, InstanceId, SignalId, SystemTId};
use crate::ports::PortAccess;
use crate::printer::{MutePrinter, OutMode, TextPrinter};
use crate::vcd::VcdPrinter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use tracing::debug;
use volt_core::ValuePool;
use volt_core::value::copy_value;

/// Default worker-thread stack size: 1MB.
/// Can be overridden via the VOLT_STACK_SIZE environment variable.
const DEFAULT_STACK_SIZE: usize = 0x100000;

/// Parse a stack size from an optional string value. Returns the parsed
/// size, or DEFAULT_STACK_SIZE if the value is missing, zero, or invalid.
/// Prints a warning to stderr for invalid values.
fn parse_stack_size(env_value: Option<String>) -> usize {
    match env_value {
        Some(val) => match val.parse::<usize>() {
            Ok(0) => {
                eprintln!(
                    "Warning: VOLT_STACK_SIZE=0 is invalid, using default {}",
                    DEFAULT_STACK_SIZE
                );
                DEFAULT_STACK_SIZE
            }
            Ok(size) => size,
            Err(_) => {
                eprintln!(
                    "Warning: VOLT_STACK_SIZE='{}' is not a valid number, using default {}",
                    val, DEFAULT_STACK_SIZE
                );
                DEFAULT_STACK_SIZE
            }
        },
        None => DEFAULT_STACK_SIZE,
    }
}

/// Run configuration.
pub struct SimConfig {
    /// Trace name; also the path prefix of the VCD file.
    pub name: String,
    pub out_mode: OutMode,
    /// Time limit in ps; `u64::MAX` means unlimited.
    pub limit_ps: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            name: "volt".to_string(),
            out_mode: OutMode::Standard,
            limit_ps: u64::MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimedPhase {
    Untimed,
    Running,
    Finished,
}

struct TimedState {
    active_time: u64,
    phase: TimedPhase,
}

/// Shared scheduler bookkeeping, all under one mutex.
struct Sched {
    /// Global simulation time in ps.
    time: u64,
    /// Timed behaviors currently executing at this time.
    active: usize,
    /// Timed behaviors that have not finished their block yet.
    running: usize,
    /// Whether released workers may execute.
    can_run: bool,
    /// Per-behavior wake-up state, indexed by behavior id.
    timed: Vec<TimedState>,
}

/// Everything a simulation run shares between the scheduler and the
/// workers.
pub(crate) struct SimCore {
    pub design: Design,
    pub state: Mutex<SimState>,
    sched: Mutex<Sched>,
    beh_cv: Condvar,
    sim_cv: Condvar,
    end: AtomicBool,
    limit: u64,
    single: bool,
}

impl SimCore {
    pub fn ended(&self) -> bool {
        self.end.load(Ordering::SeqCst)
    }

    /// Requests an orderly stop: workers exit at their next wait, the
    /// scheduler exits at its next barrier.
    pub fn request_end(&self) {
        self.end.store(true, Ordering::SeqCst);
        let _guard = self.lock_sched();
        self.beh_cv.notify_all();
        self.sim_cv.notify_all();
    }

    fn lock_sched(&self) -> MutexGuard<'_, Sched> {
        self.sched
            .lock()
            .expect("scheduler mutex poisoned: a behavior thread panicked")
    }

    fn now(&self) -> u64 {
        self.lock_sched().time
    }
}

/// The execution context of one thread: the scratch-value pool and a
/// lazily taken lock on the simulation state. The lock is held for the
/// whole burst between suspension points and always released across waits.
pub(crate) struct Exec<'a> {
    pub core: &'a SimCore,
    guard: Option<MutexGuard<'a, SimState>>,
    pub pool: ValuePool,
    /// Whether this worker is currently counted in `Sched::active`.
    counted: bool,
}

impl<'a> Exec<'a> {
    pub fn new(core: &'a SimCore) -> Exec<'a> {
        Exec {
            core,
            guard: None,
            pool: ValuePool::new(),
            counted: false,
        }
    }

    /// The simulation state, locking it on first use.
    pub fn state(&mut self) -> &mut SimState {
        if self.guard.is_none() {
            self.guard = Some(
                self.core
                    .state
                    .lock()
                    .expect("simulation state mutex poisoned: a behavior panicked"),
            );
        }
        &mut **self.guard.as_mut().unwrap()
    }

    /// The simulation state and the pool, borrowed apart.
    pub fn split(&mut self) -> (&mut SimState, &mut ValuePool) {
        if self.guard.is_none() {
            self.guard = Some(
                self.core
                    .state
                    .lock()
                    .expect("simulation state mutex poisoned: a behavior panicked"),
            );
        }
        let Exec { guard, pool, .. } = self;
        (&mut **guard.as_mut().unwrap(), pool)
    }

    /// Releases the simulation state lock.
    pub fn unlock(&mut self) {
        self.guard = None;
    }

    /// Suspends the executing behavior for `delay` ps. Returns `Terminate`
    /// when the simulation is ending and the behavior must unwind.
    pub fn wait(&mut self, delay: u64, behavior: Option<BehaviorId>) -> Control {
        let Some(b) = behavior else {
            panic!("time-wait outside a behavior context");
        };
        if !self.core.design.behaviors[b.index()].timed {
            panic!("time-wait in an untimed behavior");
        }
        if self.core.ended() {
            return Control::Terminate;
        }
        if self.core.single {
            self.wait_single(b, delay)
        } else {
            self.wait_multi(b, delay)
        }
    }

    /// Single-timed-behavior mode: propagate and advance time in place.
    fn wait_single(&mut self, b: BehaviorId, delay: u64) -> Control {
        let core = self.core;
        {
            let mut sched = core.lock_sched();
            sched.timed[b.index()].active_time += delay;
        }
        update_signals(self);
        let next = {
            let mut sched = core.lock_sched();
            let at = sched.timed[b.index()].active_time;
            sched.time = at;
            at
        };
        if next >= core.limit {
            core.request_end();
            return Control::Terminate;
        }
        if core.ended() {
            return Control::Terminate;
        }
        debug!(time = next, "time advanced");
        let design = &core.design;
        let state = self.state();
        state.fade_all();
        let SimState { printer, .. } = &mut *state;
        printer.print_time(design, next);
        Control::Continue
    }

    /// Multi-threaded mode: hand control to the scheduler and block until
    /// released at the behavior's wake-up time.
    fn wait_multi(&mut self, b: BehaviorId, delay: u64) -> Control {
        let core = self.core;
        // Never block while owning the simulation state.
        self.unlock();
        let mut sched = core.lock_sched();
        sched.timed[b.index()].active_time += delay;
        // A zero-delay wait that stays due at the current instant keeps the
        // barrier; releasing it would let the scheduler advance while this
        // worker still runs.
        if sched.can_run && sched.timed[b.index()].active_time <= sched.time {
            return Control::Continue;
        }
        assert!(sched.active > 0, "scheduler: active count underflow");
        sched.active -= 1;
        self.counted = false;
        core.sim_cv.notify_one();
        loop {
            if core.ended() {
                return Control::Terminate;
            }
            if sched.can_run && sched.timed[b.index()].active_time <= sched.time {
                break;
            }
            sched = core
                .beh_cv
                .wait(sched)
                .expect("scheduler condvar wait failed");
        }
        self.counted = true;
        Control::Continue
    }
}

/// Blocks a fresh worker until the scheduler first releases it. Returns
/// false when the simulation ended before that.
fn wait_for_activation(core: &SimCore, b: BehaviorId) -> bool {
    let mut sched = core.lock_sched();
    loop {
        if core.ended() {
            return false;
        }
        if sched.can_run && sched.timed[b.index()].active_time <= sched.time {
            return true;
        }
        sched = core
            .beh_cv
            .wait(sched)
            .expect("scheduler condvar wait failed");
    }
}

/// Body of a timed-behavior worker thread.
fn behavior_worker(core: &SimCore, b: BehaviorId) {
    debug!(behavior = b.as_u64(), "timed behavior thread started");
    let mut exec = Exec::new(core);
    if wait_for_activation(core, b) {
        exec.counted = true;
        let enabled = exec.state().behaviors[b.index()].enabled;
        if enabled {
            if let Some(block) = core.design.behaviors[b.index()].block.as_ref() {
                let _ = execute_block(&mut exec, block, Some(b));
            }
        }
        exec.unlock();
    }
    let counted = exec.counted;
    {
        let mut sched = core.lock_sched();
        if counted {
            assert!(sched.active > 0, "scheduler: active count underflow");
            sched.active -= 1;
        }
        sched.running -= 1;
        sched.timed[b.index()].phase = TimedPhase::Finished;
    }
    core.sim_cv.notify_one();
    debug!(behavior = b.as_u64(), "timed behavior finished");
}

/// A ready-to-run simulation: the elaborated design plus its run state.
pub struct Simulator {
    core: Arc<SimCore>,
}

impl Simulator {
    /// Builds the run state: evaluates initial-value expressions into the
    /// signals' future values, sets up the selected printer (writing the
    /// VCD header in VCD mode) and enables the top system's behaviors.
    pub fn new(mut design: Design, top: SystemTId, config: SimConfig) -> Result<Simulator, SimError> {
        let mut state = SimState::new(&mut design, Box::new(MutePrinter));

        // Initial values land in the future value; the time-zero touch
        // publishes them as the first transitions.
        let mut pool = ValuePool::new();
        for i in 0..design.signals.len() {
            let Some(expr) = design.signals[i].init.as_ref() else {
                continue;
            };
            pool.save_pos();
            let v = crate::eval::calc_expression(&design, &state, &mut pool, expr);
            let idx = crate::eval::materialize(&mut pool, v);
            copy_value(pool.value(idx), &mut state.signals[i].f_value);
            pool.restore_pos();
        }

        state.printer = match config.out_mode {
            OutMode::Standard => Box::new(TextPrinter),
            OutMode::Mute => Box::new(MutePrinter),
            OutMode::Vcd => Box::new(VcdPrinter::create(
                &config.name,
                &design,
                top,
                &state.signals,
            )?),
        };

        engine::set_enable_system(&design, &mut state, top, true);

        let timed = design
            .behaviors
            .iter()
            .map(|node| TimedState {
                active_time: 0,
                phase: if node.timed {
                    TimedPhase::Running
                } else {
                    TimedPhase::Untimed
                },
            })
            .collect();
        let single = design.timed.len() <= 1;
        let core = SimCore {
            design,
            state: Mutex::new(state),
            sched: Mutex::new(Sched {
                time: 0,
                active: 0,
                running: 0,
                can_run: false,
                timed,
            }),
            beh_cv: Condvar::new(),
            sim_cv: Condvar::new(),
            end: AtomicBool::new(false),
            limit: config.limit_ps,
            single,
        };
        Ok(Simulator {
            core: Arc::new(core),
        })
    }

    /// Runs the simulation to completion: until every timed behavior
    /// finishes, the time limit is reached, or a terminate statement
    /// executes. Returns immediately on a second call.
    pub fn run(&mut self) {
        if self.core.ended() {
            return;
        }
        if self.core.single {
            self.run_single();
        } else {
            self.run_multi();
        }
        self.core.end.store(true, Ordering::SeqCst);
        debug!(time = self.core.now(), "simulation finished");
    }

    /// Synchronous regime: at most one timed behavior, no worker threads.
    fn run_single(&self) {
        let core = &*self.core;
        let mut exec = Exec::new(core);
        update_signals(&mut exec);
        exec.state().touch_all();
        if let Some(&b) = core.design.timed.first() {
            let enabled = exec.state().behaviors[b.index()].enabled;
            if enabled {
                if let Some(block) = core.design.behaviors[b.index()].block.as_ref() {
                    let _ = execute_block(&mut exec, block, Some(b));
                }
            }
        }
        // Flush writes made after the last wait.
        update_signals(&mut exec);
    }

    /// Multi-threaded regime: one worker per timed behavior plus the
    /// barrier loop on this thread.
    fn run_multi(&self) {
        let core = &*self.core;
        let stack_size = parse_stack_size(std::env::var("VOLT_STACK_SIZE").ok());

        {
            let mut sched = core.lock_sched();
            sched.running = core.design.timed.len();
            sched.can_run = false;
        }
        let mut handles = Vec::new();
        for &b in core.design.timed.iter() {
            let arc = Arc::clone(&self.core);
            let handle = thread::Builder::new()
                .name(format!("volt-beh-{}", b.as_u64()))
                .stack_size(stack_size)
                .spawn(move || behavior_worker(&arc, b))
                .expect("failed to spawn behavior thread");
            handles.push(handle);
        }

        loop {
            // Wait until every released behavior reached its next wait.
            {
                let mut sched = core.lock_sched();
                while sched.active > 0 {
                    sched = core
                        .sim_cv
                        .wait(sched)
                        .expect("scheduler condvar wait failed");
                }
                sched.can_run = false;
            }

            // Propagate; untimed behaviors and code callbacks execute here.
            {
                let mut exec = Exec::new(core);
                update_signals(&mut exec);
                // Publish initial values once the time-zero round settles.
                if core.now() == 0 {
                    exec.state().touch_all();
                }
            }
            if core.ended() {
                break;
            }
            {
                let sched = core.lock_sched();
                if sched.running == 0 {
                    break;
                }
            }

            // Advance global time to the earliest wake-up.
            let next = {
                let mut sched = core.lock_sched();
                let next = sched
                    .timed
                    .iter()
                    .filter(|t| t.phase == TimedPhase::Running)
                    .map(|t| t.active_time)
                    .min();
                if let Some(t) = next {
                    sched.time = t;
                }
                next
            };
            let Some(next) = next else {
                break;
            };
            if next >= core.limit {
                break;
            }
            debug!(time = next, "time advanced");
            {
                let mut exec = Exec::new(core);
                let design = &core.design;
                let state = exec.state();
                state.fade_all();
                let SimState { printer, .. } = &mut *state;
                printer.print_time(design, next);
            }

            // Release the behaviors due at this time.
            {
                let mut sched = core.lock_sched();
                let Sched { timed, active, .. } = &mut *sched;
                for t in timed.iter() {
                    if t.phase == TimedPhase::Running && t.active_time == next {
                        *active += 1;
                    }
                }
                sched.can_run = true;
                core.beh_cv.notify_all();
            }
        }

        // Stop every worker still blocked at a wait, then collect them.
        core.end.store(true, Ordering::SeqCst);
        {
            let _guard = core.lock_sched();
            core.beh_cv.notify_all();
        }
        for handle in handles {
            let _ = handle.join();
        }
    }

    /// Current simulated time in ps.
    pub fn time(&self) -> u64 {
        self.core.now()
    }

    pub fn design(&self) -> &Design {
        &self.core.design
    }

    /// Reconfigures a system instance to its `idx`-th system type.
    pub fn configure(&self, instance: InstanceId, idx: usize) {
        let mut state = self
            .core
            .state
            .lock()
            .expect("simulation state mutex poisoned: a behavior panicked");
        engine::configure(&self.core.design, &mut state, instance, idx);
    }

    /// Runs a closure with port-level access to the simulation state.
    pub fn with_ports<R>(&self, f: impl FnOnce(&mut PortAccess<'_>) -> R) -> R {
        let mut state = self
            .core
            .state
            .lock()
            .expect("simulation state mutex poisoned: a behavior panicked");
        let mut ports = PortAccess::new(&self.core.design, &mut state);
        f(&mut ports)
    }

    /// Resolves a signal handle by name.
    pub fn find_port(&self, name: &str) -> Result<SignalId, SimError> {
        self.with_ports(|p| p.find_port(name))
    }

    /// Reads a port's committed value as an unsigned word.
    pub fn read_port(&self, port: SignalId) -> u64 {
        self.with_ports(|p| p.read_port(port))
    }

    /// Writes a port through the sequential path; the write publishes at
    /// the next propagation.
    pub fn write_port(&self, port: SignalId, data: u64) {
        self.with_ports(|p| p.write_port(port, data));
    }

    /// Runs signal propagation to fixed point on the calling thread.
    pub fn propagate(&self) {
        let mut exec = Exec::new(&self.core);
        update_signals(&mut exec);
    }
}
