//! Volt Sim: the event-driven simulator of the Volt hardware description
//! language
//!
//! A host front-end elaborates a design (system types, scopes, signals,
//! behaviors, statements) through the [`Design`] builder API, then hands
//! it to a [`Simulator`] which executes the event-driven simulation and
//! emits a waveform trace.
//!
//! # Modules
//!
//! - `ir`: the IR node sums (statements, expressions, references) and their
//!   constructors
//! - `design`: flat node registries, elaboration API and subscriber wiring
//! - `eval`: the tree-walking evaluator
//! - `engine`: signal run state, write paths and fixed-point propagation
//! - `scheduler`: the timed-behavior scheduler (single-thread and barrier
//!   regimes) and the public [`Simulator`] facade
//! - `printer` / `vcd`: the trace interface with text, mute and VCD
//!   implementations
//! - `ports`: host-side port access for scripts and code callbacks
//!
//! # Example
//!
//! ```
//! use volt_core::Type;
//! use volt_sim::ir::{BlockMode, TimeUnit, build};
//! use volt_sim::{Design, OutMode, SimConfig, Simulator};
//!
//! let mut design = Design::new();
//! let top = design.add_system("top");
//! let scope = design.add_scope("main");
//! design.set_system_scope(top, scope);
//!
//! let out = design.add_signal("out", Type::bit());
//! design.add_scope_inner(scope, out);
//!
//! let driver = design.add_behavior(true);
//! design.add_scope_behavior(scope, driver);
//! design.set_behavior_block(
//!     driver,
//!     build::block(
//!         BlockMode::Par,
//!         vec![
//!             build::transmit(build::sig_ref(out), build::value_numeric(Type::bit(), 1)),
//!             build::time_wait(10, TimeUnit::Ps),
//!         ],
//!     ),
//! );
//!
//! let mut sim = Simulator::new(
//!     design,
//!     top,
//!     SimConfig {
//!         name: "example".into(),
//!         out_mode: OutMode::Mute,
//!         limit_ps: 1_000,
//!     },
//! )
//! .unwrap();
//! sim.run();
//! let port = sim.find_port("out").unwrap();
//! assert_eq!(sim.read_port(port), 1);
//! ```

pub mod design;
pub(crate) mod engine;
pub mod error;
pub(crate) mod eval;
pub mod ir;
pub mod ports;
pub mod printer;
pub mod scheduler;
pub(crate) mod vcd;

pub use design::{CodeHook, Design, NodeRef, Owner, Subscriber};
pub use error::SimError;
pub use ir::{
    BehaviorId, Block, BlockMode, CodeId, Edge, Event, Expr, InstanceId, Ref, ScopeId, SignalId,
    Stmt, SystemTId, TimeUnit,
};
pub use ports::PortAccess;
pub use printer::{MutePrinter, OutMode, Printer, TextPrinter};
pub use scheduler::{SimConfig, Simulator};
