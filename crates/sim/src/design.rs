//! The design registry: flat node stores, elaboration API and wiring
//!
//! All IR nodes of a design live in dense registries indexed by typed
//! handles. Subscriber lists (which behavior or code node wakes up on which
//! signal edge) and owner back-references are plain handle lists computed
//! during elaboration, so the hierarchy stays a tree and the wiring graph
//! never owns anything.
//!
//! A `Design` is immutable once simulation starts; all mutable run state
//! lives in the engine.

use crate::ir::{
    BehaviorId, Block, CodeId, Edge, Event, Expr, InstanceId, ScopeId, SignalId, SystemTId,
};
use crate::ports::PortAccess;
use tracing::debug;
use volt_core::Type;

/// A behavior or external-code node subscribed to a signal edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscriber {
    Behavior(BehaviorId),
    Code(CodeId),
}

/// Owner back-reference for hierarchical naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    System(SystemTId),
    Scope(ScopeId),
    Instance(InstanceId),
    Behavior(BehaviorId),
}

/// A node that can be given an owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef {
    Signal(SignalId),
    Scope(ScopeId),
    Behavior(BehaviorId),
    Instance(InstanceId),
}

/// The callback of an external-code node. It runs on the scheduler thread
/// during propagation with port-level access to the simulation state. The
/// design is shared with every worker thread, hence the marker bounds.
pub type CodeHook = Box<dyn FnMut(&mut PortAccess<'_>) + Send + Sync>;

pub(crate) struct SignalNode {
    pub name: String,
    pub typ: Type,
    pub owner: Option<Owner>,
    pub init: Option<Expr>,
    pub any: Vec<Subscriber>,
    pub pos: Vec<Subscriber>,
    pub neg: Vec<Subscriber>,
}

pub(crate) struct BehaviorNode {
    pub events: Vec<Event>,
    pub block: Option<Block>,
    pub timed: bool,
    pub owner: Option<Owner>,
}

pub(crate) struct CodeNode {
    pub events: Vec<Event>,
    pub hook: Option<CodeHook>,
}

pub(crate) struct ScopeNode {
    pub name: String,
    pub owner: Option<Owner>,
    pub inners: Vec<SignalId>,
    pub scopes: Vec<ScopeId>,
    pub instances: Vec<InstanceId>,
    pub behaviors: Vec<BehaviorId>,
    pub codes: Vec<CodeId>,
}

pub(crate) struct SystemNode {
    pub name: String,
    pub inputs: Vec<SignalId>,
    pub outputs: Vec<SignalId>,
    pub inouts: Vec<SignalId>,
    pub scope: Option<ScopeId>,
}

pub(crate) struct InstanceNode {
    pub name: String,
    pub owner: Option<Owner>,
    pub systems: Vec<SystemTId>,
}

/// The elaborated design: every IR node of the simulated hardware.
#[derive(Default)]
pub struct Design {
    pub(crate) signals: Vec<SignalNode>,
    pub(crate) behaviors: Vec<BehaviorNode>,
    pub(crate) codes: Vec<CodeNode>,
    pub(crate) scopes: Vec<ScopeNode>,
    pub(crate) systems: Vec<SystemNode>,
    pub(crate) instances: Vec<InstanceNode>,
    /// Timed behaviors in registration order; each gets a worker thread.
    pub(crate) timed: Vec<BehaviorId>,
}

impl Design {
    pub fn new() -> Design {
        Design::default()
    }

    /// Registers a signal, assigning the next dense id.
    pub fn add_signal(&mut self, name: impl Into<String>, typ: Type) -> SignalId {
        let id = SignalId(self.signals.len() as u32);
        let name = name.into();
        debug!(signal = %name, id = id.as_u64(), width = typ.width(), "registering signal");
        self.signals.push(SignalNode {
            name,
            typ,
            owner: None,
            init: None,
            any: Vec::new(),
            pos: Vec::new(),
            neg: Vec::new(),
        });
        id
    }

    /// Registers a behavior. Timed behaviors additionally join the timed
    /// list and get their own worker thread in multi-threaded runs.
    pub fn add_behavior(&mut self, timed: bool) -> BehaviorId {
        let id = BehaviorId(self.behaviors.len() as u32);
        self.behaviors.push(BehaviorNode {
            events: Vec::new(),
            block: None,
            timed,
            owner: None,
        });
        if timed {
            debug!(behavior = id.as_u64(), "registering timed behavior");
            self.timed.push(id);
        }
        id
    }

    /// Registers an external-code node with its callback.
    pub fn add_code(&mut self, hook: CodeHook) -> CodeId {
        let id = CodeId(self.codes.len() as u32);
        self.codes.push(CodeNode {
            events: Vec::new(),
            hook: Some(hook),
        });
        id
    }

    pub fn add_scope(&mut self, name: impl Into<String>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(ScopeNode {
            name: name.into(),
            owner: None,
            inners: Vec::new(),
            scopes: Vec::new(),
            instances: Vec::new(),
            behaviors: Vec::new(),
            codes: Vec::new(),
        });
        id
    }

    pub fn add_system(&mut self, name: impl Into<String>) -> SystemTId {
        let id = SystemTId(self.systems.len() as u32);
        self.systems.push(SystemNode {
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            inouts: Vec::new(),
            scope: None,
        });
        id
    }

    pub fn add_instance(&mut self, name: impl Into<String>) -> InstanceId {
        let id = InstanceId(self.instances.len() as u32);
        self.instances.push(InstanceNode {
            name: name.into(),
            owner: None,
            systems: Vec::new(),
        });
        id
    }

    /// Attaches an event to a behavior's sensitivity list and wires the
    /// signal's subscriber list for the matching edge.
    pub fn add_behavior_event(&mut self, behavior: BehaviorId, edge: Edge, signal: SignalId) {
        self.behaviors[behavior.index()]
            .events
            .push(Event { edge, signal });
        self.subscribe(signal, edge, Subscriber::Behavior(behavior));
    }

    /// Attaches an event to a code node's sensitivity list and wires the
    /// signal's subscriber list for the matching edge.
    pub fn add_code_event(&mut self, code: CodeId, edge: Edge, signal: SignalId) {
        self.codes[code.index()].events.push(Event { edge, signal });
        self.subscribe(signal, edge, Subscriber::Code(code));
    }

    fn subscribe(&mut self, signal: SignalId, edge: Edge, sub: Subscriber) {
        let node = &mut self.signals[signal.index()];
        match edge {
            Edge::Any => node.any.push(sub),
            Edge::Pos => node.pos.push(sub),
            Edge::Neg => node.neg.push(sub),
        }
    }

    pub fn add_system_input(&mut self, system: SystemTId, signal: SignalId) {
        self.systems[system.index()].inputs.push(signal);
        self.set_owner(NodeRef::Signal(signal), Owner::System(system));
    }

    pub fn add_system_output(&mut self, system: SystemTId, signal: SignalId) {
        self.systems[system.index()].outputs.push(signal);
        self.set_owner(NodeRef::Signal(signal), Owner::System(system));
    }

    pub fn add_system_inout(&mut self, system: SystemTId, signal: SignalId) {
        self.systems[system.index()].inouts.push(signal);
        self.set_owner(NodeRef::Signal(signal), Owner::System(system));
    }

    pub fn add_scope_inner(&mut self, scope: ScopeId, signal: SignalId) {
        self.scopes[scope.index()].inners.push(signal);
        self.set_owner(NodeRef::Signal(signal), Owner::Scope(scope));
    }

    pub fn add_scope_scope(&mut self, scope: ScopeId, inner: ScopeId) {
        self.scopes[scope.index()].scopes.push(inner);
        self.set_owner(NodeRef::Scope(inner), Owner::Scope(scope));
    }

    pub fn add_scope_behavior(&mut self, scope: ScopeId, behavior: BehaviorId) {
        self.scopes[scope.index()].behaviors.push(behavior);
        self.set_owner(NodeRef::Behavior(behavior), Owner::Scope(scope));
    }

    pub fn add_scope_instance(&mut self, scope: ScopeId, instance: InstanceId) {
        self.scopes[scope.index()].instances.push(instance);
        self.set_owner(NodeRef::Instance(instance), Owner::Scope(scope));
    }

    pub fn add_scope_code(&mut self, scope: ScopeId, code: CodeId) {
        self.scopes[scope.index()].codes.push(code);
    }

    pub fn add_instance_system(&mut self, instance: InstanceId, system: SystemTId) {
        self.instances[instance.index()].systems.push(system);
    }

    pub fn set_owner(&mut self, node: NodeRef, owner: Owner) {
        match node {
            NodeRef::Signal(id) => self.signals[id.index()].owner = Some(owner),
            NodeRef::Scope(id) => self.scopes[id.index()].owner = Some(owner),
            NodeRef::Behavior(id) => self.behaviors[id.index()].owner = Some(owner),
            NodeRef::Instance(id) => self.instances[id.index()].owner = Some(owner),
        }
    }

    pub fn set_system_scope(&mut self, system: SystemTId, scope: ScopeId) {
        self.systems[system.index()].scope = Some(scope);
        self.scopes[scope.index()].owner = Some(Owner::System(system));
    }

    pub fn set_behavior_block(&mut self, behavior: BehaviorId, block: Block) {
        self.behaviors[behavior.index()].block = Some(block);
    }

    /// Sets a signal's initial value expression. It is evaluated into the
    /// signal's future value when the simulator is built, so the time-zero
    /// propagation publishes it as the first transition.
    pub fn set_signal_value(&mut self, signal: SignalId, expr: Expr) {
        self.signals[signal.index()].init = Some(expr);
    }

    pub fn signal_type(&self, signal: SignalId) -> Type {
        self.signals[signal.index()].typ
    }

    pub fn signal_name(&self, signal: SignalId) -> &str {
        &self.signals[signal.index()].name
    }

    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    pub(crate) fn timed_behaviors(&self) -> &[BehaviorId] {
        &self.timed
    }

    /// Looks a signal up by name, in registration order.
    pub fn find_signal(&self, name: &str) -> Option<SignalId> {
        self.signals
            .iter()
            .position(|s| s.name == name)
            .map(|i| SignalId(i as u32))
    }

    /// The `$`-separated hierarchical name of a signal, following the owner
    /// chain from the top.
    pub fn signal_full_name(&self, signal: SignalId) -> String {
        let mut parts = vec![self.signals[signal.index()].name.clone()];
        let mut owner = self.signals[signal.index()].owner;
        while let Some(o) = owner {
            match o {
                Owner::System(id) => {
                    parts.push(self.systems[id.index()].name.clone());
                    owner = None;
                }
                Owner::Scope(id) => {
                    parts.push(self.scopes[id.index()].name.clone());
                    owner = self.scopes[id.index()].owner;
                }
                Owner::Instance(id) => {
                    parts.push(self.instances[id.index()].name.clone());
                    owner = self.instances[id.index()].owner;
                }
                Owner::Behavior(id) => {
                    // Behaviors are anonymous; continue to their owner.
                    owner = self.behaviors[id.index()].owner;
                }
            }
        }
        parts.reverse();
        parts.retain(|p| !p.is_empty());
        parts.join("$")
    }
}
