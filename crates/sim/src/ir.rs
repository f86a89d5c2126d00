//! The simulation IR: statements, expressions, references and their
//! building blocks
//!
//! One sum type per category, dispatched by the tree evaluator. Nodes own
//! their children; signals and behaviors are referenced through dense
//! handles into the [`crate::design::Design`] registries, so the node trees
//! stay acyclic while the wiring graph (signal subscriber lists, owner
//! chains) lives in the registry.

use crate::error::SimError;
use volt_core::logic::ConcatDir;
use volt_core::{Type, Value, arith, logic};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub(crate) u32);

        impl $name {
            pub(crate) fn index(self) -> usize {
                self.0 as usize
            }

            /// The dense id assigned at registration.
            pub fn as_u64(self) -> u64 {
                self.0 as u64
            }
        }
    };
}

id_type!(
    /// Handle of a registered signal.
    SignalId
);
id_type!(
    /// Handle of a registered behavior.
    BehaviorId
);
id_type!(
    /// Handle of a registered external-code node.
    CodeId
);
id_type!(
    /// Handle of a registered scope.
    ScopeId
);
id_type!(
    /// Handle of a registered system type.
    SystemTId
);
id_type!(
    /// Handle of a registered system instance.
    InstanceId
);

/// The edge a subscriber is sensitive to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Any,
    Pos,
    Neg,
}

impl Edge {
    pub fn from_name(name: &str) -> Result<Edge, SimError> {
        match name {
            "anyedge" => Ok(Edge::Any),
            "posedge" => Ok(Edge::Pos),
            "negedge" => Ok(Edge::Neg),
            other => Err(SimError::InvalidEdge(other.to_string())),
        }
    }
}

/// A sensitivity-list entry: an edge on a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub edge: Edge,
    pub signal: SignalId,
}

/// Execution mode of a block: parallel transmits defer to the future value,
/// sequential transmits commit immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockMode {
    Par,
    Seq,
}

/// Delay units, converted to the simulator base unit (ps).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    S,
    Ms,
    Us,
    Ns,
    Ps,
}

impl TimeUnit {
    pub fn from_name(name: &str) -> Result<TimeUnit, SimError> {
        match name {
            "s" => Ok(TimeUnit::S),
            "ms" => Ok(TimeUnit::Ms),
            "us" => Ok(TimeUnit::Us),
            "ns" => Ok(TimeUnit::Ns),
            "ps" => Ok(TimeUnit::Ps),
            other => Err(SimError::InvalidTimeUnit(other.to_string())),
        }
    }

    /// A delay of `value` units, in ps.
    pub fn delay(self, value: u64) -> u64 {
        let factor: u64 = match self {
            TimeUnit::S => 1_000_000_000_000,
            TimeUnit::Ms => 1_000_000_000,
            TimeUnit::Us => 1_000_000,
            TimeUnit::Ns => 1_000,
            TimeUnit::Ps => 1,
        };
        value * factor
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    ReduceOr,
}

impl UnaryOp {
    pub fn from_symbol(sym: &str) -> Result<UnaryOp, SimError> {
        match sym {
            "~" => Ok(UnaryOp::Not),
            "-@" => Ok(UnaryOp::Neg),
            "|@" => Ok(UnaryOp::ReduceOr),
            other => Err(SimError::InvalidOperator(other.to_string())),
        }
    }

    pub fn apply(self, src: &Value, dst: &mut Value) {
        match self {
            UnaryOp::Not => logic::not_value(src, dst),
            UnaryOp::Neg => arith::neg_value(src, dst),
            UnaryOp::ReduceOr => logic::reduce_or_value(src, dst),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    /// C-style equality: undefined operands compare unequal.
    Eq,
    /// C-style inequality: undefined operands compare unequal.
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub fn from_symbol(sym: &str) -> Result<BinaryOp, SimError> {
        match sym {
            "+" => Ok(BinaryOp::Add),
            "-" => Ok(BinaryOp::Sub),
            "*" => Ok(BinaryOp::Mul),
            "/" => Ok(BinaryOp::Div),
            "%" => Ok(BinaryOp::Mod),
            "&" => Ok(BinaryOp::And),
            "|" => Ok(BinaryOp::Or),
            "^" => Ok(BinaryOp::Xor),
            "<<" => Ok(BinaryOp::Shl),
            ">>" => Ok(BinaryOp::Shr),
            "==" => Ok(BinaryOp::Eq),
            "!=" => Ok(BinaryOp::Ne),
            "<" => Ok(BinaryOp::Lt),
            "<=" => Ok(BinaryOp::Le),
            ">" => Ok(BinaryOp::Gt),
            ">=" => Ok(BinaryOp::Ge),
            other => Err(SimError::InvalidOperator(other.to_string())),
        }
    }

    pub fn apply(self, src0: &Value, src1: &Value, dst: &mut Value) {
        match self {
            BinaryOp::Add => arith::add_value(src0, src1, dst),
            BinaryOp::Sub => arith::sub_value(src0, src1, dst),
            BinaryOp::Mul => arith::mul_value(src0, src1, dst),
            BinaryOp::Div => arith::div_value(src0, src1, dst),
            BinaryOp::Mod => arith::mod_value(src0, src1, dst),
            BinaryOp::And => logic::and_value(src0, src1, dst),
            BinaryOp::Or => logic::or_value(src0, src1, dst),
            BinaryOp::Xor => logic::xor_value(src0, src1, dst),
            BinaryOp::Shl => arith::shift_left_value(src0, src1, dst),
            BinaryOp::Shr => arith::shift_right_value(src0, src1, dst),
            BinaryOp::Eq => arith::equal_value_c(src0, src1, dst),
            BinaryOp::Ne => arith::not_equal_value_c(src0, src1, dst),
            BinaryOp::Lt => arith::lesser_value(src0, src1, dst),
            BinaryOp::Le => arith::lesser_equal_value(src0, src1, dst),
            BinaryOp::Gt => arith::greater_value(src0, src1, dst),
            BinaryOp::Ge => arith::greater_equal_value(src0, src1, dst),
        }
    }
}

/// Left-hand targets of a transmit, also readable as expressions.
#[derive(Debug, Clone)]
pub enum Ref {
    Signal(SignalId),
    Index {
        typ: Type,
        index: Box<Expr>,
        target: Box<Ref>,
    },
    Range {
        typ: Type,
        first: Box<Expr>,
        last: Box<Expr>,
        target: Box<Ref>,
    },
    Concat {
        typ: Type,
        dir: ConcatDir,
        parts: Vec<Ref>,
    },
}

/// Expression nodes.
#[derive(Debug, Clone)]
pub enum Expr {
    Value(Value),
    /// A character string; only valid as a print argument.
    Str(String),
    Unary {
        op: UnaryOp,
        child: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Select {
        typ: Type,
        cond: Box<Expr>,
        choices: Vec<Expr>,
    },
    Concat {
        dir: ConcatDir,
        parts: Vec<Expr>,
    },
    Cast {
        to: Type,
        child: Box<Expr>,
    },
    Ref(Ref),
}

/// Statement nodes.
#[derive(Debug, Clone)]
pub enum Stmt {
    Transmit {
        left: Ref,
        right: Expr,
    },
    Print {
        args: Vec<Expr>,
    },
    HIf {
        cond: Expr,
        yes: Box<Stmt>,
        noifs: Vec<(Expr, Stmt)>,
        no: Option<Box<Stmt>>,
    },
    HCase {
        value: Expr,
        whens: Vec<(Expr, Stmt)>,
        default: Option<Box<Stmt>>,
    },
    TimeWait {
        delay_ps: u64,
    },
    /// Runs the body `count` times; a negative count loops forever.
    TimeRepeat {
        count: i64,
        body: Box<Stmt>,
    },
    TimeTerminate,
    Block(Block),
}

/// An ordered statement sequence with an execution mode and local signals.
#[derive(Debug, Clone)]
pub struct Block {
    pub mode: BlockMode,
    pub inners: Vec<SignalId>,
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(mode: BlockMode) -> Block {
        Block {
            mode,
            inners: Vec::new(),
            stmts: Vec::new(),
        }
    }
}

/// Statement and expression constructors, one per IR node kind. These are
/// the elaboration entry points used by host front-ends and tests.
pub mod build {
    use super::*;

    pub fn transmit(left: Ref, right: Expr) -> Stmt {
        Stmt::Transmit { left, right }
    }

    pub fn print(args: Vec<Expr>) -> Stmt {
        Stmt::Print { args }
    }

    pub fn time_wait(value: u64, unit: TimeUnit) -> Stmt {
        Stmt::TimeWait {
            delay_ps: unit.delay(value),
        }
    }

    pub fn time_repeat(count: i64, body: Stmt) -> Stmt {
        Stmt::TimeRepeat {
            count,
            body: Box::new(body),
        }
    }

    pub fn time_terminate() -> Stmt {
        Stmt::TimeTerminate
    }

    pub fn hif(cond: Expr, yes: Stmt, noifs: Vec<(Expr, Stmt)>, no: Option<Stmt>) -> Stmt {
        Stmt::HIf {
            cond,
            yes: Box::new(yes),
            noifs,
            no: no.map(Box::new),
        }
    }

    pub fn hcase(value: Expr, whens: Vec<(Expr, Stmt)>, default: Option<Stmt>) -> Stmt {
        Stmt::HCase {
            value,
            whens,
            default: default.map(Box::new),
        }
    }

    pub fn block(mode: BlockMode, stmts: Vec<Stmt>) -> Block {
        Block {
            mode,
            inners: Vec::new(),
            stmts,
        }
    }

    pub fn value_numeric(typ: Type, data: u64) -> Expr {
        Expr::Value(Value::numeric(typ, data))
    }

    pub fn value_bitstring(typ: Type, text: &str) -> Result<Expr, SimError> {
        Ok(Expr::Value(Value::bitstring(typ, text)?))
    }

    pub fn string_e(text: impl Into<String>) -> Expr {
        Expr::Str(text.into())
    }

    pub fn cast(to: Type, child: Expr) -> Expr {
        Expr::Cast {
            to,
            child: Box::new(child),
        }
    }

    pub fn unary(op: UnaryOp, child: Expr) -> Expr {
        Expr::Unary {
            op,
            child: Box::new(child),
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn select(typ: Type, cond: Expr, choices: Vec<Expr>) -> Expr {
        Expr::Select {
            typ,
            cond: Box::new(cond),
            choices,
        }
    }

    pub fn concat(dir: ConcatDir, parts: Vec<Expr>) -> Expr {
        Expr::Concat { dir, parts }
    }

    /// Reads a signal's current value.
    pub fn sig(signal: SignalId) -> Expr {
        Expr::Ref(Ref::Signal(signal))
    }

    /// Reads any reference as an expression.
    pub fn expr_ref(r: Ref) -> Expr {
        Expr::Ref(r)
    }

    pub fn sig_ref(signal: SignalId) -> Ref {
        Ref::Signal(signal)
    }

    pub fn ref_index(typ: Type, index: Expr, target: Ref) -> Ref {
        Ref::Index {
            typ,
            index: Box::new(index),
            target: Box::new(target),
        }
    }

    pub fn ref_range(typ: Type, first: Expr, last: Expr, target: Ref) -> Ref {
        Ref::Range {
            typ,
            first: Box::new(first),
            last: Box::new(last),
            target: Box::new(target),
        }
    }

    pub fn ref_concat(typ: Type, dir: ConcatDir, parts: Vec<Ref>) -> Ref {
        Ref::Concat { typ, dir, parts }
    }
}
