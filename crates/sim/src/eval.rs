//! The tree evaluator: expression calculation and statement execution
//!
//! Expressions evaluate through the thread's value pool: every operator
//! node reserves its destination slot before evaluating its children, so a
//! destination always sits below its operands and the pool can hand out the
//! destination mutably together with read access to the operand slots.
//! Signal reads and literals are returned by reference and never copied
//! during evaluation.
//!
//! Statements execute against the simulation state held by the `Exec`
//! context. Control flow unwinds cooperatively through [`Control`]:
//! `time-terminate` (and an externally requested stop) terminates the
//! executing behavior instead of killing the process.

use crate::design::Design;
use crate::engine::SimState;
use crate::ir::{BehaviorId, Block, BlockMode, Expr, Ref, Stmt};
use crate::scheduler::Exec;
use volt_core::logic::{assign_value, cast_value, concat_value, select_value};
use volt_core::value::SYM_X;
use volt_core::{Type, Value, ValuePool, arith, range};

/// How a statement finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Control {
    Continue,
    Terminate,
}

/// The result of an expression evaluation: either a pool slot or a value
/// borrowed from the design (literals) or the simulation state (signal
/// reads).
#[derive(Clone, Copy)]
pub(crate) enum Val<'v> {
    Slot(usize),
    Ext(&'v Value),
}

/// Copies a borrowed result into a fresh pool slot so the borrow on the
/// simulation state can end before a write.
pub(crate) fn materialize(pool: &mut ValuePool, val: Val<'_>) -> usize {
    match val {
        Val::Slot(i) => i,
        Val::Ext(v) => {
            let i = pool.get();
            assign_value(v, pool.value_mut(i));
            i
        }
    }
}

impl Ref {
    /// The type of the referenced storage; element granularity for range
    /// accesses comes from this type's base width.
    pub(crate) fn typ(&self, design: &Design) -> Type {
        match self {
            Ref::Signal(id) => design.signal_type(*id),
            Ref::Index { typ, .. } => *typ,
            Ref::Range { typ, .. } => *typ,
            Ref::Concat { typ, .. } => *typ,
        }
    }
}

/// Evaluates an expression tree. The returned value lives either in the
/// pool (above the caller's watermark) or behind one of the input borrows.
pub(crate) fn calc_expression<'v>(
    design: &'v Design,
    state: &'v SimState,
    pool: &mut ValuePool,
    expr: &'v Expr,
) -> Val<'v> {
    match expr {
        Expr::Value(v) => Val::Ext(v),
        Expr::Str(_) => panic!("evaluator: string literal in a hardware expression"),
        Expr::Ref(r) => calc_ref_read(design, state, pool, r),
        Expr::Unary { op, child } => {
            let dst = pool.get();
            let mark = pool.pos();
            let cv = calc_expression(design, state, pool, child);
            {
                let (d, view) = pool.dst_split(dst);
                let c = match cv {
                    Val::Slot(i) => view.slot(i),
                    Val::Ext(v) => v,
                };
                op.apply(c, d);
            }
            pool.set_pos(mark);
            Val::Slot(dst)
        }
        Expr::Binary { op, left, right } => {
            let dst = pool.get();
            let mark = pool.pos();
            let lv = calc_expression(design, state, pool, left);
            let rv = calc_expression(design, state, pool, right);
            {
                let (d, view) = pool.dst_split(dst);
                let l = match lv {
                    Val::Slot(i) => view.slot(i),
                    Val::Ext(v) => v,
                };
                let r = match rv {
                    Val::Slot(i) => view.slot(i),
                    Val::Ext(v) => v,
                };
                op.apply(l, r, d);
            }
            pool.set_pos(mark);
            Val::Slot(dst)
        }
        Expr::Select { typ, cond, choices } => {
            let dst = pool.get();
            let mark = pool.pos();
            let cond_v = calc_expression(design, state, pool, cond);
            let vals: Vec<Val<'_>> = choices
                .iter()
                .map(|c| calc_expression(design, state, pool, c))
                .collect();
            {
                let (d, view) = pool.dst_split(dst);
                let c = match cond_v {
                    Val::Slot(i) => view.slot(i),
                    Val::Ext(v) => v,
                };
                let refs: Vec<&Value> = vals
                    .iter()
                    .map(|v| match v {
                        Val::Slot(i) => view.slot(*i),
                        Val::Ext(r) => *r,
                    })
                    .collect();
                select_value(c, &refs, *typ, d);
            }
            pool.set_pos(mark);
            Val::Slot(dst)
        }
        Expr::Concat { dir, parts } => {
            let dst = pool.get();
            let mark = pool.pos();
            let vals: Vec<Val<'_>> = parts
                .iter()
                .map(|p| calc_expression(design, state, pool, p))
                .collect();
            {
                let (d, view) = pool.dst_split(dst);
                let refs: Vec<&Value> = vals
                    .iter()
                    .map(|v| match v {
                        Val::Slot(i) => view.slot(*i),
                        Val::Ext(r) => *r,
                    })
                    .collect();
                concat_value(*dir, &refs, d);
            }
            pool.set_pos(mark);
            Val::Slot(dst)
        }
        Expr::Cast { to, child } => {
            let dst = pool.get();
            let mark = pool.pos();
            let cv = calc_expression(design, state, pool, child);
            {
                let (d, view) = pool.dst_split(dst);
                let c = match cv {
                    Val::Slot(i) => view.slot(i),
                    Val::Ext(v) => v,
                };
                cast_value(c, *to, d);
            }
            pool.set_pos(mark);
            Val::Slot(dst)
        }
    }
}

/// Reads a reference as an expression.
fn calc_ref_read<'v>(
    design: &'v Design,
    state: &'v SimState,
    pool: &mut ValuePool,
    r: &'v Ref,
) -> Val<'v> {
    match r {
        Ref::Signal(id) => Val::Ext(&state.signals[id.index()].c_value),
        Ref::Index { typ, index, target } => {
            let dst = pool.get();
            let mark = pool.pos();
            let (defined, idx) = eval_index(design, state, pool, index);
            let tv = calc_ref_read(design, state, pool, target);
            {
                let base = target.typ(design);
                let (d, view) = pool.dst_split(dst);
                let t = match tv {
                    Val::Slot(i) => view.slot(i),
                    Val::Ext(v) => v,
                };
                if defined {
                    range::read_range(t, idx, idx, base, d);
                } else {
                    d.set_bits(*typ, SYM_X);
                }
            }
            pool.set_pos(mark);
            Val::Slot(dst)
        }
        Ref::Range {
            typ,
            first,
            last,
            target,
        } => {
            let dst = pool.get();
            let mark = pool.pos();
            let (fd, first_i) = eval_index(design, state, pool, first);
            let (ld, last_i) = eval_index(design, state, pool, last);
            let tv = calc_ref_read(design, state, pool, target);
            {
                let base = target.typ(design);
                let (d, view) = pool.dst_split(dst);
                let t = match tv {
                    Val::Slot(i) => view.slot(i),
                    Val::Ext(v) => v,
                };
                if fd && ld {
                    range::read_range(t, first_i, last_i, base, d);
                } else {
                    d.set_bits(*typ, SYM_X);
                }
            }
            pool.set_pos(mark);
            Val::Slot(dst)
        }
        Ref::Concat { dir, parts, .. } => {
            let dst = pool.get();
            let mark = pool.pos();
            let vals: Vec<Val<'_>> = parts
                .iter()
                .map(|p| calc_ref_read(design, state, pool, p))
                .collect();
            {
                let (d, view) = pool.dst_split(dst);
                let refs: Vec<&Value> = vals
                    .iter()
                    .map(|v| match v {
                        Val::Slot(i) => view.slot(*i),
                        Val::Ext(r) => *r,
                    })
                    .collect();
                concat_value(*dir, &refs, d);
            }
            pool.set_pos(mark);
            Val::Slot(dst)
        }
    }
}

/// Evaluates an index expression to `(is_defined, value)`.
fn eval_index(
    design: &Design,
    state: &SimState,
    pool: &mut ValuePool,
    expr: &Expr,
) -> (bool, i64) {
    pool.save_pos();
    let v = calc_expression(design, state, pool, expr);
    let out = {
        let r = match v {
            Val::Slot(i) => pool.value(i),
            Val::Ext(x) => x,
        };
        (r.is_defined(), r.to_u64() as i64)
    };
    pool.restore_pos();
    out
}

/// Evaluates an expression as a branch condition: true when defined and
/// non-zero. Scratch is released before the branch executes.
fn eval_condition(design: &Design, state: &SimState, pool: &mut ValuePool, expr: &Expr) -> bool {
    pool.save_pos();
    let v = calc_expression(design, state, pool, expr);
    let taken = {
        let r = match v {
            Val::Slot(i) => pool.value(i),
            Val::Ext(x) => x,
        };
        r.is_defined() && r.to_u64() != 0
    };
    pool.restore_pos();
    taken
}

/// Transmits the pool value at `rhs_idx` into a reference target,
/// decomposing reference concats by member widths.
fn transmit_to_ref(
    design: &Design,
    state: &mut SimState,
    pool: &mut ValuePool,
    left: &Ref,
    rhs_idx: usize,
    mode: BlockMode,
) {
    match left {
        Ref::Signal(id) => {
            if mode == BlockMode::Seq {
                state.transmit_seq(pool.value(rhs_idx), *id);
            } else {
                state.transmit(pool.value(rhs_idx), *id);
            }
        }
        Ref::Index { index, target, .. } => {
            let Ref::Signal(sig) = target.as_ref() else {
                panic!("transmit: nested reference target is not a signal");
            };
            let (defined, idx) = eval_index(design, &*state, pool, index);
            if !defined {
                return;
            }
            let base = design.signal_type(*sig);
            if mode == BlockMode::Seq {
                state.transmit_range_seq(pool.value(rhs_idx), *sig, idx, idx, base);
            } else {
                state.transmit_range(pool.value(rhs_idx), *sig, idx, idx, base);
            }
        }
        Ref::Range {
            first,
            last,
            target,
            ..
        } => {
            let Ref::Signal(sig) = target.as_ref() else {
                panic!("transmit: nested reference target is not a signal");
            };
            let (fd, first_i) = eval_index(design, &*state, pool, first);
            let (ld, last_i) = eval_index(design, &*state, pool, last);
            if !(fd && ld) {
                return;
            }
            let base = design.signal_type(*sig);
            if mode == BlockMode::Seq {
                state.transmit_range_seq(pool.value(rhs_idx), *sig, first_i, last_i, base);
            } else {
                state.transmit_range(pool.value(rhs_idx), *sig, first_i, last_i, base);
            }
        }
        Ref::Concat { dir, parts, .. } => {
            // Slice the right-hand value low bits first; the member taking
            // the lowest bits depends on the concat direction.
            let ordered: Vec<&Ref> = match dir {
                volt_core::logic::ConcatDir::Little => parts.iter().collect(),
                volt_core::logic::ConcatDir::Big => parts.iter().rev().collect(),
            };
            let mut pos: i64 = 0;
            for part in ordered {
                let width = part.typ(design).width() as i64;
                let tmp = pool.get();
                {
                    let (src, dst) = pool.pair_mut(rhs_idx, tmp);
                    range::read_range(src, pos, pos + width - 1, Type::bit(), dst);
                }
                transmit_to_ref(design, state, pool, part, tmp, mode);
                pool.free();
                pos += width;
            }
        }
    }
}

/// Executes a statement. `mode` is the enclosing block's execution mode;
/// `behavior` is the active behavior context, required at suspension
/// points.
pub(crate) fn execute_statement(
    exec: &mut Exec<'_>,
    stmt: &Stmt,
    mode: BlockMode,
    behavior: Option<BehaviorId>,
) -> Control {
    let core = exec.core;
    let design = &core.design;
    match stmt {
        Stmt::Transmit { left, right } => {
            let (state, pool) = exec.split();
            pool.save_pos();
            let rhs = calc_expression(design, &*state, pool, right);
            let rhs_idx = materialize(pool, rhs);
            transmit_to_ref(design, state, pool, left, rhs_idx, mode);
            pool.restore_pos();
            Control::Continue
        }
        Stmt::Print { args } => {
            let (state, pool) = exec.split();
            for arg in args {
                match arg {
                    Expr::Str(text) => state.printer.print_string(design, text),
                    expr => {
                        pool.save_pos();
                        let v = calc_expression(design, &*state, pool, expr);
                        let idx = materialize(pool, v);
                        state.printer.print_string_value(design, pool.value(idx));
                        pool.restore_pos();
                    }
                }
            }
            Control::Continue
        }
        Stmt::HIf {
            cond,
            yes,
            noifs,
            no,
        } => {
            let chosen: Option<&Stmt> = {
                let (state, pool) = exec.split();
                if eval_condition(design, &*state, pool, cond) {
                    Some(yes.as_ref())
                } else {
                    let mut found = None;
                    for (subcond, substmt) in noifs {
                        if eval_condition(design, &*state, pool, subcond) {
                            found = Some(substmt);
                            break;
                        }
                    }
                    found.or(no.as_deref())
                }
            };
            match chosen {
                Some(stmt) => execute_statement(exec, stmt, mode, behavior),
                None => Control::Continue,
            }
        }
        Stmt::HCase {
            value,
            whens,
            default,
        } => {
            let chosen: Option<&Stmt> = {
                let (state, pool) = exec.split();
                pool.save_pos();
                let scrutinee = calc_expression(design, &*state, pool, value);
                let val_idx = materialize(pool, scrutinee);
                let mut found = None;
                let mut cmp = Value::default();
                for (match_expr, stmt) in whens {
                    pool.save_pos();
                    let mv = calc_expression(design, &*state, pool, match_expr);
                    {
                        let m = match mv {
                            Val::Slot(i) => pool.value(i),
                            Val::Ext(v) => v,
                        };
                        arith::equal_value_c(pool.value(val_idx), m, &mut cmp);
                    }
                    pool.restore_pos();
                    if cmp.is_defined() && cmp.to_u64() != 0 {
                        found = Some(stmt);
                        break;
                    }
                }
                pool.restore_pos();
                found.or(default.as_deref())
            };
            match chosen {
                Some(stmt) => execute_statement(exec, stmt, mode, behavior),
                None => Control::Continue,
            }
        }
        Stmt::TimeWait { delay_ps } => exec.wait(*delay_ps, behavior),
        Stmt::TimeRepeat { count, body } => {
            if *count < 0 {
                loop {
                    if exec.core.ended() {
                        return Control::Terminate;
                    }
                    if let Control::Terminate = execute_statement(exec, body, mode, behavior) {
                        return Control::Terminate;
                    }
                }
            } else {
                for _ in 0..*count {
                    if let Control::Terminate = execute_statement(exec, body, mode, behavior) {
                        return Control::Terminate;
                    }
                }
                Control::Continue
            }
        }
        Stmt::TimeTerminate => {
            exec.core.request_end();
            Control::Terminate
        }
        Stmt::Block(block) => execute_block(exec, block, behavior),
    }
}

/// Executes a block's statements under the block's own mode.
pub(crate) fn execute_block(
    exec: &mut Exec<'_>,
    block: &Block,
    behavior: Option<BehaviorId>,
) -> Control {
    for stmt in &block.stmts {
        if let Control::Terminate = execute_statement(exec, stmt, block.mode, behavior) {
            return Control::Terminate;
        }
    }
    Control::Continue
}
