//! Per-bit operators: negation, bitwise gates, reductions, select, concat
//! and cast
//!
//! Every operator writes into a caller-provided destination and rewrites the
//! destination's type to the result type. Bitwise gates stay in numeric form
//! when both operands are numeric; any undefined operand bit switches the
//! result to bit-string form with `x` wherever the output is not forced by
//! the defined inputs.

use crate::types::Type;
use crate::value::{SYM_ONE, SYM_X, SYM_ZERO, Value};

/// Assigns `src` to `dst` wholesale: type and content both follow the
/// source.
pub fn assign_value(src: &Value, dst: &mut Value) {
    if src.is_numeric() {
        dst.set_num(src.typ(), src.to_u64());
    } else {
        let w = src.width();
        let bits = dst.set_bits(src.typ(), SYM_ZERO);
        for i in 0..w {
            bits[i as usize] = src.sym(i);
        }
    }
}

/// The wider operand's type; ties go to the left operand.
fn join_type(a: &Value, b: &Value) -> Type {
    if b.width() > a.width() { b.typ() } else { a.typ() }
}

fn not_sym(a: u8) -> u8 {
    match a {
        SYM_ZERO => SYM_ONE,
        SYM_ONE => SYM_ZERO,
        _ => SYM_X,
    }
}

fn and_sym(a: u8, b: u8) -> u8 {
    if a == SYM_ZERO || b == SYM_ZERO {
        SYM_ZERO
    } else if a == SYM_ONE && b == SYM_ONE {
        SYM_ONE
    } else {
        SYM_X
    }
}

fn or_sym(a: u8, b: u8) -> u8 {
    if a == SYM_ONE || b == SYM_ONE {
        SYM_ONE
    } else if a == SYM_ZERO && b == SYM_ZERO {
        SYM_ZERO
    } else {
        SYM_X
    }
}

fn xor_sym(a: u8, b: u8) -> u8 {
    let da = a == SYM_ZERO || a == SYM_ONE;
    let db = b == SYM_ZERO || b == SYM_ONE;
    if da && db {
        if a == b { SYM_ZERO } else { SYM_ONE }
    } else {
        SYM_X
    }
}

/// Bitwise complement.
pub fn not_value(src: &Value, dst: &mut Value) {
    let t = src.typ();
    if src.is_numeric() {
        dst.set_num(t, !src.to_u64());
        return;
    }
    let w = t.width();
    let bits = dst.set_bits(t, SYM_ZERO);
    for i in 0..w {
        bits[i as usize] = not_sym(src.sym(i));
    }
}

fn bitwise(
    src0: &Value,
    src1: &Value,
    dst: &mut Value,
    num_op: fn(u64, u64) -> u64,
    sym_op: fn(u8, u8) -> u8,
) {
    let t = join_type(src0, src1);
    if src0.is_numeric() && src1.is_numeric() {
        dst.set_num(t, num_op(src0.to_u64(), src1.to_u64()));
        return;
    }
    let w = t.width();
    let bits = dst.set_bits(t, SYM_ZERO);
    for i in 0..w {
        bits[i as usize] = sym_op(src0.sym(i), src1.sym(i));
    }
}

pub fn and_value(src0: &Value, src1: &Value, dst: &mut Value) {
    bitwise(src0, src1, dst, |a, b| a & b, and_sym);
}

pub fn or_value(src0: &Value, src1: &Value, dst: &mut Value) {
    bitwise(src0, src1, dst, |a, b| a | b, or_sym);
}

pub fn xor_value(src0: &Value, src1: &Value, dst: &mut Value) {
    bitwise(src0, src1, dst, |a, b| a ^ b, xor_sym);
}

/// OR-reduction to a single bit: `1` if any position is `1`, `0` if every
/// position is `0`, otherwise `x`.
pub fn reduce_or_value(src: &Value, dst: &mut Value) {
    let w = src.width();
    let mut saw_undef = false;
    for i in 0..w {
        match src.sym(i) {
            SYM_ONE => {
                dst.set_num(Type::bit(), 1);
                return;
            }
            SYM_ZERO => {}
            _ => saw_undef = true,
        }
    }
    if saw_undef {
        dst.set_bits(Type::bit(), SYM_X);
    } else {
        dst.set_num(Type::bit(), 0);
    }
}

/// Picks `choices[cond]`. An undefined condition or an out-of-range index
/// yields all-`x` at `undef_typ` (the select node's type).
pub fn select_value(cond: &Value, choices: &[&Value], undef_typ: Type, dst: &mut Value) {
    if !cond.is_defined() {
        dst.set_bits(undef_typ, SYM_X);
        return;
    }
    let idx = cond.to_u64() as usize;
    match choices.get(idx) {
        Some(chosen) => assign_value(chosen, dst),
        None => {
            dst.set_bits(undef_typ, SYM_X);
        }
    }
}

/// Concatenation direction: with `Little` the first part occupies the
/// lowest bits, with `Big` the highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcatDir {
    Little,
    Big,
}

/// Concatenates `parts` into `dst`. The result width is the sum of the part
/// widths; the result stays numeric when every part is numeric and the
/// total fits a word.
pub fn concat_value(dir: ConcatDir, parts: &[&Value], dst: &mut Value) {
    let total: u64 = parts.iter().map(|p| p.width()).sum();
    let t = Type::vector(Type::bit(), total);

    let ordered: Vec<&Value> = match dir {
        ConcatDir::Little => parts.to_vec(),
        ConcatDir::Big => parts.iter().rev().copied().collect(),
    };

    if total <= 64 && ordered.iter().all(|p| p.is_numeric()) {
        let mut n = 0u64;
        let mut pos = 0;
        for p in &ordered {
            n |= p.to_u64() << pos;
            pos += p.width();
        }
        dst.set_num(t, n);
        return;
    }

    let bits = dst.set_bits(t, SYM_ZERO);
    let mut pos = 0usize;
    for p in &ordered {
        for i in 0..p.width() {
            bits[pos + i as usize] = p.sym(i);
        }
        pos += p.width() as usize;
    }
}

/// Casts `src` to `to`: truncates from the most significant end when
/// narrowing, sign- or zero-extends when widening. No `x` or `z` is ever
/// introduced; an undefined sign bit is replicated as is.
pub fn cast_value(src: &Value, to: Type, dst: &mut Value) {
    let sw = src.width();
    let tw = to.width();
    if src.is_numeric() {
        let n = if tw <= sw || !src.typ().is_signed() {
            src.to_u64()
        } else {
            src.to_i64() as u64
        };
        dst.set_num(to, n);
        return;
    }
    let fill = if src.typ().is_signed() && sw > 0 {
        src.sym(sw - 1)
    } else {
        SYM_ZERO
    };
    let bits = dst.set_bits(to, SYM_ZERO);
    for i in 0..tw {
        bits[i as usize] = if i < sw { src.sym(i) } else { fill };
    }
    dst.normalize();
}
