//! Word-level operators: arithmetic, shifts and comparisons
//!
//! Arithmetic needs every operand bit, so a single undefined input bit
//! degrades the whole result to `x` at the result width. Shifts move
//! symbols, preserving any `x`/`z` in the shifted operand. Comparisons
//! produce a single bit; the `_c` equality variants follow C semantics
//! where an undefined operand compares unequal instead of unknown.
//!
//! Operands are interpreted as signed two's complement when **both**
//! operand types are signed.

use crate::types::Type;
use crate::value::{SYM_X, SYM_ZERO, Value};

/// The wider operand's type; ties go to the left operand.
fn join_type(a: &Value, b: &Value) -> Type {
    if b.width() > a.width() { b.typ() } else { a.typ() }
}

fn both_signed(a: &Value, b: &Value) -> bool {
    a.typ().is_signed() && b.typ().is_signed()
}

/// Two's-complement negation.
pub fn neg_value(src: &Value, dst: &mut Value) {
    let t = src.typ();
    if src.is_defined() {
        dst.set_num(t, src.to_u64().wrapping_neg());
    } else {
        dst.set_bits(t, SYM_X);
    }
}

fn arith2(src0: &Value, src1: &Value, dst: &mut Value, op: impl FnOnce(u64, u64) -> Option<u64>) {
    let t = join_type(src0, src1);
    if src0.is_defined() && src1.is_defined() {
        if let Some(n) = op(src0.to_u64(), src1.to_u64()) {
            dst.set_num(t, n);
            return;
        }
    }
    dst.set_bits(t, SYM_X);
}

pub fn add_value(src0: &Value, src1: &Value, dst: &mut Value) {
    arith2(src0, src1, dst, |a, b| Some(a.wrapping_add(b)));
}

pub fn sub_value(src0: &Value, src1: &Value, dst: &mut Value) {
    arith2(src0, src1, dst, |a, b| Some(a.wrapping_sub(b)));
}

pub fn mul_value(src0: &Value, src1: &Value, dst: &mut Value) {
    if both_signed(src0, src1) {
        let (a, b) = (src0.to_i64(), src1.to_i64());
        arith2(src0, src1, dst, |_, _| Some(a.wrapping_mul(b) as u64));
    } else {
        arith2(src0, src1, dst, |a, b| Some(a.wrapping_mul(b)));
    }
}

/// Division; a zero divisor yields all-`x`.
pub fn div_value(src0: &Value, src1: &Value, dst: &mut Value) {
    if both_signed(src0, src1) {
        let (a, b) = (src0.to_i64(), src1.to_i64());
        arith2(src0, src1, dst, |_, _| {
            if b == 0 {
                None
            } else {
                Some(a.wrapping_div(b) as u64)
            }
        });
    } else {
        arith2(src0, src1, dst, |a, b| a.checked_div(b));
    }
}

/// Modulo; a zero divisor yields all-`x`.
pub fn mod_value(src0: &Value, src1: &Value, dst: &mut Value) {
    if both_signed(src0, src1) {
        let (a, b) = (src0.to_i64(), src1.to_i64());
        arith2(src0, src1, dst, |_, _| {
            if b == 0 {
                None
            } else {
                Some(a.wrapping_rem(b) as u64)
            }
        });
    } else {
        arith2(src0, src1, dst, |a, b| a.checked_rem(b));
    }
}

/// Left shift. The result keeps the shifted operand's type; vacated
/// positions fill with `0`. An undefined shift amount degrades to `x`.
pub fn shift_left_value(src0: &Value, src1: &Value, dst: &mut Value) {
    let t = src0.typ();
    if !src1.is_defined() {
        dst.set_bits(t, SYM_X);
        return;
    }
    let amt = src1.to_u64();
    if src0.is_numeric() {
        let n = if amt >= 64 { 0 } else { src0.to_u64() << amt };
        dst.set_num(t, n);
        return;
    }
    let w = t.width();
    let bits = dst.set_bits(t, SYM_ZERO);
    for i in 0..w {
        if i >= amt {
            bits[i as usize] = src0.sym(i - amt);
        }
    }
}

/// Right shift: arithmetic for signed sources, logical otherwise. An
/// undefined shift amount degrades to `x`.
pub fn shift_right_value(src0: &Value, src1: &Value, dst: &mut Value) {
    let t = src0.typ();
    if !src1.is_defined() {
        dst.set_bits(t, SYM_X);
        return;
    }
    let amt = src1.to_u64();
    let w = t.width();
    if src0.is_numeric() {
        let n = if t.is_signed() {
            let v = src0.to_i64();
            if amt >= 64 { (v >> 63) as u64 } else { (v >> amt) as u64 }
        } else if amt >= 64 {
            0
        } else {
            src0.to_u64() >> amt
        };
        dst.set_num(t, n);
        return;
    }
    let fill = if t.is_signed() && w > 0 {
        src0.sym(w - 1)
    } else {
        SYM_ZERO
    };
    let bits = dst.set_bits(t, SYM_ZERO);
    for i in 0..w {
        let j = i + amt;
        bits[i as usize] = if j < w { src0.sym(j) } else { fill };
    }
}

fn set_bool(dst: &mut Value, b: bool) {
    dst.set_num(Type::bit(), b as u64);
}

fn set_unknown_bit(dst: &mut Value) {
    dst.set_bits(Type::bit(), SYM_X);
}

fn contents_equal(a: &Value, b: &Value) -> bool {
    a.same_content(b)
}

/// Equality to a single bit; any undefined operand yields `x`.
pub fn equal_value(src0: &Value, src1: &Value, dst: &mut Value) {
    if src0.is_defined() && src1.is_defined() {
        set_bool(dst, contents_equal(src0, src1));
    } else {
        set_unknown_bit(dst);
    }
}

/// Inequality to a single bit; any undefined operand yields `x`.
pub fn not_equal_value(src0: &Value, src1: &Value, dst: &mut Value) {
    if src0.is_defined() && src1.is_defined() {
        set_bool(dst, !contents_equal(src0, src1));
    } else {
        set_unknown_bit(dst);
    }
}

/// C-style equality: an undefined operand compares unequal (result `0`).
pub fn equal_value_c(src0: &Value, src1: &Value, dst: &mut Value) {
    let eq = src0.is_defined() && src1.is_defined() && contents_equal(src0, src1);
    set_bool(dst, eq);
}

/// C-style inequality: an undefined operand compares unequal (result `1`).
pub fn not_equal_value_c(src0: &Value, src1: &Value, dst: &mut Value) {
    let eq = src0.is_defined() && src1.is_defined() && contents_equal(src0, src1);
    set_bool(dst, !eq);
}

fn order2(src0: &Value, src1: &Value, dst: &mut Value, op: impl FnOnce(i128, i128) -> bool) {
    if !(src0.is_defined() && src1.is_defined()) {
        set_unknown_bit(dst);
        return;
    }
    let (a, b) = if both_signed(src0, src1) {
        (src0.to_i64() as i128, src1.to_i64() as i128)
    } else {
        (src0.to_u64() as i128, src1.to_u64() as i128)
    };
    set_bool(dst, op(a, b));
}

pub fn lesser_value(src0: &Value, src1: &Value, dst: &mut Value) {
    order2(src0, src1, dst, |a, b| a < b);
}

pub fn lesser_equal_value(src0: &Value, src1: &Value, dst: &mut Value) {
    order2(src0, src1, dst, |a, b| a <= b);
}

pub fn greater_value(src0: &Value, src1: &Value, dst: &mut Value) {
    order2(src0, src1, dst, |a, b| a > b);
}

pub fn greater_equal_value(src0: &Value, src1: &Value, dst: &mut Value) {
    order2(src0, src1, dst, |a, b| a >= b);
}
