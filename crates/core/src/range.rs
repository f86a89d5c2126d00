//! Partial reads and writes inside a value
//!
//! Ranges are inclusive and element-granular: the `base` type's element
//! width (its `base` field) sets the granularity, so `[1..2]` over a base of
//! one bit addresses bits 1 and 2, while the same range over a byte base
//! addresses bits 8..23. `first` and `last` may come in either order.
//!
//! Out-of-bounds positions read as `x`; out-of-bounds writes are dropped.

use crate::types::Type;
use crate::value::{SYM_X, SYM_Z, SYM_ZERO, Value};

fn span(first: i64, last: i64, elem_bits: u64) -> (i64, u64) {
    let lo = first.min(last);
    let count = first.abs_diff(last) + 1;
    (lo * elem_bits as i64, count * elem_bits)
}

fn elem_type(base: Type, count: u64) -> Type {
    let elem = if base.is_signed() {
        Type::signed(base.base_width())
    } else {
        Type::unsigned(base.base_width())
    };
    Type::vector(elem, count)
}

/// Reads the inclusive element range `[first..last]` of `src` into `dst`.
/// The destination type becomes a vector of `|last-first|+1` elements of
/// the base element width.
pub fn read_range(src: &Value, first: i64, last: i64, base: Type, dst: &mut Value) {
    let ew = base.base_width().max(1);
    let (lo_bit, nbits) = span(first, last, ew);
    let t = elem_type(base, first.abs_diff(last) + 1);

    let src_w = src.width() as i64;
    if src.is_numeric() && lo_bit >= 0 && lo_bit + nbits as i64 <= src_w && nbits <= 64 {
        let n = if lo_bit >= 64 {
            0
        } else {
            src.to_u64() >> lo_bit
        };
        dst.set_num(t, n);
        return;
    }

    let bits = dst.set_bits(t, SYM_X);
    for k in 0..nbits {
        let idx = lo_bit + k as i64;
        if idx >= 0 && idx < src_w {
            bits[k as usize] = src.sym(idx as u64);
        }
    }
    dst.normalize();
}

fn write_range_with(
    src: &Value,
    first: i64,
    last: i64,
    base: Type,
    dst: &mut Value,
    keep_z: bool,
) {
    let ew = base.base_width().max(1);
    let (lo_bit, nbits) = span(first, last, ew);
    let dst_w = dst.width();

    // Numeric fast path: fully defined write inside a defined word.
    if !keep_z
        && dst.is_numeric()
        && src.is_defined()
        && lo_bit >= 0
        && lo_bit as u64 + nbits <= dst_w
        && dst_w <= 64
    {
        let lo = lo_bit as u64;
        let field_mask = if nbits >= 64 {
            u64::MAX
        } else {
            (1u64 << nbits) - 1
        };
        let n = (dst.to_u64() & !(field_mask << lo)) | ((src.to_u64() & field_mask) << lo);
        dst.set_num(dst.typ(), n);
        return;
    }

    let old: Vec<u8> = (0..dst_w).map(|i| dst.sym(i)).collect();
    let t = dst.typ();
    let bits = dst.set_bits(t, SYM_ZERO);
    bits.copy_from_slice(&old);
    for k in 0..nbits {
        let idx = lo_bit + k as i64;
        if idx < 0 || idx >= dst_w as i64 {
            continue;
        }
        let s = src.sym(k);
        if keep_z && s == SYM_Z {
            continue;
        }
        bits[idx as usize] = s;
    }
}

/// Overwrites the inclusive element range `[first..last]` of `dst` with the
/// low bits of `src`; every other position of `dst` is preserved.
pub fn write_range(src: &Value, first: i64, last: i64, base: Type, dst: &mut Value) {
    write_range_with(src, first, last, base, dst, false);
}

/// Like [`write_range`], but positions whose source symbol is `z` keep the
/// destination's previous content.
pub fn write_range_no_z(src: &Value, first: i64, last: i64, base: Type, dst: &mut Value) {
    write_range_with(src, first, last, base, dst, true);
}
