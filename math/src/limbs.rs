//! Little-endian 32-bit limb primitives.
//!
//! Every routine works on slices whose length is fixed by the owning field
//! (`L` for single-width values, `2L` for double-width values). Carries and
//! borrows are returned to the caller instead of being tracked in an extra
//! limb; the guard limbs of the layout keep them at zero for well-formed
//! inputs.

use std::cmp::Ordering;

use num_bigint::BigUint;
use rand::RngCore;

/// Add with carry: (result, carry) = a + b + carry_in
#[inline(always)]
pub(crate) const fn adc(a: u32, b: u32, carry: u32) -> (u32, u32) {
    let tmp = a as u64 + b as u64 + carry as u64;
    (tmp as u32, (tmp >> 32) as u32)
}

/// Subtract with borrow: (result, borrow) = a - b - borrow_in
#[inline(always)]
pub(crate) const fn sbb(a: u32, b: u32, borrow: u32) -> (u32, u32) {
    let tmp = (a as u64).wrapping_sub(b as u64).wrapping_sub(borrow as u64);
    (tmp as u32, (tmp >> 63) as u32)
}

/// Multiply-accumulate: (lo, hi) = a + b * c + carry_in
#[inline(always)]
pub(crate) const fn mac(a: u32, b: u32, c: u32, carry: u32) -> (u32, u32) {
    let tmp = a as u64 + (b as u64) * (c as u64) + carry as u64;
    (tmp as u32, (tmp >> 32) as u32)
}

/// `a += b`, where `b` may be shorter than `a`. Returns the carry out of
/// the top limb of `a`.
pub(crate) fn add_assign(a: &mut [u32], b: &[u32]) -> u32 {
    debug_assert!(b.len() <= a.len());
    let mut carry = 0;
    for (i, limb) in a.iter_mut().enumerate() {
        if i >= b.len() && carry == 0 {
            break;
        }
        let rhs = b.get(i).copied().unwrap_or(0);
        (*limb, carry) = adc(*limb, rhs, carry);
    }
    carry
}

/// `a -= b`, where `b` may be shorter than `a`. Returns the borrow out of
/// the top limb of `a`.
pub(crate) fn sub_assign(a: &mut [u32], b: &[u32]) -> u32 {
    debug_assert!(b.len() <= a.len());
    let mut borrow = 0;
    for (i, limb) in a.iter_mut().enumerate() {
        if i >= b.len() && borrow == 0 {
            break;
        }
        let rhs = b.get(i).copied().unwrap_or(0);
        (*limb, borrow) = sbb(*limb, rhs, borrow);
    }
    borrow
}

/// Numeric comparison; missing high limbs of the shorter operand are zero.
pub(crate) fn compare(a: &[u32], b: &[u32]) -> Ordering {
    let len = a.len().max(b.len());
    for i in (0..len).rev() {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

#[inline]
pub(crate) fn is_zero(a: &[u32]) -> bool {
    a.iter().all(|&limb| limb == 0)
}

#[inline]
pub(crate) fn is_odd(a: &[u32]) -> bool {
    a.first().is_some_and(|&limb| limb & 1 == 1)
}

/// Shift right by one bit, shifting `top` (0 or 1) in at the most
/// significant position.
pub(crate) fn shr1(a: &mut [u32], top: u32) {
    let mut carry = top;
    for limb in a.iter_mut().rev() {
        let next = *limb & 1;
        *limb = (*limb >> 1) | (carry << 31);
        carry = next;
    }
}

/// Shift left by one bit. Returns the bit shifted out of the top limb.
pub(crate) fn shl1(a: &mut [u32]) -> u32 {
    let mut carry = 0;
    for limb in a.iter_mut() {
        let next = *limb >> 31;
        *limb = (*limb << 1) | carry;
        carry = next;
    }
    carry
}

/// `a = q - a` for `0 < a < q`; zero stays zero.
pub(crate) fn neg_mod(a: &mut [u32], q: &[u32]) {
    if is_zero(a) {
        return;
    }
    let mut borrow = 0;
    for (limb, &qi) in a.iter_mut().zip(q) {
        (*limb, borrow) = sbb(qi, *limb, borrow);
    }
    debug_assert_eq!(borrow, 0, "negated value was not reduced");
}

/// Subtract `q` once if `a >= q`.
#[inline]
pub(crate) fn reduce_once(a: &mut [u32], q: &[u32]) {
    if compare(a, q) != Ordering::Less {
        sub_assign(a, q);
    }
}

/// Subtract `q` until `a < q`. Only meant for values that are a small
/// multiple of `q`.
#[inline]
pub(crate) fn reduce_small_multiple(a: &mut [u32], q: &[u32]) {
    while compare(a, q) != Ordering::Less {
        sub_assign(a, q);
    }
}

/// `-q^{-1} mod 2^32` for odd `q0` (Newton iteration, doubling the number of
/// correct low bits each round).
pub(crate) const fn neg_inverse(q0: u32) -> u32 {
    let mut inv: u32 = 1;
    let mut i = 0;
    while i < 5 {
        inv = inv.wrapping_mul(2u32.wrapping_sub(q0.wrapping_mul(inv)));
        i += 1;
    }
    inv.wrapping_neg()
}

/// Montgomery multiplication, CIOS (coarsely integrated operand scanning):
/// `acc = a * b * 2^(-32n) mod q` with `n = q.len()`.
///
/// Each outer round adds `a * b[i]` into the accumulator, then adds the
/// multiple `m * q` that clears the lowest limb and shifts one limb down.
/// The two words above the accumulator are kept in locals. One trailing
/// conditional subtraction yields a value below `q` whenever
/// `a * b < q * 2^(32n)`, which holds for operands below `2^32 * q`.
pub(crate) fn mont_mul(acc: &mut [u32], a: &[u32], b: &[u32], q: &[u32], n0: u32) {
    let n = q.len();
    debug_assert!(a.len() == n && b.len() == n && acc.len() == n);

    acc.fill(0);
    let mut acc_hi = 0u32;
    for &bi in b {
        let mut carry = 0;
        for j in 0..n {
            (acc[j], carry) = mac(acc[j], a[j], bi, carry);
        }
        let (hi, hi_carry) = adc(acc_hi, carry, 0);

        let m = acc[0].wrapping_mul(n0);
        let (_, mut carry) = mac(acc[0], m, q[0], 0);
        for j in 1..n {
            (acc[j - 1], carry) = mac(acc[j], m, q[j], carry);
        }
        let (top, top_carry) = adc(hi, carry, 0);
        acc[n - 1] = top;
        acc_hi = hi_carry + top_carry;
    }

    if acc_hi != 0 || compare(acc, q) != Ordering::Less {
        sub_assign(acc, q);
    }
}

/// Schoolbook product of two `n`-limb values into `2n` limbs.
pub(crate) fn mul_wide(out: &mut [u32], a: &[u32], b: &[u32]) {
    let n = a.len();
    debug_assert!(b.len() == n && out.len() == 2 * n);

    out.fill(0);
    for (i, &ai) in a.iter().enumerate() {
        let mut carry = 0;
        for (j, &bj) in b.iter().enumerate() {
            (out[i + j], carry) = mac(out[i + j], ai, bj, carry);
        }
        out[i + n] = carry;
    }
}

/// Montgomery reduction (REDC) of a double-width value:
/// `out = t * 2^(-32n) mod q`. `t` is clobbered.
///
/// Word-by-word: each round picks `m = t[i] * n0` so that adding `m * q`
/// at limb `i` clears that limb; the carry out of the top of the window is
/// deferred into the next round. The upper half then holds a value below
/// `t / 2^(32n) + q`, which is brought under `q` by repeated subtraction.
pub(crate) fn mont_reduce(out: &mut [u32], t: &mut [u32], q: &[u32], n0: u32) {
    let n = q.len();
    debug_assert!(out.len() == n && t.len() == 2 * n);

    let mut carry2 = 0u32;
    for i in 0..n {
        let m = t[i].wrapping_mul(n0);
        let mut carry = 0;
        for j in 0..n {
            (t[i + j], carry) = mac(t[i + j], m, q[j], carry);
        }
        (t[i + n], carry2) = adc(t[i + n], carry, carry2);
    }
    debug_assert_eq!(carry2, 0, "double-width value exceeded its guard limbs");

    out.copy_from_slice(&t[n..]);
    reduce_small_multiple(out, q);
}

/// Rejection-sample `out` uniformly from `[0, q)`, where `q` has `bits`
/// significant bits. Limbs above the top word of `q` are cleared.
pub(crate) fn sample_below(out: &mut [u32], q: &[u32], bits: u64, rng: &mut dyn RngCore) {
    let words = bits.div_ceil(32) as usize;
    let mask = match bits % 32 {
        0 => u32::MAX,
        rem => (1u32 << rem) - 1,
    };
    out.fill(0);
    loop {
        for limb in &mut out[..words] {
            *limb = rng.next_u32();
        }
        out[words - 1] &= mask;
        if compare(out, q) == Ordering::Less {
            return;
        }
    }
}

#[inline]
pub(crate) fn to_biguint(limbs: &[u32]) -> BigUint {
    BigUint::from_slice(limbs)
}

/// Write `value` into `out`, zero-extending. Returns `false` if it does not
/// fit.
pub(crate) fn copy_from_biguint(out: &mut [u32], value: &BigUint) -> bool {
    let digits = value.to_u32_digits();
    if digits.len() > out.len() {
        return false;
    }
    out.fill(0);
    out[..digits.len()].copy_from_slice(&digits);
    true
}
