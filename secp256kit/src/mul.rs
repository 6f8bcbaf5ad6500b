//! Windowed scalar multiplication with precomputed tables.
//!
//! Multiplication recodes the scalar into signed windowed digits and walks
//! a table of small multiples. For the base point the table is built once
//! per process and published through a write-once cell; for other points a
//! table can be cached explicitly with [`precompute`] or built on the fly.
//!
//! The window loop is careful about the secret scalar: every step scans
//! the *whole* window slice and keeps the wanted entry by masked
//! selection, a zero digit performs the same lookup-and-add against a
//! ghost accumulator, and the digit count is fixed, so neither control
//! flow nor the memory access pattern depends on the scalar. That narrows
//! the timing story to the field primitives themselves; it does not make
//! the whole stack provably constant-time.

use crate::{point::Point, scalar::Scalar};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};

/// Window width used for the base point table.
const BASE_WINDOW: usize = 8;

/// Window width for tables built on the fly inside a single
/// multiplication, where build cost dominates.
const TRANSIENT_WINDOW: usize = 4;

/// A precomputed table of small odd-and-even multiples of one point.
///
/// For every window `j` of the scalar, the table holds
/// `d * 2^(j*w) * P` for each digit `d` in `[1, 2^(w-1)]`; negative digits
/// are served by negating the selected entry. Tables are immutable once
/// built and therefore freely shareable.
pub struct PointTable {
    window: usize,
    windows: usize,
    entries: Vec<Point>,
}

impl PointTable {
    /// Builds the table for `point` with window width `window`, which must
    /// be one of `{1, 2, 4, 8, 16}` so that windows never straddle limb
    /// boundaries.
    pub fn new(point: &Point, window: usize) -> Self {
        assert!(
            matches!(window, 1 | 2 | 4 | 8 | 16),
            "window width must divide 64"
        );
        let windows = 256 / window + 1;
        let row = 1usize << (window - 1);
        let mut entries = Vec::with_capacity(windows * row);
        let mut base = *point;
        for _ in 0..windows {
            let mut multiple = base;
            for _ in 0..row {
                entries.push(multiple);
                multiple = multiple.add(&base);
            }
            for _ in 0..window {
                base = base.double();
            }
        }
        PointTable {
            window,
            windows,
            entries,
        }
    }

    /// The window width this table was built with.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Reads the whole window slice and keeps entry `index` by masked
    /// combination. Never indexes memory by the secret digit.
    fn select(&self, win: usize, index: u32) -> Point {
        let row = 1usize << (self.window - 1);
        let slice = &self.entries[win * row..(win + 1) * row];
        let mut out = Point::IDENTITY;
        for (j, entry) in slice.iter().enumerate() {
            out.conditional_assign(entry, (j as u32).ct_eq(&index));
        }
        out
    }

    /// Multiplies the table's point by `scalar`.
    pub fn mul(&self, scalar: &Scalar) -> Point {
        let digits = signed_digits(scalar, self.window);
        debug_assert_eq!(digits.len(), self.windows);
        let mut acc = Point::IDENTITY;
        let mut ghost = Point::IDENTITY;
        for (win, &digit) in digits.iter().enumerate() {
            let is_zero = Choice::from((digit == 0) as u8);
            let is_neg = Choice::from((digit < 0) as u8);
            let index = (digit.unsigned_abs() as u32).saturating_sub(1);
            let entry = self.select(win, index).conditional_negate(is_neg);
            // Both accumulators take the same addition; the zero digit
            // routes it into the ghost so per-window work is constant.
            let acc_step = acc.add(&entry);
            let ghost_step = ghost.add(&entry);
            acc = Point::conditional_select(&acc_step, &acc, is_zero);
            ghost = Point::conditional_select(&ghost, &ghost_step, is_zero);
        }
        acc
    }
}

/// Recodes a scalar into `256/w + 1` signed digits in `[-2^(w-1), 2^(w-1)]`
/// with carry propagation; the extra window absorbs the final carry.
fn signed_digits(scalar: &Scalar, window: usize) -> Vec<i64> {
    let windows = 256 / window + 1;
    let half = 1i64 << (window - 1);
    let full = 1i64 << window;
    let mask = (1u64 << window) - 1;
    let mut limbs = [0u64; 5];
    limbs[..4].copy_from_slice(&scalar.0);

    let mut digits = Vec::with_capacity(windows);
    let mut carry = 0i64;
    for i in 0..windows {
        let bit = i * window;
        let raw = ((limbs[bit / 64] >> (bit % 64)) & mask) as i64 + carry;
        // Branch-free borrow: digits above 2^(w-1) become negative and
        // push a carry into the next window.
        carry = (raw > half) as i64;
        digits.push(raw - carry * full);
    }
    debug_assert_eq!(carry, 0);
    digits
}

static BASE_TABLE: OnceLock<PointTable> = OnceLock::new();

fn base_table() -> &'static PointTable {
    BASE_TABLE.get_or_init(|| PointTable::new(&Point::BASE, BASE_WINDOW))
}

type TableCache = RwLock<HashMap<[u8; 33], Arc<PointTable>>>;

static TABLE_CACHE: OnceLock<TableCache> = OnceLock::new();

fn table_cache() -> &'static TableCache {
    TABLE_CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Builds (or fetches) the cached multiplication table for `point`.
///
/// Subsequent `point.mul(..)` calls for the same point reuse the table.
/// Returns `None` for the identity, an unsupported window width, or a
/// poisoned cache. Racing builders are benign: both tables are
/// semantically identical and either may end up published.
///
/// # Example
/// ```
/// use secp256kit::{precompute, Point, Scalar};
/// let point = Point::random(&mut rand::thread_rng());
/// let table = precompute(8, &point).unwrap();
/// let k = Scalar::random(&mut rand::thread_rng());
/// assert_eq!(table.mul(&k), point.mul(&k));
/// ```
pub fn precompute(window: usize, point: &Point) -> Option<Arc<PointTable>> {
    if !matches!(window, 1 | 2 | 4 | 8 | 16) {
        return None;
    }
    let key = point.to_bytes()?;
    if let Some(existing) = table_cache().read().ok()?.get(&key) {
        if existing.window == window {
            return Some(existing.clone());
        }
    }
    let table = Arc::new(PointTable::new(point, window));
    table_cache().write().ok()?.insert(key, table.clone());
    Some(table)
}

/// Scalar multiplication entry point used by [`Point::mul`].
pub(crate) fn mul(point: &Point, scalar: &Scalar) -> Point {
    if bool::from(point.is_identity()) {
        return Point::IDENTITY;
    }
    if *point == Point::BASE {
        return base_table().mul(scalar);
    }
    let cached = table_cache().read().ok().and_then(|cache| {
        if cache.is_empty() {
            return None;
        }
        point.to_bytes().and_then(|key| cache.get(&key).cloned())
    });
    match cached {
        Some(table) => table.mul(scalar),
        None => PointTable::new(point, TRANSIENT_WINDOW).mul(scalar),
    }
}

/// `[a]P + [b]Q` for verification equations.
///
/// Nothing here is secret, so this may take variable time.
pub fn double_mul_vartime(a: &Scalar, p: &Point, b: &Scalar, q: &Point) -> Point {
    p.mul(a).add(&q.mul(b))
}

#[cfg(test)]
mod test {
    use super::*;

    /// Bit-at-a-time reference multiplication.
    fn naive_mul(point: &Point, scalar: &Scalar) -> Point {
        let mut acc = Point::IDENTITY;
        for byte in scalar.to_bytes() {
            for shift in (0..8).rev() {
                acc = acc.double();
                if (byte >> shift) & 1 == 1 {
                    acc = acc.add(point);
                }
            }
        }
        acc
    }

    #[test]
    fn recoding_digits_recompose() {
        for k in [
            Scalar::from(1u32),
            Scalar::from(0xFFu32),
            Scalar::from(0x80u32),
            Scalar::ZERO.sub(&Scalar::ONE),
        ] {
            for window in [1usize, 4, 8] {
                let digits = signed_digits(&k, window);
                assert_eq!(digits.len(), 256 / window + 1);
                let half = 1i64 << (window - 1);
                assert!(digits.iter().all(|d| (-half..=half).contains(d)));
                // Recompose sum(d_i * 2^(i*w)) in the scalar group.
                let mut acc = Scalar::ZERO;
                let mut weight = Scalar::ONE;
                let two = Scalar::from(2u32);
                for &d in &digits {
                    let mag = Scalar::from(d.unsigned_abs() as u32);
                    let term = weight.mul(&mag);
                    acc = if d < 0 { acc.sub(&term) } else { acc.add(&term) };
                    for _ in 0..window {
                        weight = weight.mul(&two);
                    }
                }
                assert_eq!(acc, k, "window {window}");
            }
        }
    }

    #[test]
    fn table_mul_matches_naive() {
        let point = Point::BASE;
        for window in [1usize, 2, 4, 8] {
            let table = PointTable::new(&point, window);
            for k in [
                Scalar::ZERO,
                Scalar::ONE,
                Scalar::from(2u32),
                Scalar::from(0xDEADBEEFu32),
                Scalar::ZERO.sub(&Scalar::ONE),
            ] {
                assert_eq!(table.mul(&k), naive_mul(&point, &k), "window {window}");
            }
        }
    }

    #[test]
    fn base_and_transient_paths_agree() {
        let k = Scalar::random(&mut rand::thread_rng());
        let via_base_table = Point::BASE.mul(&k);
        let via_transient = PointTable::new(&Point::BASE, TRANSIENT_WINDOW).mul(&k);
        assert_eq!(via_base_table, via_transient);
    }

    #[test]
    fn precompute_round_trip() {
        let point = Point::random(&mut rand::thread_rng());
        let k = Scalar::random(&mut rand::thread_rng());
        let expected = point.mul(&k);
        let table = precompute(8, &point).unwrap();
        assert_eq!(table.mul(&k), expected);
        // Now the cached path serves the same result.
        assert_eq!(point.mul(&k), expected);
        assert!(precompute(3, &point).is_none());
        assert!(precompute(8, &Point::IDENTITY).is_none());
    }

    #[test]
    fn double_mul() {
        let p = Point::random(&mut rand::thread_rng());
        let q = Point::random(&mut rand::thread_rng());
        let a = Scalar::random(&mut rand::thread_rng());
        let b = Scalar::random(&mut rand::thread_rng());
        assert_eq!(
            double_mul_vartime(&a, &p, &b, &q),
            naive_mul(&p, &a).add(&naive_mul(&q, &b))
        );
    }
}
