//! Robust geometric predicates
//!
//! Sign tests (orientation, point-in-circumcircle) evaluated with adaptive
//! precision: a fast double-precision estimate is accepted whenever its
//! magnitude exceeds a forward error bound, and only the remaining
//! near-degenerate cases fall back to exact floating-point expansion
//! arithmetic. The expansion machinery follows Shewchuk's nonoverlapping
//! expansion-sum scheme; it is exact floating point, not arbitrary precision.
//!
//! The kernel is stateless and safe to call from any number of threads.
//! An exactly zero result is a valid output (collinear points, cocircular
//! points); callers handle it, no errors are raised here.

use glam::DVec2;

use crate::point::Point;

/// Half an ulp of 1.0; the base unit of Shewchuk's error bounds
const EPSILON: f64 = f64::EPSILON * 0.5;

/// 2^27 + 1, splits a double into two 26-bit halves
const SPLITTER: f64 = 134_217_729.0;

const CCW_ERRBOUND_A: f64 = (3.0 + 16.0 * EPSILON) * EPSILON;
const ICC_ERRBOUND_A: f64 = (10.0 + 96.0 * EPSILON) * EPSILON;

/// Orientation of the turn `a -> b -> c`
///
/// Positive when the three points wind counter-clockwise, negative when they
/// wind clockwise, exactly zero when they are collinear. The sign is always
/// correct; the magnitude is only meaningful on the fast path (twice the
/// signed triangle area).
pub fn orientation(a: &Point, b: &Point, c: &Point) -> f64 {
    let detleft = (a.x - c.x) * (b.y - c.y);
    let detright = (a.y - c.y) * (b.x - c.x);
    let det = detleft - detright;

    let detsum = if detleft > 0.0 {
        if detright <= 0.0 {
            return det;
        }
        detleft + detright
    } else if detleft < 0.0 {
        if detright >= 0.0 {
            return det;
        }
        -detleft - detright
    } else {
        return det;
    };

    let errbound = CCW_ERRBOUND_A * detsum;
    if det >= errbound || -det >= errbound {
        return det;
    }

    orientation_exact(a, b, c)
}

/// Whether `a`, `b`, `c` make a strict counter-clockwise turn
#[inline]
pub fn is_ccw(a: &Point, b: &Point, c: &Point) -> bool {
    orientation(a, b, c) > 0.0
}

/// Whether `d` lies strictly inside the circle through `a`, `b`, `c`
///
/// `a`, `b`, `c` are assumed counter-clockwise; with clockwise input the
/// result is inverted. Points exactly on the circle are not inside.
pub fn in_circumcircle(a: &Point, b: &Point, c: &Point, d: &Point) -> bool {
    let adx = a.x - d.x;
    let ady = a.y - d.y;
    let bdx = b.x - d.x;
    let bdy = b.y - d.y;
    let cdx = c.x - d.x;
    let cdy = c.y - d.y;

    let bdxcdy = bdx * cdy;
    let cdxbdy = cdx * bdy;
    let alift = adx * adx + ady * ady;

    let cdxady = cdx * ady;
    let adxcdy = adx * cdy;
    let blift = bdx * bdx + bdy * bdy;

    let adxbdy = adx * bdy;
    let bdxady = bdx * ady;
    let clift = cdx * cdx + cdy * cdy;

    let det = alift * (bdxcdy - cdxbdy) + blift * (cdxady - adxcdy) + clift * (adxbdy - bdxady);

    let permanent = (bdxcdy.abs() + cdxbdy.abs()) * alift
        + (cdxady.abs() + adxcdy.abs()) * blift
        + (adxbdy.abs() + bdxady.abs()) * clift;
    let errbound = ICC_ERRBOUND_A * permanent;
    if det > errbound || -det > errbound {
        return det > 0.0;
    }

    incircle_exact(a, b, c, d) > 0.0
}

// --- exact expansion fallbacks ---------------------------------------------

fn orientation_exact(a: &Point, b: &Point, c: &Point) -> f64 {
    // det = ax by - ax cy - cx by - ay bx + ay cx + cy bx
    let terms = [
        product(a.x, b.y),
        negate(product(a.x, c.y)),
        negate(product(c.x, b.y)),
        negate(product(a.y, b.x)),
        product(a.y, c.x),
        product(c.y, b.x),
    ];
    let mut det: Vec<f64> = Vec::new();
    for t in &terms {
        det = fast_expansion_sum_zeroelim(&det, t);
    }
    expansion_sign(&det)
}

fn incircle_exact(a: &Point, b: &Point, c: &Point, d: &Point) -> f64 {
    let adx = difference(a.x, d.x);
    let ady = difference(a.y, d.y);
    let bdx = difference(b.x, d.x);
    let bdy = difference(b.y, d.y);
    let cdx = difference(c.x, d.x);
    let cdy = difference(c.y, d.y);

    let alift = expansion_add(
        &expansion_product(&adx, &adx),
        &expansion_product(&ady, &ady),
    );
    let blift = expansion_add(
        &expansion_product(&bdx, &bdx),
        &expansion_product(&bdy, &bdy),
    );
    let clift = expansion_add(
        &expansion_product(&cdx, &cdx),
        &expansion_product(&cdy, &cdy),
    );

    let bc = expansion_sub(
        &expansion_product(&bdx, &cdy),
        &expansion_product(&cdx, &bdy),
    );
    let ca = expansion_sub(
        &expansion_product(&cdx, &ady),
        &expansion_product(&adx, &cdy),
    );
    let ab = expansion_sub(
        &expansion_product(&adx, &bdy),
        &expansion_product(&bdx, &ady),
    );

    let det = expansion_add(
        &expansion_product(&alift, &bc),
        &expansion_add(
            &expansion_product(&blift, &ca),
            &expansion_product(&clift, &ab),
        ),
    );
    expansion_sign(&det)
}

#[inline]
fn fast_two_sum(a: f64, b: f64) -> (f64, f64) {
    // requires |a| >= |b|
    let x = a + b;
    let y = b - (x - a);
    (x, y)
}

#[inline]
fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let x = a + b;
    let bvirt = x - a;
    let avirt = x - bvirt;
    let bround = b - bvirt;
    let around = a - avirt;
    (x, around + bround)
}

#[inline]
fn two_diff(a: f64, b: f64) -> (f64, f64) {
    let x = a - b;
    let bvirt = a - x;
    let avirt = x + bvirt;
    let bround = bvirt - b;
    let around = a - avirt;
    (x, around + bround)
}

#[inline]
fn split(a: f64) -> (f64, f64) {
    let c = SPLITTER * a;
    let hi = c - (c - a);
    (hi, a - hi)
}

#[inline]
fn two_product(a: f64, b: f64) -> (f64, f64) {
    let x = a * b;
    let (ahi, alo) = split(a);
    let (bhi, blo) = split(b);
    let err1 = x - ahi * bhi;
    let err2 = err1 - alo * bhi;
    let err3 = err2 - ahi * blo;
    (x, alo * blo - err3)
}

/// Exact product of two doubles as a two-component expansion
#[inline]
fn product(a: f64, b: f64) -> Vec<f64> {
    let (x, y) = two_product(a, b);
    vec![y, x]
}

/// Exact difference of two doubles as a two-component expansion
#[inline]
fn difference(a: f64, b: f64) -> Vec<f64> {
    let (x, y) = two_diff(a, b);
    vec![y, x]
}

#[inline]
fn negate(e: Vec<f64>) -> Vec<f64> {
    e.into_iter().map(|c| -c).collect()
}

/// Expansions are ordered by increasing magnitude; the top nonzero component
/// carries the sign of the whole sum
#[inline]
fn expansion_sign(e: &[f64]) -> f64 {
    e.last().copied().unwrap_or(0.0)
}

#[inline]
fn expansion_add(e: &[f64], f: &[f64]) -> Vec<f64> {
    fast_expansion_sum_zeroelim(e, f)
}

#[inline]
fn expansion_sub(e: &[f64], f: &[f64]) -> Vec<f64> {
    fast_expansion_sum_zeroelim(e, &f.iter().map(|c| -c).collect::<Vec<_>>())
}

/// Exact product of two expansions
fn expansion_product(e: &[f64], f: &[f64]) -> Vec<f64> {
    let mut result: Vec<f64> = Vec::new();
    for &fi in f {
        let term = scale_expansion_zeroelim(e, fi);
        result = fast_expansion_sum_zeroelim(&result, &term);
    }
    result
}

fn scale_expansion_zeroelim(e: &[f64], b: f64) -> Vec<f64> {
    if e.is_empty() || b == 0.0 {
        return Vec::new();
    }
    let mut h = Vec::with_capacity(e.len() * 2);
    let (mut q, hh) = two_product(e[0], b);
    if hh != 0.0 {
        h.push(hh);
    }
    for &enow in &e[1..] {
        let (p1, p0) = two_product(enow, b);
        let (sum, hh) = two_sum(q, p0);
        if hh != 0.0 {
            h.push(hh);
        }
        let (qnew, hh) = fast_two_sum(p1, sum);
        q = qnew;
        if hh != 0.0 {
            h.push(hh);
        }
    }
    if q != 0.0 || h.is_empty() {
        h.push(q);
    }
    h
}

fn fast_expansion_sum_zeroelim(e: &[f64], f: &[f64]) -> Vec<f64> {
    if e.is_empty() {
        return f.to_vec();
    }
    if f.is_empty() {
        return e.to_vec();
    }

    let mut h = Vec::with_capacity(e.len() + f.len());
    let mut eindex = 0;
    let mut findex = 0;

    let mut q = if (f[0] > e[0]) == (f[0] > -e[0]) {
        eindex = 1;
        e[0]
    } else {
        findex = 1;
        f[0]
    };

    if eindex < e.len() && findex < f.len() {
        let (qnew, hh) = if (f[findex] > e[eindex]) == (f[findex] > -e[eindex]) {
            let (qnew, hh) = fast_two_sum(e[eindex], q);
            eindex += 1;
            (qnew, hh)
        } else {
            let (qnew, hh) = fast_two_sum(f[findex], q);
            findex += 1;
            (qnew, hh)
        };
        q = qnew;
        if hh != 0.0 {
            h.push(hh);
        }
        while eindex < e.len() && findex < f.len() {
            let (qnew, hh) = if (f[findex] > e[eindex]) == (f[findex] > -e[eindex]) {
                let r = two_sum(q, e[eindex]);
                eindex += 1;
                r
            } else {
                let r = two_sum(q, f[findex]);
                findex += 1;
                r
            };
            q = qnew;
            if hh != 0.0 {
                h.push(hh);
            }
        }
    }
    while eindex < e.len() {
        let (qnew, hh) = two_sum(q, e[eindex]);
        eindex += 1;
        q = qnew;
        if hh != 0.0 {
            h.push(hh);
        }
    }
    while findex < f.len() {
        let (qnew, hh) = two_sum(q, f[findex]);
        findex += 1;
        q = qnew;
        if hh != 0.0 {
            h.push(hh);
        }
    }
    if q != 0.0 || h.is_empty() {
        h.push(q);
    }
    h
}

// --- constructive companions -----------------------------------------------
//
// These build coordinates rather than decide signs, so plain double
// arithmetic is appropriate. Callers gate degenerate triangles with
// `orientation` first.

/// Vector from `a` to the circumcenter of `(a, b, c)`
///
/// Components are infinite for collinear input.
pub fn circumdelta(a: &Point, b: &Point, c: &Point) -> DVec2 {
    let d = b.to_dvec2() - a.to_dvec2();
    let e = c.to_dvec2() - a.to_dvec2();

    let bl = d.length_squared();
    let cl = e.length_squared();
    let denom = 0.5 / d.perp_dot(e);

    DVec2::new(
        (e.y * bl - d.y * cl) * denom,
        (d.x * cl - e.x * bl) * denom,
    )
}

/// Squared circumradius of the triangle `(a, b, c)`
pub fn circumradius2(a: &Point, b: &Point, c: &Point) -> f64 {
    circumdelta(a, b, c).length_squared()
}

/// Circumcenter of the triangle `(a, b, c)`
pub fn circumcenter(a: &Point, b: &Point, c: &Point) -> Point {
    let delta = circumdelta(a, b, c);
    Point::xy(a.x + delta.x, a.y + delta.y)
}
