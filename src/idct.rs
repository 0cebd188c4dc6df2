//! The 8x8 inverse discrete cosine transform.
//!
//! Direct cosine-table formulation of
//!
//! ```text
//! f(x,y) = 1/4 * sum_u sum_v C(u) C(v) F(u,v)
//!              * cos((2x+1) u pi / 16) * cos((2y+1) v pi / 16)
//! ```
//!
//! with `C(0) = 1/sqrt(2)` and `C(k>0) = 1`. The transform is separable,
//! so it runs as two 1-D passes over a precomputed basis instead of the
//! naive quadruple loop. Everything is `f64`; the caller level-shifts and
//! clamps afterwards.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// A prepared 8x8 inverse DCT.
///
/// The basis table is built once per scan and shared by every block; the
/// decoder drops it together with the scan.
pub(crate) struct Idct8x8 {
    /// `basis[x][u] = C(u)/2 * cos((2x+1) u pi / 16)`
    basis: [[f64; 8]; 8],
}

impl Idct8x8 {
    pub fn new() -> Idct8x8 {
        let mut basis = [[0.0; 8]; 8];

        for (x, row) in basis.iter_mut().enumerate() {
            for (u, value) in row.iter_mut().enumerate() {
                let scale = if u == 0 { FRAC_1_SQRT_2 } else { 1.0 };
                let angle = (2 * x + 1) as f64 * u as f64 * PI / 16.0;

                *value = 0.5 * scale * angle.cos();
            }
        }

        Idct8x8 { basis }
    }

    /// Transform one block of natural (row-major) frequency coefficients
    /// into spatial samples, also row-major.
    pub fn transform(&self, coefficients: &[f64; 64]) -> [f64; 64] {
        // first pass: 1-D transform of every coefficient row
        let mut rows = [0.0; 64];

        for u in 0..8 {
            for y in 0..8 {
                let mut acc = 0.0;

                for v in 0..8 {
                    acc += self.basis[y][v] * coefficients[u * 8 + v];
                }

                rows[u * 8 + y] = acc;
            }
        }

        // second pass: 1-D transform down every column of the first pass
        let mut output = [0.0; 64];

        for x in 0..8 {
            for y in 0..8 {
                let mut acc = 0.0;

                for u in 0..8 {
                    acc += self.basis[x][u] * rows[u * 8 + y];
                }

                output[x * 8 + y] = acc;
            }
        }

        output
    }
}
