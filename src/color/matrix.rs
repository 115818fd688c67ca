use std::ops::Mul;

use crate::color::error::{ColorError, Result};

/// Determinants smaller than this are treated as singular.
const SINGULAR_EPSILON: f64 = 1e-9;

/// A 3x3 real matrix stored row-major.
///
/// Matrices are applied to column vectors (`M · c`), which is the same as
/// the row-vector form `c · Mᵀ`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3(pub [[f64; 3]; 3]);

impl Mat3 {
    pub const IDENTITY: Mat3 = Mat3([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);

    pub const fn new(rows: [[f64; 3]; 3]) -> Self {
        Self(rows)
    }

    /// Multiply a column vector.
    #[inline(always)]
    pub fn apply(&self, v: [f64; 3]) -> [f64; 3] {
        let m = &self.0;
        [
            m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
            m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
            m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
        ]
    }

    pub fn determinant(&self) -> f64 {
        let [[a, b, c], [d, e, f], [g, h, i]] = self.0;
        a * (e * i - f * h) - b * (d * i - f * g) + c * (d * h - e * g)
    }

    /// Invert via the adjugate. Fails with `ColorError::Configuration` when
    /// the matrix is singular or contains non-finite entries.
    pub fn inverse(&self) -> Result<Self> {
        if self.0.iter().flatten().any(|x| !x.is_finite()) {
            return Err(ColorError::Configuration(
                "matrix contains non-finite entries".to_string(),
            ));
        }

        let det = self.determinant();
        if det.abs() < SINGULAR_EPSILON {
            return Err(ColorError::Configuration(format!(
                "matrix is singular (det = {det:e})"
            )));
        }

        let [[a, b, c], [d, e, f], [g, h, i]] = self.0;
        let adj = [
            [e * i - f * h, c * h - b * i, b * f - c * e],
            [f * g - d * i, a * i - c * g, c * d - a * f],
            [d * h - e * g, b * g - a * h, a * e - b * d],
        ];
        Ok(Self(adj.map(|row| row.map(|x| x / det))))
    }
}

impl Mul for Mat3 {
    type Output = Mat3;

    fn mul(self, rhs: Mat3) -> Mat3 {
        let mut out = [[0.0; 3]; 3];
        for (r, row) in out.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.0[r][k] * rhs.0[k][c]).sum();
            }
        }
        Mat3(out)
    }
}
