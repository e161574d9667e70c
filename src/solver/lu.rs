//! Dense linear system with LU decomposition.

use crate::error::{AmpereError, Result};

/// A pivot smaller than this is treated as numerically zero.
const PIVOT_EPSILON: f64 = 1e-12;

/// A dense square system `A x = b`, solved by LU decomposition without
/// pivoting.
///
/// No pivoting means decomposition fails on any system that is singular or
/// needs row exchanges for stability. That is a deliberate limitation, not a
/// masked one: the analysis engines anchor exactly one reference row per
/// unknown, which keeps their systems diagonally safe, and anything else
/// surfaces as [`AmpereError::SingularSystem`] instead of NaN garbage.
#[derive(Debug)]
pub struct LinearSystem {
    /// System matrix A (row-major)
    a: Vec<f64>,
    /// Right-hand side b
    b: Vec<f64>,
    /// Combined LU factors: unit lower triangle below the diagonal, upper
    /// triangle on and above it
    lu: Vec<f64>,
    /// Matrix dimension
    size: usize,
}

impl LinearSystem {
    /// Create a zeroed `size` x `size` system.
    pub fn new(size: usize) -> Self {
        Self {
            a: vec![0.0; size * size],
            b: vec![0.0; size],
            lu: vec![0.0; size * size],
            size,
        }
    }

    /// Matrix dimension.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Matrix element at (row, col).
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.a[row * self.size + col]
    }

    /// Add to matrix element at (row, col).
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        self.a[row * self.size + col] += value;
    }

    /// Add to right-hand side element.
    pub fn add_rhs(&mut self, row: usize, value: f64) {
        self.b[row] += value;
    }

    /// Accumulate a whole row fragment, scaled by `sign`.
    pub fn add_row(&mut self, row: usize, coefficients: &[f64], sign: f64) {
        for (col, value) in coefficients.iter().enumerate() {
            self.a[row * self.size + col] += sign * value;
        }
    }

    /// Factor A into L and U (Doolittle, no pivoting).
    pub fn decompose(&mut self) -> Result<()> {
        let n = self.size;
        self.lu.copy_from_slice(&self.a);

        for k in 0..n {
            let pivot = self.lu[k * n + k];
            if pivot.abs() < PIVOT_EPSILON {
                return Err(AmpereError::SingularSystem);
            }
            for i in (k + 1)..n {
                let factor = self.lu[i * n + k] / pivot;
                self.lu[i * n + k] = factor;
                for j in (k + 1)..n {
                    self.lu[i * n + j] -= factor * self.lu[k * n + j];
                }
            }
        }

        Ok(())
    }

    /// Solve for x using the factors from [`decompose`](Self::decompose):
    /// forward substitution for `L y = b`, then backward substitution for
    /// `U x = y`.
    pub fn solve(&self) -> Vec<f64> {
        let n = self.size;
        let mut x = self.b.clone();

        for i in 0..n {
            for j in 0..i {
                x[i] -= self.lu[i * n + j] * x[j];
            }
        }

        for i in (0..n).rev() {
            for j in (i + 1)..n {
                x[i] -= self.lu[i * n + j] * x[j];
            }
            x[i] /= self.lu[i * n + i];
        }

        x
    }

    /// Factor and solve in one step.
    pub fn decompose_and_solve(&mut self) -> Result<Vec<f64>> {
        self.decompose()?;
        Ok(self.solve())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_solve_identity() {
        let mut system = LinearSystem::new(2);
        system.add(0, 0, 1.0);
        system.add(1, 1, 1.0);
        system.add_rhs(0, 3.0);
        system.add_rhs(1, -7.0);

        let x = system.decompose_and_solve().unwrap();
        assert_relative_eq!(x[0], 3.0);
        assert_relative_eq!(x[1], -7.0);
    }

    #[test]
    fn test_solve_known_system() {
        // 2x + y = 5
        //  x + 3y = 10  =>  x = 1, y = 3
        let mut system = LinearSystem::new(2);
        system.add(0, 0, 2.0);
        system.add(0, 1, 1.0);
        system.add(1, 0, 1.0);
        system.add(1, 1, 3.0);
        system.add_rhs(0, 5.0);
        system.add_rhs(1, 10.0);

        let x = system.decompose_and_solve().unwrap();
        assert_relative_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_three_by_three() {
        let a = [[4.0, -1.0, 0.0], [-1.0, 4.0, -1.0], [0.0, -1.0, 4.0]];
        let expected = [1.0, -2.0, 0.5];
        let mut system = LinearSystem::new(3);
        for (i, row) in a.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                system.add(i, j, *value);
            }
            let rhs: f64 = row
                .iter()
                .zip(expected.iter())
                .map(|(coeff, x)| coeff * x)
                .sum();
            system.add_rhs(i, rhs);
        }

        let x = system.decompose_and_solve().unwrap();
        for (solved, expected) in x.iter().zip(expected.iter()) {
            assert_relative_eq!(*solved, *expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_singular_matrix_is_an_error() {
        let mut system = LinearSystem::new(2);
        system.add(0, 0, 1.0);
        system.add(0, 1, 2.0);
        system.add(1, 0, 2.0);
        system.add(1, 1, 4.0);

        assert!(matches!(
            system.decompose(),
            Err(AmpereError::SingularSystem)
        ));
    }

    #[test]
    fn test_add_row_scales_by_sign() {
        let mut system = LinearSystem::new(3);
        system.add_row(1, &[0.5, 0.0, -0.5], -1.0);
        assert_relative_eq!(system.get(1, 0), -0.5);
        assert_relative_eq!(system.get(1, 2), 0.5);
    }
}
