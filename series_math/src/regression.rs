//! Least-squares regression with optional per-coefficient ridge penalties
//!
//! The solver builds the normal equations `(XᵀX + Λ) β = Xᵀy` and solves them
//! with Gaussian elimination and partial pivoting. Design matrices in this
//! workspace are small (a trend plus a few dozen Fourier columns), so a dense
//! solve is sufficient.

use serde::{Deserialize, Serialize};

use crate::{MathError, Result};

/// Pivots smaller than this are treated as zero
const SINGULAR_EPSILON: f64 = 1e-12;

/// A fitted least-squares model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeastSquares {
    coefficients: Vec<f64>,
    residual_std: f64,
    observations: usize,
}

impl LeastSquares {
    /// Fit coefficients for a row-major design matrix.
    ///
    /// `penalties` holds one ridge weight per column; use `0.0` for an
    /// unpenalised coefficient such as the intercept.
    pub fn fit(design: &[Vec<f64>], targets: &[f64], penalties: &[f64]) -> Result<Self> {
        if design.is_empty() {
            return Err(MathError::InsufficientData(
                "Design matrix has no rows".to_string(),
            ));
        }
        if design.len() != targets.len() {
            return Err(MathError::InvalidInput(format!(
                "Design matrix has {} rows but {} targets were given",
                design.len(),
                targets.len()
            )));
        }

        let columns = penalties.len();
        if columns == 0 {
            return Err(MathError::InvalidInput(
                "At least one column is required".to_string(),
            ));
        }
        if let Some(row) = design.iter().find(|row| row.len() != columns) {
            return Err(MathError::InvalidInput(format!(
                "Row width {} does not match {} penalties",
                row.len(),
                columns
            )));
        }
        if penalties.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(MathError::InvalidInput(
                "Penalties must be finite and non-negative".to_string(),
            ));
        }
        if targets.iter().any(|y| !y.is_finite())
            || design.iter().flatten().any(|x| !x.is_finite())
        {
            return Err(MathError::InvalidInput(
                "Design matrix and targets must be finite".to_string(),
            ));
        }

        let mut gram = vec![vec![0.0; columns]; columns];
        let mut moments = vec![0.0; columns];
        for (row, &y) in design.iter().zip(targets) {
            for i in 0..columns {
                moments[i] += row[i] * y;
                for j in i..columns {
                    gram[i][j] += row[i] * row[j];
                }
            }
        }
        for i in 0..columns {
            for j in 0..i {
                gram[i][j] = gram[j][i];
            }
            gram[i][i] += penalties[i];
        }

        let coefficients = solve_linear_system(gram, moments)?;

        let sum_sq: f64 = design
            .iter()
            .zip(targets)
            .map(|(row, &y)| {
                let fitted: f64 = row.iter().zip(&coefficients).map(|(x, b)| x * b).sum();
                (y - fitted).powi(2)
            })
            .sum();
        let dof = design.len().saturating_sub(columns).max(1);

        Ok(Self {
            coefficients,
            residual_std: (sum_sq / dof as f64).sqrt(),
            observations: design.len(),
        })
    }

    /// Evaluate the fitted model for one row of features
    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.coefficients.len() {
            return Err(MathError::InvalidInput(format!(
                "Expected {} features, got {}",
                self.coefficients.len(),
                row.len()
            )));
        }
        Ok(row.iter().zip(&self.coefficients).map(|(x, b)| x * b).sum())
    }

    /// Fitted coefficients in column order
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Standard deviation of the in-sample residuals
    pub fn residual_std(&self) -> f64 {
        self.residual_std
    }

    /// Number of rows the model was fitted on
    pub fn observations(&self) -> usize {
        self.observations
    }
}

/// Solve `a · x = b` for a square system
pub fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    if a.len() != n || a.iter().any(|row| row.len() != n) {
        return Err(MathError::InvalidInput(
            "System matrix must be square and match the right-hand side".to_string(),
        ));
    }

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&x, &y| a[x][col].abs().total_cmp(&a[y][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < SINGULAR_EPSILON {
            return Err(MathError::CalculationError(format!(
                "Singular system: column {} has no usable pivot",
                col
            )));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}
