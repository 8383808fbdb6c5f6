//! Numerical building blocks: SVD least squares and the bounded
//! Levenberg–Marquardt solver built on it.

pub mod lm;
pub mod ols;

pub use lm::*;
pub use ols::*;
