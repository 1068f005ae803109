//! Minimizers of the lifetime likelihood
//!
//! - [ParabolicMinimizer]: derivative-free search over `tau` by successive parabolic
//!   interpolation, used for the signal-only NLL.
//! - [GradientDescent]: fixed learning-rate descent over `(tau, a)` with forward-difference
//!   derivatives, used for the signal plus background NLL.
//!
//! Both take the objective as a closure returning `Result<f64, FitError>`, so likelihood domain
//! errors stop the search, and both own their iteration state for the duration of a call.

pub mod gradient;
pub use gradient::{GradientDescent, GradientResult};

pub mod parabolic;
pub use parabolic::{Parabola, ParabolicMinimizer, ParabolicResult};
