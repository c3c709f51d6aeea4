//! Continuous-time models advanced by an [`Integrator`](crate::Integrator).

use crate::error::ActuatorResult;

/// An ODE `ẋ = f(t, x)` with the state arithmetic RK4 needs.
///
/// `rhs` takes `&mut self` so a model may cache values between stage
/// evaluations. Returning an error aborts the step before any state is
/// committed.
pub trait TransientModel {
    type State: Clone;

    fn rhs(&mut self, t: f64, x: &Self::State) -> ActuatorResult<Self::State>;

    /// `a + b`
    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State;

    /// `scale · a`
    fn scale(&self, a: &Self::State, scale: f64) -> Self::State;
}
