//! Fixed-step explicit integrators.

use crate::error::ActuatorResult;
use crate::model::TransientModel;

pub trait Integrator {
    /// State of `model` after `dt` seconds starting from `x` at time `t`.
    fn step<M: TransientModel>(
        &self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> ActuatorResult<M::State>;
}

/// Classical fourth-order Runge-Kutta.
#[derive(Clone, Copy, Debug, Default)]
pub struct Rk4;

impl Integrator for Rk4 {
    fn step<M: TransientModel>(
        &self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> ActuatorResult<M::State> {
        let half = 0.5 * dt;

        let k1 = model.rhs(t, x)?;
        let x2 = model.add(x, &model.scale(&k1, half));
        let k2 = model.rhs(t + half, &x2)?;
        let x3 = model.add(x, &model.scale(&k2, half));
        let k3 = model.rhs(t + half, &x3)?;
        let x4 = model.add(x, &model.scale(&k3, dt));
        let k4 = model.rhs(t + dt, &x4)?;

        // x + dt/6 · (k1 + 2·k2 + 2·k3 + k4)
        let inner = model.add(&k2, &k3);
        let weighted = model.add(&model.add(&k1, &k4), &model.scale(&inner, 2.0));
        Ok(model.add(x, &model.scale(&weighted, dt / 6.0)))
    }
}
