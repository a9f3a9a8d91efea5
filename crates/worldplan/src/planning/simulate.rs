//! Rolling action sequences through the dynamics model.

use super::model::{DynamicsModel, LatentSequence, LatentState};
use crate::{PlanError, Result};
use ndarray::{s, Array3, ArrayView3, Axis};
use std::f32::consts::FRAC_PI_2;

/// Distance covered per step by the diagnostic kinematics.
const PLAN_STEP: f32 = 0.25;

/// Predict latent trajectories for a batch of action sequences.
///
/// `actions` is `[amount, horizon, action_dim]`. `initial_state` must hold a
/// single batch element; it is tiled to `amount` copies and rolled forward
/// open loop. The returned sequence is checked to have batch `amount` and
/// `horizon` steps.
pub fn simulate<M: DynamicsModel>(
    actions: ArrayView3<'_, f32>,
    model: &M,
    initial_state: &M::State,
) -> Result<M::Sequence> {
    let batch = initial_state.batch_size();
    if batch != 1 {
        return Err(PlanError::invalid(format!(
            "initial state must have a single batch element, got {}",
            batch
        )));
    }
    let (amount, horizon, _) = actions.dim();
    let tiled = initial_state.tile(amount);
    let states = model.open_loop(actions, &tiled)?;
    check_sequence(&states, amount, horizon)?;
    Ok(states)
}

/// Fail with `ShapeMismatch` unless `states` is `[batch, horizon, ..]`.
pub(crate) fn check_sequence<S: LatentSequence>(
    states: &S,
    batch: usize,
    horizon: usize,
) -> Result<()> {
    if states.batch_size() != batch || states.horizon() != horizon {
        return Err(PlanError::shape(
            &[batch, horizon],
            &[states.batch_size(), states.horizon()],
        ));
    }
    Ok(())
}

/// Turn 1-D steering sequences into planar positions, for plotting only.
///
/// Each action `a` turns the heading by `a * pi/2` and moves a quarter unit
/// along the mid-angle of the turn. The output is `[batch, horizon + 1, 2]`
/// with every trajectory starting at the origin facing `+x`.
pub fn simulate_plan(actions: ArrayView3<'_, f32>) -> Result<Array3<f32>> {
    let (batch, horizon, action_dim) = actions.dim();
    if action_dim != 1 {
        return Err(PlanError::invalid(format!(
            "plan simulation needs a 1-D action space, got {} dimensions",
            action_dim
        )));
    }

    let mut positions = Array3::zeros((batch, horizon + 1, 2));
    for (plan, mut out) in actions
        .axis_iter(Axis(0))
        .zip(positions.axis_iter_mut(Axis(0)))
    {
        let (mut x, mut y, mut heading) = (0.0f32, 0.0f32, 0.0f32);
        for (t, &action) in plan.slice(s![.., 0]).iter().enumerate() {
            let turn = action * FRAC_PI_2;
            let mid = heading + turn / 2.0;
            x += mid.cos() * PLAN_STEP;
            y += mid.sin() * PLAN_STEP;
            heading += turn;
            out[[t + 1, 0]] = x;
            out[[t + 1, 1]] = y;
        }
    }
    Ok(positions)
}

/// Predict a trajectory from observed context followed by imagined steps.
///
/// The first `context` steps (at most `T - 1`) are filtered with
/// `closed_loop`; the remaining actions are rolled out open loop from the
/// last posterior. Returns the concatenation, `T` steps in total.
pub fn imagine_from_context<M: DynamicsModel>(
    model: &M,
    embedded: ArrayView3<'_, f32>,
    actions: ArrayView3<'_, f32>,
    context: usize,
) -> Result<M::Sequence> {
    let (batch, steps, _) = actions.dim();
    let (eb, es, _) = embedded.dim();
    if eb != batch || es != steps {
        return Err(PlanError::shape(&[batch, steps], &[eb, es]));
    }
    if steps == 0 {
        return Err(PlanError::invalid("cannot imagine an empty trajectory"));
    }
    let context = context.min(steps - 1);
    if context == 0 {
        let initial = model.initial_state(batch);
        let imagined = model.open_loop(actions, &initial)?;
        check_sequence(&imagined, batch, steps)?;
        return Ok(imagined);
    }

    let (_, posterior) = model.closed_loop(
        embedded.slice(s![.., ..context, ..]),
        actions.slice(s![.., ..context, ..]),
        None,
    )?;
    check_sequence(&posterior, batch, context)?;
    let last = posterior
        .last()
        .ok_or_else(|| PlanError::shape(&[batch, context], &[batch, 0]))?;
    let imagined = model.open_loop(actions.slice(s![.., context.., ..]), &last)?;
    check_sequence(&imagined, batch, steps - context)?;
    posterior.concat_time(&imagined)
}
