//! Scoring imagined trajectories.

use super::model::{LatentSequence, ObjectiveDecoder};
use crate::{PlanError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// How per-step objective values become one score per trajectory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Aggregation {
    /// Total predicted reward over the horizon.
    #[default]
    Sum,
    /// Value at the final step only.
    Last,
    /// `sum_t gamma^t * r_t`.
    Discounted { gamma: f32 },
}

impl Aggregation {
    pub fn validate(&self) -> Result<()> {
        if let Aggregation::Discounted { gamma } = *self {
            if !(gamma > 0.0 && gamma <= 1.0) {
                return Err(PlanError::invalid(format!(
                    "discount must be in (0, 1], got {}",
                    gamma
                )));
            }
        }
        Ok(())
    }

    /// Reduce `[batch, horizon]` values to `[batch]` scores.
    pub fn apply(&self, values: &Array2<f32>) -> Array1<f32> {
        match *self {
            Aggregation::Sum => values.sum_axis(Axis(1)),
            Aggregation::Last => match values.ncols() {
                0 => Array1::zeros(values.nrows()),
                n => values.column(n - 1).to_owned(),
            },
            Aggregation::Discounted { gamma } => {
                let mut weight = 1.0;
                let weights = Array1::from_shape_fn(values.ncols(), |_| {
                    let w = weight;
                    weight *= gamma;
                    w
                });
                values.dot(&weights)
            }
        }
    }
}

/// Objective function built from a decoder and an aggregation policy.
///
/// Higher decoded values always produce higher scores.
pub struct Objective<D> {
    decoder: D,
    aggregation: Aggregation,
}

impl<D> Objective<D> {
    pub fn new(decoder: D, aggregation: Aggregation) -> Result<Self> {
        aggregation.validate()?;
        Ok(Self {
            decoder,
            aggregation,
        })
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    pub fn into_decoder(self) -> D {
        self.decoder
    }

    /// Score every trajectory in `states`, returning one value per batch
    /// element.
    pub fn score<S>(&self, states: &S) -> Result<Array1<f32>>
    where
        S: LatentSequence,
        D: ObjectiveDecoder<S>,
    {
        let values = self.decoder.decode(states)?;
        let expected = [states.batch_size(), states.horizon()];
        if values.shape() != &expected[..] {
            return Err(PlanError::shape(&expected, values.shape()));
        }
        Ok(self.aggregation.apply(&values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::testing::{Broken, FirstFeature};
    use crate::planning::TensorSequence;
    use ndarray::{array, Array3};

    fn sequence() -> TensorSequence {
        TensorSequence::new(
            Array3::from_shape_vec((2, 3, 1), vec![1.0, 2.0, 3.0, -1.0, 0.0, 4.0]).unwrap(),
        )
    }

    #[test]
    fn test_sum_is_default() {
        let objective = Objective::new(FirstFeature, Aggregation::default()).unwrap();
        assert_eq!(objective.score(&sequence()).unwrap(), array![6.0, 3.0]);
    }

    #[test]
    fn test_last_and_discounted() {
        let last = Objective::new(FirstFeature, Aggregation::Last).unwrap();
        assert_eq!(last.score(&sequence()).unwrap(), array![3.0, 4.0]);

        let discounted =
            Objective::new(FirstFeature, Aggregation::Discounted { gamma: 0.5 }).unwrap();
        assert_eq!(
            discounted.score(&sequence()).unwrap(),
            array![1.0 + 1.0 + 0.75, -1.0 + 0.0 + 1.0]
        );
    }

    #[test]
    fn test_rejects_bad_gamma() {
        for gamma in [0.0, -0.5, 1.5, f32::NAN] {
            assert!(Objective::new(FirstFeature, Aggregation::Discounted { gamma }).is_err());
        }
    }

    #[test]
    fn test_decoder_shape_is_checked() {
        struct Flat;
        impl ObjectiveDecoder<TensorSequence> for Flat {
            fn decode(&self, _states: &TensorSequence) -> Result<Array2<f32>> {
                Ok(Array2::zeros((2, 2)))
            }
        }
        let objective = Objective::new(Flat, Aggregation::Sum).unwrap();
        assert!(matches!(
            objective.score(&sequence()),
            Err(PlanError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_decoder_errors_propagate() {
        let objective = Objective::new(Broken, Aggregation::Sum).unwrap();
        assert!(matches!(
            objective.score(&sequence()),
            Err(PlanError::Model(_))
        ));
    }

    #[test]
    fn test_aggregation_serde() {
        let agg: Aggregation = serde_json::from_str(r#"{"type": "discounted", "gamma": 0.9}"#).unwrap();
        assert_eq!(agg, Aggregation::Discounted { gamma: 0.9 });
        let sum: Aggregation = serde_json::from_str(r#"{"type": "sum"}"#).unwrap();
        assert_eq!(sum, Aggregation::Sum);
    }
}
