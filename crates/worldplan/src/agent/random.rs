use super::Agent;
use crate::spaces::{Box as BoxSpace, Space};
use crate::Result;
use ndarray::Array1;
use rand::Rng;

/// Acts uniformly at random within the action space.
pub struct RandomAgent {
    action_space: BoxSpace,
}

impl RandomAgent {
    pub fn new(action_space: BoxSpace) -> Self {
        Self { action_space }
    }
}

impl Agent for RandomAgent {
    fn reset(&mut self) {}

    fn act<R: Rng>(&mut self, _observation: &Array1<f32>, rng: &mut R) -> Result<Array1<f32>> {
        Ok(self.action_space.sample(rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_actions_stay_in_space() {
        let space = BoxSpace::new(array![-0.5, 2.0], array![0.5, 3.0]).unwrap();
        let mut agent = RandomAgent::new(space.clone());
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let obs = Array1::zeros(4);
        for _ in 0..50 {
            assert!(space.contains(&agent.act(&obs, &mut rng).unwrap()));
        }
    }
}
