//! When the tool loop stops calling the model.

/// Stop condition evaluated after every step that produced tool calls.
///
/// A step without tool calls always ends the loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopCondition {
    /// Stop once this many model steps have run.
    StepCountIs(usize),
}

impl StopCondition {
    /// True when the loop must not start another step.
    pub fn is_met(&self, steps_completed: usize) -> bool {
        match self {
            Self::StepCountIs(max) => steps_completed >= *max,
        }
    }
}

impl Default for StopCondition {
    fn default() -> Self {
        Self::StepCountIs(5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_count() {
        let stop = StopCondition::StepCountIs(5);
        assert!(!stop.is_met(4));
        assert!(stop.is_met(5));
        assert!(stop.is_met(6));
    }

    #[test]
    fn default_is_five_steps() {
        assert_eq!(StopCondition::default(), StopCondition::StepCountIs(5));
    }
}
