/// An implementation of a time-decaying value
pub trait Decay {
    /// Calculate value at time `t`
    fn evaluate(&self, t: f32) -> f32;
}

// TODO: better error types
fn validate(vi: f32, vf: f32) -> Result<(), String> {
    (vi >= vf)
        .then_some(())
        .ok_or_else(|| String::from("`vi` must be greater than or equal to `vf`"))
}

/// A constant value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constant {
    value: f32,
}

impl Constant {
    pub fn new(value: f32) -> Self {
        Self { value }
    }
}

impl Decay for Constant {
    fn evaluate(&self, _t: f32) -> f32 {
        self.value
    }
}

/// v(t) = max(v<sub>i</sub> - rt, v<sub>f</sub>)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Linear {
    rate: f32,
    vi: f32,
    vf: f32,
}

impl Linear {
    pub fn new(rate: f32, vi: f32, vf: f32) -> Result<Self, String> {
        if rate < 0.0 {
            return Err(String::from("`rate` must be non-negative"));
        }
        validate(vi, vf)?;
        Ok(Self { rate, vi, vf })
    }
}

impl Decay for Linear {
    fn evaluate(&self, t: f32) -> f32 {
        let &Self { rate, vi, vf } = self;
        (vi - rate * t).max(vf)
    }
}

/// v(t) = max(v<sub>i</sub> * r<sup>t</sup>, v<sub>f</sub>)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometric {
    rate: f32,
    vi: f32,
    vf: f32,
}

impl Geometric {
    pub fn new(rate: f32, vi: f32, vf: f32) -> Result<Self, String> {
        if !(0.0..=1.0).contains(&rate) {
            return Err(String::from("`rate` must be in the interval [0, 1]"));
        }
        validate(vi, vf)?;
        Ok(Self { rate, vi, vf })
    }
}

impl Decay for Geometric {
    fn evaluate(&self, t: f32) -> f32 {
        let &Self { rate, vi, vf } = self;
        (vi * rate.powf(t)).max(vf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_functional() {
        assert!(validate(1.0, 0.0).is_ok());
        assert!(validate(0.0, 1.0).is_err());
    }

    #[test]
    fn constant_decay() {
        let x = Constant::new(1.0);
        assert_eq!(x.evaluate(0.0), 1.0);
        assert_eq!(x.evaluate(1.0), 1.0);
    }

    #[test]
    fn linear_decay() {
        let x = Linear::new(0.5, 2.0, 0.5).unwrap();
        assert_eq!(x.evaluate(0.0), 2.0);
        assert_eq!(x.evaluate(1.0), 1.5);
        assert_eq!(x.evaluate(10.0), 0.5);
    }

    #[test]
    fn geometric_decay() {
        let x = Geometric::new(0.5, 2.0, 0.125).unwrap();
        assert_eq!(x.evaluate(0.0), 2.0);
        assert_eq!(x.evaluate(1.0), 1.0);
        assert_eq!(x.evaluate(2.0), 0.5);
        assert_eq!(x.evaluate(100.0), 0.125);
    }

    #[test]
    fn decays_are_monotone_and_floored() {
        let schedules: Vec<Box<dyn Decay>> = vec![
            Box::new(Linear::new(0.004, 0.5, 0.0).unwrap()),
            Box::new(Geometric::new(0.99975, 1.0, 0.001).unwrap()),
        ];
        for decay in schedules {
            let mut prev = f32::INFINITY;
            for t in 0..20_000 {
                let v = decay.evaluate(t as f32);
                assert!(v <= prev, "not monotone at t={t}");
                assert!(v >= 0.0, "below floor at t={t}");
                prev = v;
            }
        }
    }

    #[test]
    fn geometric_respects_floor() {
        let x = Geometric::new(0.99975, 1.0, 0.001).unwrap();
        assert_eq!(x.evaluate(1e6), 0.001);
    }
}
