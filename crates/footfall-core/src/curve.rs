use std::ops::{Add, Mul};
use serde::{Deserialize, Serialize};

#[inline]
pub fn hermite<T>(p0: T, v0: T, p1: T, v1: T, s: f32) -> T
where
    T: Copy + Add<Output = T> + Mul<f32, Output = T>,
{
    let s2 = s*s; let s3 = s2*s;
    let h00 =  2.0*s3 - 3.0*s2 + 1.0;
    let h10 =       s3 - 2.0*s2 + s;
    let h01 = -2.0*s3 + 3.0*s2;
    let h11 =       s3 -     s2;
    p0*h00 + v0*h10 + p1*h01 + v1*h11
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub in_tangent: f32,
    #[serde(default)]
    pub out_tangent: f32,
}

impl Keyframe {
    pub fn new(time: f32, value: f32) -> Self { Self { time, value, in_tangent: 0.0, out_tangent: 0.0 } }
    pub fn with_tangents(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self { time, value, in_tangent, out_tangent }
    }
}

/// Keyframed scalar curve with cubic hermite segments. Clamped outside the key range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Keyframe>", into = "Vec<Keyframe>")]
pub struct Curve { keys: Vec<Keyframe> }

impl From<Vec<Keyframe>> for Curve {
    fn from(keys: Vec<Keyframe>) -> Self { Curve::new(keys) }
}

impl From<Curve> for Vec<Keyframe> {
    fn from(c: Curve) -> Self { c.keys }
}

impl Default for Curve {
    fn default() -> Self { Curve::linear(0.0, 0.0, 1.0, 1.0) }
}

impl Curve {
    pub fn new(mut keys: Vec<Keyframe>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    pub fn constant(value: f32) -> Self { Self { keys: vec![Keyframe::new(0.0, value)] } }

    pub fn linear(t0: f32, v0: f32, t1: f32, v1: f32) -> Self {
        let dt = t1 - t0;
        let slope = if dt.abs() > f32::EPSILON { (v1 - v0) / dt } else { 0.0 };
        Curve::new(vec![
            Keyframe::with_tangents(t0, v0, slope, slope),
            Keyframe::with_tangents(t1, v1, slope, slope),
        ])
    }

    /// Flat tangents at both ends.
    pub fn ease_in_out(t0: f32, v0: f32, t1: f32, v1: f32) -> Self {
        Curve::new(vec![Keyframe::new(t0, v0), Keyframe::new(t1, v1)])
    }

    pub fn keys(&self) -> &[Keyframe] { &self.keys }

    pub fn evaluate(&self, t: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return 0.0,
        };
        if t <= first.time { return first.value; }
        if t >= last.time { return last.value; }

        // first key strictly after t; both neighbours exist because t is inside the range
        let i = self.keys.partition_point(|k| k.time <= t);
        let k0 = &self.keys[i - 1];
        let k1 = &self.keys[i];
        let dt = k1.time - k0.time;
        if dt <= f32::EPSILON { return k1.value; }
        let s = (t - k0.time) / dt;
        hermite(k0.value, k0.out_tangent * dt, k1.value, k1.in_tangent * dt, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use glam::Vec3;

    #[test]
    fn hermite_hits_endpoints() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(hermite(a, Vec3::ZERO, b, Vec3::ZERO, 0.0), a);
        assert!((hermite(a, Vec3::ZERO, b, Vec3::ZERO, 1.0) - b).length() < 1e-6);
    }

    #[test]
    fn linear_curve_is_linear() {
        let c = Curve::linear(0.0, 0.0, 2.0, 4.0);
        assert_abs_diff_eq!(c.evaluate(0.5), 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(c.evaluate(1.5), 3.0, epsilon = 1e-5);
    }

    #[test]
    fn clamps_outside_range() {
        let c = Curve::ease_in_out(1.0, 3.0, 2.0, 5.0);
        assert_eq!(c.evaluate(-10.0), 3.0);
        assert_eq!(c.evaluate(10.0), 5.0);
        assert_abs_diff_eq!(c.evaluate(1.5), 4.0, epsilon = 1e-5);
    }

    #[test]
    fn empty_and_constant() {
        assert_eq!(Curve::new(vec![]).evaluate(0.3), 0.0);
        assert_eq!(Curve::constant(0.7).evaluate(12.0), 0.7);
    }

    #[test]
    fn json_is_a_key_list() {
        let c = Curve::linear(0.0, 1.0, 1.0, 2.0);
        let s = serde_json::to_string(&c).unwrap();
        assert!(s.starts_with('['));
        let back: Curve = serde_json::from_str(&s).unwrap();
        assert_eq!(back, c);
    }
}
