use std::cmp::Ordering;

use footfall_core::{angle_deg, project_on_plane, Isometry, Vec3};
use footfall_terrain::{Hit, TerrainProbe};
use thiserror::Error;

use crate::config::FootConfig;

/// Internal to the solver; always absorbed into a diagnostic.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum SearchError {
    #[error("no verified foothold around {around:?}")]
    NoFootholdFound { around: Vec3 },
}

/// Lexicographic ranking key of a foothold candidate, lower is better.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RankKey {
    /// 0: own side, in reach, forward. 1: same but backward. 2: anything else.
    pub tier: u8,
    pub score: f32,
    pub distance: f32,
}

impl RankKey {
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.tier.cmp(&other.tier)
            .then(self.score.total_cmp(&other.score))
            .then(self.distance.total_cmp(&other.distance))
    }
}

#[inline]
fn quad_mean(a: f32, b: f32, c: f32) -> f32 { ((a * a + b * b + c * c) / 3.0).sqrt() }

/// Everything a foothold query needs for one tick: the probe, where the body is,
/// and the foot's tuning.
pub struct SearchFrame<'a> {
    pub probe: &'a dyn TerrainProbe,
    pub body: Isometry,
    pub cfg: &'a FootConfig,
    pub body_height: f32,
}

impl<'a> SearchFrame<'a> {
    pub fn new(probe: &'a dyn TerrainProbe, body: Isometry, cfg: &'a FootConfig, body_height: f32) -> Self {
        Self { probe, body, cfg, body_height }
    }

    /// Walkable slope, within leg reach, and not too far out in the surface plane.
    pub fn verify(&self, point: Vec3, normal: Vec3) -> bool {
        let dir = point - self.body.pos;
        angle_deg(Vec3::Y, normal) < self.cfg.max_foot_angle
            && dir.length() <= self.cfg.leg_length + self.cfg.reach_slack
            && project_on_plane(dir, normal).length() <= self.cfg.max_step_length
    }

    /// Forward and reach are measured from `target`; the lateral offset from the
    /// body centre line. The drop term is scaled by the measured body height.
    pub fn rank(&self, target: Vec3, point: Vec3) -> RankKey {
        let right = self.body.right();
        let d = point - target;
        let forward = d.dot(self.body.forward());
        let horizontal = forward.hypot(d.dot(right));
        let lateral = (point - self.body.pos).dot(right);

        let own_side = self.cfg.side.signum() * lateral >= self.cfg.min_foot_spacing
            && horizontal < self.cfg.max_step_length;
        let tier = match (own_side, forward >= 0.0) {
            (true, true) => 0,
            (true, false) => 1,
            _ => 2,
        };

        let drop = (1.0 - d.y / self.body_height.max(1e-3)).max(1e-3).log2().powi(2);
        let score = quad_mean(horizontal, (lateral - self.cfg.signed_spacing()).abs(), drop);
        RankKey { tier, score, distance: d.length() }
    }

    pub fn compare(&self, target: Vec3, lhs: &Hit, rhs: &Hit) -> Ordering {
        self.rank(target, lhs.point).total_cmp(&self.rank(target, rhs.point))
    }

    /// Stable sort, best candidate first.
    pub fn rank_hits(&self, target: Vec3, hits: &mut [Hit]) {
        hits.sort_by(|a, b| self.compare(target, a, b));
    }

    pub fn first_verified(&self, hits: &[Hit]) -> Option<Hit> {
        hits.iter().copied().find(|h| self.verify(h.point, h.normal))
    }

    /// Straight down from `(at.x, from_y, at.z)`.
    pub fn ray_down(&self, at: Vec3, from_y: f32, range: f32) -> Option<Hit> {
        self.probe.raycast(Vec3::new(at.x, from_y, at.z), Vec3::NEG_Y, range, self.cfg.mask)
    }

    /// Sphere-cast straight down through a band of `1.1 · max_step_height` on
    /// either side of `center`, ranked against `center`.
    pub fn local_search(&self, center: Vec3, radius: f32) -> Vec<Hit> {
        let reach = self.cfg.max_step_height * 1.1;
        let mut hits = self.probe.spherecast(center + Vec3::Y * reach, radius, Vec3::NEG_Y, 2.0 * reach, self.cfg.mask);
        self.rank_hits(center, &mut hits);
        hits
    }

    /// First verified candidate of a local search. The ranked list is left in `scratch`.
    pub fn best_fit(&self, center: Vec3, radius: f32, scratch: &mut Vec<Hit>) -> Result<Hit, SearchError> {
        *scratch = self.local_search(center, radius);
        self.first_verified(scratch).ok_or(SearchError::NoFootholdFound { around: center })
    }

    /// Footholds around a barrier crest. Each ranked candidate is verified in turn.
    pub fn barrier_fallback(&self, crest: Vec3, target: Vec3, scratch: &mut Vec<Hit>) -> Option<Hit> {
        let mut hits = self.probe.spherecast(crest, self.cfg.side_step_radius, Vec3::NEG_Y, self.cfg.max_step_height, self.cfg.mask);
        self.rank_hits(target, &mut hits);
        *scratch = hits;
        self.first_verified(scratch)
    }

    /// Short ray under the foot, then a sphere-cast whose nearest hit must be
    /// within `eps` of the foot.
    pub fn ground_check(&self, foot: Vec3) -> Option<Hit> {
        let gc = &self.cfg.ground_check;
        let origin = foot + Vec3::Y * gc.lift;
        if let Some(hit) = self.probe.raycast(origin, Vec3::NEG_Y, gc.radius, self.cfg.mask) {
            return Some(hit);
        }
        if gc.fallback <= 1e-5 { return None; }
        self.probe
            .spherecast(origin, gc.radius, Vec3::NEG_Y, gc.fallback, self.cfg.mask)
            .into_iter()
            .min_by(|a, b| a.point.distance(foot).total_cmp(&b.point.distance(foot)))
            .filter(|h| h.point.distance(foot) < gc.eps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use footfall_core::vec3;
    use footfall_terrain::{EmptyProbe, LayerMask, TerrainScene};

    fn hit(p: Vec3) -> Hit { Hit { point: p, normal: Vec3::Y, distance: 0.0 } }

    fn frame<'a>(probe: &'a dyn TerrainProbe, cfg: &'a FootConfig) -> SearchFrame<'a> {
        SearchFrame::new(probe, Isometry::IDENTITY, cfg, 0.9)
    }

    #[test]
    fn verify_limits() {
        let cfg = FootConfig::default();
        let f = frame(&EmptyProbe, &cfg);
        assert!(f.verify(vec3(0.3, -0.9, 0.12), Vec3::Y));
        // too steep
        assert!(!f.verify(vec3(0.3, -0.9, 0.12), vec3(1.0, 1.0, 0.0).normalize()));
        // out of reach
        assert!(!f.verify(vec3(0.3, -1.3, 0.12), Vec3::Y));
        // too far out in the surface plane
        assert!(!f.verify(vec3(0.7, -0.5, 0.12), Vec3::Y));
    }

    #[test]
    fn ranking_matches_hand_order() {
        let cfg = FootConfig::default();
        let f = frame(&EmptyProbe, &cfg);
        let target = vec3(0.4, -0.9, 0.12);

        let a = hit(vec3(0.5, -0.9, 0.12)); // forward, on spacing, level
        let d = hit(vec3(0.6, -0.7, 0.12)); // forward but raised 0.2
        let b = hit(vec3(0.3, -0.9, 0.15)); // backward
        let c = hit(vec3(0.45, -0.9, -0.1)); // wrong side of the body

        let ka = f.rank(target, a.point);
        assert_eq!(ka.tier, 0);
        assert_abs_diff_eq!(ka.score, (0.01f32 / 3.0).sqrt(), epsilon = 1e-5);
        let kd = f.rank(target, d.point);
        let drop = (1.0f32 - 0.2 / 0.9).log2().powi(2);
        assert_abs_diff_eq!(kd.score, ((0.04 + drop * drop) / 3.0f32).sqrt(), epsilon = 1e-4);
        assert_eq!(f.rank(target, b.point).tier, 1);
        assert_eq!(f.rank(target, c.point).tier, 2);

        let mut hits = vec![c, b, d, a];
        f.rank_hits(target, &mut hits);
        let order: Vec<Vec3> = hits.iter().map(|h| h.point).collect();
        assert_eq!(order, vec![a.point, d.point, b.point, c.point]);
    }

    #[test]
    fn comparator_is_antisymmetric() {
        let cfg = FootConfig::left();
        let f = frame(&EmptyProbe, &cfg);
        let target = vec3(0.4, -0.9, -0.12);
        let pts = [
            vec3(0.5, -0.9, -0.12), vec3(0.2, -0.8, -0.2), vec3(0.4, -1.0, 0.1),
            vec3(0.45, -0.9, -0.12), vec3(0.9, -0.9, -0.3),
        ];
        for p in pts {
            for q in pts {
                let (l, r) = (hit(p), hit(q));
                assert_eq!(f.compare(target, &l, &r), f.compare(target, &r, &l).reverse());
            }
            assert_eq!(f.compare(target, &hit(p), &hit(p)), Ordering::Equal);
        }
    }

    #[test]
    fn ground_check_ray_then_nothing() {
        let cfg = FootConfig::default();
        let scene = TerrainScene::flat(0.0);
        let f = frame(&scene, &cfg);
        let g = f.ground_check(vec3(2.0, 0.05, 0.0)).unwrap();
        assert_abs_diff_eq!(g.point.y, 0.0, epsilon = 1e-5);
        assert!(f.ground_check(vec3(2.0, 0.6, 0.0)).is_none());
    }

    struct ScriptedProbe { sphere: Vec<Hit> }

    impl TerrainProbe for ScriptedProbe {
        fn raycast(&self, _: Vec3, _: Vec3, _: f32, _: LayerMask) -> Option<Hit> { None }
        fn spherecast(&self, _: Vec3, _: f32, _: Vec3, _: f32, _: LayerMask) -> Vec<Hit> { self.sphere.clone() }
        fn capsulecast(&self, _: Vec3, _: Vec3, _: f32, _: Vec3, _: f32, _: LayerMask) -> Option<Hit> { None }
    }

    #[test]
    fn barrier_fallback_checks_every_candidate() {
        let cfg = FootConfig::default();
        // best ranked candidate is too steep, the second one is fine
        let steep = Hit { point: vec3(0.4, -0.9, 0.12), normal: vec3(1.0, 0.4, 0.0).normalize(), distance: 0.1 };
        let flat = hit(vec3(0.3, -0.85, 0.14));
        let probe = ScriptedProbe { sphere: vec![steep, flat] };
        let f = frame(&probe, &cfg);
        let mut scratch = Vec::new();
        let got = f.barrier_fallback(vec3(0.4, -0.6, 0.12), vec3(0.4, -0.9, 0.12), &mut scratch).unwrap();
        assert_eq!(scratch[0].point, steep.point);
        assert_eq!(got.point, flat.point);
    }

    #[test]
    fn best_fit_reports_no_foothold() {
        let cfg = FootConfig::default();
        let f = frame(&EmptyProbe, &cfg);
        let mut scratch = vec![hit(Vec3::ZERO)];
        let at = vec3(0.4, -0.9, 0.12);
        assert_eq!(f.best_fit(at, 0.6, &mut scratch), Err(SearchError::NoFootholdFound { around: at }));
        assert!(scratch.is_empty());
    }
}
