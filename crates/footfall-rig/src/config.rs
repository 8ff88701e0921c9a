use std::path::{Path, PathBuf};

use footfall_core::{vec3, Vec3};
use footfall_foot::FootConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::gait::GaitProfile;

#[derive(Debug, Error)]
pub enum RigConfigError {
    #[error("cannot access rig config {}", path.display())]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("malformed rig config")]
    Parse(#[from] serde_json::Error),
    #[error("invalid rig config: {0}")]
    Invalid(String),
}

/// Everything a [`LocomotionRig`](crate::LocomotionRig) is built from.
/// Missing JSON fields take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    pub left: FootConfig,
    pub right: FootConfig,
    pub gait: GaitProfile,
    /// Body-local point each foot is snapped down from at setup.
    pub left_rest: Vec3,
    pub right_rest: Vec3,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            left: FootConfig::left(),
            right: FootConfig::right(),
            gait: GaitProfile::default(),
            left_rest: vec3(0.0, -0.5, -0.12),
            right_rest: vec3(0.0, -0.5, 0.12),
        }
    }
}

impl RigConfig {
    pub fn from_json_str(s: &str) -> Result<Self, RigConfigError> {
        let cfg: RigConfig = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_json(path: &Path) -> Result<Self, RigConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| RigConfigError::Io { path: path.to_path_buf(), source })?;
        let cfg = Self::from_json_str(&text)?;
        debug!(path = %path.display(), "rig config loaded");
        Ok(cfg)
    }

    /// Writes the config as JSON; `pretty` indents it.
    pub fn save_json(&self, path: &Path, pretty: bool) -> Result<(), RigConfigError> {
        let json = if pretty { serde_json::to_string_pretty(self)? } else { serde_json::to_string(self)? };
        std::fs::write(path, json).map_err(|source| RigConfigError::Io { path: path.to_path_buf(), source })
    }

    pub fn validate(&self) -> Result<(), RigConfigError> {
        let invalid = |msg: String| Err(RigConfigError::Invalid(msg));
        for (name, foot) in [("left", &self.left), ("right", &self.right)] {
            if !(foot.leg_length > 0.0) {
                return invalid(format!("{name} leg_length must be positive, got {}", foot.leg_length));
            }
            if foot.body_height.is_some_and(|h| !(h > 0.0)) {
                return invalid(format!("{name} body_height must be positive when set"));
            }
            let radii = [
                ("sweep_radius", foot.sweep_radius),
                ("side_step_radius", foot.side_step_radius),
                ("ground_check.radius", foot.ground_check.radius),
                ("ground_check.fallback", foot.ground_check.fallback),
            ];
            for (field, r) in radii {
                if !(r >= 0.0) {
                    return invalid(format!("{name} {field} must not be negative, got {r}"));
                }
            }
        }
        if !(self.left.side < 0.0 && self.right.side > 0.0) {
            return invalid("left foot needs a negative side and right foot a positive one".into());
        }
        if !(self.gait.run_threshold >= 0.0) {
            return invalid(format!("run_threshold must not be negative, got {}", self.gait.run_threshold));
        }
        if let Some(k) = self.gait.step_period.keys().iter().find(|k| !(k.value > 0.0)) {
            return invalid(format!("step_period must be positive, got {} at speed {}", k.value, k.time));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_the_default() {
        assert_eq!(RigConfig::from_json_str("{}").unwrap(), RigConfig::default());
    }

    #[test]
    fn partial_override() {
        let cfg = RigConfig::from_json_str(r#"{ "gait": { "run_threshold": 2.0 }, "right": { "leg_length": 1.2 } }"#).unwrap();
        assert_eq!(cfg.gait.run_threshold, 2.0);
        assert_eq!(cfg.right.leg_length, 1.2);
        assert_eq!(cfg.right.side, 1.0);
        assert_eq!(cfg.gait.step_length, GaitProfile::default().step_length);
    }

    #[test]
    fn rejects_bad_values() {
        let bad = [
            r#"{ "left": { "side": -1.0, "leg_length": 0.0 } }"#,
            r#"{ "right": { "sweep_radius": -0.1 } }"#,
            r#"{ "gait": { "step_period": [ { "time": 0.0, "value": 0.0 } ] } }"#,
            r#"{ "left": { "side": 1.0 } }"#,
        ];
        for json in bad {
            assert!(matches!(RigConfig::from_json_str(json), Err(RigConfigError::Invalid(_))), "{json}");
        }
        assert!(matches!(RigConfig::from_json_str("{ nope"), Err(RigConfigError::Parse(_))));
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("footfall-rig-{}.json", std::process::id()));
        let mut cfg = RigConfig::default();
        cfg.gait.run_threshold = 2.5;
        cfg.save_json(&path, true).unwrap();
        let back = RigConfig::load_json(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(back, cfg);
    }

    #[test]
    fn missing_file_is_io() {
        let err = RigConfig::load_json(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, RigConfigError::Io { .. }));
    }
}
