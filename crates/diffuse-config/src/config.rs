//! Engine configuration file.

use diffuse_core::{
    Curve, CurveFamily, CurveSet, CurveShape, DiffuseEngine, EngineSettings, MeterMode,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::paths::{default_library_path, ensure_parent_dir};

/// Global curve selection for one family.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurveConfig {
    /// Shape name: `linear`, `poly`, `exp`, `sigmoid` for ramps, `linear`,
    /// `sqrt`, `sinus` for crossfades.
    pub shape: String,
    /// Shape parameter.
    pub param: f64,
}

impl From<Curve> for CurveConfig {
    fn from(curve: Curve) -> Self {
        Self {
            shape: curve.shape.name().to_string(),
            param: curve.param,
        }
    }
}

impl CurveConfig {
    fn to_curve(&self, family: CurveFamily) -> Result<Curve, ConfigError> {
        let field = format!("{family}.shape");
        let shape: CurveShape = self
            .shape
            .parse()
            .map_err(|e| ConfigError::setting(&field, e))?;
        if !shape.belongs_to(family) {
            return Err(ConfigError::setting(
                field,
                format!("{shape} is not a {family} curve"),
            ));
        }
        if !self.param.is_finite() {
            return Err(ConfigError::setting(
                format!("{family}.param"),
                "must be finite",
            ));
        }
        Ok(Curve::new(shape, self.param))
    }
}

/// Engine configuration file.
///
/// Every field is optional in the file; missing ones take the defaults of
/// [`EngineConfig::default`].
///
/// # TOML Format
///
/// ```toml
/// inputs = 4
/// outputs = 8
/// slots = 16
/// sample_rate = 48000.0
/// master = 1.0
/// out_gains = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.5, 0.5]
/// meter = "db"
/// library = "/home/me/.config/diffuse/states.toml"
///
/// [ramp]
/// shape = "exp"
/// param = 4.0
///
/// [xfade]
/// shape = "sinus"
/// param = -3.0
/// ```
///
/// Plain values precede the curve tables so the file serializes as valid
/// TOML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of input channels.
    pub inputs: usize,
    /// Number of output channels.
    pub outputs: usize,
    /// Number of snapshot slots.
    pub slots: usize,
    /// Initial sample rate in Hz.
    pub sample_rate: f64,
    /// Master gain.
    pub master: f64,
    /// Per-output gains. Empty means unity on every output.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub out_gains: Vec<f64>,
    /// Meter mode: `off`, `db` or `ampl`.
    pub meter: String,
    /// State library file. Defaults to [`default_library_path`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<PathBuf>,
    /// Global ramp curve.
    pub ramp: CurveConfig,
    /// Global crossfade curve.
    pub xfade: CurveConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let settings = EngineSettings::default();
        Self {
            inputs: settings.inputs,
            outputs: settings.outputs,
            slots: settings.slots,
            sample_rate: settings.sample_rate,
            master: 1.0,
            out_gains: Vec::new(),
            meter: MeterMode::default().name().to_string(),
            library: None,
            ramp: settings.curves.ramp.into(),
            xfade: settings.curves.xfade.into(),
        }
    }
}

impl EngineConfig {
    /// Load a config from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "engine config loaded");
        Ok(config)
    }

    /// Load a config from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the config to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        ensure_parent_dir(path)?;
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        tracing::debug!(path = %path.display(), "engine config saved");
        Ok(())
    }

    /// Convert the config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Global curves.
    pub fn curves(&self) -> Result<CurveSet, ConfigError> {
        Ok(CurveSet {
            ramp: self.ramp.to_curve(CurveFamily::Ramp)?,
            xfade: self.xfade.to_curve(CurveFamily::Xfade)?,
        })
    }

    /// Meter mode.
    pub fn meter_mode(&self) -> Result<MeterMode, ConfigError> {
        self.meter
            .parse()
            .map_err(|e| ConfigError::setting("meter", e))
    }

    /// Construction settings for [`DiffuseEngine::new`].
    pub fn settings(&self) -> Result<EngineSettings, ConfigError> {
        if self.inputs == 0 {
            return Err(ConfigError::setting("inputs", "must be at least 1"));
        }
        if self.outputs == 0 {
            return Err(ConfigError::setting("outputs", "must be at least 1"));
        }
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ConfigError::setting("sample_rate", "must be positive"));
        }
        Ok(EngineSettings {
            inputs: self.inputs,
            outputs: self.outputs,
            slots: self.slots,
            sample_rate: self.sample_rate,
            curves: self.curves()?,
        })
    }

    /// Checks every field without building an engine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.settings()?;
        self.meter_mode()?;
        if !(self.master.is_finite() && self.master >= 0.0) {
            return Err(ConfigError::setting("master", "must be non-negative"));
        }
        if !self.out_gains.is_empty() && self.out_gains.len() != self.outputs {
            return Err(ConfigError::setting(
                "out_gains",
                format!(
                    "expected {} values, found {}",
                    self.outputs,
                    self.out_gains.len()
                ),
            ));
        }
        Ok(())
    }

    /// Builds an engine with the configured gains and meter applied.
    pub fn build(&self) -> Result<DiffuseEngine, ConfigError> {
        self.validate()?;
        let mut engine = DiffuseEngine::new(self.settings()?)?;
        engine.set_master(self.master)?;
        for (output, &gain) in self.out_gains.iter().enumerate() {
            engine.set_output_gain(output, gain)?;
        }
        engine.set_meter(self.meter_mode()?);
        tracing::debug!(
            inputs = self.inputs,
            outputs = self.outputs,
            slots = self.slots,
            "engine built from config"
        );
        Ok(engine)
    }

    /// State library file, falling back to the platform default.
    pub fn library_path(&self) -> PathBuf {
        self.library.clone().unwrap_or_else(default_library_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_builds() {
        let config = EngineConfig::default();
        let engine = config.build().unwrap();
        assert_eq!(engine.inputs(), 2);
        assert_eq!(engine.outputs(), 2);
        assert_eq!(engine.curves(), &CurveSet::default());
    }

    #[test]
    fn test_minimal_toml() {
        let config = EngineConfig::from_toml("inputs = 4\noutputs = 8\n").unwrap();
        assert_eq!(config.inputs, 4);
        assert_eq!(config.outputs, 8);
        assert_eq!(config.slots, 10); // default
        assert_eq!(config.ramp, CurveConfig::from(Curve::DEFAULT_RAMP));
    }

    #[test]
    fn test_full_toml() {
        let toml = r#"
inputs = 1
outputs = 3
slots = 4
sample_rate = 48000.0
master = 0.5
out_gains = [1.0, 0.5, 0.25]
meter = "ampl"
library = "lib/states.toml"

[ramp]
shape = "sigmoid"
param = 2.0

[xfade]
shape = "sqrt"
param = -4.5
"#;
        let config = EngineConfig::from_toml(toml).unwrap();
        let engine = config.build().unwrap();
        assert_eq!(engine.master(), 0.5);
        assert_eq!(engine.output_gains(), &[1.0, 0.5, 0.25]);
        assert_eq!(engine.meter().mode(), MeterMode::Amplitude);
        assert_eq!(
            engine.curves().ramp,
            Curve::new(CurveShape::Sigmoid, 2.0)
        );
        assert_eq!(config.library_path(), PathBuf::from("lib/states.toml"));
    }

    #[test]
    fn test_roundtrip() {
        let config = EngineConfig {
            inputs: 6,
            out_gains: vec![0.5, 1.0],
            library: Some(PathBuf::from("states.toml")),
            ..EngineConfig::default()
        };
        let parsed = EngineConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_shape_must_match_family() {
        let config = EngineConfig {
            ramp: CurveConfig {
                shape: "sinus".to_string(),
                param: -3.0,
            },
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSetting { ref field, .. }) if field == "ramp.shape"
        ));
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = [
            EngineConfig {
                inputs: 0,
                ..EngineConfig::default()
            },
            EngineConfig {
                sample_rate: -1.0,
                ..EngineConfig::default()
            },
            EngineConfig {
                master: -0.5,
                ..EngineConfig::default()
            },
            EngineConfig {
                out_gains: vec![1.0],
                ..EngineConfig::default()
            },
            EngineConfig {
                meter: "peak".to_string(),
                ..EngineConfig::default()
            },
            EngineConfig {
                xfade: CurveConfig {
                    shape: "cubic".to_string(),
                    param: 1.0,
                },
                ..EngineConfig::default()
            },
        ];
        for config in bad {
            assert!(
                matches!(config.build(), Err(ConfigError::InvalidSetting { .. })),
                "{config:?}"
            );
        }
    }

    #[test]
    fn test_library_path_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.library_path(), default_library_path());
    }
}
