use sem2d::config::{ConfigError, KernelSelection, ScatterStrategy, SolverConfig};
use sem2d::shape::{ControlNodeLayout, UnsupportedControlNodeCount};
use std::error::Error;

#[test]
fn default_config_is_valid() {
    let config = SolverConfig::default();
    assert_eq!(config.ngllx, 5);
    assert_eq!(config.ngllz, 5);
    assert_eq!(config.ngnod, 4);
    assert_eq!(config.scatter, ScatterStrategy::Colored);
    assert_eq!(config.kernel, KernelSelection::Auto);
    assert_eq!(config.distortion_warning_ratio, 10.0);
    assert_eq!(config.validate(), Ok(()));
    assert_eq!(config.layout(), Ok(ControlNodeLayout::Quad4));
}

#[test]
fn config_json_roundtrip() {
    let config = SolverConfig {
        ngllx: 4,
        ngllz: 6,
        ngnod: 9,
        scatter: ScatterStrategy::Sequential,
        kernel: KernelSelection::Generic,
        distortion_warning_ratio: 25.0,
    };
    let json = serde_json::to_string(&config).unwrap();
    let deserialized: SolverConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized, config);
}

#[test]
fn missing_fields_take_default_values() {
    let config: SolverConfig = serde_json::from_str(r#"{ "ngllx": 7, "scatter": "Sequential" }"#).unwrap();
    assert_eq!(
        config,
        SolverConfig {
            ngllx: 7,
            scatter: ScatterStrategy::Sequential,
            ..SolverConfig::default()
        }
    );
}

#[test]
fn validate_rejects_invalid_configs() {
    let config = SolverConfig {
        ngllz: 1,
        ..SolverConfig::default()
    };
    assert_eq!(
        config.validate(),
        Err(ConfigError::GridTooSmall {
            direction: "gamma",
            ngll: 1
        })
    );

    let config = SolverConfig {
        ngnod: 8,
        ..SolverConfig::default()
    };
    let err = config.validate().unwrap_err();
    assert_eq!(err, ConfigError::UnsupportedControlNodeCount(UnsupportedControlNodeCount(8)));
    assert!(err.source().is_some());

    for ratio in [0.5, f64::NAN] {
        let config = SolverConfig {
            distortion_warning_ratio: ratio,
            ..SolverConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDistortionWarningRatio(_))
        ));
    }
}

#[test]
fn fixed_order_requires_isotropic_supported_grid() {
    let config = |ngllx, ngllz, kernel| SolverConfig {
        ngllx,
        ngllz,
        kernel,
        ..SolverConfig::default()
    };
    assert_eq!(config(5, 5, KernelSelection::Auto).fixed_order(), Some(5));
    assert_eq!(config(2, 2, KernelSelection::Auto).fixed_order(), Some(2));
    assert_eq!(config(8, 8, KernelSelection::Auto).fixed_order(), Some(8));
    assert_eq!(config(9, 9, KernelSelection::Auto).fixed_order(), None);
    assert_eq!(config(4, 5, KernelSelection::Auto).fixed_order(), None);
    assert_eq!(config(5, 5, KernelSelection::Generic).fixed_order(), None);
}
