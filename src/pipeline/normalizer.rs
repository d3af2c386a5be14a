//! # 能谱归一化
//!
//! 将原始分箱计数换算为计数率 counts / (keV·kg·day)：
//!
//! ```text
//! factor      = exposure · 86400 / (beam_on · file_count) / bin_width / detector_mass
//! rate[i]     = counts[i] · factor · activity
//! sigma[i]    = counts[i] · factor · sigma
//! ```
//!
//! 不确定度是对参考表相对 sigma 的线性缩放，不是计数统计误差。
//! 任何参数无法确定时返回 `SkipReason`，不会把 NaN / Inf 写入能谱。
//!
//! ## 依赖关系
//! - 被 `pipeline/mod.rs` 调用
//! - 使用 `catalog/` 的 CatalogEntry, `parsers/run_macro.rs` 的 RunMetadata

use super::config::{BeamOnFallback, BeamOnSource, MassSource, PipelineConfig, SECONDS_PER_DAY};
use crate::catalog::CatalogEntry;
use crate::models::{EnergyHistogram, NormalizedSpectrum, PairKey};
use crate::parsers::RunMetadata;

use thiserror::Error;

/// 跳过一个 (layer, isotope) 组合的原因
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkipReason {
    #[error("no contributing result files")]
    NoContributingFiles,

    #[error("no catalog entry")]
    CatalogMiss,

    #[error("catalog entry has no {0}")]
    MissingExposure(&'static str),

    #[error("no geometry table in the contributing files")]
    MissingGeometryTable,

    #[error("material '{0}' not present in the geometry table")]
    GeometryMassMissing(String),

    #[error("exposure must be positive, got {0}")]
    NonPositiveExposure(f64),

    #[error("number of primary events is unknown")]
    UnknownBeamOn,

    #[error("invalid catalog value: activity={activity} sigma={sigma}")]
    InvalidCatalogValue { activity: f64, sigma: f64 },

    #[error("normalization factor is not finite")]
    NonFiniteFactor,

    #[error("normalized rate overflows")]
    NonFiniteRate,
}

/// 归一化系数
pub fn normalization_factor(
    exposure: f64,
    beam_on: f64,
    file_count: usize,
    bin_width: f64,
    detector_mass: f64,
) -> f64 {
    exposure * SECONDS_PER_DAY / (beam_on * file_count as f64)
        * (1.0 / bin_width)
        * (1.0 / detector_mass)
}

/// 确定曝光量：内部材料的质量或背景源的表面积
fn resolve_exposure(
    key: &PairKey,
    samples: &[RunMetadata],
    entry: &CatalogEntry,
    config: &PipelineConfig,
) -> Result<f64, SkipReason> {
    let exposure = if key.component.is_internal() && config.mass_source == MassSource::Geometry {
        let material = config.geometry_material(&key.layer);
        let masses = samples
            .first()
            .and_then(|m| m.masses.as_ref())
            .ok_or(SkipReason::MissingGeometryTable)?;
        *masses
            .get(material)
            .ok_or_else(|| SkipReason::GeometryMassMissing(material.to_string()))?
    } else {
        let what = if key.component.is_internal() { "mass" } else { "surface" };
        entry.exposure.ok_or(SkipReason::MissingExposure(what))?
    };

    if exposure.is_finite() && exposure > 0.0 {
        Ok(exposure)
    } else {
        Err(SkipReason::NonPositiveExposure(exposure))
    }
}

/// 确定初级事件数；未知时按配置的策略处理
fn resolve_beam_on(
    key: &PairKey,
    samples: &[RunMetadata],
    entry: &CatalogEntry,
    config: &PipelineConfig,
) -> Result<f64, SkipReason> {
    let beam_on = match config.beam_on_source {
        BeamOnSource::RunMacro => {
            let first = samples.first().and_then(|m| m.beam_on);
            if let Some(n) = first {
                if samples.iter().any(|m| m.beam_on.is_some_and(|b| b != n)) {
                    log::warn!(
                        "layer={} isotope={} reason=\"beamOn differs across replicates, using {}\"",
                        key.layer,
                        key.isotope,
                        n
                    );
                }
            }
            first.map(|n| n as f64)
        }
        BeamOnSource::Table => entry.event_count.filter(|c| c.is_finite() && *c > 0.0),
    };

    match (beam_on, config.beam_on_fallback) {
        (Some(n), _) => Ok(n),
        (None, BeamOnFallback::One) => {
            log::warn!(
                "layer={} isotope={} reason=\"beamOn unknown, defaulting to 1\"",
                key.layer,
                key.isotope
            );
            Ok(1.0)
        }
        (None, BeamOnFallback::Skip) => Err(SkipReason::UnknownBeamOn),
    }
}

/// 归一化一个组合的直方图
pub fn normalize(
    key: &PairKey,
    histogram: &EnergyHistogram,
    samples: &[RunMetadata],
    entry: &CatalogEntry,
    file_count: usize,
    config: &PipelineConfig,
) -> Result<NormalizedSpectrum, SkipReason> {
    if file_count == 0 {
        return Err(SkipReason::NoContributingFiles);
    }

    if !(entry.activity.is_finite() && entry.sigma.is_finite() && entry.sigma >= 0.0) {
        return Err(SkipReason::InvalidCatalogValue {
            activity: entry.activity,
            sigma: entry.sigma,
        });
    }

    let exposure = resolve_exposure(key, samples, entry, config)?;
    let beam_on = resolve_beam_on(key, samples, entry, config)?;

    let factor = normalization_factor(
        exposure,
        beam_on,
        file_count,
        config.binning.width(),
        config.detector_mass,
    );
    if !factor.is_finite() {
        return Err(SkipReason::NonFiniteFactor);
    }

    let norm = factor * entry.activity;
    let norm_err = factor * entry.sigma;
    if !(norm.is_finite() && norm_err.is_finite()) {
        return Err(SkipReason::NonFiniteRate);
    }

    let rate: Vec<f64> = histogram.counts.iter().map(|&c| c as f64 * norm).collect();
    let uncertainty: Vec<f64> = histogram
        .counts
        .iter()
        .map(|&c| c as f64 * norm_err)
        .collect();
    // 计数再乘一次仍可能溢出
    if !rate.iter().chain(&uncertainty).all(|v| v.is_finite()) {
        return Err(SkipReason::NonFiniteRate);
    }

    Ok(NormalizedSpectrum {
        key: key.clone(),
        energy: histogram.centers.clone(),
        rate,
        uncertainty,
        file_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Binning, Component};
    use crate::pipeline::naming::FileNaming;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn entry(component: Component, exposure: Option<f64>) -> CatalogEntry {
        CatalogEntry {
            key: PairKey::new(component, "Cu", "K40"),
            activity: 10.0,
            sigma: 1.0,
            exposure,
            event_count: Some(500.0),
        }
    }

    fn table_config() -> PipelineConfig {
        let mut cfg = PipelineConfig::new(Component::Internal, FileNaming::new(PathBuf::from(".")));
        cfg.mass_source = MassSource::Table;
        cfg
    }

    fn histogram_with(bin: usize, count: u64) -> EnergyHistogram {
        let binning = Binning::default();
        let mut hist = EnergyHistogram::from_values(&[], &binning);
        hist.counts[bin] = count;
        hist
    }

    fn meta(beam_on: Option<u64>) -> RunMetadata {
        RunMetadata {
            beam_on,
            masses: None,
        }
    }

    #[test]
    fn test_normalization_factor_scenario() {
        let factor = normalization_factor(2.0, 1000.0, 1, 250.0, 0.797336);
        let expected = 2.0 * 86400.0 / 1000.0 / 250.0 / 0.797336;
        assert!((factor - expected).abs() < 1e-12);
        assert!((factor - 0.866887).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_scenario() {
        let key = PairKey::new(Component::Internal, "Cu", "K40");
        let hist = histogram_with(3, 50);
        let cfg = table_config();
        let entry = entry(Component::Internal, Some(2.0));
        let spectrum = normalize(&key, &hist, &[meta(Some(1000))], &entry, 1, &cfg).unwrap();

        let factor = 2.0 * 86400.0 / 1000.0 / 250.0 / 0.797336;
        assert_eq!(spectrum.rate.len(), 20);
        assert!((spectrum.rate[3] - 50.0 * factor * 10.0).abs() < 1e-9);
        assert!((spectrum.uncertainty[3] - 50.0 * factor * 1.0).abs() < 1e-9);
        assert_eq!(spectrum.rate[0], 0.0);
        assert!(spectrum.uncertainty.iter().all(|u| *u >= 0.0));
    }

    #[test]
    fn test_zero_files_is_skipped() {
        let key = PairKey::new(Component::Internal, "Cu", "K40");
        let hist = histogram_with(0, 5);
        let entry = entry(Component::Internal, Some(2.0));
        let result = normalize(&key, &hist, &[], &entry, 0, &table_config());
        assert_eq!(result.unwrap_err(), SkipReason::NoContributingFiles);
    }

    #[test]
    fn test_unknown_beam_on_defaults_to_one() {
        let key = PairKey::new(Component::Internal, "Cu", "K40");
        let hist = histogram_with(0, 1);
        // 3 个文件成功，beamOn 未知
        let samples = vec![meta(None), meta(None), meta(None)];
        let entry = entry(Component::Internal, Some(2.0));
        let spectrum = normalize(&key, &hist, &samples, &entry, 3, &table_config()).unwrap();

        let factor = 2.0 * 86400.0 / (1.0 * 3.0) / 250.0 / 0.797336;
        assert!((spectrum.rate[0] - factor * 10.0).abs() < 1e-9);
        assert_eq!(spectrum.file_count, 3);
    }

    #[test]
    fn test_unknown_beam_on_skip_policy() {
        let key = PairKey::new(Component::Internal, "Cu", "K40");
        let hist = histogram_with(0, 1);
        let mut cfg = table_config();
        cfg.beam_on_fallback = BeamOnFallback::Skip;
        let entry = entry(Component::Internal, Some(2.0));
        let result = normalize(&key, &hist, &[meta(None)], &entry, 1, &cfg);
        assert_eq!(result.unwrap_err(), SkipReason::UnknownBeamOn);
    }

    #[test]
    fn test_beam_on_from_table_count() {
        let key = PairKey::new(Component::Internal, "Cu", "K40");
        let hist = histogram_with(0, 1);
        let mut cfg = table_config();
        cfg.beam_on_source = BeamOnSource::Table;
        let entry = entry(Component::Internal, Some(2.0));
        let spectrum = normalize(&key, &hist, &[meta(Some(1))], &entry, 1, &cfg).unwrap();
        let factor = 2.0 * 86400.0 / 500.0 / 250.0 / 0.797336;
        assert!((spectrum.rate[0] - factor * 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_geometry_mass_with_alias() {
        let key = PairKey::new(Component::Internal, "PCu", "K40");
        let hist = histogram_with(0, 1);
        let cfg = PipelineConfig::new(Component::Internal, FileNaming::new(PathBuf::from(".")));

        let mut masses = BTreeMap::new();
        masses.insert("PureCu".to_string(), 4.0);
        let samples = vec![RunMetadata {
            beam_on: Some(100),
            masses: Some(masses),
        }];

        let entry = entry(Component::Internal, None);
        let spectrum = normalize(&key, &hist, &samples, &entry, 1, &cfg).unwrap();
        let factor = 4.0 * 86400.0 / 100.0 / 250.0 / 0.797336;
        assert!((spectrum.rate[0] - factor * 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_geometry_mass_missing_is_skipped() {
        let key = PairKey::new(Component::Internal, "Ti", "K40");
        let hist = histogram_with(0, 1);
        let cfg = PipelineConfig::new(Component::Internal, FileNaming::new(PathBuf::from(".")));
        let samples = vec![RunMetadata {
            beam_on: Some(100),
            masses: Some(BTreeMap::new()),
        }];
        let entry = entry(Component::Internal, None);
        let result = normalize(&key, &hist, &samples, &entry, 1, &cfg);
        assert_eq!(
            result.unwrap_err(),
            SkipReason::GeometryMassMissing("Ti".to_string())
        );

        let result = normalize(&key, &hist, &[meta(Some(100))], &entry, 1, &cfg);
        assert_eq!(result.unwrap_err(), SkipReason::MissingGeometryTable);
    }

    #[test]
    fn test_background_uses_surface() {
        let key = PairKey::new(Component::Rock, "Gammas", "K40");
        let hist = histogram_with(0, 2);
        let cfg = PipelineConfig::new(Component::Rock, FileNaming::new(PathBuf::from(".")));
        let rock = entry(Component::Rock, Some(100.0));
        let spectrum = normalize(&key, &hist, &[meta(Some(1000))], &rock, 2, &cfg).unwrap();
        let factor = 100.0 * 86400.0 / (1000.0 * 2.0) / 250.0 / 0.797336;
        assert!((spectrum.rate[0] - 2.0 * factor * 10.0).abs() < 1e-9);

        let rock = entry(Component::Rock, None);
        let result = normalize(&key, &hist, &[meta(Some(1000))], &rock, 2, &cfg);
        assert_eq!(result.unwrap_err(), SkipReason::MissingExposure("surface"));
    }

    #[test]
    fn test_invalid_exposure_and_sigma() {
        let key = PairKey::new(Component::Internal, "Cu", "K40");
        let hist = histogram_with(0, 1);
        let cfg = table_config();

        let zero = entry(Component::Internal, Some(0.0));
        let result = normalize(&key, &hist, &[meta(Some(10))], &zero, 1, &cfg);
        assert_eq!(result.unwrap_err(), SkipReason::NonPositiveExposure(0.0));

        let mut bad = entry(Component::Internal, Some(1.0));
        bad.sigma = -1.0;
        let result = normalize(&key, &hist, &[meta(Some(10))], &bad, 1, &cfg);
        assert!(matches!(result, Err(SkipReason::InvalidCatalogValue { .. })));
    }

    #[test]
    fn test_zero_detector_mass_is_skipped() {
        let key = PairKey::new(Component::Internal, "Cu", "K40");
        let hist = histogram_with(0, 1);
        let mut cfg = table_config();
        cfg.detector_mass = 0.0;
        let entry = entry(Component::Internal, Some(2.0));
        let result = normalize(&key, &hist, &[meta(Some(10))], &entry, 1, &cfg);
        assert_eq!(result.unwrap_err(), SkipReason::NonFiniteFactor);
    }

    #[test]
    fn test_overflowing_rate_is_skipped() {
        let key = PairKey::new(Component::Internal, "Cu", "K40");
        let hist = histogram_with(0, 5);
        let cfg = table_config();
        let mut huge = entry(Component::Internal, Some(1e300));
        huge.activity = 1e300;
        huge.sigma = 1e299;
        let result = normalize(&key, &hist, &[meta(Some(1))], &huge, 1, &cfg);
        assert_eq!(result.unwrap_err(), SkipReason::NonFiniteRate);
    }

    #[test]
    fn test_overflow_from_bin_count_is_skipped() {
        let key = PairKey::new(Component::Internal, "Cu", "K40");
        let hist = histogram_with(0, u64::MAX);
        let cfg = table_config();
        // 单位计数的系数有限，乘以计数后溢出
        let mut big = entry(Component::Internal, Some(1e300));
        big.activity = 1e2;
        big.sigma = 1.0;
        let result = normalize(&key, &hist, &[meta(Some(1))], &big, 1, &cfg);
        assert_eq!(result.unwrap_err(), SkipReason::NonFiniteRate);
    }
}
