//! # 流程配置
//!
//! 把历史上多份只在文件命名、能量列位置、质量来源上有差别的处理流程
//! 合并为一个配置结构，每个变体都是一组配置值。
//!
//! ## 依赖关系
//! - 被 `pipeline/` 各阶段和 `commands/process.rs` 使用
//! - 使用 `models/`, `parsers/event_file.rs` 的 SchemaVersion

use super::naming::FileNaming;
use crate::error::{BgnormError, Result};
use crate::models::{Binning, Component};
use crate::parsers::SchemaVersion;

use clap::ValueEnum;
use std::collections::BTreeMap;

/// 每天的秒数
pub const SECONDS_PER_DAY: f64 = 86400.0;

/// 探测器质量 (kg)
pub const DEFAULT_DETECTOR_MASS_KG: f64 = 0.797336;

/// 内部材料的质量来源
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum MassSource {
    /// Mass of the material recovered from each file's geometry table
    #[default]
    Geometry,
    /// Fixed reference mass from the materials table
    Table,
}

/// 初级事件数来源
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum BeamOnSource {
    /// `/run/beamOn` directive embedded in the result file
    #[default]
    RunMacro,
    /// `Count` column of the catalog tables
    Table,
}

/// 初级事件数未知时的处理策略
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum BeamOnFallback {
    /// Assume one primary event and log a warning
    #[default]
    One,
    /// Skip the (layer, isotope) pair
    Skip,
}

/// 归一化流程的完整配置
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub component: Component,
    pub naming: FileNaming,
    /// 能量沉积列所在的数据格式版本
    pub schema: SchemaVersion,
    pub mass_source: MassSource,
    /// 几何变体标签，选择参考表中的 `Mass_<geometry>` 列
    pub geometry: Option<String>,
    /// 参考表材料名 -> 几何表材料名
    pub geometry_aliases: BTreeMap<String, String>,
    pub beam_on_source: BeamOnSource,
    pub beam_on_fallback: BeamOnFallback,
    pub binning: Binning,
    /// 探测器质量 (kg)
    pub detector_mass: f64,
}

impl PipelineConfig {
    /// 使用默认值创建配置
    pub fn new(component: Component, naming: FileNaming) -> Self {
        let mut geometry_aliases = BTreeMap::new();
        geometry_aliases.insert("PCu".to_string(), "PureCu".to_string());

        PipelineConfig {
            component,
            naming,
            schema: SchemaVersion::default(),
            mass_source: MassSource::default(),
            geometry: None,
            geometry_aliases,
            beam_on_source: BeamOnSource::default(),
            beam_on_fallback: BeamOnFallback::default(),
            binning: Binning::default(),
            detector_mass: DEFAULT_DETECTOR_MASS_KG,
        }
    }

    /// 固定质量模式下参考表中要读取的质量列
    pub fn mass_column(&self) -> Option<String> {
        if !self.component.is_internal() || self.mass_source != MassSource::Table {
            return None;
        }
        Some(match &self.geometry {
            Some(tag) => format!("Mass_{}", tag),
            None => "Mass".to_string(),
        })
    }

    /// 参考表中的材料名在几何表中的名称
    pub fn geometry_material<'a>(&'a self, layer: &'a str) -> &'a str {
        self.geometry_aliases
            .get(layer)
            .map(String::as_str)
            .unwrap_or(layer)
    }

    /// 检查数值参数
    pub fn validate(&self) -> Result<()> {
        if self.binning.bins == 0 {
            return Err(BgnormError::InvalidArgument(
                "number of bins must be positive".to_string(),
            ));
        }
        if !(self.binning.high > self.binning.low) {
            return Err(BgnormError::InvalidRange(format!(
                "{}-{} (energy range must satisfy low < high)",
                self.binning.low, self.binning.high
            )));
        }
        if !(self.detector_mass.is_finite() && self.detector_mass > 0.0) {
            return Err(BgnormError::InvalidArgument(format!(
                "detector mass must be positive, got {}",
                self.detector_mass
            )));
        }
        if self.naming.replicates.is_empty() {
            return Err(BgnormError::InvalidRange(format!(
                "{}-{} (replicate window is empty)",
                self.naming.replicates.start(),
                self.naming.replicates.end()
            )));
        }
        Ok(())
    }
}
