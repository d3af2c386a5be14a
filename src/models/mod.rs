//! # 数据模型模块
//!
//! 定义本底来源标识与能谱相关的数据模型。
//!
//! ## 依赖关系
//! - 被 `catalog/`, `pipeline/`, `report/`, `commands/` 使用
//! - 子模块: source, spectrum

pub mod source;
pub mod spectrum;

pub use source::{Component, PairKey};
pub use spectrum::{
    BinTotals, Binning, EnergyHistogram, LayerTotal, NormalizedSpectrum, RollupTotals,
};
