//! # 放射源标识数据模型
//!
//! 描述本底来源的分类（内部材料 / 岩石 / 混凝土）以及
//! 单个 (layer, isotope) 组合的标识。
//!
//! ## 依赖关系
//! - 被 `catalog/`, `pipeline/`, `report/` 使用
//! - 无外部模块依赖

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// 本底来源类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
pub enum Component {
    /// Internal detector and shielding materials
    #[value(alias = "internals")]
    Internal,
    /// Rock background (gammas, neutrons)
    Rock,
    /// Concrete background (gammas, neutrons)
    Concrete,
}

impl Component {
    /// 背景类文件名前缀，同时也是背景参考表 `Material` 列的取值
    pub fn background_material(&self) -> Option<&'static str> {
        match self {
            Component::Internal => None,
            Component::Rock => Some("Rock"),
            Component::Concrete => Some("Concrete"),
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Component::Internal)
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Component::Internal => write!(f, "internal"),
            Component::Rock => write!(f, "rock"),
            Component::Concrete => write!(f, "concrete"),
        }
    }
}

/// 单个 (layer, isotope) 组合
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairKey {
    pub component: Component,
    /// 材料名（内部）或粒子类别（背景）
    pub layer: String,
    /// 同位素名，或非同位素源的占位名（如中子）
    pub isotope: String,
}

impl PairKey {
    pub fn new(component: Component, layer: impl Into<String>, isotope: impl Into<String>) -> Self {
        PairKey {
            component,
            layer: layer.into(),
            isotope: isotope.into(),
        }
    }
}

impl std::fmt::Display for PairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.component, self.layer, self.isotope)
    }
}
