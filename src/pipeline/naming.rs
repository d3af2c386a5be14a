//! # 结果文件命名约定
//!
//! - 内部材料：`{layer}_{isotope}_{index}[_{bias}]_{suffix}`
//! - 岩石 / 混凝土：`{Rock|Concrete}_{layer}_{isotope}_{index}[_{bias}]_{suffix}`
//!
//! 非同位素源（如中子）的文件名不含同位素字段。
//!
//! ## 依赖关系
//! - 被 `pipeline/loader.rs`, `commands/` 使用
//! - 使用 `regex` 反向解析文件名

use crate::models::{Component, PairKey};

use regex::Regex;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// 文件命名与候选副本范围
#[derive(Debug, Clone)]
pub struct FileNaming {
    /// 结果文件所在目录
    pub folder: PathBuf,
    /// 偏置标签（如 `boff`）；`None` 时文件名不含该字段
    pub bias: Option<String>,
    /// 文件名后缀
    pub suffix: String,
    /// 候选副本编号（闭区间）
    pub replicates: RangeInclusive<u32>,
    /// 文件名中省略同位素字段的层
    pub isotope_free_layers: Vec<String>,
}

impl FileNaming {
    pub fn new(folder: PathBuf) -> Self {
        FileNaming {
            folder,
            bias: Some("boff".to_string()),
            suffix: "filtered.root".to_string(),
            replicates: 0..=299,
            isotope_free_layers: vec!["Neutrons".to_string()],
        }
    }

    /// 第 `index` 个副本的文件名
    pub fn file_name(&self, key: &PairKey, index: u32) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(6);
        if let Some(prefix) = key.component.background_material() {
            parts.push(prefix);
        }
        parts.push(&key.layer);

        let isotope_free =
            !key.component.is_internal() && self.isotope_free_layers.contains(&key.layer);
        if !isotope_free {
            parts.push(&key.isotope);
        }

        let index = index.to_string();
        parts.push(&index);
        if let Some(bias) = &self.bias {
            parts.push(bias);
        }
        parts.push(&self.suffix);

        parts.join("_")
    }

    /// 第 `index` 个副本的完整路径
    pub fn path(&self, key: &PairKey, index: u32) -> PathBuf {
        self.folder.join(self.file_name(key, index))
    }

    /// 全部候选 (编号, 路径)
    pub fn candidates<'a>(&'a self, key: &'a PairKey) -> impl Iterator<Item = (u32, PathBuf)> + 'a {
        self.replicates.clone().map(move |i| (i, self.path(key, i)))
    }

    /// 匹配目录中所有结果文件的 glob 模式
    pub fn folder_glob(&self) -> String {
        let folder = glob::Pattern::escape(&self.folder.display().to_string());
        format!("{}/*_{}", folder, glob::Pattern::escape(&self.suffix))
    }
}

/// 从文件名解析出的标识
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFileName {
    pub component: Component,
    pub layer: String,
    /// 非同位素源为 `None`
    pub isotope: Option<String>,
    pub index: u32,
    pub bias: Option<String>,
}

/// 按命名约定反向解析文件名
pub fn parse_file_name(path: &Path, suffix: &str) -> Option<ParsedFileName> {
    let name = path.file_name()?.to_str()?;
    let pattern = format!(
        r"^(?:(Rock|Concrete)_)?([^_]+)(?:_([^_]+))?_(\d+)(?:_([^_]+))?_{}$",
        regex::escape(suffix)
    );
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(name)?;

    let component = match caps.get(1).map(|m| m.as_str()) {
        Some("Rock") => Component::Rock,
        Some("Concrete") => Component::Concrete,
        _ => Component::Internal,
    };

    Some(ParsedFileName {
        component,
        layer: caps.get(2)?.as_str().to_string(),
        isotope: caps.get(3).map(|m| m.as_str().to_string()),
        index: caps.get(4)?.as_str().parse().ok()?,
        bias: caps.get(5).map(|m| m.as_str().to_string()),
    })
}
