//! # 元数据目录
//!
//! 进程启动时加载一次的静态参考数据：每种材料 / 同位素的活度与质量，
//! 以及岩石 / 混凝土背景的表面积、通量与 sigma。
//! 加载后只读，通过引用传递给所有需要查询的阶段。
//!
//! ## 查询规则
//! - 按 (component, layer, isotope) 精确匹配
//! - 多行匹配：取表中第一行并记录警告
//! - 无匹配：返回 `None`，调用方必须跳过该组合
//!
//! ## 依赖关系
//! - 被 `commands/process.rs`, `pipeline/` 使用
//! - 子模块: tables

pub mod tables;

use crate::error::{BgnormError, Result};
use crate::models::{Component, PairKey};

use std::fs::File;
use std::path::Path;

/// 参考表中的一行
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub key: PairKey,
    /// 比活度（内部材料）或通量（背景）
    pub activity: f64,
    /// 活度 / 通量的不确定度
    pub sigma: f64,
    /// 表中给出的质量（内部材料）或表面积（背景）
    pub exposure: Option<f64>,
    /// 表中给出的模拟初级事件数（旧版流程使用）
    pub event_count: Option<f64>,
}

/// 元数据目录
#[derive(Debug, Clone, Default)]
pub struct MetadataCatalog {
    entries: Vec<CatalogEntry>,
}

impl MetadataCatalog {
    /// 从已解析的表行构建
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// 从两张 CSV 参考表加载
    pub fn load(
        internal_path: &Path,
        background_path: &Path,
        mass_column: Option<&str>,
    ) -> Result<Self> {
        let internal = open_table(internal_path)?;
        let mut entries = tables::read_internal_table(
            internal,
            &internal_path.display().to_string(),
            mass_column,
        )?;

        let background = open_table(background_path)?;
        entries.extend(tables::read_background_table(
            background,
            &background_path.display().to_string(),
        )?);

        Ok(Self::from_entries(entries))
    }

    /// 表行总数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 查询一个 (layer, isotope) 组合
    pub fn lookup(
        &self,
        component: Component,
        layer: &str,
        isotope: &str,
    ) -> Option<&CatalogEntry> {
        let mut matches = self.entries.iter().filter(|e| {
            e.key.component == component && e.key.layer == layer && e.key.isotope == isotope
        });

        let first = matches.next()?;
        let extra = matches.count();
        if extra > 0 {
            log::warn!(
                "component={} layer={} isotope={} reason=\"{} duplicate rows, using the first\"",
                component,
                layer,
                isotope,
                extra + 1
            );
        }
        Some(first)
    }

    /// 某类别下的所有层，按表中首次出现顺序
    pub fn layers(&self, component: Component) -> Vec<String> {
        let mut layers: Vec<String> = Vec::new();
        for entry in self.entries.iter().filter(|e| e.key.component == component) {
            if !layers.contains(&entry.key.layer) {
                layers.push(entry.key.layer.clone());
            }
        }
        layers
    }

    /// 某层下的所有同位素，按表中首次出现顺序
    pub fn isotopes(&self, component: Component, layer: &str) -> Vec<String> {
        let mut isotopes: Vec<String> = Vec::new();
        for entry in self
            .entries
            .iter()
            .filter(|e| e.key.component == component && e.key.layer == layer)
        {
            if !isotopes.contains(&entry.key.isotope) {
                isotopes.push(entry.key.isotope.clone());
            }
        }
        isotopes
    }

    /// 某类别下需要处理的全部组合
    pub fn pairs(&self, component: Component) -> Vec<PairKey> {
        self.layers(component)
            .into_iter()
            .flat_map(|layer| {
                self.isotopes(component, &layer)
                    .into_iter()
                    .map(move |iso| PairKey::new(component, layer.clone(), iso))
            })
            .collect()
    }
}

fn open_table(path: &Path) -> Result<File> {
    if !path.exists() {
        return Err(BgnormError::CatalogLoadError {
            path: path.display().to_string(),
            reason: "file does not exist".to_string(),
        });
    }
    File::open(path).map_err(|e| BgnormError::CatalogLoadError {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(component: Component, layer: &str, isotope: &str, activity: f64) -> CatalogEntry {
        CatalogEntry {
            key: PairKey::new(component, layer, isotope),
            activity,
            sigma: activity / 10.0,
            exposure: Some(1.0),
            event_count: None,
        }
    }

    fn sample_catalog() -> MetadataCatalog {
        MetadataCatalog::from_entries(vec![
            entry(Component::Internal, "Cu", "K40", 1.0),
            entry(Component::Internal, "Cu", "U238", 2.0),
            entry(Component::Internal, "Pb", "K40", 3.0),
            entry(Component::Internal, "Cu", "K40", 99.0),
            entry(Component::Rock, "Gammas", "K40", 4.0),
            entry(Component::Concrete, "Gammas", "Th232", 5.0),
        ])
    }

    #[test]
    fn test_lookup_exact_match() {
        let catalog = sample_catalog();
        let e = catalog.lookup(Component::Internal, "Pb", "K40").unwrap();
        assert_eq!(e.activity, 3.0);
        assert!(catalog.lookup(Component::Internal, "Pb", "U238").is_none());
        assert!(catalog.lookup(Component::Rock, "Cu", "K40").is_none());
    }

    #[test]
    fn test_lookup_duplicate_returns_first_row() {
        let catalog = sample_catalog();
        for _ in 0..5 {
            let e = catalog.lookup(Component::Internal, "Cu", "K40").unwrap();
            assert_eq!(e.activity, 1.0);
        }
    }

    #[test]
    fn test_layers_and_isotopes_in_table_order() {
        let catalog = sample_catalog();
        assert_eq!(catalog.layers(Component::Internal), vec!["Cu", "Pb"]);
        assert_eq!(catalog.isotopes(Component::Internal, "Cu"), vec!["K40", "U238"]);
        assert_eq!(catalog.isotopes(Component::Rock, "Gammas"), vec!["K40"]);
        assert_eq!(catalog.isotopes(Component::Concrete, "Gammas"), vec!["Th232"]);
    }

    #[test]
    fn test_pairs() {
        let catalog = sample_catalog();
        let pairs = catalog.pairs(Component::Internal);
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[2], PairKey::new(Component::Internal, "Pb", "K40"));
    }

    #[test]
    fn test_load_missing_file_is_fatal() {
        let result = MetadataCatalog::load(
            Path::new("/nonexistent/materials.csv"),
            Path::new("/nonexistent/rock.csv"),
            None,
        );
        assert!(matches!(result, Err(BgnormError::CatalogLoadError { .. })));
    }
}
