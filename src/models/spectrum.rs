//! # 能谱数据模型
//!
//! 定义能量分箱、原始计数直方图、归一化能谱以及汇总结果。
//!
//! ## 单位
//! - 能量：keV
//! - 归一化计数率：counts / (keV·kg·day)
//!
//! ## 依赖关系
//! - 被 `pipeline/`, `report/` 使用
//! - 使用 `models/source.rs`

use super::source::PairKey;
use serde::{Deserialize, Serialize};

/// 线性能量分箱
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Binning {
    /// 分箱数
    pub bins: usize,
    /// 下限 (keV)
    pub low: f64,
    /// 上限 (keV)
    pub high: f64,
}

impl Default for Binning {
    fn default() -> Self {
        Binning {
            bins: 20,
            low: 0.0,
            high: 5000.0,
        }
    }
}

impl Binning {
    pub fn new(bins: usize, low: f64, high: f64) -> Self {
        Binning { bins, low, high }
    }

    /// 单个分箱宽度 (keV)
    pub fn width(&self) -> f64 {
        (self.high - self.low) / self.bins as f64
    }

    /// 分箱边界，长度为 bins + 1
    pub fn edges(&self) -> Vec<f64> {
        let width = self.width();
        (0..=self.bins)
            .map(|i| {
                if i == self.bins {
                    self.high
                } else {
                    self.low + i as f64 * width
                }
            })
            .collect()
    }

    /// 分箱中心
    pub fn centers(&self) -> Vec<f64> {
        let edges = self.edges();
        edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
    }

    /// 数值所在的分箱；区间左闭右开，最后一个分箱包含上限
    pub fn index_of(&self, value: f64) -> Option<usize> {
        if !value.is_finite() || value < self.low || value > self.high || self.bins == 0 {
            return None;
        }
        if value == self.high {
            return Some(self.bins - 1);
        }
        let idx = ((value - self.low) / self.width()).floor() as usize;
        Some(idx.min(self.bins - 1))
    }
}

/// 单个 (layer, isotope) 的原始计数直方图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyHistogram {
    pub centers: Vec<f64>,
    pub counts: Vec<u64>,
    pub edges: Vec<f64>,
}

impl EnergyHistogram {
    /// 对沉积能量取直方图；范围外与非有限值被丢弃
    pub fn from_values(values: &[f64], binning: &Binning) -> Self {
        let mut counts = vec![0u64; binning.bins];
        for &v in values {
            if let Some(idx) = binning.index_of(v) {
                counts[idx] += 1;
            }
        }
        EnergyHistogram {
            centers: binning.centers(),
            counts,
            edges: binning.edges(),
        }
    }

    /// 直方图内的事件总数
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// 归一化能谱（计算后不再修改）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedSpectrum {
    pub key: PairKey,
    /// 分箱中心 (keV)
    pub energy: Vec<f64>,
    /// counts / (keV·kg·day)
    pub rate: Vec<f64>,
    pub uncertainty: Vec<f64>,
    /// 参与归一化的结果文件数
    pub file_count: usize,
}

/// 每个分箱的计数率与不确定度
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BinTotals {
    pub rate: Vec<f64>,
    pub uncertainty: Vec<f64>,
}

impl BinTotals {
    pub fn zeros(bins: usize) -> Self {
        BinTotals {
            rate: vec![0.0; bins],
            uncertainty: vec![0.0; bins],
        }
    }

    /// 线性累加计数率，不确定度按平方和开方合并
    pub fn accumulate(&mut self, rate: &[f64], uncertainty: &[f64]) {
        let n = rate.len().max(uncertainty.len());
        if self.rate.len() < n {
            self.rate.resize(n, 0.0);
            self.uncertainty.resize(n, 0.0);
        }
        for (acc, r) in self.rate.iter_mut().zip(rate) {
            *acc += r;
        }
        for (acc, u) in self.uncertainty.iter_mut().zip(uncertainty) {
            *acc = acc.hypot(*u);
        }
    }

    /// 对所有分箱积分的计数率
    pub fn integrated_rate(&self) -> f64 {
        self.rate.iter().sum()
    }

    /// 对所有分箱积分的不确定度（活度 sigma 在各分箱间完全相关）
    pub fn integrated_uncertainty(&self) -> f64 {
        self.uncertainty.iter().sum()
    }
}

/// 单层（材料或粒子类别）的同位素汇总
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerTotal {
    pub layer: String,
    /// 参与汇总的同位素，按输入顺序
    pub isotopes: Vec<String>,
    pub totals: BinTotals,
}

/// 层级汇总结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RollupTotals {
    /// 分箱中心 (keV)
    pub energy: Vec<f64>,
    pub layers: Vec<LayerTotal>,
    pub grand: BinTotals,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_binning() {
        let binning = Binning::default();
        assert!((binning.width() - 250.0).abs() < 1e-12);
        let edges = binning.edges();
        assert_eq!(edges.len(), 21);
        assert_eq!(edges[0], 0.0);
        assert_eq!(edges[20], 5000.0);
        let centers = binning.centers();
        assert_eq!(centers.len(), 20);
        assert!((centers[0] - 125.0).abs() < 1e-12);
    }

    #[test]
    fn test_histogram_edges_inclusive_last_bin() {
        let binning = Binning::default();
        let values = [0.0, 249.999, 250.0, 5000.0, 5000.1, -1.0, f64::NAN];
        let hist = EnergyHistogram::from_values(&values, &binning);
        assert_eq!(hist.counts[0], 2);
        assert_eq!(hist.counts[1], 1);
        assert_eq!(hist.counts[19], 1);
        assert_eq!(hist.total(), 4);
    }

    #[test]
    fn test_accumulate_quadrature() {
        let mut totals = BinTotals::zeros(1);
        totals.accumulate(&[1.0], &[3.0]);
        totals.accumulate(&[2.0], &[4.0]);
        assert!((totals.rate[0] - 3.0).abs() < 1e-12);
        assert!((totals.uncertainty[0] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_accumulate_grows_empty_totals() {
        let mut totals = BinTotals::default();
        totals.accumulate(&[1.0, 2.0], &[0.5, 0.5]);
        assert_eq!(totals.rate, vec![1.0, 2.0]);
        assert!((totals.integrated_rate() - 3.0).abs() < 1e-12);
        assert!((totals.integrated_uncertainty() - 1.0).abs() < 1e-12);
    }
}
