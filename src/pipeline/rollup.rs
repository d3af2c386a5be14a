//! # 层级汇总
//!
//! - 每层：各同位素计数率相加，不确定度按平方和开方合并
//! - 总计：逐层累加，每加入一层就做一次平方和合并
//!
//! 被跳过的组合不在输入中，汇总时既不出现也不按零处理。
//!
//! ## 依赖关系
//! - 被 `pipeline/mod.rs` 调用
//! - 使用 `models/spectrum.rs`

use crate::models::{BinTotals, LayerTotal, NormalizedSpectrum, RollupTotals};

/// 汇总各同位素能谱
pub fn rollup(spectra: &[NormalizedSpectrum]) -> RollupTotals {
    let energy = spectra.first().map(|s| s.energy.clone()).unwrap_or_default();
    let bins = energy.len();

    // 按层首次出现的顺序分组
    let mut layers: Vec<LayerTotal> = Vec::new();
    for spectrum in spectra {
        let idx = match layers.iter().position(|l| l.layer == spectrum.key.layer) {
            Some(idx) => idx,
            None => {
                layers.push(LayerTotal {
                    layer: spectrum.key.layer.clone(),
                    isotopes: Vec::new(),
                    totals: BinTotals::zeros(bins),
                });
                layers.len() - 1
            }
        };

        let layer = &mut layers[idx];
        layer.isotopes.push(spectrum.key.isotope.clone());
        layer.totals.accumulate(&spectrum.rate, &spectrum.uncertainty);
    }

    let mut grand = BinTotals::zeros(bins);
    for layer in &layers {
        grand.accumulate(&layer.totals.rate, &layer.totals.uncertainty);
    }

    RollupTotals {
        energy,
        layers,
        grand,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Component, PairKey};

    fn spectrum(
        layer: &str,
        isotope: &str,
        rate: Vec<f64>,
        uncertainty: Vec<f64>,
    ) -> NormalizedSpectrum {
        NormalizedSpectrum {
            key: PairKey::new(Component::Internal, layer, isotope),
            energy: (0..rate.len()).map(|i| 125.0 + 250.0 * i as f64).collect(),
            rate,
            uncertainty,
            file_count: 1,
        }
    }

    #[test]
    fn test_layer_total() {
        let spectra = vec![
            spectrum("Cu", "A", vec![1.0, 2.0], vec![0.1, 0.2]),
            spectrum("Cu", "B", vec![3.0, 4.0], vec![0.3, 0.1]),
        ];
        let totals = rollup(&spectra);

        assert_eq!(totals.layers.len(), 1);
        let cu = &totals.layers[0];
        assert_eq!(cu.isotopes, vec!["A", "B"]);
        assert_eq!(cu.totals.rate, vec![4.0, 6.0]);
        assert!((cu.totals.uncertainty[0] - 0.1_f64.hypot(0.3)).abs() < 1e-12);
        assert!((cu.totals.uncertainty[0] - 0.3162).abs() < 1e-4);
        assert!((cu.totals.uncertainty[1] - 0.2236).abs() < 1e-4);
    }

    #[test]
    fn test_grand_total_is_quadrature_not_linear() {
        let spectra = vec![
            spectrum("Cu", "K40", vec![1.0], vec![3.0]),
            spectrum("Pb", "K40", vec![2.0], vec![4.0]),
        ];
        let totals = rollup(&spectra);
        assert_eq!(totals.layers.len(), 2);
        assert!((totals.grand.rate[0] - 3.0).abs() < 1e-12);
        assert!((totals.grand.uncertainty[0] - 5.0).abs() < 1e-12);
        assert!((totals.grand.uncertainty[0] - 7.0).abs() > 1.0);
    }

    #[test]
    fn test_layer_order_does_not_change_grand_total() {
        let a = spectrum("Cu", "K40", vec![1.5, 2.25, 0.0], vec![0.15, 0.3, 0.0]);
        let b = spectrum("Pb", "U238", vec![7.0, 0.125, 3.0], vec![0.7, 0.01, 0.4]);
        let c = spectrum("Ti", "Co60", vec![0.001, 11.0, 2.5], vec![0.0001, 1.2, 0.25]);

        let forward = rollup(&[a.clone(), b.clone(), c.clone()]);
        let reversed = rollup(&[c, b, a]);

        for i in 0..3 {
            let r1 = forward.grand.rate[i];
            let r2 = reversed.grand.rate[i];
            assert!((r1 - r2).abs() <= 1e-9 * r1.abs().max(1e-300));
            let u1 = forward.grand.uncertainty[i];
            let u2 = reversed.grand.uncertainty[i];
            assert!((u1 - u2).abs() <= 1e-9 * u1.abs().max(1e-300));
        }
    }

    #[test]
    fn test_empty_input() {
        let totals = rollup(&[]);
        assert!(totals.layers.is_empty());
        assert!(totals.grand.rate.is_empty());
        assert_eq!(totals.grand.integrated_rate(), 0.0);
    }

    #[test]
    fn test_absent_isotope_is_tolerated() {
        // Pb 的 U238 被跳过，只剩 K40
        let spectra = vec![
            spectrum("Cu", "K40", vec![1.0], vec![0.1]),
            spectrum("Pb", "K40", vec![2.0], vec![0.2]),
        ];
        let totals = rollup(&spectra);
        assert_eq!(totals.layers[1].isotopes, vec!["K40"]);
        assert!((totals.grand.rate[0] - 3.0).abs() < 1e-12);
    }
}
