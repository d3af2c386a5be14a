//! # 归一化流程
//!
//! 对一个组件的全部 (layer, isotope) 组合执行：
//! 加载 → 分箱 → 归一化 → 汇总。
//!
//! 每个组合互相独立，结果是显式的 成功能谱 / 跳过原因，
//! 跳过的组合记录日志后继续，不会中断整次运行。
//!
//! ## 依赖关系
//! - 被 `commands/process.rs` 调用
//! - 子模块: config, naming, loader, normalizer, rollup
//! - 使用 `batch/runner.rs` 并行处理组合

pub mod config;
pub mod loader;
pub mod naming;
pub mod normalizer;
pub mod rollup;

pub use config::{BeamOnFallback, BeamOnSource, MassSource, PipelineConfig};
pub use naming::{parse_file_name, FileNaming};
pub use normalizer::SkipReason;

use crate::batch::BatchRunner;
use crate::catalog::MetadataCatalog;
use crate::models::{EnergyHistogram, NormalizedSpectrum, PairKey, RollupTotals};
use crate::parsers::EventFileReader;

/// 单个组合的处理结果
#[derive(Debug, Clone)]
pub struct PairReport {
    pub key: PairKey,
    /// 成功贡献数据的文件数
    pub file_count: usize,
    /// 存在但读取失败的文件数
    pub failed_files: usize,
    /// 分箱范围内的事件数
    pub events: u64,
    pub outcome: Result<NormalizedSpectrum, SkipReason>,
}

/// 运行统计
#[derive(Debug, Default, Clone)]
pub struct PipelineStats {
    /// 归一化成功的组合数
    pub normalized: usize,
    /// 跳过的组合数
    pub skipped: usize,
    /// 成功读取的文件总数
    pub files: usize,
    /// 读取失败的文件总数
    pub failed_files: usize,
}

impl PipelineStats {
    /// 合并一个组合的结果
    pub fn merge(&mut self, report: &PairReport) {
        self.files += report.file_count;
        self.failed_files += report.failed_files;
        match &report.outcome {
            Ok(_) => self.normalized += 1,
            Err(_) => self.skipped += 1,
        }
    }

    /// 处理的组合总数
    pub fn total(&self) -> usize {
        self.normalized + self.skipped
    }
}

/// 一次完整运行的输出
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub reports: Vec<PairReport>,
    pub totals: RollupTotals,
    pub stats: PipelineStats,
}

impl PipelineOutput {
    /// 成功归一化的能谱，按目录顺序
    pub fn spectra(&self) -> impl Iterator<Item = &NormalizedSpectrum> {
        self.reports.iter().filter_map(|r| r.outcome.as_ref().ok())
    }
}

/// 归一化流程
pub struct Pipeline<'a> {
    catalog: &'a MetadataCatalog,
    config: &'a PipelineConfig,
    reader: &'a dyn EventFileReader,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        catalog: &'a MetadataCatalog,
        config: &'a PipelineConfig,
        reader: &'a dyn EventFileReader,
    ) -> Self {
        Pipeline {
            catalog,
            config,
            reader,
        }
    }

    /// 处理单个组合
    pub fn process_pair(&self, key: &PairKey) -> PairReport {
        let loaded = loader::load_pair(key, self.config, self.reader);
        let histogram = EnergyHistogram::from_values(&loaded.values, &self.config.binning);

        let outcome = match self.catalog.lookup(key.component, &key.layer, &key.isotope) {
            _ if loaded.file_count == 0 => Err(SkipReason::NoContributingFiles),
            None => Err(SkipReason::CatalogMiss),
            Some(entry) => normalizer::normalize(
                key,
                &histogram,
                &loaded.metadata,
                entry,
                loaded.file_count,
                self.config,
            ),
        };

        if let Err(reason) = &outcome {
            log::warn!(
                "layer={} isotope={} reason=\"{}\" skipped",
                key.layer,
                key.isotope,
                reason
            );
        } else {
            log::info!(
                "layer={} isotope={} files={} events={} normalized",
                key.layer,
                key.isotope,
                loaded.file_count,
                histogram.total()
            );
        }

        PairReport {
            key: loaded.key,
            file_count: loaded.file_count,
            failed_files: loaded.failed_files,
            events: histogram.total(),
            outcome,
        }
    }

    /// 处理组件在目录中登记的全部组合并汇总
    pub fn run(&self, runner: &BatchRunner) -> PipelineOutput {
        self.run_pairs(&self.catalog.pairs(self.config.component), runner)
    }

    /// 处理指定组合并汇总
    pub fn run_pairs(&self, pairs: &[PairKey], runner: &BatchRunner) -> PipelineOutput {
        let reports = runner.run(pairs, "Normalizing", |key| self.process_pair(key));

        let mut stats = PipelineStats::default();
        for report in &reports {
            stats.merge(report);
        }

        let spectra: Vec<NormalizedSpectrum> = reports
            .iter()
            .filter_map(|r| r.outcome.as_ref().ok().cloned())
            .collect();
        let totals = rollup::rollup(&spectra);

        PipelineOutput {
            reports,
            totals,
            stats,
        }
    }
}
