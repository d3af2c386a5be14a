//! # process 命令实现
//!
//! 归一化一个组件的全部 (layer, isotope) 组合并汇总。
//!
//! ## 功能
//! - 把命令行参数整理为 `PipelineConfig`
//! - 启动时加载参考表（失败即终止）
//! - 并行处理各组合，打印汇总表
//! - 可选导出 CSV 与能谱图
//!
//! ## 依赖关系
//! - 使用 `cli/process.rs` 定义的参数
//! - 使用 `catalog/`, `pipeline/`, `report/`, `batch/`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use crate::batch::BatchRunner;
use crate::catalog::MetadataCatalog;
use crate::cli::process::ProcessArgs;
use crate::error::{BgnormError, Result};
use crate::models::Binning;
use crate::parsers::DumpReader;
use crate::pipeline::{FileNaming, Pipeline, PipelineConfig};
use crate::report;
use crate::utils::{output, progress};

use anyhow::Context;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// 执行 process 命令
pub fn execute(args: ProcessArgs) -> anyhow::Result<()> {
    output::print_header(&format!(
        "Normalizing {} background in {}",
        args.component,
        args.folder.display()
    ));

    if !args.folder.is_dir() {
        return Err(BgnormError::DirectoryNotFound {
            path: args.folder.display().to_string(),
        }
        .into());
    }

    let config = build_config(&args)?;
    config.validate()?;

    // 参考表只加载一次，加载失败时终止
    let spinner = progress::create_spinner("Loading catalog tables...");
    let catalog = MetadataCatalog::load(
        &args.materials_table,
        &args.background_table,
        config.mass_column().as_deref(),
    );
    spinner.finish_and_clear();
    let catalog = catalog.with_context(|| {
        format!(
            "cannot start without catalog tables ({}, {})",
            args.materials_table.display(),
            args.background_table.display()
        )
    })?;
    if catalog.is_empty() {
        output::print_warning("Catalog tables contain no rows");
    } else {
        output::print_success(&format!("Loaded {} catalog rows", catalog.len()));
    }

    let found = count_result_files(&config.naming);
    if found == 0 {
        output::print_warning(&format!(
            "No '*_{}' files in {}",
            config.naming.suffix,
            config.naming.folder.display()
        ));
    } else {
        output::print_info(&format!("Found {} result files", found));
    }

    let pairs = catalog.pairs(config.component);
    if pairs.is_empty() {
        output::print_warning(&format!("No {} entries in the catalog", config.component));
        return Ok(());
    }
    let runner = BatchRunner::new(args.jobs);
    output::print_info(&format!(
        "Processing {} (layer, isotope) pairs, replicates {}-{}, {} jobs",
        pairs.len(),
        config.naming.replicates.start(),
        config.naming.replicates.end(),
        runner.jobs()
    ));

    let reader = DumpReader;
    let pipeline = Pipeline::new(&catalog, &config, &reader);
    let result = pipeline.run(&runner);

    if result.stats.failed_files > 0 {
        output::print_warning(&format!(
            "{} result files could not be read (see log)",
            result.stats.failed_files
        ));
    }

    if args.verbose {
        report::print_pair_table(&result.reports);
    }
    report::print_summary(&result.totals);

    if let Some(path) = &args.output_csv {
        report::export_csv(&result, config.component, path)?;
        output::print_success(&format!("Spectra saved to '{}'", path.display()));
    }

    if let Some(dir) = &args.plot_dir {
        let written = report::write_plots(&result, config.component, &config.binning, dir)?;
        output::print_success(&format!(
            "{} plots written to '{}'",
            written.len(),
            dir.display()
        ));
    }

    println!();
    output::print_done(&format!(
        "{}/{} pairs normalized, {} skipped, {} files read",
        result.stats.normalized,
        result.stats.total(),
        result.stats.skipped,
        result.stats.files
    ));

    Ok(())
}

/// 把命令行参数整理为流程配置
fn build_config(args: &ProcessArgs) -> Result<PipelineConfig> {
    let mut naming = FileNaming::new(args.folder.clone());
    naming.bias = if args.no_bias {
        None
    } else {
        Some(args.bias.clone())
    };
    naming.suffix = args.suffix.clone();
    naming.replicates = parse_index_range(&args.replicates)?;
    naming.isotope_free_layers = args.isotope_free_layer.clone();

    let (low, high) = parse_energy_range(&args.energy_range)?;

    let mut config = PipelineConfig::new(args.component, naming);
    config.schema = args.schema;
    config.mass_source = args.mass_source;
    config.geometry = args.geometry.clone();
    // 用户别名覆盖在内置别名之上
    config
        .geometry_aliases
        .extend(parse_aliases(&args.geometry_alias)?);
    config.beam_on_source = args.beam_on_source;
    config.beam_on_fallback = args.beam_on_fallback;
    config.binning = Binning::new(args.bins, low, high);
    config.detector_mass = args.detector_mass;

    log::debug!("pipeline config: {:?}", config);
    Ok(config)
}

/// 统计目录中符合后缀的结果文件
fn count_result_files(naming: &FileNaming) -> usize {
    match glob::glob(&naming.folder_glob()) {
        Ok(paths) => paths.filter_map(|p| p.ok()).count(),
        Err(e) => {
            log::warn!("invalid result file pattern: {}", e);
            0
        }
    }
}

/// 解析副本编号范围 (如 "0-299")，两端都包含
fn parse_index_range(range: &str) -> Result<RangeInclusive<u32>> {
    let parts: Vec<&str> = range.trim().split('-').collect();
    if parts.len() != 2 {
        return Err(BgnormError::InvalidRange(range.to_string()));
    }

    let start: u32 = parts[0]
        .trim()
        .parse()
        .map_err(|_| BgnormError::InvalidRange(range.to_string()))?;
    let end: u32 = parts[1]
        .trim()
        .parse()
        .map_err(|_| BgnormError::InvalidRange(range.to_string()))?;

    if end < start {
        return Err(BgnormError::InvalidRange(range.to_string()));
    }

    Ok(start..=end)
}

/// 解析能量范围 (如 "0-5000")
fn parse_energy_range(range: &str) -> Result<(f64, f64)> {
    let parts: Vec<&str> = range.trim().split('-').collect();
    if parts.len() != 2 {
        return Err(BgnormError::InvalidRange(range.to_string()));
    }

    let low: f64 = parts[0]
        .trim()
        .parse()
        .map_err(|_| BgnormError::InvalidRange(range.to_string()))?;
    let high: f64 = parts[1]
        .trim()
        .parse()
        .map_err(|_| BgnormError::InvalidRange(range.to_string()))?;

    if !(high > low) {
        return Err(BgnormError::InvalidRange(range.to_string()));
    }

    Ok((low, high))
}

/// 解析 `catalog=geometry` 形式的材料别名
fn parse_aliases(items: &[String]) -> Result<BTreeMap<String, String>> {
    let mut aliases = BTreeMap::new();
    for item in items {
        let (from, to) = item
            .split_once('=')
            .map(|(a, b)| (a.trim(), b.trim()))
            .filter(|(a, b)| !a.is_empty() && !b.is_empty())
            .ok_or_else(|| {
                BgnormError::InvalidArgument(format!(
                    "geometry alias '{}' must look like 'catalog=geometry'",
                    item
                ))
            })?;
        aliases.insert(from.to_string(), to.to_string());
    }
    Ok(aliases)
}
