//! # process 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/process.rs`

use crate::models::Component;
use crate::parsers::SchemaVersion;
use crate::pipeline::{BeamOnFallback, BeamOnSource, MassSource};

use clap::Args;
use std::path::PathBuf;

/// process 子命令参数
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Folder containing the simulation result files
    pub folder: PathBuf,

    /// Source component to process
    #[arg(short, long, value_enum)]
    pub component: Component,

    /// CSV table of internal material activities and masses
    #[arg(long, default_value = "cached_data/materials_data.csv")]
    pub materials_table: PathBuf,

    /// CSV table of rock/concrete surfaces and fluxes
    #[arg(long, default_value = "cached_data/rock_data.csv")]
    pub background_table: PathBuf,

    /// Bias tag in the result file names
    #[arg(long, default_value = "boff")]
    pub bias: String,

    /// Result file names carry no bias tag
    #[arg(long)]
    pub no_bias: bool,

    /// File name suffix
    #[arg(long, default_value = "filtered.root")]
    pub suffix: String,

    /// Replicate index window (inclusive, e.g. '0-299')
    #[arg(long, default_value = "0-299")]
    pub replicates: String,

    /// Result file schema (locates the energy deposition column)
    #[arg(long, value_enum, default_value_t = SchemaVersion::Filtered)]
    pub schema: SchemaVersion,

    /// Where the mass of an internal material comes from
    #[arg(long, value_enum, default_value_t = MassSource::Geometry)]
    pub mass_source: MassSource,

    /// Geometry variant; selects the 'Mass_<tag>' column in table mode
    #[arg(long)]
    pub geometry: Option<String>,

    /// Extra catalog-to-geometry material alias (e.g. 'SS=Steel'); 'PCu=PureCu' is built in
    #[arg(long)]
    pub geometry_alias: Vec<String>,

    /// Where the number of primary events comes from
    #[arg(long, value_enum, default_value_t = BeamOnSource::RunMacro)]
    pub beam_on_source: BeamOnSource,

    /// What to do when the number of primary events is unknown
    #[arg(long, value_enum, default_value_t = BeamOnFallback::One)]
    pub beam_on_fallback: BeamOnFallback,

    /// Background layers whose file names carry no isotope token
    #[arg(long, default_value = "Neutrons")]
    pub isotope_free_layer: Vec<String>,

    /// Detector mass in kg
    #[arg(long, default_value_t = 0.797336)]
    pub detector_mass: f64,

    /// Number of energy bins
    #[arg(long, default_value_t = 20)]
    pub bins: usize,

    /// Energy range in keV (e.g. '0-5000')
    #[arg(long, default_value = "0-5000")]
    pub energy_range: String,

    /// Number of parallel jobs (0 = all CPUs)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Export all spectra and totals to this CSV file
    #[arg(long)]
    pub output_csv: Option<PathBuf>,

    /// Write per-layer and total spectrum plots (PNG) into this directory
    #[arg(long)]
    pub plot_dir: Option<PathBuf>,

    /// Print the per-pair table
    #[arg(short, long)]
    pub verbose: bool,
}
