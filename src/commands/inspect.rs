//! # inspect 命令实现
//!
//! 查看单个结果文件：由文件名解析出的标识、列目录（标出能量沉积列）、
//! beamOn、以及几何表中每种材料的质量。
//!
//! ## 依赖关系
//! - 使用 `cli/inspect.rs` 定义的参数
//! - 使用 `parsers/`, `pipeline/naming.rs`
//! - 使用 `utils/output.rs`, `tabled`

use crate::cli::inspect::InspectArgs;
use crate::error::BgnormError;
use crate::parsers::run_macro::{extract_beam_on, extract_material_masses};
use crate::parsers::{DumpReader, EventFileReader};
use crate::pipeline::parse_file_name;
use crate::utils::output;

use tabled::{Table, Tabled};

#[derive(Tabled)]
struct ColumnRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Column")]
    name: String,
    #[tabled(rename = "")]
    marker: String,
}

#[derive(Tabled)]
struct MassRow {
    #[tabled(rename = "Material")]
    material: String,
    #[tabled(rename = "Mass")]
    mass: String,
}

/// 执行 inspect 命令
pub fn execute(args: InspectArgs) -> anyhow::Result<()> {
    if !args.file.is_file() {
        return Err(BgnormError::FileNotFound {
            path: args.file.display().to_string(),
        }
        .into());
    }

    output::print_header(&format!("Inspecting {}", args.file.display()));

    match parse_file_name(&args.file, &args.suffix) {
        Some(id) => output::print_info(&format!(
            "component={} layer={} isotope={} index={} bias={}",
            id.component,
            id.layer,
            id.isotope.as_deref().unwrap_or("-"),
            id.index,
            id.bias.as_deref().unwrap_or("-")
        )),
        None => output::print_warning("File name does not follow the result naming convention"),
    }

    let file = DumpReader.open(&args.file)?;
    output::print_info(&format!("{} entries", file.entries()));

    let spec = args.schema.energy_deposition();
    let energy = match spec.resolve(&file) {
        Ok(idx) => Some(idx),
        Err(e) => {
            output::print_warning(&e.to_string());
            None
        }
    };

    let rows: Vec<ColumnRow> = file
        .columns()
        .iter()
        .enumerate()
        .map(|(index, name)| ColumnRow {
            index,
            name: name.clone(),
            marker: if Some(index) == energy {
                format!("<- energy deposition ({})", args.schema)
            } else {
                String::new()
            },
        })
        .collect();
    output::print_header("Columns");
    println!("{}", Table::new(&rows));

    match extract_beam_on(&file) {
        Some(n) => output::print_info(&format!("beamOn = {}", n)),
        None => output::print_warning("beamOn unknown"),
    }

    match extract_material_masses(&file) {
        Some(masses) if !masses.is_empty() => {
            let rows: Vec<MassRow> = masses
                .into_iter()
                .map(|(material, mass)| MassRow {
                    material,
                    mass: format!("{:.6}", mass),
                })
                .collect();
            output::print_header("Geometry masses");
            println!("{}", Table::new(&rows));
        }
        Some(_) => output::print_warning("Geometry table has no parseable rows"),
        None => output::print_skip("No geometry table"),
    }

    let others: Vec<&str> = file.record_names();
    if !others.is_empty() {
        output::print_info(&format!("Records: {}", others.join(", ")));
    }

    Ok(())
}
