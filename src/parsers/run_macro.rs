//! # 运行配置记录解析
//!
//! 每个结果文件都嵌入了生成它的运行配置（模拟溯源信息）：
//! - `runMacro`：宏命令，`/run/beamOn <N>` 给出模拟的初级事件数
//! - `geometryTable`：几何表，每行 `<name> <mass> ... <material>`
//!
//! 解析必须对部分损坏或缺失的记录保持健壮：单行错误只跳过该行。
//!
//! ## 依赖关系
//! - 被 `pipeline/loader.rs`, `commands/inspect.rs` 使用
//! - 使用 `parsers/event_file.rs` 的 EventFile

use super::event_file::EventFile;

use std::collections::BTreeMap;

/// 运行宏记录名
pub const RUN_MACRO: &str = "runMacro";
/// 几何表记录名
pub const GEOMETRY_TABLE: &str = "geometryTable";
/// 初级事件数指令
pub const BEAM_ON_DIRECTIVE: &str = "/run/beamOn";

/// 单个结果文件的运行元数据；`None` 表示未知
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunMetadata {
    /// 模拟的初级事件数
    pub beam_on: Option<u64>,
    /// 几何中每种材料的总质量
    pub masses: Option<BTreeMap<String, f64>>,
}

impl RunMetadata {
    pub fn from_event_file(file: &EventFile) -> Self {
        RunMetadata {
            beam_on: extract_beam_on(file),
            masses: extract_material_masses(file),
        }
    }
}

/// 从结果文件中提取初级事件数
pub fn extract_beam_on(file: &EventFile) -> Option<u64> {
    file.record(RUN_MACRO).and_then(parse_beam_on)
}

/// 从结果文件中提取每种材料的质量
pub fn extract_material_masses(file: &EventFile) -> Option<BTreeMap<String, f64>> {
    file.record(GEOMETRY_TABLE).map(parse_material_masses)
}

/// 查找第一条 beamOn 指令并读取其整数参数
///
/// 只看第一条匹配的指令；参数不是正整数时视为未知。
pub fn parse_beam_on<S: AsRef<str>>(lines: &[S]) -> Option<u64> {
    let line = lines.iter().find(|line| {
        matches!(
            line.as_ref().split_whitespace().next(),
            Some(BEAM_ON_DIRECTIVE) | Some("beamOn")
        )
    })?;

    match line.as_ref().split_whitespace().nth(1)?.parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(n),
    }
}

/// 按材料累加几何表中的质量
///
/// 第二个字段为质量，最后一个字段为材料名；
/// 无法解析的行（包括表头）逐行跳过。
pub fn parse_material_masses<S: AsRef<str>>(lines: &[S]) -> BTreeMap<String, f64> {
    let mut masses: BTreeMap<String, f64> = BTreeMap::new();

    for line in lines {
        let tokens: Vec<&str> = line.as_ref().split_whitespace().collect();
        if tokens.len() < 3 {
            continue;
        }

        let mass = match tokens[1].parse::<f64>() {
            Ok(m) if m.is_finite() => m,
            _ => continue,
        };
        let material = tokens[tokens.len() - 1];

        *masses.entry(material.to_string()).or_insert(0.0) += mass;
    }

    masses
}
