//! # 模拟结果文件读取
//!
//! 单个结果文件包含 `events` 树（按列组织的数值数据）以及嵌入的
//! 运行配置文本记录（`runMacro`, `geometryTable`）。
//!
//! 二进制 ROOT 读取库是外部依赖，这里只定义接口 `EventFileReader`，
//! 并提供读取文本导出格式的 `DumpReader`：
//!
//! ```text
//! [[events]]
//! file,ID,eventID,clusterIndex,timeStamp,edep
//! 0,1,17,0,12.5,661.7
//! [[runMacro]]
//! /run/beamOn 100000
//! [[geometryTable]]
//! World 1.2e3 G4_AIR
//! ```
//!
//! ## 能量列定位
//! 不同数据版本的列集合不稳定，能量沉积列按版本化的 `ColumnSpec`
//! （列名 + 期望位置）定位；列不存在时明确报错，而不是按位置读错列。
//!
//! ## 依赖关系
//! - 被 `pipeline/loader.rs`, `commands/inspect.rs` 使用
//! - 使用 `csv` 解析 events 段

use crate::error::{BgnormError, Result};

use clap::ValueEnum;
use csv::StringRecord;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// events 树所在的段名
pub const EVENTS_SECTION: &str = "events";

/// 结果文件读取接口
pub trait EventFileReader: Send + Sync {
    /// 打开并解析一个结果文件
    fn open(&self, path: &Path) -> Result<EventFile>;
}

/// 已读取的结果文件
#[derive(Debug, Clone)]
pub struct EventFile {
    pub path: PathBuf,
    columns: Vec<String>,
    rows: Vec<StringRecord>,
    records: BTreeMap<String, Vec<String>>,
}

impl EventFile {
    /// events 树的列目录（按树中顺序）
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// events 树的条目数
    pub fn entries(&self) -> usize {
        self.rows.len()
    }

    /// 读取一列的全部数值
    pub fn column_values(&self, idx: usize) -> Result<Vec<f64>> {
        let column = self.columns.get(idx).ok_or_else(|| self.parse_error(format!(
            "column index {} out of range ({} columns)",
            idx,
            self.columns.len()
        )))?;

        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let raw = row.get(idx).unwrap_or("");
                raw.parse::<f64>().map_err(|_| {
                    self.parse_error(format!(
                        "entry {}: column '{}' is not numeric: '{}'",
                        i, column, raw
                    ))
                })
            })
            .collect()
    }

    /// 嵌入的文本记录（如 `runMacro`）
    pub fn record(&self, name: &str) -> Option<&[String]> {
        self.records.get(name).map(|lines| lines.as_slice())
    }

    /// 全部嵌入记录的名称
    pub fn record_names(&self) -> Vec<&str> {
        self.records.keys().map(|k| k.as_str()).collect()
    }

    fn parse_error(&self, reason: String) -> BgnormError {
        BgnormError::ParseError {
            format: "event dump".to_string(),
            path: self.path.display().to_string(),
            reason,
        }
    }
}

// ─────────────────────────────────────────────────────────────
// 能量列的版本化描述
// ─────────────────────────────────────────────────────────────

/// 结果文件的数据格式版本
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum SchemaVersion {
    /// Filtered virtual-detector output (`*_filtered.root`), edep at position 16
    #[default]
    Filtered,
    /// Legacy processed output (`*_proc.root`), edep at position 5
    Processed,
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaVersion::Filtered => write!(f, "filtered"),
            SchemaVersion::Processed => write!(f, "processed"),
        }
    }
}

impl SchemaVersion {
    /// 逻辑字段 `energy_deposition` 对应的列
    pub fn energy_deposition(&self) -> ColumnSpec {
        match self {
            SchemaVersion::Filtered => ColumnSpec {
                name: "edep",
                position: 16,
            },
            SchemaVersion::Processed => ColumnSpec {
                name: "edep",
                position: 5,
            },
        }
    }
}

/// 列名 + 期望位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub position: usize,
}

impl ColumnSpec {
    /// 在文件的列目录中定位该列
    ///
    /// 期望位置上的列名必须一致；列名出现在别处时按名称读取并警告；
    /// 列名不存在时返回 `MissingColumn`。
    pub fn resolve(&self, file: &EventFile) -> Result<usize> {
        let columns = file.columns();
        if columns.get(self.position).map(String::as_str) == Some(self.name) {
            return Ok(self.position);
        }

        match columns.iter().position(|c| c == self.name) {
            Some(idx) => {
                log::warn!(
                    "{}: column '{}' found at position {} instead of {}, reading by name",
                    file.path.display(),
                    self.name,
                    idx,
                    self.position
                );
                Ok(idx)
            }
            None => Err(BgnormError::MissingColumn {
                path: file.path.display().to_string(),
                column: self.name.to_string(),
                position: self.position,
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────
// 文本导出格式读取器
// ─────────────────────────────────────────────────────────────

/// 读取文本导出格式的结果文件
#[derive(Debug, Clone, Copy, Default)]
pub struct DumpReader;

impl EventFileReader for DumpReader {
    fn open(&self, path: &Path) -> Result<EventFile> {
        let content = fs::read_to_string(path).map_err(|e| BgnormError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        parse_dump(&content, path)
    }
}

/// 识别 `[[name]]` 段头
fn section_name(line: &str) -> Option<&str> {
    let name = line.strip_prefix("[[")?.strip_suffix("]]")?.trim();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// 解析文本导出格式
pub fn parse_dump(content: &str, path: &Path) -> Result<EventFile> {
    let parse_error = |reason: String| BgnormError::ParseError {
        format: "event dump".to_string(),
        path: path.display().to_string(),
        reason,
    };

    let mut sections: Vec<(String, Vec<&str>)> = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if let Some(name) = section_name(trimmed) {
            sections.push((name.to_string(), Vec::new()));
            continue;
        }

        match sections.last_mut() {
            Some((_, lines)) => lines.push(line.trim_end()),
            None if trimmed.is_empty() || trimmed.starts_with('#') => {}
            None => {
                return Err(parse_error(format!(
                    "line {}: content before the first section header",
                    line_no + 1
                )))
            }
        }
    }

    let mut events: Option<Vec<&str>> = None;
    let mut records: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for (name, lines) in sections {
        if name == EVENTS_SECTION {
            if events.is_some() {
                return Err(parse_error("duplicate [[events]] section".to_string()));
            }
            events = Some(lines);
        } else if records.contains_key(&name) {
            log::warn!(
                "{}: duplicate record '{}', keeping the first",
                path.display(),
                name
            );
        } else {
            records.insert(name, lines.iter().map(|l| l.to_string()).collect());
        }
    }

    let events = events.ok_or_else(|| parse_error("no [[events]] section".to_string()))?;
    let table: Vec<&str> = events
        .into_iter()
        .filter(|l| !l.trim().is_empty())
        .collect();
    let table = table.join("\n");

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(table.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| parse_error(format!("events header: {}", e)))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
        return Err(parse_error("events section has no column header".to_string()));
    }

    let rows = reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| parse_error(format!("events table: {}", e)))?;

    Ok(EventFile {
        path: path.to_path_buf(),
        columns,
        rows,
        records,
    })
}
