//! # 参考表读取
//!
//! 读取两张静态参考表（CSV）：
//! - 内部材料表：`Material, Isotope, Activity, Sigma` + 可选 `Mass_<geometry>`, `Count`
//! - 背景表：`Material, Particule, Isotope, Surface, Flux, Sigma` + 可选 `Count`
//!
//! 任何读取失败都是致命错误（没有参考表就无法归一化）。
//!
//! ## 依赖关系
//! - 被 `catalog/mod.rs` 调用
//! - 使用 `csv` + `serde` 反序列化

use super::CatalogEntry;
use crate::error::{BgnormError, Result};
use crate::models::{Component, PairKey};

use csv::StringRecord;
use serde::Deserialize;
use std::io::Read;

const INTERNAL_REQUIRED: [&str; 4] = ["Material", "Isotope", "Activity", "Sigma"];
const BACKGROUND_REQUIRED: [&str; 6] = [
    "Material",
    "Particule",
    "Isotope",
    "Surface",
    "Flux",
    "Sigma",
];

/// 背景表的一行
#[derive(Debug, Deserialize)]
struct BackgroundRow {
    #[serde(rename = "Material")]
    material: String,
    #[serde(rename = "Particule")]
    particule: String,
    #[serde(rename = "Isotope")]
    isotope: String,
    #[serde(rename = "Surface")]
    surface: f64,
    #[serde(rename = "Flux")]
    flux: f64,
    #[serde(rename = "Sigma")]
    sigma: f64,
    #[serde(rename = "Count", default)]
    count: Option<f64>,
}

fn csv_reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input)
}

fn load_error(source: &str, reason: impl Into<String>) -> BgnormError {
    BgnormError::CatalogLoadError {
        path: source.to_string(),
        reason: reason.into(),
    }
}

fn check_headers(headers: &StringRecord, required: &[&str], source: &str) -> Result<()> {
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(load_error(
                source,
                format!("missing required column '{}'", column),
            ));
        }
    }
    Ok(())
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn required_f64(
    record: &StringRecord,
    idx: usize,
    column: &str,
    row: usize,
    source: &str,
) -> Result<f64> {
    let raw = record.get(idx).unwrap_or("");
    raw.parse::<f64>().map_err(|_| {
        load_error(
            source,
            format!("row {}: column '{}' is not a number: '{}'", row, column, raw),
        )
    })
}

/// 可选数值列：空单元格视为缺失，非空但无法解析则报错
fn optional_f64(
    record: &StringRecord,
    idx: Option<usize>,
    column: &str,
    row: usize,
    source: &str,
) -> Result<Option<f64>> {
    let Some(idx) = idx else {
        return Ok(None);
    };
    match record.get(idx).unwrap_or("") {
        "" | "nan" | "NaN" => Ok(None),
        raw => raw.parse::<f64>().map(Some).map_err(|_| {
            load_error(
                source,
                format!("row {}: column '{}' is not a number: '{}'", row, column, raw),
            )
        }),
    }
}

/// 读取内部材料表
///
/// `mass_column` 为 `Some` 时该列必须存在（固定质量模式）。
pub fn read_internal_table<R: Read>(
    input: R,
    source: &str,
    mass_column: Option<&str>,
) -> Result<Vec<CatalogEntry>> {
    let mut reader = csv_reader(input);
    let headers = reader
        .headers()
        .map_err(|e| load_error(source, e.to_string()))?
        .clone();
    check_headers(&headers, &INTERNAL_REQUIRED, source)?;

    let material_idx = column_index(&headers, "Material").unwrap_or(0);
    let isotope_idx = column_index(&headers, "Isotope").unwrap_or(1);
    let activity_idx = column_index(&headers, "Activity").unwrap_or(2);
    let sigma_idx = column_index(&headers, "Sigma").unwrap_or(3);
    let count_idx = column_index(&headers, "Count");

    let mass_idx = match mass_column {
        Some(name) => Some(column_index(&headers, name).ok_or_else(|| {
            let available: Vec<&str> = headers.iter().filter(|h| h.starts_with("Mass")).collect();
            load_error(
                source,
                format!(
                    "mass column '{}' not found (available: {})",
                    name,
                    available.join(", ")
                ),
            )
        })?),
        None => None,
    };

    let mut entries = Vec::new();
    for (i, record) in reader.records().enumerate() {
        // 行号从 2 开始（第 1 行为表头）
        let row = i + 2;
        let record = record.map_err(|e| load_error(source, format!("row {}: {}", row, e)))?;

        let layer = record.get(material_idx).unwrap_or("").to_string();
        let isotope = record.get(isotope_idx).unwrap_or("").to_string();
        if layer.is_empty() || isotope.is_empty() {
            return Err(load_error(source, format!("row {}: empty Material or Isotope", row)));
        }

        entries.push(CatalogEntry {
            key: PairKey::new(Component::Internal, layer, isotope),
            activity: required_f64(&record, activity_idx, "Activity", row, source)?,
            sigma: required_f64(&record, sigma_idx, "Sigma", row, source)?,
            exposure: optional_f64(&record, mass_idx, mass_column.unwrap_or("Mass"), row, source)?,
            event_count: optional_f64(&record, count_idx, "Count", row, source)?,
        });
    }

    Ok(entries)
}

/// 读取岩石 / 混凝土背景表
pub fn read_background_table<R: Read>(input: R, source: &str) -> Result<Vec<CatalogEntry>> {
    let mut reader = csv_reader(input);
    let headers = reader
        .headers()
        .map_err(|e| load_error(source, e.to_string()))?
        .clone();
    check_headers(&headers, &BACKGROUND_REQUIRED, source)?;

    let mut entries = Vec::new();
    for (i, row) in reader.deserialize::<BackgroundRow>().enumerate() {
        let line = i + 2;
        let row = row.map_err(|e| load_error(source, format!("row {}: {}", line, e)))?;

        let component = match row.material.as_str() {
            "Rock" => Component::Rock,
            "Concrete" => Component::Concrete,
            other => {
                log::debug!("{}: row {} has unknown material '{}', ignored", source, line, other);
                continue;
            }
        };

        entries.push(CatalogEntry {
            key: PairKey::new(component, row.particule, row.isotope),
            activity: row.flux,
            sigma: row.sigma,
            exposure: Some(row.surface),
            event_count: row.count,
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_internal_with_mass_column() {
        let content = "\
Material,Isotope,Activity,Sigma,Mass_v1,Mass_v2,Count
Cu,K40,10.0,1.0,2.0,3.0,1000
Pb,Pb210, 5.0 ,0.5,,4.0,
";
        let entries =
            read_internal_table(content.as_bytes(), "materials.csv", Some("Mass_v1")).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key.layer, "Cu");
        assert_eq!(entries[0].exposure, Some(2.0));
        assert_eq!(entries[0].event_count, Some(1000.0));
        assert_eq!(entries[1].activity, 5.0);
        assert_eq!(entries[1].exposure, None);
        assert_eq!(entries[1].event_count, None);
    }

    #[test]
    fn test_read_internal_missing_mass_column_is_fatal() {
        let content = "Material,Isotope,Activity,Sigma,Mass_v1\nCu,K40,1,1,1\n";
        let result = read_internal_table(content.as_bytes(), "materials.csv", Some("Mass_v9"));
        assert!(matches!(result, Err(BgnormError::CatalogLoadError { .. })));
    }

    #[test]
    fn test_read_internal_bad_activity_is_fatal() {
        let content = "Material,Isotope,Activity,Sigma\nCu,K40,high,1\n";
        let result = read_internal_table(content.as_bytes(), "materials.csv", None);
        assert!(result.is_err());
    }

    #[test]
    fn test_read_background_table() {
        let content = "\
Material,Particule,Isotope,Surface,Flux,Sigma
Rock,Gammas,K40,100.0,0.5,0.05
Concrete,Gammas,K40,50.0,0.7,0.07
Rock,Neutrons,Neutrons,100.0,1e-6,1e-7
Granite,Gammas,K40,1,1,1
";
        let entries = read_background_table(content.as_bytes(), "rock.csv").unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].key.component, Component::Rock);
        assert_eq!(entries[0].exposure, Some(100.0));
        assert_eq!(entries[0].activity, 0.5);
        assert_eq!(entries[1].key.component, Component::Concrete);
        assert_eq!(entries[2].key.layer, "Neutrons");
    }

    #[test]
    fn test_read_background_missing_column() {
        let content = "Material,Particule,Isotope,Flux,Sigma\nRock,Gammas,K40,1,1\n";
        let result = read_background_table(content.as_bytes(), "rock.csv");
        assert!(matches!(result, Err(BgnormError::CatalogLoadError { .. })));
    }
}
