//! # 结果文件加载与合并
//!
//! 对一个 (layer, isotope) 组合遍历所有候选副本编号，读取存在的结果文件中的
//! 能量沉积列并拼接，同时统计成功贡献数据的文件数。
//!
//! 文件数之后作为归一化的除数，因此只统计成功解析且至少包含一个数值的文件：
//! - 文件不存在：静默跳过
//! - 打开 / 解析失败：警告并跳过，不计数
//! - 空文件：跳过，不计数
//!
//! ## 依赖关系
//! - 被 `pipeline/mod.rs` 调用
//! - 使用 `parsers/` 读取文件与运行元数据

use super::config::PipelineConfig;
use crate::error::Result;
use crate::models::PairKey;
use crate::parsers::{EventFileReader, RunMetadata};

use std::path::Path;

/// 一个组合的加载结果
#[derive(Debug, Clone)]
pub struct LoadedPair {
    pub key: PairKey,
    /// 所有文件的能量沉积值，按副本编号顺序拼接
    pub values: Vec<f64>,
    /// 成功贡献数据的文件数
    pub file_count: usize,
    /// 存在但读取失败的文件数
    pub failed_files: usize,
    /// 每个贡献文件的运行元数据，按副本编号顺序
    pub metadata: Vec<RunMetadata>,
}

impl LoadedPair {
    fn empty(key: &PairKey) -> Self {
        LoadedPair {
            key: key.clone(),
            values: Vec::new(),
            file_count: 0,
            failed_files: 0,
            metadata: Vec::new(),
        }
    }
}

/// 读取单个文件的能量列与运行元数据
fn read_energy_column(
    reader: &dyn EventFileReader,
    path: &Path,
    config: &PipelineConfig,
) -> Result<(Vec<f64>, RunMetadata)> {
    let file = reader.open(path)?;
    let idx = config.schema.energy_deposition().resolve(&file)?;
    let values = file.column_values(idx)?;
    Ok((values, RunMetadata::from_event_file(&file)))
}

/// 加载一个 (layer, isotope) 组合的全部副本
pub fn load_pair(
    key: &PairKey,
    config: &PipelineConfig,
    reader: &dyn EventFileReader,
) -> LoadedPair {
    let mut loaded = LoadedPair::empty(key);

    for (index, path) in config.naming.candidates(key) {
        if !path.exists() {
            continue;
        }

        match read_energy_column(reader, &path, config) {
            Ok((values, _)) if values.is_empty() => {
                log::debug!(
                    "layer={} isotope={} index={} reason=\"no entries\" file={}",
                    key.layer,
                    key.isotope,
                    index,
                    path.display()
                );
            }
            Ok((values, metadata)) => {
                loaded.values.extend(values);
                loaded.metadata.push(metadata);
                loaded.file_count += 1;
            }
            Err(e) => {
                loaded.failed_files += 1;
                log::warn!(
                    "layer={} isotope={} index={} reason=\"unreadable file\" error=\"{}\"",
                    key.layer,
                    key.isotope,
                    index,
                    e.to_string().replace('\n', " ")
                );
            }
        }
    }

    log::debug!(
        "layer={} isotope={} files={} failed={} entries={}",
        key.layer,
        key.isotope,
        loaded.file_count,
        loaded.failed_files,
        loaded.values.len()
    );

    loaded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Component;
    use crate::parsers::{DumpReader, SchemaVersion};
    use crate::pipeline::naming::FileNaming;

    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("bgnorm_loader_{}_{}", tag, nanos));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn dump(values: &[f64], beam_on: u64) -> String {
        let mut s = String::from("[[events]]\nfile,ID,eventID,clusterIndex,timeStamp,edep\n");
        for v in values {
            s.push_str(&format!("0,1,2,0,0.0,{}\n", v));
        }
        s.push_str(&format!("[[runMacro]]\n/run/beamOn {}\n", beam_on));
        s
    }

    fn config(dir: PathBuf) -> PipelineConfig {
        let mut naming = FileNaming::new(dir);
        naming.replicates = 0..=9;
        let mut cfg = PipelineConfig::new(Component::Internal, naming);
        cfg.schema = SchemaVersion::Processed;
        cfg
    }

    #[test]
    fn test_load_pair_counts_only_successful_files() {
        let dir = unique_temp_dir("counts");
        let cfg = config(dir.clone());
        let key = PairKey::new(Component::Internal, "Cu", "K40");

        // 3 个有效文件，2 个损坏文件，1 个空文件
        fs::write(cfg.naming.path(&key, 0), dump(&[100.0, 200.0], 1000)).unwrap();
        fs::write(cfg.naming.path(&key, 2), dump(&[300.0], 1000)).unwrap();
        fs::write(cfg.naming.path(&key, 5), dump(&[400.0, 500.0, 600.0], 1000)).unwrap();
        fs::write(cfg.naming.path(&key, 3), "not a dump").unwrap();
        fs::write(cfg.naming.path(&key, 4), "[[events]]\na,b\n1,2\n").unwrap();
        fs::write(cfg.naming.path(&key, 7), dump(&[], 1000)).unwrap();

        let loaded = load_pair(&key, &cfg, &DumpReader);
        assert_eq!(loaded.file_count, 3);
        assert_eq!(loaded.failed_files, 2);
        assert_eq!(loaded.values, vec![100.0, 200.0, 300.0, 400.0, 500.0, 600.0]);
        assert_eq!(loaded.metadata.len(), 3);
        assert_eq!(loaded.metadata[0].beam_on, Some(1000));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_pair_outside_window_is_ignored() {
        let dir = unique_temp_dir("window");
        let cfg = config(dir.clone());
        let key = PairKey::new(Component::Internal, "Cu", "K40");

        fs::write(cfg.naming.path(&key, 10), dump(&[1.0], 10)).unwrap();

        let loaded = load_pair(&key, &cfg, &DumpReader);
        assert_eq!(loaded.file_count, 0);
        assert!(loaded.values.is_empty());

        fs::remove_dir_all(&dir).ok();
    }
}
