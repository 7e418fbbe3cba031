// 该文件是 Shanan （山南西风） 项目的一部分。
// src/source.rs - 数据集 CSV 读取
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::{
  collections::{BTreeSet, HashMap},
  path::{Path, PathBuf},
  sync::{Arc, Mutex},
};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  catalog::{self, DatasetProfile},
  record::{BenchmarkRow, ClassMetricRow, TrainingLogRow, column::EPOCH},
  variant::classify,
};

/// 整体测试结果文件
pub const OVERALL_FILE: &str = "Testing-Results-LAST_ASLI.csv";
/// 分类别测试结果文件
pub const CLASS_FILE: &str = "yolo_metrics_detailed.csv";
/// 训练日志文件后缀，前缀为模型标识
pub const TRAINING_LOG_SUFFIX: &str = "_results.csv";

#[derive(Error, Debug)]
pub enum SourceError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("数据集路径缺少数据集名称: {0}")]
  MissingDatasetId(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("CSV 解析错误 {path}: {source}")]
  Csv {
    path: PathBuf,
    #[source]
    source: csv::Error,
  },
  #[error("模型 {0} 在结果文件中重复出现")]
  DuplicateModel(String),
  #[error("模型 {model} 的类别 {class} 重复出现")]
  DuplicateClassMetric { model: String, class: String },
  #[error("训练日志 {0} 缺少 epoch 列")]
  MissingEpoch(PathBuf),
  #[error("训练日志 {path} 第 {line} 行的值无法解析: '{value}'")]
  InvalidValue {
    path: PathBuf,
    line: u64,
    value: String,
  },
  #[error("训练日志 {model} 的 epoch 未递增: {previous} -> {epoch}")]
  EpochOrder {
    model: String,
    previous: u32,
    epoch: u32,
  },
}

impl SourceError {
  fn csv(path: &Path, source: csv::Error) -> Self {
    SourceError::Csv {
      path: path.to_path_buf(),
      source,
    }
  }
}

/// 一次加载得到的数据集快照
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSnapshot {
  pub dataset_id: String,
  pub overall: Vec<BenchmarkRow>,
  pub classes: Vec<ClassMetricRow>,
  pub training_logs: Vec<TrainingLogRow>,
}

impl DatasetSnapshot {
  pub fn profile(&self) -> Option<&'static DatasetProfile> {
    catalog::lookup(&self.dataset_id)
  }
}

/// 以 `dataset:///<目录>/<数据集>` 指定的数据集目录
#[derive(Debug, Clone)]
pub struct DatasetSource {
  directory: PathBuf,
  dataset_id: String,
}

impl FromUrlWithScheme for DatasetSource {
  const SCHEME: &'static str = "dataset";
}

impl FromUrl for DatasetSource {
  type Error = SourceError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(SourceError::SchemeMismatch(url.scheme().to_string()));
    }
    Self::new(url.path())
  }
}

impl DatasetSource {
  pub fn new(directory: impl Into<PathBuf>) -> Result<Self, SourceError> {
    let directory = directory.into();
    let dataset_id = directory
      .file_name()
      .and_then(|name| name.to_str())
      .filter(|name| !name.is_empty())
      .map(str::to_string)
      .ok_or_else(|| SourceError::MissingDatasetId(directory.display().to_string()))?;
    Ok(Self {
      directory,
      dataset_id,
    })
  }

  pub fn dataset_id(&self) -> &str {
    &self.dataset_id
  }

  pub fn directory(&self) -> &Path {
    &self.directory
  }

  pub fn load(&self) -> Result<DatasetSnapshot, SourceError> {
    info!("加载数据集: {} ({})", self.dataset_id, self.directory.display());

    let overall: Vec<BenchmarkRow> = read_records(&self.directory.join(OVERALL_FILE))?;
    let mut models = BTreeSet::new();
    for row in &overall {
      if !models.insert(row.model.as_str()) {
        return Err(SourceError::DuplicateModel(row.model.clone()));
      }
    }

    let classes: Vec<ClassMetricRow> = read_records(&self.directory.join(CLASS_FILE))?;
    let mut pairs = BTreeSet::new();
    for row in &classes {
      if !pairs.insert((row.model.as_str(), row.class.as_str())) {
        return Err(SourceError::DuplicateClassMetric {
          model: row.model.clone(),
          class: row.class.clone(),
        });
      }
    }

    let training_logs = self.load_training_logs()?;
    debug!(
      "数据集 {}: {} 个模型, {} 条分类别结果, {} 条训练日志",
      self.dataset_id,
      overall.len(),
      classes.len(),
      training_logs.len()
    );

    Ok(DatasetSnapshot {
      dataset_id: self.dataset_id.clone(),
      overall,
      classes,
      training_logs,
    })
  }

  fn load_training_logs(&self) -> Result<Vec<TrainingLogRow>, SourceError> {
    let mut files: Vec<(String, PathBuf)> = std::fs::read_dir(&self.directory)?
      .filter_map(|entry| entry.ok())
      .filter_map(|entry| {
        let path = entry.path();
        let name = path.file_name()?.to_str()?;
        let model = name.strip_suffix(TRAINING_LOG_SUFFIX)?;
        (!model.is_empty()).then(|| (model.to_string(), path.clone()))
      })
      .collect();
    files.sort();

    if files.is_empty() {
      warn!("数据集 {} 没有训练日志", self.dataset_id);
    }

    let mut logs = Vec::new();
    for (model, path) in files {
      logs.extend(read_training_log(&model, &path)?);
    }
    Ok(logs)
  }
}

fn reader(path: &Path) -> Result<csv::Reader<std::fs::File>, SourceError> {
  csv::ReaderBuilder::new()
    .trim(csv::Trim::All)
    .from_path(path)
    .map_err(|e| SourceError::csv(path, e))
}

fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SourceError> {
  let mut reader = reader(path)?;
  let records = reader
    .deserialize()
    .collect::<Result<Vec<T>, _>>()
    .map_err(|e| SourceError::csv(path, e))?;
  debug!("读取 {}: {} 行", path.display(), records.len());
  Ok(records)
}

/// 读取单个模型的训练日志，表头两侧的空白会被去除
pub fn read_training_log(model: &str, path: &Path) -> Result<Vec<TrainingLogRow>, SourceError> {
  let mut reader = reader(path)?;
  let headers = reader.headers().map_err(|e| SourceError::csv(path, e))?.clone();
  let epoch_index = headers
    .iter()
    .position(|header| header == EPOCH)
    .ok_or_else(|| SourceError::MissingEpoch(path.to_path_buf()))?;

  let variant = classify(model);
  let mut rows: Vec<TrainingLogRow> = Vec::new();
  for record in reader.records() {
    let record = record.map_err(|e| SourceError::csv(path, e))?;
    let line = record.position().map(|p| p.line()).unwrap_or_default();
    let invalid = |value: &str| SourceError::InvalidValue {
      path: path.to_path_buf(),
      line,
      value: value.to_string(),
    };

    let raw_epoch = record.get(epoch_index).unwrap_or_default();
    let epoch = raw_epoch
      .parse::<f64>()
      .ok()
      .filter(|e| *e >= 0.0 && e.fract() == 0.0 && *e <= u32::MAX as f64)
      .map(|e| e as u32)
      .ok_or_else(|| invalid(raw_epoch))?;
    if let Some(previous) = rows.last().map(|row| row.epoch)
      && epoch <= previous
    {
      return Err(SourceError::EpochOrder {
        model: model.to_string(),
        previous,
        epoch,
      });
    }

    let mut metrics = Vec::with_capacity(headers.len().saturating_sub(1));
    for (index, (header, value)) in headers.iter().zip(record.iter()).enumerate() {
      if index == epoch_index || value.is_empty() {
        continue;
      }
      let value = value.parse::<f64>().map_err(|_| invalid(value))?;
      metrics.push((header.to_string(), value));
    }

    rows.push(TrainingLogRow {
      model: model.to_string(),
      variant,
      epoch,
      metrics,
    });
  }
  debug!("训练日志 {}: {} 个 epoch", model, rows.len());
  Ok(rows)
}

/// 按数据集标识缓存快照，供多次渲染复用
#[derive(Debug, Default)]
pub struct DatasetCache {
  snapshots: Mutex<HashMap<String, Arc<DatasetSnapshot>>>,
}

impl DatasetCache {
  pub fn get_or_load(&self, source: &DatasetSource) -> Result<Arc<DatasetSnapshot>, SourceError> {
    let mut snapshots = self
      .snapshots
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(snapshot) = snapshots.get(source.dataset_id()) {
      debug!("数据集 {} 命中缓存", source.dataset_id());
      return Ok(Arc::clone(snapshot));
    }
    let snapshot = Arc::new(source.load()?);
    snapshots.insert(source.dataset_id().to_string(), Arc::clone(&snapshot));
    Ok(snapshot)
  }

  pub fn invalidate(&self, dataset_id: &str) {
    self
      .snapshots
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .remove(dataset_id);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dataset_id_from_url_path() {
    let url = Url::parse("dataset:///srv/data/fer-2013").unwrap();
    let source = DatasetSource::from_url(&url).unwrap();
    assert_eq!(source.dataset_id(), "fer-2013");
    assert_eq!(source.directory(), Path::new("/srv/data/fer-2013"));
  }

  #[test]
  fn wrong_scheme_is_rejected() {
    let url = Url::parse("folder:///srv/data/fer-2013").unwrap();
    assert!(matches!(
      DatasetSource::from_url(&url),
      Err(SourceError::SchemeMismatch(scheme)) if scheme == "folder"
    ));
  }

  #[test]
  fn root_path_has_no_dataset() {
    assert!(matches!(
      DatasetSource::new("/"),
      Err(SourceError::MissingDatasetId(_))
    ));
  }
}
