// 该文件是 Shanan （山南西风） 项目的一部分。
// src/record.rs - 基准测试记录定义
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

use serde::{Deserialize, Serialize};

use crate::{
  reshape::derive_total_latency,
  table::{Cell, Table, TableError, TableRow, ToTable},
  variant::VariantGroup,
};

/// 结果文件中的列名
pub mod column {
  pub use crate::table::MODEL;

  pub const CLASS: &str = "Class";
  pub const PRECISION: &str = "Precision";
  pub const RECALL: &str = "Recall";
  pub const F1_SCORE: &str = "F1-Score";
  pub const MAP50: &str = "mAP50";
  pub const MAP50_95: &str = "mAP50-95";
  pub const PREPROCESSING: &str = "Preprocessing (ms)";
  pub const INFERENCE: &str = "Inference (ms)";
  pub const POSTPROCESSING: &str = "Postprocessing (ms)";
  pub const TOTAL_TIME: &str = "Total Time (ms)";
  pub const FPS: &str = "FPS";
  pub const TRAINING_TIME: &str = "Training Time";
  pub const TRAINING_MINUTES: &str = "Training Time (min)";
  pub const PARAMETERS: &str = "Parameters (M)";
  pub const EPOCH: &str = "epoch";
  pub const VARIANT_GROUP: &str = "Variant Group";

  pub const ACCURACY: [&str; 5] = [PRECISION, RECALL, F1_SCORE, MAP50, MAP50_95];
  pub const LATENCY_STAGES: [&str; 3] = [PREPROCESSING, INFERENCE, POSTPROCESSING];
}

use self::column::*;

/// 单个模型的整体测试结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRow {
  #[serde(rename = "Model")]
  pub model: String,
  #[serde(rename = "Precision")]
  pub precision: f64,
  #[serde(rename = "Recall")]
  pub recall: f64,
  #[serde(rename = "F1-Score")]
  pub f1_score: f64,
  #[serde(rename = "mAP50")]
  pub map50: f64,
  #[serde(rename = "mAP50-95")]
  pub map50_95: f64,
  #[serde(rename = "Preprocessing (ms)")]
  pub preprocessing_ms: f64,
  #[serde(rename = "Inference (ms)")]
  pub inference_ms: f64,
  #[serde(rename = "Postprocessing (ms)")]
  pub postprocessing_ms: f64,
  #[serde(rename = "Total Time (ms)", default)]
  pub total_time_ms: Option<f64>,
  #[serde(rename = "FPS")]
  pub fps: f64,
  #[serde(rename = "Training Time")]
  pub training_time: String,
  #[serde(rename = "Parameters (M)", default)]
  pub parameters_m: Option<f64>,
}

impl TableRow for BenchmarkRow {
  const COLUMNS: &'static [&'static str] = &[
    MODEL,
    PRECISION,
    RECALL,
    F1_SCORE,
    MAP50,
    MAP50_95,
    PREPROCESSING,
    INFERENCE,
    POSTPROCESSING,
    TOTAL_TIME,
    FPS,
    TRAINING_TIME,
    PARAMETERS,
  ];

  fn model_id(&self) -> &str {
    &self.model
  }

  fn cell(&self, column: &str) -> Result<Cell, TableError> {
    let cell = match column {
      MODEL => Cell::from(self.model.as_str()),
      PRECISION => self.precision.into(),
      RECALL => self.recall.into(),
      F1_SCORE => self.f1_score.into(),
      MAP50 => self.map50.into(),
      MAP50_95 => self.map50_95.into(),
      PREPROCESSING => self.preprocessing_ms.into(),
      INFERENCE => self.inference_ms.into(),
      POSTPROCESSING => self.postprocessing_ms.into(),
      TOTAL_TIME => self
        .total_time_ms
        .unwrap_or_else(|| derive_total_latency(self))
        .into(),
      FPS => self.fps.into(),
      TRAINING_TIME => Cell::from(self.training_time.as_str()),
      PARAMETERS => self.parameters_m.into(),
      _ => return Err(TableError::UnknownColumn(column.to_string())),
    };
    Ok(cell)
  }
}

impl ToTable for [BenchmarkRow] {
  fn to_table(&self) -> Table {
    let mut columns = vec![MODEL];
    columns.extend(ACCURACY);
    columns.extend(LATENCY_STAGES);
    // 可选列只有在数据里出现时才输出，缺失的总耗时留给派生处理
    if self.iter().any(|row| row.total_time_ms.is_some()) {
      columns.push(TOTAL_TIME);
    }
    columns.extend([FPS, TRAINING_TIME]);
    if self.iter().any(|row| row.parameters_m.is_some()) {
      columns.push(PARAMETERS);
    }
    rows_to_table(self, &columns)
  }
}

/// 单个模型在单个类别上的测试结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetricRow {
  #[serde(rename = "Model")]
  pub model: String,
  #[serde(rename = "Class")]
  pub class: String,
  #[serde(rename = "Precision")]
  pub precision: f64,
  #[serde(rename = "Recall")]
  pub recall: f64,
  #[serde(rename = "F1-Score")]
  pub f1_score: f64,
  #[serde(rename = "mAP50")]
  pub map50: f64,
  #[serde(rename = "mAP50-95")]
  pub map50_95: f64,
}

impl TableRow for ClassMetricRow {
  const COLUMNS: &'static [&'static str] =
    &[MODEL, CLASS, PRECISION, RECALL, F1_SCORE, MAP50, MAP50_95];

  fn model_id(&self) -> &str {
    &self.model
  }

  fn cell(&self, column: &str) -> Result<Cell, TableError> {
    let cell = match column {
      MODEL => Cell::from(self.model.as_str()),
      CLASS => Cell::from(self.class.as_str()),
      PRECISION => self.precision.into(),
      RECALL => self.recall.into(),
      F1_SCORE => self.f1_score.into(),
      MAP50 => self.map50.into(),
      MAP50_95 => self.map50_95.into(),
      _ => return Err(TableError::UnknownColumn(column.to_string())),
    };
    Ok(cell)
  }
}

impl ToTable for [ClassMetricRow] {
  fn to_table(&self) -> Table {
    let mut columns = vec![MODEL, CLASS];
    columns.extend(ACCURACY);
    rows_to_table(self, &columns)
  }
}

/// 训练日志中的一个 epoch，模型标识与分组由加载器附加
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingLogRow {
  pub model: String,
  pub variant: VariantGroup,
  pub epoch: u32,
  pub metrics: Vec<(String, f64)>,
}

impl TrainingLogRow {
  pub fn metric(&self, name: &str) -> Option<f64> {
    self
      .metrics
      .iter()
      .find(|(metric, _)| metric == name)
      .map(|(_, value)| *value)
  }
}

impl TableRow for TrainingLogRow {
  // 指标列随日志文件而定
  const COLUMNS: &'static [&'static str] = &[MODEL, VARIANT_GROUP, EPOCH];

  fn model_id(&self) -> &str {
    &self.model
  }

  fn cell(&self, column: &str) -> Result<Cell, TableError> {
    match column {
      MODEL => Ok(Cell::from(self.model.as_str())),
      VARIANT_GROUP => Ok(Cell::from(self.variant.label())),
      EPOCH => Ok(Cell::Number(self.epoch as f64)),
      _ => self
        .metric(column)
        .map(Cell::Number)
        .ok_or_else(|| TableError::UnknownColumn(column.to_string())),
    }
  }
}

impl ToTable for [TrainingLogRow] {
  fn to_table(&self) -> Table {
    let mut columns = vec![MODEL.to_string(), VARIANT_GROUP.to_string(), EPOCH.to_string()];
    for row in self {
      for (name, _) in &row.metrics {
        if !columns.contains(name) {
          columns.push(name.clone());
        }
      }
    }
    let mut table = Table::new(columns.iter().cloned());
    for row in self {
      // 不同模型的日志列可能不一致，缺失的指标留空
      table.push_row(
        columns
          .iter()
          .map(|column| row.cell(column).unwrap_or(Cell::Empty))
          .collect(),
      );
    }
    table
  }
}

fn rows_to_table<R: TableRow>(rows: &[R], columns: &[&str]) -> Table {
  let mut table = Table::new(columns.iter().copied());
  for row in rows {
    table.push_row(
      columns
        .iter()
        .map(|column| row.cell(column).unwrap_or(Cell::Empty))
        .collect(),
    );
  }
  table
}
