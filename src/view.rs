// 该文件是 Shanan （山南西风） 项目的一部分。
// src/view.rs - 看板视图
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

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::{
  filter::{ChartSort, SortMode, TrainingFilter, apply, curve_metrics, order_long, select_training_logs},
  highlight::{Highlights, highlight_columns},
  order::{canonical_permutation, index_by_canonical_order, sort_by_canonical_order},
  record::column::*,
  reshape::{METRICS, SCORE, melt, pivot, with_total_latency, with_training_minutes},
  source::DatasetSnapshot,
  table::{Table, TableError, ToTable},
};

#[derive(Error, Debug, PartialEq)]
pub enum ViewError {
  #[error("表格错误: {0}")]
  Table(#[from] TableError),
  #[error("数据集 {0} 没有训练日志")]
  NoTrainingLogs(String),
  #[error("训练日志中没有可绘制的指标: {0}")]
  UnknownMetric(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewKind {
  Accuracy,
  Efficiency,
  MapChart,
  LatencyChart,
  TradeOff,
  TrainingTime,
  Robustness,
  ClassTable,
  TrainingCurve,
}

impl ViewKind {
  pub const ALL: [ViewKind; 9] = [
    ViewKind::Accuracy,
    ViewKind::Efficiency,
    ViewKind::MapChart,
    ViewKind::LatencyChart,
    ViewKind::TradeOff,
    ViewKind::TrainingTime,
    ViewKind::Robustness,
    ViewKind::ClassTable,
    ViewKind::TrainingCurve,
  ];

  pub fn name(&self) -> &'static str {
    match self {
      ViewKind::Accuracy => "accuracy",
      ViewKind::Efficiency => "efficiency",
      ViewKind::MapChart => "map-chart",
      ViewKind::LatencyChart => "latency-chart",
      ViewKind::TradeOff => "trade-off",
      ViewKind::TrainingTime => "training-time",
      ViewKind::Robustness => "robustness",
      ViewKind::ClassTable => "class-table",
      ViewKind::TrainingCurve => "training-curve",
    }
  }

  pub fn title(&self) -> &'static str {
    match self {
      ViewKind::Accuracy => "YOLO 模型精度对比",
      ViewKind::Efficiency => "YOLO 模型效率对比",
      ViewKind::MapChart => "mAP50 与 mAP50-95 对比",
      ViewKind::LatencyChart => "各阶段延迟对比",
      ViewKind::TradeOff => "速度与精度权衡",
      ViewKind::TrainingTime => "训练时长（分钟）",
      ViewKind::Robustness => "分类别鲁棒性热力图",
      ViewKind::ClassTable => "分类别结果",
      ViewKind::TrainingCurve => "训练曲线",
    }
  }
}

impl fmt::Display for ViewKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for ViewKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    ViewKind::ALL
      .into_iter()
      .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| format!("未知的视图: {}", s))
  }
}

/// 调用方持有的筛选与排序状态
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewOptions {
  pub selected_models: BTreeSet<String>,
  pub sort_column: Option<String>,
  pub sort_mode: SortMode,
  pub chart_sort: ChartSort,
  pub metric: Option<String>,
  pub training_filter: TrainingFilter,
}

impl ViewOptions {
  fn sort_column(&self) -> &str {
    self.sort_column.as_deref().unwrap_or(MODEL)
  }

  /// `Default` 与未指定等价
  fn metric(&self) -> Option<&str> {
    self
      .metric
      .as_deref()
      .filter(|metric| !metric.eq_ignore_ascii_case("default"))
  }

  /// 去掉排序列与指标，只保留模型选择、图表方向和训练曲线筛选
  pub fn without_column_choices(&self) -> ViewOptions {
    ViewOptions {
      sort_column: None,
      sort_mode: SortMode::CanonicalDefault,
      metric: None,
      ..self.clone()
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
  pub kind: ViewKind,
  pub dataset_id: String,
  pub title: String,
  pub table: Table,
  pub highlights: Highlights,
}

impl View {
  fn new(kind: ViewKind, snapshot: &DatasetSnapshot, table: Table) -> Self {
    Self {
      kind,
      dataset_id: snapshot.dataset_id.clone(),
      title: kind.title().to_string(),
      table,
      highlights: Highlights::new(),
    }
  }

  fn with_highlights(mut self, columns: &[&str]) -> Result<Self, TableError> {
    let present: Vec<&str> = columns
      .iter()
      .copied()
      .filter(|column| self.table.has_column(column))
      .collect();
    self.highlights = highlight_columns(&self.table, &present)?;
    Ok(self)
  }
}

pub fn build_view(
  kind: ViewKind,
  snapshot: &DatasetSnapshot,
  options: &ViewOptions,
) -> Result<View, ViewError> {
  debug!("构建视图 {} ({})", kind, snapshot.dataset_id);
  match kind {
    ViewKind::Accuracy => accuracy(snapshot, options),
    ViewKind::Efficiency => efficiency(snapshot, options),
    ViewKind::MapChart => map_chart(snapshot, options),
    ViewKind::LatencyChart => latency_chart(snapshot, options),
    ViewKind::TradeOff => trade_off(snapshot, options),
    ViewKind::TrainingTime => training_time(snapshot, options),
    ViewKind::Robustness => robustness(snapshot, options),
    ViewKind::ClassTable => class_table(snapshot, options),
    ViewKind::TrainingCurve => training_curve(snapshot, options),
  }
}

fn sorted_table(table: &Table, options: &ViewOptions) -> Result<Table, TableError> {
  let indexed = index_by_canonical_order(table)?;
  apply(&indexed, &options.selected_models, options.sort_column(), options.sort_mode)
}

fn accuracy(snapshot: &DatasetSnapshot, options: &ViewOptions) -> Result<View, ViewError> {
  let mut columns = vec![MODEL];
  columns.extend(ACCURACY);
  let table = snapshot.overall.to_table().select_columns(&columns)?;
  let table = sorted_table(&table, options)?;
  Ok(View::new(ViewKind::Accuracy, snapshot, table).with_highlights(&ACCURACY)?)
}

fn efficiency(snapshot: &DatasetSnapshot, options: &ViewOptions) -> Result<View, ViewError> {
  let mut columns = vec![MODEL];
  columns.extend(LATENCY_STAGES);
  columns.extend([TOTAL_TIME, FPS, TRAINING_TIME]);
  let table = with_total_latency(&snapshot.overall.to_table())?.select_columns(&columns)?;
  let table = sorted_table(&table, options)?;
  Ok(View::new(ViewKind::Efficiency, snapshot, table).with_highlights(&columns[1..])?)
}

fn melted_chart(
  kind: ViewKind,
  snapshot: &DatasetSnapshot,
  options: &ViewOptions,
  value_columns: &[&str],
) -> Result<View, ViewError> {
  let long = melt(&snapshot.overall.to_table(), &[MODEL], value_columns, METRICS, SCORE)?;
  let table = order_long(&long, &options.selected_models, options.metric(), options.chart_sort)?;
  Ok(View::new(kind, snapshot, table))
}

fn map_chart(snapshot: &DatasetSnapshot, options: &ViewOptions) -> Result<View, ViewError> {
  melted_chart(ViewKind::MapChart, snapshot, options, &[MAP50, MAP50_95])
}

fn latency_chart(snapshot: &DatasetSnapshot, options: &ViewOptions) -> Result<View, ViewError> {
  melted_chart(ViewKind::LatencyChart, snapshot, options, &LATENCY_STAGES)
}

fn trade_off(snapshot: &DatasetSnapshot, options: &ViewOptions) -> Result<View, ViewError> {
  let table = with_total_latency(&snapshot.overall.to_table())?;
  let columns: Vec<&str> = [MODEL, TOTAL_TIME, MAP50_95, PARAMETERS]
    .into_iter()
    .filter(|column| table.has_column(column))
    .collect();
  let table = apply(
    &table.select_columns(&columns)?,
    &options.selected_models,
    MODEL,
    SortMode::CanonicalDefault,
  )?;
  Ok(View::new(ViewKind::TradeOff, snapshot, table))
}

fn training_time(snapshot: &DatasetSnapshot, options: &ViewOptions) -> Result<View, ViewError> {
  let table = with_training_minutes(&snapshot.overall.to_table())?
    .select_columns(&[MODEL, TRAINING_TIME, TRAINING_MINUTES])?;
  let mode = match options.chart_sort {
    ChartSort::Default => SortMode::CanonicalDefault,
    ChartSort::Ascending => SortMode::NumericAscending,
    ChartSort::Descending => SortMode::NumericDescending,
  };
  let table = apply(&table, &options.selected_models, TRAINING_MINUTES, mode)?;
  Ok(View::new(ViewKind::TrainingTime, snapshot, table).with_highlights(&[TRAINING_TIME])?)
}

/// 模型 × 类别矩阵，类别列按数据集目录中的顺序排列
fn class_matrix(snapshot: &DatasetSnapshot, options: &ViewOptions) -> Result<Table, TableError> {
  let metric = options.metric().unwrap_or(MAP50);
  let classes = apply(
    &snapshot.classes.to_table(),
    &options.selected_models,
    MODEL,
    SortMode::CanonicalDefault,
  )?;
  let wide = pivot(&classes, MODEL, CLASS, metric)?;

  let mut columns: Vec<&str> = vec![MODEL];
  if let Some(profile) = snapshot.profile() {
    columns.extend(profile.classes.iter().copied().filter(|class| wide.has_column(class)));
  }
  for column in wide.columns().iter().skip(1) {
    if !columns.contains(&column.as_str()) {
      columns.push(column);
    }
  }
  wide.select_columns(&columns)
}

fn robustness(snapshot: &DatasetSnapshot, options: &ViewOptions) -> Result<View, ViewError> {
  let matrix = class_matrix(snapshot, options)?;
  let order = canonical_permutation(&matrix.model_ids()?);
  Ok(View::new(ViewKind::Robustness, snapshot, matrix.reorder(&order)))
}

fn class_table(snapshot: &DatasetSnapshot, options: &ViewOptions) -> Result<View, ViewError> {
  let matrix = class_matrix(snapshot, options)?;
  let table = sorted_table(&matrix, options)?;
  let class_columns: Vec<String> = matrix.columns().iter().skip(1).cloned().collect();
  let class_columns: Vec<&str> = class_columns.iter().map(String::as_str).collect();
  Ok(View::new(ViewKind::ClassTable, snapshot, table).with_highlights(&class_columns)?)
}

fn training_curve(snapshot: &DatasetSnapshot, options: &ViewOptions) -> Result<View, ViewError> {
  if snapshot.training_logs.is_empty() {
    return Err(ViewError::NoTrainingLogs(snapshot.dataset_id.clone()));
  }
  let available = curve_metrics(&snapshot.training_logs);
  let metric = match options.metric() {
    Some(metric) if available.iter().any(|m| m == metric) => metric.to_string(),
    Some(metric) => return Err(ViewError::UnknownMetric(metric.to_string())),
    None => available
      .first()
      .cloned()
      .ok_or_else(|| ViewError::UnknownMetric("<none>".to_string()))?,
  };

  let logs = sort_by_canonical_order(
    &select_training_logs(&snapshot.training_logs, &options.training_filter),
    |row| row.model.as_str(),
  );
  let table = logs
    .to_table()
    .select_columns(&[MODEL, VARIANT_GROUP, EPOCH, metric.as_str()])?;
  let mut view = View::new(ViewKind::TrainingCurve, snapshot, table);
  view.title = format!("{}: {}", view.title, metric);
  Ok(view)
}
