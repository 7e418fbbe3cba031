// 该文件是 Shanan （山南西风） 项目的一部分。
// src/filter.rs - 模型筛选与排序
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

use std::{cmp::Ordering, collections::BTreeSet, fmt, str::FromStr};

use tracing::debug;

use crate::{
  catalog::best_variants,
  order::rank,
  record::{
    TrainingLogRow,
    column::{TOTAL_TIME, TRAINING_TIME},
  },
  reshape::{METRICS, SCORE, parse_duration, pivot, with_total_latency},
  table::{Cell, MODEL, Table, TableError, TableRow},
  variant::{VariantGroup, family},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
  /// 按模型规范顺序，忽略排序列
  #[default]
  CanonicalDefault,
  NumericAscending,
  NumericDescending,
  LexicalAscending,
  LexicalDescending,
}

impl SortMode {
  fn is_numeric(&self) -> bool {
    matches!(self, SortMode::NumericAscending | SortMode::NumericDescending)
  }

  fn is_descending(&self) -> bool {
    matches!(self, SortMode::NumericDescending | SortMode::LexicalDescending)
  }
}

impl FromStr for SortMode {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "default" | "canonical" => Ok(SortMode::CanonicalDefault),
      "asc" | "ascending" | "numeric-asc" => Ok(SortMode::NumericAscending),
      "desc" | "descending" | "numeric-desc" => Ok(SortMode::NumericDescending),
      "a-z" | "lexical-asc" => Ok(SortMode::LexicalAscending),
      "z-a" | "lexical-desc" => Ok(SortMode::LexicalDescending),
      other => Err(format!("未知的排序方式: {}", other)),
    }
  }
}

impl fmt::Display for SortMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      SortMode::CanonicalDefault => "default",
      SortMode::NumericAscending => "asc",
      SortMode::NumericDescending => "desc",
      SortMode::LexicalAscending => "a-z",
      SortMode::LexicalDescending => "z-a",
    };
    f.write_str(name)
  }
}

/// 图表数据的排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartSort {
  #[default]
  Default,
  Ascending,
  Descending,
}

impl FromStr for ChartSort {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "default" => Ok(ChartSort::Default),
      "asc" | "ascending" => Ok(ChartSort::Ascending),
      "desc" | "descending" => Ok(ChartSort::Descending),
      other => Err(format!("未知的图表排序方式: {}", other)),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
enum SortKey {
  Number(f64),
  Text(String),
  Empty,
}

impl SortKey {
  /// 数值模式下训练时长列按解析后的时长比较，其余列数字按数值、文本按字典序
  ///
  /// 字典序模式下数字以保留小数点的形式参与比较，整数 `1` 写作 `1.0`。
  fn from_cell(cell: &Cell, mode: SortMode, duration: bool) -> Result<Self, TableError> {
    match cell {
      Cell::Empty => Ok(SortKey::Empty),
      cell if mode.is_numeric() && duration => parse_duration(&cell.to_string())
        .map(|duration| SortKey::Number(duration.num_seconds() as f64)),
      Cell::Number(value) if mode.is_numeric() => Ok(SortKey::Number(*value)),
      Cell::Number(value) => Ok(SortKey::Text(format!("{:?}", value))),
      cell => Ok(SortKey::Text(cell.to_string())),
    }
  }

  /// 空值无论升降序都排在最后，数字总在文本之前
  fn compare(&self, other: &Self, descending: bool) -> Ordering {
    let ordering = match (self, other) {
      (SortKey::Empty, SortKey::Empty) => return Ordering::Equal,
      (SortKey::Empty, _) => return Ordering::Greater,
      (_, SortKey::Empty) => return Ordering::Less,
      (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
      (SortKey::Number(_), SortKey::Text(_)) => return Ordering::Less,
      (SortKey::Text(_), SortKey::Number(_)) => return Ordering::Greater,
      (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
    };
    if descending { ordering.reverse() } else { ordering }
  }
}

fn is_selected(selected_models: &BTreeSet<String>, model_id: &str) -> bool {
  selected_models.is_empty() || selected_models.contains(model_id)
}

/// 对保留下来的行下标稳定排序
fn arrange<'a>(
  kept: Vec<usize>,
  model_of: impl Fn(usize) -> &'a str,
  cell_of: impl Fn(usize) -> Result<Cell, TableError>,
  sort_column: &str,
  sort_mode: SortMode,
) -> Result<Vec<usize>, TableError> {
  let mut kept = kept;
  if sort_mode == SortMode::CanonicalDefault {
    kept.sort_by_key(|&index| rank(model_of(index)));
    return Ok(kept);
  }

  let duration = sort_column == TRAINING_TIME;
  let mut keyed = kept
    .into_iter()
    .map(|index| {
      let cell = cell_of(index)?;
      SortKey::from_cell(&cell, sort_mode, duration).map(|key| (index, key))
    })
    .collect::<Result<Vec<_>, _>>()?;
  let descending = sort_mode.is_descending();
  keyed.sort_by(|(_, a), (_, b)| a.compare(b, descending));
  Ok(keyed.into_iter().map(|(index, _)| index).collect())
}

/// 按模型筛选并排序，返回新表
///
/// `selected_models` 为空时保留全部行。`CanonicalDefault` 忽略 `sort_column`，
/// 其余模式下未知列返回 [`TableError::UnknownColumn`]。所有排序均为稳定排序。
pub fn apply(
  table: &Table,
  selected_models: &BTreeSet<String>,
  sort_column: &str,
  sort_mode: SortMode,
) -> Result<Table, TableError> {
  let models = table.model_ids()?;
  let kept: Vec<usize> = (0..table.nrows())
    .filter(|&index| is_selected(selected_models, &models[index]))
    .collect();

  let column = match sort_mode {
    SortMode::CanonicalDefault => None,
    _ => Some(table.column_index(sort_column)?),
  };

  let order = arrange(
    kept,
    |index| models[index].as_str(),
    |index| Ok(column.map(|c| table.rows()[index][c].clone()).unwrap_or(Cell::Empty)),
    sort_column,
    sort_mode,
  )?;
  debug!(
    "筛选排序: {} -> {} 行, 排序列 '{}', 方式 {}",
    table.nrows(),
    order.len(),
    sort_column,
    sort_mode
  );
  Ok(table.reorder(&order))
}

/// 与 [`apply`] 相同，作用于记录序列
///
/// 排序列在筛选之前检查：既不是记录的固定列、也不出现在任何一条记录中时
/// 返回 [`TableError::UnknownColumn`]，与筛选结果是否为空无关。
/// 个别记录缺少的指标按空值排序。
pub fn apply_rows<R: TableRow + Clone>(
  rows: &[R],
  selected_models: &BTreeSet<String>,
  sort_column: &str,
  sort_mode: SortMode,
) -> Result<Vec<R>, TableError> {
  if sort_mode != SortMode::CanonicalDefault
    && !R::COLUMNS.contains(&sort_column)
    && !rows.iter().any(|row| row.cell(sort_column).is_ok())
  {
    return Err(TableError::UnknownColumn(sort_column.to_string()));
  }

  let kept: Vec<usize> = (0..rows.len())
    .filter(|&index| is_selected(selected_models, rows[index].model_id()))
    .collect();
  let order = arrange(
    kept,
    |index| rows[index].model_id(),
    |index| match rows[index].cell(sort_column) {
      Err(TableError::UnknownColumn(_)) => Ok(Cell::Empty),
      other => other,
    },
    sort_column,
    sort_mode,
  )?;
  Ok(order.into_iter().map(|index| rows[index].clone()).collect())
}

/// 对宽转长后的图表数据排序
///
/// 不指定指标或方向为 `Default` 时按模型规范顺序；否则先透视为
/// 模型 × 指标的宽表，按所选指标排出模型顺序，再以该顺序重排长表。
/// 选择 `Total Time (ms)` 且数据中没有该指标时由三段耗时派生。
pub fn order_long(
  long: &Table,
  selected_models: &BTreeSet<String>,
  sort_metric: Option<&str>,
  direction: ChartSort,
) -> Result<Table, TableError> {
  let filtered = apply(long, selected_models, MODEL, SortMode::CanonicalDefault)?;

  let metric = match (sort_metric, direction) {
    (None, _) | (_, ChartSort::Default) => return Ok(filtered),
    (Some(metric), _) => metric,
  };

  let mut wide = pivot(&filtered, MODEL, METRICS, SCORE)?;
  if metric == TOTAL_TIME && !wide.has_column(TOTAL_TIME) {
    wide = with_total_latency(&wide)?;
  }
  let mode = match direction {
    ChartSort::Descending => SortMode::NumericDescending,
    _ => SortMode::NumericAscending,
  };
  let model_order = apply(&wide, &BTreeSet::new(), metric, mode)?.model_ids()?;

  let models = filtered.model_ids()?;
  let mut order: Vec<usize> = (0..filtered.nrows()).collect();
  order.sort_by_key(|&index| {
    model_order
      .iter()
      .position(|model| *model == models[index])
      .unwrap_or(model_order.len())
  });
  Ok(filtered.reorder(&order))
}

/// 训练曲线的筛选方式
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TrainingFilter {
  #[default]
  All,
  Variant(VariantGroup),
  Family(String),
  Model(String),
  /// 数据集中每个家族最优的模型，数据集没有整理过时显示全部
  BestOf(String),
}

impl FromStr for TrainingFilter {
  type Err = String;

  /// 形如 `all`、`variant:s`、`family:yolov11`、`model:yolov8n`、`best:fer-2013`
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (kind, value) = s.split_once(':').unwrap_or((s, ""));
    match (kind.trim().to_ascii_lowercase().as_str(), value.trim()) {
      ("all", _) => Ok(TrainingFilter::All),
      ("variant", value) => value.parse().map(TrainingFilter::Variant),
      ("family", value) if !value.is_empty() => Ok(TrainingFilter::Family(value.to_ascii_lowercase())),
      ("model", value) if !value.is_empty() => Ok(TrainingFilter::Model(value.to_string())),
      ("best", value) if !value.is_empty() => Ok(TrainingFilter::BestOf(value.to_string())),
      _ => Err(format!("无法解析训练曲线筛选: {}", s)),
    }
  }
}

pub fn select_training_logs(logs: &[TrainingLogRow], filter: &TrainingFilter) -> Vec<TrainingLogRow> {
  let best = match filter {
    TrainingFilter::BestOf(dataset) => {
      let best = best_variants(dataset);
      if best.is_empty() {
        debug!("数据集 {} 没有最优模型列表，显示全部训练日志", dataset);
      }
      best
    }
    _ => BTreeSet::new(),
  };

  logs
    .iter()
    .filter(|row| match filter {
      TrainingFilter::All => true,
      TrainingFilter::Variant(group) => row.variant == *group,
      TrainingFilter::Family(name) => {
        family(&row.model).is_some_and(|f| f.eq_ignore_ascii_case(name))
      }
      TrainingFilter::Model(model) => row.model.eq_ignore_ascii_case(model),
      TrainingFilter::BestOf(_) => {
        best.is_empty() || best.iter().any(|model| model.eq_ignore_ascii_case(&row.model))
      }
    })
    .cloned()
    .collect()
}

/// 可绘制为训练曲线的指标，排除损失、学习率与时间列
pub fn curve_metrics(logs: &[TrainingLogRow]) -> Vec<String> {
  let mut metrics: Vec<String> = Vec::new();
  for row in logs {
    for (name, _) in &row.metrics {
      let ignored = name == "time" || name.starts_with("lr/") || name.ends_with("_loss");
      if !ignored && !metrics.contains(name) {
        metrics.push(name.clone());
      }
    }
  }
  metrics
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::{BenchmarkRow, column::MAP50_95, tests::benchmark};

  fn scores() -> Table {
    Table::new([MODEL, "Score"]).with_rows(vec![
      vec!["a".into(), 1.0.into()],
      vec!["b".into(), 1.0.into()],
      vec!["c".into(), 2.0.into()],
    ])
  }

  fn none() -> BTreeSet<String> {
    BTreeSet::new()
  }

  #[test]
  fn ties_keep_input_order() {
    let sorted = apply(&scores(), &none(), "Score", SortMode::NumericAscending).unwrap();
    assert_eq!(sorted.model_ids().unwrap(), ["a", "b", "c"]);
    let sorted = apply(&scores(), &none(), "Score", SortMode::NumericDescending).unwrap();
    assert_eq!(sorted.model_ids().unwrap(), ["c", "a", "b"]);
  }

  #[test]
  fn empty_selection_keeps_all_rows() {
    let table = scores();
    let out = apply(&table, &none(), "Score", SortMode::CanonicalDefault).unwrap();
    assert_eq!(out.nrows(), table.nrows());
  }

  #[test]
  fn selection_restricts_rows() {
    let selected: BTreeSet<String> = ["c".to_string(), "a".to_string()].into();
    let out = apply(&scores(), &selected, "Score", SortMode::LexicalDescending).unwrap();
    assert_eq!(out.model_ids().unwrap(), ["c", "a"]);
  }

  #[test]
  fn unknown_column_fails_unless_canonical() {
    assert_eq!(
      apply(&scores(), &none(), "Nope", SortMode::LexicalAscending),
      Err(TableError::UnknownColumn("Nope".into()))
    );
    assert!(apply(&scores(), &none(), "Nope", SortMode::CanonicalDefault).is_ok());
  }

  #[test]
  fn training_time_sorts_by_duration() {
    let rows = vec![
      benchmark("YOLOv8n", 0.4, "00:45:00"),
      benchmark("YOLOv8s", 0.4, "01:15:00"),
      benchmark("YOLOv8m", 0.4, "00:30:00"),
    ];
    let sorted = apply_rows(&rows, &none(), TRAINING_TIME, SortMode::NumericAscending).unwrap();
    let times: Vec<&str> = sorted.iter().map(|row| row.training_time.as_str()).collect();
    assert_eq!(times, ["00:30:00", "00:45:00", "01:15:00"]);
  }

  #[test]
  fn training_time_numeric_beats_lexical_trap() {
    let rows = vec![
      benchmark("YOLOv8n", 0.4, "10:00:00"),
      benchmark("YOLOv8s", 0.4, "100:00:00"),
      benchmark("YOLOv8m", 0.4, "09:00:00"),
    ];
    let numeric = apply_rows(&rows, &none(), TRAINING_TIME, SortMode::NumericAscending).unwrap();
    let lexical = apply_rows(&rows, &none(), TRAINING_TIME, SortMode::LexicalAscending).unwrap();
    let models = |rows: &[BenchmarkRow]| rows.iter().map(|r| r.model.clone()).collect::<Vec<_>>();
    assert_eq!(models(&numeric), ["YOLOv8m", "YOLOv8n", "YOLOv8s"]);
    assert_eq!(models(&lexical), ["YOLOv8m", "YOLOv8s", "YOLOv8n"]);
  }

  #[test]
  fn malformed_training_time_is_reported() {
    let rows = vec![benchmark("YOLOv8n", 0.4, "45 min")];
    assert_eq!(
      apply_rows(&rows, &none(), TRAINING_TIME, SortMode::NumericDescending),
      Err(TableError::MalformedDuration("45 min".into()))
    );
  }

  #[test]
  fn unknown_row_column_fails_even_when_nothing_is_kept() {
    let rows = vec![benchmark("YOLOv8n", 0.4, "00:45:00")];
    let selected: BTreeSet<String> = ["YOLOv5n".to_string()].into();
    assert_eq!(
      apply_rows(&rows, &selected, "Nope", SortMode::NumericAscending),
      Err(TableError::UnknownColumn("Nope".into()))
    );
    assert_eq!(
      apply_rows::<BenchmarkRow>(&[], &none(), "Nope", SortMode::LexicalAscending),
      Err(TableError::UnknownColumn("Nope".into()))
    );
    assert_eq!(
      apply_rows(&rows, &selected, MAP50_95, SortMode::NumericAscending),
      Ok(Vec::new())
    );
  }

  #[test]
  fn missing_log_metric_sorts_as_empty() {
    let log = |model: &str, metrics: Vec<(String, f64)>| TrainingLogRow {
      model: model.into(),
      variant: VariantGroup::NanoTiny,
      epoch: 1,
      metrics,
    };
    let rows = vec![
      log("yolov8n", Vec::new()),
      log("yolov9t", vec![("metrics/mAP50(B)".into(), 0.3)]),
    ];
    let sorted =
      apply_rows(&rows, &none(), "metrics/mAP50(B)", SortMode::NumericDescending).unwrap();
    let models: Vec<&str> = sorted.iter().map(|row| row.model.as_str()).collect();
    assert_eq!(models, ["yolov9t", "yolov8n"]);
    assert!(apply_rows(&rows, &none(), "metrics/recall(B)", SortMode::NumericDescending).is_err());
  }

  #[test]
  fn canonical_mode_ignores_sort_column() {
    let rows = vec![
      benchmark("YOLOv11n", 0.5, "00:10:00"),
      benchmark("custom", 0.9, "00:10:00"),
      benchmark("YOLOv8l", 0.3, "00:10:00"),
    ];
    let sorted = apply_rows(&rows, &none(), MAP50_95, SortMode::CanonicalDefault).unwrap();
    let models: Vec<&str> = sorted.iter().map(|row| row.model.as_str()).collect();
    assert_eq!(models, ["YOLOv8l", "YOLOv11n", "custom"]);
  }

  #[test]
  fn lexical_numbers_keep_decimal_point() {
    let table = Table::new([MODEL, "Score"]).with_rows(vec![
      vec!["a".into(), 1.0.into()],
      vec!["b".into(), "1-".into()],
      vec!["c".into(), 10.0.into()],
    ]);
    // "1-" < "1.0" < "10.0"
    let sorted = apply(&table, &none(), "Score", SortMode::LexicalAscending).unwrap();
    assert_eq!(sorted.model_ids().unwrap(), ["b", "a", "c"]);
    assert_eq!(
      SortKey::from_cell(&Cell::Number(1.0), SortMode::LexicalAscending, false),
      Ok(SortKey::Text("1.0".into()))
    );
  }

  #[test]
  fn empty_cells_sort_last_both_ways() {
    let table = Table::new([MODEL, "Score"]).with_rows(vec![
      vec!["a".into(), Cell::Empty],
      vec!["b".into(), 2.0.into()],
      vec!["c".into(), 1.0.into()],
    ]);
    let asc = apply(&table, &none(), "Score", SortMode::NumericAscending).unwrap();
    let desc = apply(&table, &none(), "Score", SortMode::NumericDescending).unwrap();
    assert_eq!(asc.model_ids().unwrap(), ["c", "b", "a"]);
    assert_eq!(desc.model_ids().unwrap(), ["b", "c", "a"]);
  }

  fn latency_long() -> Table {
    let mut long = Table::new([MODEL, METRICS, SCORE]);
    for (model, pre, inf, post) in [
      ("YOLOv8n", 1.0, 9.0, 1.0),
      ("YOLOv9t", 3.0, 4.0, 1.0),
      ("YOLOv10n", 1.0, 5.0, 1.0),
    ] {
      long.push_row(vec![model.into(), "Preprocessing (ms)".into(), pre.into()]);
      long.push_row(vec![model.into(), "Inference (ms)".into(), inf.into()]);
      long.push_row(vec![model.into(), "Postprocessing (ms)".into(), post.into()]);
    }
    long
  }

  #[test]
  fn long_data_orders_by_derived_total() {
    let ordered = order_long(&latency_long(), &none(), Some(TOTAL_TIME), ChartSort::Ascending).unwrap();
    let models = ordered.model_ids().unwrap();
    assert_eq!(models[0], "YOLOv10n");
    assert_eq!(models[3], "YOLOv9t");
    assert_eq!(models[8], "YOLOv8n");
    assert_eq!(ordered.get(0, METRICS).unwrap(), Some(&Cell::from("Preprocessing (ms)")));
  }

  #[test]
  fn long_data_defaults_to_canonical_order() {
    let selected: BTreeSet<String> = ["YOLOv10n".to_string(), "YOLOv8n".to_string()].into();
    let ordered = order_long(&latency_long(), &selected, Some("Inference (ms)"), ChartSort::Default).unwrap();
    let models = ordered.model_ids().unwrap();
    assert_eq!(models, ["YOLOv8n", "YOLOv8n", "YOLOv8n", "YOLOv10n", "YOLOv10n", "YOLOv10n"]);
  }

  fn log(model: &str, epoch: u32) -> TrainingLogRow {
    TrainingLogRow {
      model: model.to_string(),
      variant: crate::variant::classify(model),
      epoch,
      metrics: vec![
        ("train/box_loss".into(), 1.0),
        ("metrics/mAP50(B)".into(), 0.5),
        ("lr/pg0".into(), 0.01),
        ("time".into(), 12.0),
      ],
    }
  }

  #[test]
  fn training_logs_by_filter() {
    let logs = vec![log("yolov8l", 1), log("yolov8n", 1), log("yolov11s", 1), log("yolov9t", 1)];
    let pick = |filter: TrainingFilter| {
      select_training_logs(&logs, &filter)
        .into_iter()
        .map(|row| row.model)
        .collect::<Vec<_>>()
    };
    assert_eq!(pick(TrainingFilter::Variant(VariantGroup::NanoTiny)), ["yolov8n", "yolov9t"]);
    assert_eq!(pick(TrainingFilter::Family("yolov8".into())), ["yolov8l", "yolov8n"]);
    assert_eq!(pick(TrainingFilter::Model("YOLOv11s".into())), ["yolov11s"]);
    assert_eq!(
      pick(TrainingFilter::BestOf("human-face-emotion-computer-vision-model".into())),
      ["yolov8l", "yolov11s", "yolov9t"]
    );
    assert_eq!(pick(TrainingFilter::BestOf("unknown-dataset".into())).len(), 4);
  }

  #[test]
  fn curve_metrics_skip_losses_and_rates() {
    assert_eq!(curve_metrics(&[log("yolov8n", 1)]), ["metrics/mAP50(B)"]);
  }

  #[test]
  fn parse_training_filter() {
    assert_eq!("all".parse::<TrainingFilter>(), Ok(TrainingFilter::All));
    assert_eq!(
      "variant:m".parse::<TrainingFilter>(),
      Ok(TrainingFilter::Variant(VariantGroup::Medium))
    );
    assert_eq!(
      "family:YOLOv11".parse::<TrainingFilter>(),
      Ok(TrainingFilter::Family("yolov11".into()))
    );
    assert!("family:".parse::<TrainingFilter>().is_err());
  }

  #[test]
  fn text_follows_numbers_in_numeric_modes() {
    let table = Table::new([MODEL, "Score"]).with_rows(vec![
      vec!["a".into(), "n/a".into()],
      vec!["b".into(), 1.0.into()],
      vec!["c".into(), 2.0.into()],
    ]);
    let sorted = apply(&table, &none(), "Score", SortMode::NumericDescending).unwrap();
    assert_eq!(sorted.model_ids().unwrap(), ["c", "b", "a"]);
    let sorted = apply(&table, &none(), "Score", SortMode::NumericAscending).unwrap();
    assert_eq!(sorted.model_ids().unwrap(), ["b", "c", "a"]);
  }
}
