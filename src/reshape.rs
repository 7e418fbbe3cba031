// 该文件是 Shanan （山南西风） 项目的一部分。
// src/reshape.rs - 表格变形：宽表转长表、长表透视与派生列
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

use std::collections::HashMap;

use chrono::TimeDelta;
use tracing::debug;

use crate::{
  record::{
    BenchmarkRow,
    column::{LATENCY_STAGES, TOTAL_TIME, TRAINING_MINUTES, TRAINING_TIME},
  },
  table::{Cell, Table, TableError},
};

/// 宽转长后指标名称列的默认列名
pub const METRICS: &str = "Metrics";
/// 宽转长后指标取值列的默认列名
pub const SCORE: &str = "Score";

/// 宽表转长表
///
/// 输出列为 `id_columns`、`metric_name_col`、`value_col`。行按值列分块输出：
/// 先是第一个值列对应的全部行，再是第二个，依此类推。
pub fn melt(
  table: &Table,
  id_columns: &[&str],
  value_columns: &[&str],
  metric_name_col: &str,
  value_col: &str,
) -> Result<Table, TableError> {
  let id_indices = id_columns
    .iter()
    .map(|name| table.column_index(name))
    .collect::<Result<Vec<_>, _>>()?;
  let value_indices = value_columns
    .iter()
    .map(|name| table.column_index(name))
    .collect::<Result<Vec<_>, _>>()?;

  let mut columns: Vec<&str> = id_columns.to_vec();
  columns.extend([metric_name_col, value_col]);
  let mut long = Table::new(columns);

  for (name, &value_index) in value_columns.iter().zip(&value_indices) {
    for row in table.rows() {
      let mut out: Vec<Cell> = id_indices.iter().map(|&index| row[index].clone()).collect();
      out.push(Cell::from(*name));
      out.push(row[value_index].clone());
      long.push_row(out);
    }
  }

  debug!(
    "melt: {} 行 x {} 列 -> {} 行",
    table.nrows(),
    value_columns.len(),
    long.nrows()
  );
  Ok(long)
}

/// 长表透视为宽表
///
/// 每个不同的行键生成一行，每个不同的列键生成一列，均保持首次出现的顺序；
/// 没有对应值的单元格为空。同一 (行键, 列键) 出现多次时返回
/// [`TableError::AmbiguousPivot`]，透视不做聚合。
pub fn pivot(
  long: &Table,
  row_key_col: &str,
  col_key_col: &str,
  value_col: &str,
) -> Result<Table, TableError> {
  let row_key_index = long.column_index(row_key_col)?;
  let col_key_index = long.column_index(col_key_col)?;
  let value_index = long.column_index(value_col)?;

  let mut row_keys: Vec<Cell> = Vec::new();
  let mut col_keys: Vec<String> = Vec::new();
  let mut cells: HashMap<(usize, usize), Cell> = HashMap::new();

  for row in long.rows() {
    let row_key = &row[row_key_index];
    let col_key = row[col_key_index].to_string();

    let r = match row_keys.iter().position(|key| key == row_key) {
      Some(r) => r,
      None => {
        row_keys.push(row_key.clone());
        row_keys.len() - 1
      }
    };
    let c = match col_keys.iter().position(|key| *key == col_key) {
      Some(c) => c,
      None => {
        col_keys.push(col_key.clone());
        col_keys.len() - 1
      }
    };

    if cells.insert((r, c), row[value_index].clone()).is_some() {
      return Err(TableError::AmbiguousPivot {
        row_key: row_key.to_string(),
        col_key,
      });
    }
  }

  let mut columns = vec![row_key_col.to_string()];
  columns.extend(col_keys.iter().cloned());
  let mut wide = Table::new(columns);
  for (r, row_key) in row_keys.into_iter().enumerate() {
    let mut row = Vec::with_capacity(col_keys.len() + 1);
    row.push(row_key);
    for c in 0..col_keys.len() {
      row.push(cells.remove(&(r, c)).unwrap_or(Cell::Empty));
    }
    wide.push_row(row);
  }
  Ok(wide)
}

/// 预处理、推理、后处理三段耗时之和
pub fn derive_total_latency(row: &BenchmarkRow) -> f64 {
  row.preprocessing_ms + row.inference_ms + row.postprocessing_ms
}

/// 表中缺少 `Total Time (ms)` 时按三段耗时派生该列，已存在时原样返回
pub fn with_total_latency(table: &Table) -> Result<Table, TableError> {
  if table.has_column(TOTAL_TIME) {
    return Ok(table.clone());
  }
  let indices = LATENCY_STAGES
    .iter()
    .map(|name| table.column_index(name))
    .collect::<Result<Vec<_>, _>>()?;
  let totals = table
    .rows()
    .iter()
    .map(|row| {
      Cell::from(
        indices
          .iter()
          .map(|&index| row[index].as_number())
          .sum::<Option<f64>>(),
      )
    })
    .collect();
  Ok(table.with_column(TOTAL_TIME, totals))
}

/// 严格解析 `HH:MM:SS` 格式的时长
///
/// 小时至少两位，分钟与秒恰好两位且小于 60。
pub fn parse_duration(text: &str) -> Result<TimeDelta, TableError> {
  let malformed = || TableError::MalformedDuration(text.to_string());

  let mut parts = text.split(':');
  let (Some(hours), Some(minutes), Some(seconds), None) =
    (parts.next(), parts.next(), parts.next(), parts.next())
  else {
    return Err(malformed());
  };

  let field = |part: &str, exact: bool| -> Option<i64> {
    let width_ok = if exact { part.len() == 2 } else { part.len() >= 2 };
    if !width_ok || !part.bytes().all(|b| b.is_ascii_digit()) {
      return None;
    }
    part.parse().ok()
  };

  let hours = field(hours, false).ok_or_else(malformed)?;
  let minutes = field(minutes, true).filter(|m| *m < 60).ok_or_else(malformed)?;
  let seconds = field(seconds, true).filter(|s| *s < 60).ok_or_else(malformed)?;

  TimeDelta::try_hours(hours)
    .and_then(|h| h.checked_add(&TimeDelta::minutes(minutes)))
    .and_then(|hm| hm.checked_add(&TimeDelta::seconds(seconds)))
    .ok_or_else(malformed)
}

/// `HH:MM:SS` 时长换算为分钟，如 `"01:30:00"` → `90.0`
pub fn duration_to_minutes(text: &str) -> Result<f64, TableError> {
  parse_duration(text).map(|duration| duration.num_seconds() as f64 / 60.0)
}

/// 追加 `Training Time (min)` 列，供训练时长图表使用
pub fn with_training_minutes(table: &Table) -> Result<Table, TableError> {
  if table.has_column(TRAINING_MINUTES) {
    return Ok(table.clone());
  }
  let minutes = table
    .column(TRAINING_TIME)?
    .map(|cell| match cell {
      Cell::Empty => Ok(Cell::Empty),
      other => duration_to_minutes(&other.to_string()).map(Cell::Number),
    })
    .collect::<Result<Vec<_>, _>>()?;
  Ok(table.with_column(TRAINING_MINUTES, minutes))
}
