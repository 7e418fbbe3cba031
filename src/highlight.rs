// 该文件是 Shanan （山南西风） 项目的一部分。
// src/highlight.rs - 最优值标记
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

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
  record::column::{FPS, TOTAL_TIME, TRAINING_TIME},
  reshape::parse_duration,
  table::{Cell, Table, TableError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Objective {
  Maximize,
  Minimize,
}

impl Objective {
  /// 延迟类列与训练时长越小越好，其余（精度、FPS、各类别得分）越大越好
  pub fn for_column(column: &str) -> Self {
    if column == FPS {
      Objective::Maximize
    } else if column.ends_with("(ms)") || column == TOTAL_TIME || column == TRAINING_TIME {
      Objective::Minimize
    } else {
      Objective::Maximize
    }
  }
}

/// 每列最优值所在的行下标
pub type Highlights = BTreeMap<String, Vec<usize>>;

/// 列中取得最优值的全部行，并列时全部返回
pub fn best_rows(table: &Table, column: &str, objective: Objective) -> Result<Vec<usize>, TableError> {
  let duration = column == TRAINING_TIME;
  let mut values = Vec::with_capacity(table.nrows());
  for (index, cell) in table.column(column)?.enumerate() {
    let value = match cell {
      Cell::Empty => continue,
      cell if duration => parse_duration(&cell.to_string())?.num_seconds() as f64,
      Cell::Number(value) => *value,
      Cell::Text(_) => continue,
    };
    values.push((index, value));
  }

  let best = values.iter().map(|(_, value)| *value).reduce(|a, b| match objective {
    Objective::Maximize => a.max(b),
    Objective::Minimize => a.min(b),
  });
  Ok(match best {
    Some(best) => values
      .into_iter()
      .filter(|(_, value)| *value == best)
      .map(|(index, _)| index)
      .collect(),
    None => Vec::new(),
  })
}

/// 对多列按各自的目标计算最优行
pub fn highlight_columns(table: &Table, columns: &[&str]) -> Result<Highlights, TableError> {
  columns
    .iter()
    .map(|column| {
      best_rows(table, column, Objective::for_column(column)).map(|rows| (column.to_string(), rows))
    })
    .collect()
}
