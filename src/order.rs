// 该文件是 Shanan （山南西风） 项目的一部分。
// src/order.rs - 模型展示顺序
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

use crate::table::{Cell, Table, TableError};

/// 已知模型的规范顺序：先按代际，再按规模
pub const MODEL_ORDER: [&str; 20] = [
  "YOLOv8n", "YOLOv8s", "YOLOv8m", "YOLOv8l", //
  "YOLOv9t", "YOLOv9s", "YOLOv9m", "YOLOv9c", //
  "YOLOv10n", "YOLOv10s", "YOLOv10m", "YOLOv10l", //
  "YOLOv11n", "YOLOv11s", "YOLOv11m", "YOLOv11l", //
  "YOLOv12n", "YOLOv12s", "YOLOv12m", "YOLOv12l",
];

/// 未知模型的排名，大于任何已知排名
pub const UNKNOWN_RANK: usize = 999;

pub const INDEX: &str = "Index";

/// 模型在规范顺序中的位置（从 1 开始），比较时忽略 ASCII 大小写
pub fn rank(model_id: &str) -> usize {
  MODEL_ORDER
    .iter()
    .position(|known| known.eq_ignore_ascii_case(model_id))
    .map(|position| position + 1)
    .unwrap_or(UNKNOWN_RANK)
}

/// 按规范顺序稳定排序，排名相同的元素保持原有相对顺序
pub fn sort_by_canonical_order<T, F>(rows: &[T], key_fn: F) -> Vec<T>
where
  T: Clone,
  F: Fn(&T) -> &str,
{
  let mut sorted = rows.to_vec();
  sorted.sort_by_key(|row| rank(key_fn(row)));
  sorted
}

/// 按规范顺序排列行的下标
pub fn canonical_permutation(model_ids: &[String]) -> Vec<usize> {
  let mut order: Vec<usize> = (0..model_ids.len()).collect();
  order.sort_by_key(|&index| rank(&model_ids[index]));
  order
}

/// 按规范顺序排列后在最前面加上从 1 开始的 `Index` 列
pub fn index_by_canonical_order(table: &Table) -> Result<Table, TableError> {
  let order = canonical_permutation(&table.model_ids()?);
  let sorted = table.reorder(&order);
  let index = (1..=sorted.nrows()).map(|i| Cell::Number(i as f64)).collect();
  Ok(sorted.with_leading_column(INDEX, index))
}
