// 该文件是 Shanan （山南西风） 项目的一部分。
// src/table.rs - 表格与单元格定义
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

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// 模型列名，所有表格都以它作为模型标识列
pub const MODEL: &str = "Model";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
  #[error("未知列: {0}")]
  UnknownColumn(String),
  #[error("透视冲突: 行键 '{row_key}' 与列键 '{col_key}' 出现多次")]
  AmbiguousPivot { row_key: String, col_key: String },
  #[error("时长格式错误，应为 HH:MM:SS: '{0}'")]
  MalformedDuration(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
  Empty,
  Number(f64),
  Text(String),
}

impl Cell {
  pub fn as_number(&self) -> Option<f64> {
    match self {
      Cell::Number(value) => Some(*value),
      _ => None,
    }
  }
}

impl fmt::Display for Cell {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Cell::Empty => Ok(()),
      Cell::Number(value) => write!(f, "{}", value),
      Cell::Text(text) => write!(f, "{}", text),
    }
  }
}

impl From<f64> for Cell {
  fn from(value: f64) -> Self {
    Cell::Number(value)
  }
}

impl From<Option<f64>> for Cell {
  fn from(value: Option<f64>) -> Self {
    value.map(Cell::Number).unwrap_or(Cell::Empty)
  }
}

impl From<&str> for Cell {
  fn from(value: &str) -> Self {
    Cell::Text(value.to_string())
  }
}

impl From<String> for Cell {
  fn from(value: String) -> Self {
    Cell::Text(value)
  }
}

/// 以列名访问的行记录
pub trait TableRow {
  /// 每条记录都具备的列，可选列也在其中
  const COLUMNS: &'static [&'static str];

  fn model_id(&self) -> &str;
  fn cell(&self, column: &str) -> Result<Cell, TableError>;
}

/// 可整体转换为表格的记录集合
pub trait ToTable {
  fn to_table(&self) -> Table;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
  columns: Vec<String>,
  rows: Vec<Vec<Cell>>,
}

impl Table {
  pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
    Self {
      columns: columns.into_iter().map(Into::into).collect(),
      rows: Vec::new(),
    }
  }

  pub fn with_rows(mut self, rows: Vec<Vec<Cell>>) -> Self {
    for row in rows {
      self.push_row(row);
    }
    self
  }

  /// 追加一行，长度不足的部分补空，多余的部分截断
  pub fn push_row(&mut self, mut row: Vec<Cell>) {
    row.resize(self.columns.len(), Cell::Empty);
    self.rows.push(row);
  }

  pub fn columns(&self) -> &[String] {
    &self.columns
  }

  pub fn rows(&self) -> &[Vec<Cell>] {
    &self.rows
  }

  pub fn nrows(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  pub fn has_column(&self, name: &str) -> bool {
    self.columns.iter().any(|column| column == name)
  }

  pub fn column_index(&self, name: &str) -> Result<usize, TableError> {
    self
      .columns
      .iter()
      .position(|column| column == name)
      .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
  }

  pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Cell>, TableError> {
    let index = self.column_index(name)?;
    Ok(self.rows.iter().map(move |row| &row[index]))
  }

  pub fn get(&self, row: usize, column: &str) -> Result<Option<&Cell>, TableError> {
    let index = self.column_index(column)?;
    Ok(self.rows.get(row).map(|row| &row[index]))
  }

  /// 各行的模型标识，表格缺少 `Model` 列时报错
  pub fn model_ids(&self) -> Result<Vec<String>, TableError> {
    Ok(self.column(MODEL)?.map(|cell| cell.to_string()).collect())
  }

  /// 按给定顺序挑选行，生成新表
  pub fn reorder(&self, order: &[usize]) -> Table {
    Table {
      columns: self.columns.clone(),
      rows: order.iter().map(|&index| self.rows[index].clone()).collect(),
    }
  }

  pub fn select_columns(&self, names: &[&str]) -> Result<Table, TableError> {
    let indices = names
      .iter()
      .map(|name| self.column_index(name))
      .collect::<Result<Vec<_>, _>>()?;
    Ok(Table {
      columns: names.iter().map(|name| name.to_string()).collect(),
      rows: self
        .rows
        .iter()
        .map(|row| indices.iter().map(|&index| row[index].clone()).collect())
        .collect(),
    })
  }

  /// 追加一列，`values` 的长度必须与行数一致
  pub fn with_column(&self, name: &str, values: Vec<Cell>) -> Table {
    debug_assert_eq!(values.len(), self.rows.len());
    let mut columns = self.columns.clone();
    columns.push(name.to_string());
    let rows = self
      .rows
      .iter()
      .zip(values)
      .map(|(row, value)| {
        let mut row = row.clone();
        row.push(value);
        row
      })
      .collect();
    Table { columns, rows }
  }

  /// 在最前面插入一列
  pub fn with_leading_column(&self, name: &str, values: Vec<Cell>) -> Table {
    debug_assert_eq!(values.len(), self.rows.len());
    let mut columns = Vec::with_capacity(self.columns.len() + 1);
    columns.push(name.to_string());
    columns.extend(self.columns.iter().cloned());
    let rows = self
      .rows
      .iter()
      .zip(values)
      .map(|(row, value)| {
        let mut new_row = Vec::with_capacity(row.len() + 1);
        new_row.push(value);
        new_row.extend(row.iter().cloned());
        new_row
      })
      .collect();
    Table { columns, rows }
  }
}
