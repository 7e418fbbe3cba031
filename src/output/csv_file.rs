// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/csv_file.rs - CSV 表格导出
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

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  output::{Render, has_flag, open_output_file, per_view_path, write_csv},
  view::View,
};

#[derive(Error, Debug)]
pub enum CsvFileError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("CSV 错误: {0}")]
  CsvError(#[from] csv::Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 将视图表格导出为 CSV 文件，可直接用电子表格打开
///
/// `?per_view` 时每个视图写入各自的文件 `<文件名>-<数据集>-<视图>.csv`。
pub struct CsvFileOutput {
  path: PathBuf,
  append: bool,
  per_view: bool,
}

impl FromUrlWithScheme for CsvFileOutput {
  const SCHEME: &'static str = "csv";
}

impl FromUrl for CsvFileOutput {
  type Error = CsvFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(CsvFileError::SchemeMismatch(format!(
        "期望输出方式 '{}', 实际输出方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    Ok(CsvFileOutput {
      path: PathBuf::from(uri.path()),
      append: has_flag(uri, "append"),
      per_view: has_flag(uri, "per_view"),
    })
  }
}

impl Render<View> for CsvFileOutput {
  type Error = CsvFileError;

  fn render_result(&self, result: &View) -> Result<(), Self::Error> {
    let path = if self.per_view {
      per_view_path(&self.path, result)
    } else {
      self.path.clone()
    };
    let file = open_output_file(&path, self.append)?;
    write_csv(&result.table, file)?;
    info!(
      "视图 {} 已导出为 CSV: {} ({} 行)",
      result.kind,
      path.display(),
      result.table.nrows()
    );
    Ok(())
  }
}
