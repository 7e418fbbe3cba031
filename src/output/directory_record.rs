// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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

use chrono::{DateTime, Datelike, Utc};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
  FromUrl, FromUrlWithScheme,
  output::{Render, has_flag, open_output_file, write_csv},
  view::View,
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("CSV 错误: {0}")]
  CsvError(#[from] csv::Error),
  #[cfg(feature = "json_output")]
  #[error("JSON 错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordFormat {
  Csv,
  #[cfg(feature = "json_output")]
  Json,
}

impl RecordFormat {
  fn with(kind: &str) -> Self {
    match kind {
      #[cfg(feature = "json_output")]
      "json" => RecordFormat::Json,
      _ => RecordFormat::Csv,
    }
  }

  fn extension(&self) -> &'static str {
    match self {
      RecordFormat::Csv => "csv",
      #[cfg(feature = "json_output")]
      RecordFormat::Json => "json",
    }
  }
}

/// 按日期分目录记录每次渲染的视图
///
/// 路径为 `<目录>/YYYY/MM/DD/HH-MM-SS-<视图>.csv`，同一秒内的重复记录
/// 追加序号。空表默认不记录，`?always` 时照常写出；`?format=json` 改为 JSON。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  format: RecordFormat,
  record_counters: Arc<Mutex<u16>>,
  always: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let format = uri
      .query_pairs()
      .find(|(k, _)| k == "format")
      .map(|(_, v)| RecordFormat::with(&v))
      .unwrap_or(RecordFormat::Csv);

    Ok(DirectoryRecordOutput {
      directory: PathBuf::from(uri.path()),
      format,
      record_counters: Arc::new(Mutex::new(0)),
      always: has_flag(uri, "always"),
    })
  }
}

impl DirectoryRecordOutput {
  fn record_id(&self) -> u16 {
    let mut counter = self
      .record_counters
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    let id = counter.wrapping_add(1);
    *counter = id;
    id
  }

  fn record_path(&self, now: DateTime<Utc>, view: &View) -> PathBuf {
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));

    let stem = format!("{}-{}", now.format("%H-%M-%S"), view.kind);
    let mut path = directory.join(format!("{}.{}", stem, self.format.extension()));
    if path.exists() {
      path = directory.join(format!(
        "{}-{:04X}.{}",
        stem,
        self.record_id(),
        self.format.extension()
      ));
    }
    path
  }
}

impl Render<View> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, result: &View) -> Result<(), Self::Error> {
    if !self.always && result.table.is_empty() {
      warn!("视图 {} 没有数据，跳过记录", result.kind);
      return Ok(());
    }

    let path = self.record_path(Utc::now(), result);
    let file = open_output_file(&path, false)?;
    match self.format {
      RecordFormat::Csv => write_csv(&result.table, file)?,
      #[cfg(feature = "json_output")]
      RecordFormat::Json => serde_json::to_writer_pretty(file, result)?,
    }
    info!("视图 {} 已记录到 {}", result.kind, path.display());
    Ok(())
  }
}
