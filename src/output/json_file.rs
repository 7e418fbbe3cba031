// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/json_file.rs - JSON 视图导出
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

use std::{io::Write, path::PathBuf};

use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  output::{Render, has_flag, open_output_file, per_view_path},
  view::View,
};

#[derive(Error, Debug)]
pub enum JsonFileError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 视图整体序列化为 JSON
///
/// 默认每次渲染覆盖文件；`?append` 时每个视图占一行（JSON Lines），
/// `?pretty` 输出缩进格式，`?per_view` 时每个视图写入各自的文件。
pub struct JsonFileOutput {
  path: PathBuf,
  append: bool,
  pretty: bool,
  per_view: bool,
}

impl FromUrlWithScheme for JsonFileOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for JsonFileOutput {
  type Error = JsonFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(JsonFileError::SchemeMismatch(format!(
        "期望输出方式 '{}', 实际输出方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let append = has_flag(uri, "append");
    Ok(JsonFileOutput {
      path: PathBuf::from(uri.path()),
      append,
      pretty: has_flag(uri, "pretty") && !append,
      per_view: has_flag(uri, "per_view"),
    })
  }
}

impl Render<View> for JsonFileOutput {
  type Error = JsonFileError;

  fn render_result(&self, result: &View) -> Result<(), Self::Error> {
    let path = if self.per_view {
      per_view_path(&self.path, result)
    } else {
      self.path.clone()
    };
    let mut file = open_output_file(&path, self.append)?;
    if self.pretty {
      serde_json::to_writer_pretty(&mut file, result)?;
    } else {
      serde_json::to_writer(&mut file, result)?;
    }
    writeln!(file)?;
    info!("视图 {} 已导出为 JSON: {}", result.kind, path.display());
    Ok(())
  }
}
