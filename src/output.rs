// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output.rs - 输出定义
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

use std::{
  fs::{File, OpenOptions},
  io::Write,
  path::{Path, PathBuf},
};

use thiserror::Error;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, table::Table, view::View};

pub trait Render<Output>: Sized {
  type Error;
  fn render_result(&self, result: &Output) -> Result<(), Self::Error>;
}

mod text_table;
pub use self::text_table::{TextTableError, TextTableOutput, format_table};

#[cfg(feature = "csv_output")]
mod csv_file;
#[cfg(feature = "csv_output")]
pub use self::csv_file::{CsvFileError, CsvFileOutput};

#[cfg(feature = "json_output")]
mod json_file;
#[cfg(feature = "json_output")]
pub use self::json_file::{JsonFileError, JsonFileOutput};

#[cfg(feature = "directory_record")]
mod directory_record;
#[cfg(feature = "directory_record")]
pub use self::directory_record::{DirectoryRecordOutput, DirectoryRecordOutputError};

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("文本表格输出错误: {0}")]
  TextTableError(#[from] TextTableError),
  #[cfg(feature = "csv_output")]
  #[error("CSV 文件输出错误: {0}")]
  CsvFileError(#[from] CsvFileError),
  #[cfg(feature = "json_output")]
  #[error("JSON 文件输出错误: {0}")]
  JsonFileError(#[from] JsonFileError),
  #[cfg(feature = "directory_record")]
  #[error("目录记录输出错误: {0}")]
  DirectoryRecordOutputError(#[from] DirectoryRecordOutputError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

pub enum OutputWrapper {
  TextTableOutput(TextTableOutput),
  #[cfg(feature = "csv_output")]
  CsvFileOutput(CsvFileOutput),
  #[cfg(feature = "json_output")]
  JsonFileOutput(JsonFileOutput),
  #[cfg(feature = "directory_record")]
  DirectoryRecordOutput(DirectoryRecordOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      TextTableOutput::SCHEME => {
        let output = TextTableOutput::from_url(url)?;
        Ok(OutputWrapper::TextTableOutput(output))
      }
      #[cfg(feature = "csv_output")]
      CsvFileOutput::SCHEME => {
        let output = CsvFileOutput::from_url(url)?;
        Ok(OutputWrapper::CsvFileOutput(output))
      }
      #[cfg(feature = "json_output")]
      JsonFileOutput::SCHEME => {
        let output = JsonFileOutput::from_url(url)?;
        Ok(OutputWrapper::JsonFileOutput(output))
      }
      #[cfg(feature = "directory_record")]
      DirectoryRecordOutput::SCHEME => {
        let output = DirectoryRecordOutput::from_url(url)?;
        Ok(OutputWrapper::DirectoryRecordOutput(output))
      }
      other => Err(OutputError::SchemeMismatch(other.to_string())),
    }
  }
}

impl Render<View> for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, result: &View) -> Result<(), Self::Error> {
    match self {
      OutputWrapper::TextTableOutput(output) => {
        output.render_result(result).map_err(OutputError::from)
      }
      #[cfg(feature = "csv_output")]
      OutputWrapper::CsvFileOutput(output) => output.render_result(result).map_err(OutputError::from),
      #[cfg(feature = "json_output")]
      OutputWrapper::JsonFileOutput(output) => {
        output.render_result(result).map_err(OutputError::from)
      }
      #[cfg(feature = "directory_record")]
      OutputWrapper::DirectoryRecordOutput(output) => {
        output.render_result(result).map_err(OutputError::from)
      }
    }
  }
}

/// 写出表头与全部行，空单元格写为空字段
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<(), csv::Error> {
  let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);
  writer.write_record(table.columns())?;
  for row in table.rows() {
    writer.write_record(row.iter().map(|cell| cell.to_string()))?;
  }
  writer.flush()?;
  Ok(())
}

/// 打开输出文件，必要时创建上级目录；`append` 为真时在文件末尾续写
pub(crate) fn open_output_file(path: &Path, append: bool) -> std::io::Result<File> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)?;
  }
  OpenOptions::new()
    .create(true)
    .write(true)
    .append(append)
    .truncate(!append)
    .open(path)
}

/// URL 中是否带有某个查询参数，只看键不看值
pub(crate) fn has_flag(url: &Url, flag: &str) -> bool {
  url.query_pairs().any(|(key, _)| key == flag)
}

/// `?per_view` 时每个视图单独成文件：`<文件名>-<数据集>-<视图>.<扩展名>`
pub(crate) fn per_view_path(path: &Path, view: &View) -> PathBuf {
  let stem = path
    .file_stem()
    .map(|stem| stem.to_string_lossy().into_owned())
    .unwrap_or_default();
  let mut name = match stem.as_str() {
    "" => format!("{}-{}", view.dataset_id, view.kind),
    stem => format!("{}-{}-{}", stem, view.dataset_id, view.kind),
  };
  if let Some(extension) = path.extension() {
    name.push('.');
    name.push_str(&extension.to_string_lossy());
  }
  path.with_file_name(name)
}

/// 多视图报告使用的输出地址
///
/// 单文件输出每次渲染都会覆盖前一个视图：CSV 与非追加的 JSON 改为每个视图
/// 一个文件，写到文件的文本表格改为追加。其余输出原样返回。
pub fn report_url(url: &Url) -> Url {
  let mut url = url.clone();
  let scheme = url.scheme().to_string();
  match scheme.as_str() {
    "csv" if !has_flag(&url, "per_view") => {
      url.query_pairs_mut().append_key_only("per_view");
    }
    "json" if !has_flag(&url, "per_view") && !has_flag(&url, "append") => {
      url.query_pairs_mut().append_key_only("per_view");
    }
    "text" if !matches!(url.path(), "" | "-") && !has_flag(&url, "append") => {
      url.query_pairs_mut().append_key_only("append");
    }
    _ => {}
  }
  url
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_scheme_is_rejected() {
    let url = Url::parse("rtsp://localhost/live").unwrap();
    assert!(matches!(
      OutputWrapper::from_url(&url),
      Err(OutputError::SchemeMismatch(scheme)) if scheme == "rtsp"
    ));
  }

  #[test]
  fn text_scheme_is_dispatched() {
    let url = Url::parse("text:-").unwrap();
    assert!(matches!(
      OutputWrapper::from_url(&url),
      Ok(OutputWrapper::TextTableOutput(_))
    ));
  }

  #[cfg(feature = "directory_record")]
  #[test]
  fn folder_scheme_is_dispatched() {
    let url = Url::parse("folder:///tmp/board?always").unwrap();
    assert!(matches!(
      OutputWrapper::from_url(&url),
      Ok(OutputWrapper::DirectoryRecordOutput(_))
    ));
  }

  #[test]
  fn report_url_splits_single_file_outputs() {
    let csv = report_url(&Url::parse("csv:///tmp/board/report.csv").unwrap());
    assert!(has_flag(&csv, "per_view"));

    let json = report_url(&Url::parse("json:///tmp/board/report.json?pretty").unwrap());
    assert!(has_flag(&json, "per_view"));
    assert!(has_flag(&json, "pretty"));

    let lines = report_url(&Url::parse("json:///tmp/board/report.jsonl?append").unwrap());
    assert!(!has_flag(&lines, "per_view"));

    let text = report_url(&Url::parse("text:///tmp/board/report.txt").unwrap());
    assert!(has_flag(&text, "append"));

    let stdout = Url::parse("text:-").unwrap();
    assert_eq!(report_url(&stdout), stdout);
    let folder = Url::parse("folder:///tmp/board").unwrap();
    assert_eq!(report_url(&folder), folder);
  }

  #[test]
  fn per_view_path_names_dataset_and_view() {
    use crate::{highlight::Highlights, view::ViewKind};

    let view = View {
      kind: ViewKind::MapChart,
      dataset_id: "fer-2013".into(),
      title: "mAP".into(),
      table: Table::new([crate::table::MODEL]),
      highlights: Highlights::new(),
    };
    assert_eq!(
      per_view_path(Path::new("/tmp/board/report.csv"), &view),
      PathBuf::from("/tmp/board/report-fer-2013-map-chart.csv")
    );
  }

  #[test]
  fn flags_ignore_values() {
    let url = Url::parse("csv:///tmp/out.csv?append=1&x=2").unwrap();
    assert!(has_flag(&url, "append"));
    assert!(!has_flag(&url, "always"));
  }
}
