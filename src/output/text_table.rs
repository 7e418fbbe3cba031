// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/text_table.rs - 终端文本表格输出
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

use std::{fmt, io::Write, path::PathBuf};

use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  output::{Render, has_flag, open_output_file},
  table::Cell,
  view::View,
};

const PADDING: usize = 1;
/// 最优值单元格的后缀标记
const BEST_MARK: &str = " *";

#[derive(Error, Debug)]
pub enum TextTableError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// `text:-` 输出到标准输出，`text:///path/board.txt` 输出到文件
pub struct TextTableOutput {
  path: Option<PathBuf>,
  append: bool,
}

impl FromUrlWithScheme for TextTableOutput {
  const SCHEME: &'static str = "text";
}

impl FromUrl for TextTableOutput {
  type Error = TextTableError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(TextTableError::SchemeMismatch(format!(
        "期望输出方式 '{}', 实际输出方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let path = match uri.path() {
      "" | "-" => None,
      path => Some(PathBuf::from(path)),
    };
    Ok(TextTableOutput {
      path,
      append: has_flag(uri, "append"),
    })
  }
}

impl Render<View> for TextTableOutput {
  type Error = TextTableError;

  fn render_result(&self, result: &View) -> Result<(), Self::Error> {
    let text = format_table(result);
    match &self.path {
      None => {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", text)?;
      }
      Some(path) => {
        let mut file = open_output_file(path, self.append)?;
        writeln!(file, "{}", text)?;
        info!("视图 {} 已写入 {}", result.kind, path.display());
      }
    }
    Ok(())
  }
}

fn format_cell(cell: &Cell) -> String {
  match cell {
    Cell::Number(value) if value.fract() == 0.0 => format!("{}", value),
    Cell::Number(value) => format!("{:.4}", value),
    other => other.to_string(),
  }
}

/// 带标题的等宽文本表格，最优值以 ` *` 标记
pub fn format_table(view: &View) -> String {
  let header: Vec<String> = view.table.columns().to_vec();
  let values: Vec<Vec<String>> = view
    .table
    .rows()
    .iter()
    .enumerate()
    .map(|(index, row)| {
      header
        .iter()
        .zip(row)
        .map(|(column, cell)| {
          let best = view
            .highlights
            .get(column)
            .is_some_and(|rows| rows.contains(&index));
          let mut text = format_cell(cell);
          if best {
            text.push_str(BEST_MARK);
          }
          text
        })
        .collect()
    })
    .collect();

  let mut column_widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
  for row in &values {
    for (width, value) in column_widths.iter_mut().zip(row) {
      *width = (*width).max(value.chars().count());
    }
  }

  let mut out = format!("{} [{}]\n", view.title, view.dataset_id);
  out.push_str(&format!("{}\n", Row { column_widths: &column_widths, values: &header }));
  out.push_str(&format!("{}\n", Line { column_widths: &column_widths }));
  for row in &values {
    out.push_str(&format!("{}\n", Row { column_widths: &column_widths, values: row }));
  }
  out
}

struct Line<'a> {
  column_widths: &'a [usize],
}

impl fmt::Display for Line<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "|")?;
    for width in self.column_widths {
      write!(f, "{}|", "-".repeat(width + 2 * PADDING))?;
    }
    Ok(())
  }
}

struct Row<'a> {
  column_widths: &'a [usize],
  values: &'a [String],
}

impl fmt::Display for Row<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "|")?;
    for (width, value) in self.column_widths.iter().zip(self.values) {
      let fill = width + PADDING - value.chars().count();
      write!(f, "{}{}{}|", " ".repeat(PADDING), value, " ".repeat(fill))?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    highlight::Highlights,
    table::{MODEL, Table},
    view::ViewKind,
  };

  fn view() -> View {
    let table = Table::new([MODEL, "mAP50"]).with_rows(vec![
      vec!["YOLOv8n".into(), 0.61.into()],
      vec!["YOLOv11s".into(), 0.66.into()],
    ]);
    let mut highlights = Highlights::new();
    highlights.insert("mAP50".into(), vec![1]);
    View {
      kind: ViewKind::Accuracy,
      dataset_id: "fer-2013".into(),
      title: "精度".into(),
      table,
      highlights,
    }
  }

  #[test]
  fn best_cells_are_marked() {
    let text = format_table(&view());
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "精度 [fer-2013]");
    assert_eq!(lines[1], "| Model    | mAP50    |");
    assert_eq!(lines[2], "|----------|----------|");
    assert_eq!(lines[3], "| YOLOv8n  | 0.6100   |");
    assert_eq!(lines[4], "| YOLOv11s | 0.6600 * |");
  }

  #[test]
  fn stdout_and_file_targets() {
    let stdout = TextTableOutput::from_url(&Url::parse("text:-").unwrap()).unwrap();
    assert!(stdout.path.is_none());
    let file = TextTableOutput::from_url(&Url::parse("text:///tmp/board.txt?append").unwrap()).unwrap();
    assert_eq!(file.path, Some(PathBuf::from("/tmp/board.txt")));
    assert!(file.append);
  }
}
