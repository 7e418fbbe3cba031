// 该文件是 Shanan （山南西风） 项目的一部分。
// src/bin/export_report.rs - 导出全部视图
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

use anyhow::Result;
use clap::Parser;
use tracing::info;
use url::Url;

use shanan_board::{
  FromUrl,
  args::ViewArgs,
  output::{OutputWrapper, report_url},
  source::{DatasetCache, DatasetSource},
  task::{ReportTask, Task},
  view::{ViewKind, ViewOptions},
};

/// 将一个或多个数据集的全部视图导出
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 数据集目录，可重复指定
  #[arg(long, value_name = "DATASET", required = true)]
  pub data: Vec<Url>,
  /// 输出位置，默认按日期记录到目录；CSV 与 JSON 文件按视图拆分
  #[arg(long, value_name = "OUTPUT", default_value = "folder:///tmp/shanan-board/report")]
  pub output: Url,
  /// 只导出这些视图（逗号分隔），默认全部
  #[arg(long, value_name = "VIEWS", value_delimiter = ',')]
  pub views: Vec<ViewKind>,
  #[command(flatten)]
  pub options: ViewArgs,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("数据集数量: {}", args.data.len());
  info!("输出路径: {}", args.output);

  let output = OutputWrapper::from_url(&report_url(&args.output))?;
  let options: ViewOptions = args.options.into();
  let kinds = (!args.views.is_empty()).then_some(args.views);
  let cache = DatasetCache::default();

  for url in &args.data {
    let source = DatasetSource::from_url(url)?;
    let snapshot = cache.get_or_load(&source)?;
    ReportTask::new(options.clone())
      .with_kinds(kinds.clone())
      .run_task(snapshot.as_ref(), &output)?;
  }

  info!("全部导出完成");
  Ok(())
}
