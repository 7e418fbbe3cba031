// 该文件是 Shanan （山南西风） 项目的一部分。
// src/main.rs - 看板主程序
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
  output::OutputWrapper,
  source::DatasetSource,
  task::{Task, ViewTask},
  view::ViewKind,
};

/// YOLO 基准测试看板
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 数据集目录，如 dataset:///srv/benchmarks/fer-2013
  #[arg(long, value_name = "DATASET")]
  pub data: Url,
  /// 输出位置: text:-, csv:///path, json:///path, folder:///path
  #[arg(long, default_value = "text:-", value_name = "OUTPUT")]
  pub output: Url,
  /// 视图: accuracy, efficiency, map-chart, latency-chart, trade-off,
  /// training-time, robustness, class-table, training-curve
  #[arg(long, default_value = "accuracy", value_name = "VIEW")]
  pub view: ViewKind,
  #[command(flatten)]
  pub options: ViewArgs,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("数据集: {}", args.data);
  info!("输出路径: {}", args.output);
  info!("视图: {}", args.view);

  let source = DatasetSource::from_url(&args.data)?;
  let output = OutputWrapper::from_url(&args.output)?;
  let snapshot = source.load()?;

  ViewTask::new(args.view, args.options.into()).run_task(&snapshot, &output)?;

  Ok(())
}
