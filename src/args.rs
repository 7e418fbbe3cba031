// 该文件是 Shanan （山南西风） 项目的一部分。
// src/args.rs - 看板参数配置
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

use clap::Args;

use crate::{
  filter::{ChartSort, SortMode, TrainingFilter},
  view::ViewOptions,
};

/// 视图的筛选与排序参数，两个命令行程序共用
#[derive(Args, Debug, Clone)]
pub struct ViewArgs {
  /// 只显示这些模型（逗号分隔），为空时显示全部
  #[arg(long, value_name = "MODELS", value_delimiter = ',')]
  pub select: Vec<String>,

  /// 表格排序列
  #[arg(long, value_name = "COLUMN")]
  pub sort_column: Option<String>,

  /// 表格排序方式: default, asc, desc, a-z, z-a
  #[arg(long, default_value = "default", value_name = "MODE")]
  pub sort_mode: SortMode,

  /// 图表排序方向: default, asc, desc
  #[arg(long, default_value = "default", value_name = "DIRECTION")]
  pub chart_sort: ChartSort,

  /// 图表排序指标或分类别结果使用的指标
  #[arg(long, value_name = "METRIC")]
  pub metric: Option<String>,

  /// 训练曲线筛选: all, variant:<n|s|m|l>, family:<yolov8>, model:<id>, best:<dataset>
  #[arg(long, default_value = "all", value_name = "FILTER")]
  pub training_filter: TrainingFilter,
}

impl From<ViewArgs> for ViewOptions {
  fn from(args: ViewArgs) -> Self {
    ViewOptions {
      selected_models: args
        .select
        .into_iter()
        .map(|model| model.trim().to_string())
        .filter(|model| !model.is_empty())
        .collect(),
      sort_column: args.sort_column,
      sort_mode: args.sort_mode,
      chart_sort: args.chart_sort,
      metric: args.metric,
      training_filter: args.training_filter,
    }
  }
}
