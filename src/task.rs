// 该文件是 Shanan （山南西风） 项目的一部分。
// src/task.rs - 看板任务
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

use tracing::{info, warn};

use crate::{
  output::Render,
  source::DatasetSnapshot,
  table::TableError,
  view::{View, ViewError, ViewKind, ViewOptions, build_view},
};

pub trait Task<S, O>: Sized {
  type Error;
  fn run_task(self, source: S, output: O) -> Result<(), Self::Error>;
}

/// 渲染单个视图
pub struct ViewTask {
  kind: ViewKind,
  options: ViewOptions,
}

impl ViewTask {
  pub fn new(kind: ViewKind, options: ViewOptions) -> Self {
    Self { kind, options }
  }
}

impl<'a, 'b, RE, O> Task<&'a DatasetSnapshot, &'b O> for ViewTask
where
  RE: std::error::Error + Sync + Send + 'static,
  O: Render<View, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, source: &'a DatasetSnapshot, output: &'b O) -> Result<(), Self::Error> {
    info!("开始任务: 视图 {} ({})", self.kind, source.dataset_id);
    let now = std::time::Instant::now();
    let view = build_view(self.kind, source, &self.options)?;
    info!("视图构建完成，{} 行，耗时: {:.2?}", view.table.nrows(), now.elapsed());
    output.render_result(&view)?;
    info!("渲染完成，耗时: {:.2?}", now.elapsed());

    Ok(())
  }
}

/// 依次渲染全部视图
///
/// 没有训练日志时跳过训练曲线。排序列或指标只对部分视图有意义，
/// 不适用的视图改用默认排序与默认指标。
#[derive(Default, Debug)]
pub struct ReportTask {
  options: ViewOptions,
  kinds: Option<Vec<ViewKind>>,
}

impl ReportTask {
  pub fn new(options: ViewOptions) -> Self {
    Self {
      options,
      kinds: None,
    }
  }

  pub fn with_kinds(mut self, kinds: Option<Vec<ViewKind>>) -> Self {
    self.kinds = kinds;
    self
  }
}

impl<'a, 'b, RE, O> Task<&'a DatasetSnapshot, &'b O> for ReportTask
where
  RE: std::error::Error + Sync + Send + 'static,
  O: Render<View, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, source: &'a DatasetSnapshot, output: &'b O) -> Result<(), Self::Error> {
    let kinds = self.kinds.unwrap_or_else(|| ViewKind::ALL.to_vec());
    info!("开始报告任务: {} 个视图 ({})", kinds.len(), source.dataset_id);

    let mut rendered = 0;
    for kind in kinds {
      let view = match build_view(kind, source, &self.options) {
        Ok(view) => view,
        Err(ViewError::NoTrainingLogs(dataset)) => {
          warn!("数据集 {} 没有训练日志，跳过视图 {}", dataset, kind);
          continue;
        }
        Err(e @ (ViewError::UnknownMetric(_) | ViewError::Table(TableError::UnknownColumn(_)))) => {
          warn!("视图 {} 不适用当前排序或指标 ({})，改用默认设置", kind, e);
          build_view(kind, source, &self.options.without_column_choices())?
        }
        Err(e) => return Err(e.into()),
      };
      output.render_result(&view)?;
      rendered += 1;
    }

    info!("报告完成，共渲染 {} 个视图", rendered);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    filter::{ChartSort, SortMode},
    record::{
      column::{MAP50_95, TRAINING_TIME},
      tests::benchmark,
    },
  };
  use std::{cell::RefCell, convert::Infallible};

  #[derive(Default)]
  struct Collect(RefCell<Vec<ViewKind>>);

  impl Render<View> for Collect {
    type Error = Infallible;

    fn render_result(&self, result: &View) -> Result<(), Self::Error> {
      self.0.borrow_mut().push(result.kind);
      Ok(())
    }
  }

  fn snapshot() -> DatasetSnapshot {
    DatasetSnapshot {
      dataset_id: "fer-2013".into(),
      overall: vec![benchmark("YOLOv8n", 0.4, "00:45:00")],
      classes: Vec::new(),
      training_logs: Vec::new(),
    }
  }

  #[test]
  fn report_skips_training_curve_without_logs() {
    let output = Collect::default();
    ReportTask::default().run_task(&snapshot(), &output).unwrap();
    let kinds = output.0.into_inner();
    assert_eq!(kinds.len(), ViewKind::ALL.len() - 1);
    assert!(!kinds.contains(&ViewKind::TrainingCurve));
  }

  #[test]
  fn report_falls_back_when_sort_column_is_missing() {
    let mut snapshot = snapshot();
    snapshot.overall.push(benchmark("YOLOv11s", 0.5, "01:30:00"));
    let options = ViewOptions {
      sort_column: Some(TRAINING_TIME.into()),
      sort_mode: SortMode::NumericDescending,
      chart_sort: ChartSort::Descending,
      metric: Some(MAP50_95.into()),
      ..Default::default()
    };

    let output = Collect::default();
    ReportTask::new(options.clone())
      .run_task(&snapshot, &output)
      .unwrap();
    assert_eq!(output.0.into_inner().len(), ViewKind::ALL.len() - 1);

    let efficiency = build_view(ViewKind::Efficiency, &snapshot, &options).unwrap();
    assert_eq!(efficiency.table.model_ids().unwrap(), ["YOLOv11s", "YOLOv8n"]);
  }

  #[test]
  fn view_task_keeps_sort_column_errors() {
    let options = ViewOptions {
      sort_column: Some(TRAINING_TIME.into()),
      sort_mode: SortMode::NumericDescending,
      ..Default::default()
    };
    let output = Collect::default();
    let task = ViewTask::new(ViewKind::Accuracy, options);
    assert!(task.run_task(&snapshot(), &output).is_err());
  }

  #[test]
  fn view_task_propagates_view_errors() {
    let output = Collect::default();
    let task = ViewTask::new(ViewKind::TrainingCurve, ViewOptions::default());
    assert!(task.run_task(&snapshot(), &output).is_err());
    assert!(output.0.into_inner().is_empty());
  }
}
