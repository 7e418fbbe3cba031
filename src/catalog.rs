// 该文件是 Shanan （山南西风） 项目的一部分。
// src/catalog.rs - 数据集目录与最优模型列表
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

use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetProfile {
  pub id: &'static str,
  pub display_name: &'static str,
  /// 类别在表格与热力图中的列顺序
  pub classes: &'static [&'static str],
  /// 每个模型家族中表现最好的变体
  pub best_variants: &'static [&'static str],
  /// 演示页面使用的权重文件
  pub demo_weights: Option<&'static str>,
}

pub const DATASETS: [DatasetProfile; 2] = [
  DatasetProfile {
    id: "human-face-emotion-computer-vision-model",
    display_name: "Human Face Emotions Computer Vision Model",
    classes: &[
      "anger", "content", "disgust", "fear", "happy", "neutral", "sad", "surprise",
    ],
    best_variants: &["yolov8l", "yolov9t", "yolov10n", "yolov11s", "yolov12n"],
    demo_weights: Some("best-YOLOv11s-Roboflow.pt"),
  },
  DatasetProfile {
    id: "fer-2013",
    display_name: "FER2013",
    classes: &["angry", "disgust", "fear", "happy", "neutral", "sad", "surprise"],
    best_variants: &["yolov8m", "yolov9s", "yolov10s", "yolov11s", "yolov12m"],
    demo_weights: None,
  },
];

/// 按数据集标识或显示名称查找
pub fn lookup(name: &str) -> Option<&'static DatasetProfile> {
  DATASETS
    .iter()
    .find(|profile| profile.id == name || profile.display_name.eq_ignore_ascii_case(name))
}

/// 数据集整理过的最优模型集合，未知数据集返回空集合
pub fn best_variants(dataset_id: &str) -> BTreeSet<String> {
  lookup(dataset_id)
    .map(|profile| profile.best_variants.iter().map(|m| m.to_string()).collect())
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn known_dataset_has_five_families() {
    let best = best_variants("fer-2013");
    assert_eq!(best.len(), 5);
    assert!(best.contains("yolov12m"));
  }

  #[test]
  fn unknown_dataset_yields_empty_set() {
    assert!(best_variants("unknown-dataset").is_empty());
  }

  #[test]
  fn lookup_by_display_name() {
    let profile = lookup("FER2013").unwrap();
    assert_eq!(profile.id, "fer-2013");
    assert_eq!(profile.demo_weights, None);
    assert_eq!(
      lookup("human-face-emotion-computer-vision-model").map(|p| p.classes.len()),
      Some(8)
    );
  }
}
