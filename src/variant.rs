// 该文件是 Shanan （山南西风） 项目的一部分。
// src/variant.rs - 模型规模分组
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

use std::{fmt, str::FromStr};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum VariantGroup {
  NanoTiny,
  Small,
  Medium,
  LargeCompact,
  Other,
}

impl VariantGroup {
  /// 可供选择的分组，`Other` 不参与筛选
  pub const ALL: [VariantGroup; 4] = [
    VariantGroup::NanoTiny,
    VariantGroup::Small,
    VariantGroup::Medium,
    VariantGroup::LargeCompact,
  ];

  pub fn label(&self) -> &'static str {
    match self {
      VariantGroup::NanoTiny => "Nano & Tiny (n/t)",
      VariantGroup::Small => "Small (s)",
      VariantGroup::Medium => "Medium (m)",
      VariantGroup::LargeCompact => "Large & Compact (l/c)",
      VariantGroup::Other => "Other",
    }
  }
}

impl fmt::Display for VariantGroup {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

impl FromStr for VariantGroup {
  type Err = String;

  /// 接受完整标签或后缀字母，如 `n`、`small`、`Large & Compact (l/c)`
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let lowered = s.trim().to_ascii_lowercase();
    match lowered.as_str() {
      "n" | "t" | "nano" | "tiny" | "nano-tiny" => Ok(VariantGroup::NanoTiny),
      "s" | "small" => Ok(VariantGroup::Small),
      "m" | "medium" => Ok(VariantGroup::Medium),
      "l" | "c" | "large" | "compact" | "large-compact" => Ok(VariantGroup::LargeCompact),
      "other" => Ok(VariantGroup::Other),
      _ => [VariantGroup::Other]
        .into_iter()
        .chain(VariantGroup::ALL)
        .find(|group| group.label().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| format!("未知的模型分组: {}", s)),
    }
  }
}

/// 按模型标识的最后一个字符确定规模分组
pub fn classify(model_id: &str) -> VariantGroup {
  match model_id.chars().last().map(|c| c.to_ascii_lowercase()) {
    Some('n') | Some('t') => VariantGroup::NanoTiny,
    Some('s') => VariantGroup::Small,
    Some('m') => VariantGroup::Medium,
    Some('l') | Some('c') => VariantGroup::LargeCompact,
    _ => VariantGroup::Other,
  }
}

/// 提取模型家族，如 `YOLOv11s` → `yolov11`
pub fn family(model_id: &str) -> Option<String> {
  const PREFIX: &str = "yolov";

  let lowered = model_id.to_ascii_lowercase();
  let start = lowered.find(PREFIX)?;
  let digits: String = lowered[start + PREFIX.len()..]
    .chars()
    .take_while(|c| c.is_ascii_digit())
    .collect();
  if digits.is_empty() {
    return None;
  }
  Some(format!("{}{}", PREFIX, digits))
}
