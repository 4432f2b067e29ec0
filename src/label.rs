// 该文件是 Shanan （山南西风） 项目的一部分。
// src/label.rs - 分类器标签选择
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

use tracing::warn;

use crate::meta::{ClassifierResult, DetectedObject};

/// 选中的标签与其显示文本
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSelection {
  pub label: String,
  pub probability: f32,
  pub display_text: String,
}

/// 将概率裁剪到 [0, 1]，NaN 视为 0
pub fn clamp_probability(probability: f32) -> f32 {
  if probability.is_nan() {
    return 0.0;
  }
  probability.clamp(0.0, 1.0)
}

pub fn format_display_text(label: &str, probability: f32) -> String {
  format!("{} ({:.2})", label, probability)
}

/// 遍历所有分类结果，返回最后一个非空标签
///
/// 不按置信度排序，后出现的标签直接覆盖前面的。
pub fn select_label(classifiers: &[ClassifierResult]) -> Option<LabelSelection> {
  let mut selected = None;

  for (classifier_idx, classifier) in classifiers.iter().enumerate() {
    for info in classifier.labels.iter().filter(|info| !info.label.is_empty()) {
      let probability = clamp_probability(info.probability);
      if probability != info.probability {
        warn!(
          classifier = classifier_idx,
          label = %info.label,
          raw = info.probability,
          "分类概率超出 [0, 1]，已裁剪为 {:.2}",
          probability
        );
      }

      selected = Some(LabelSelection {
        label: info.label.clone(),
        probability,
        display_text: format_display_text(&info.label, probability),
      });
    }
  }

  selected
}

/// 为目标设置显示文本，返回纯标签（没有标签时为空字符串）
pub fn apply_label(object: &mut DetectedObject) -> String {
  match select_label(&object.classifiers) {
    Some(selection) => {
      object.display_text = Some(selection.display_text);
      selection.label
    }
    None => String::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::meta::{BBox, LabelInfo};

  fn classifier(labels: &[(&str, f32)]) -> ClassifierResult {
    ClassifierResult::new(
      labels
        .iter()
        .map(|(label, prob)| LabelInfo::new(*label, *prob))
        .collect(),
    )
  }

  #[test]
  fn test_clamp_probability() {
    assert_eq!(format!("{:.2}", clamp_probability(222.65)), "1.00");
    assert_eq!(format!("{:.2}", clamp_probability(-3.2)), "0.00");
    assert_eq!(format!("{:.2}", clamp_probability(0.734)), "0.73");
    assert_eq!(clamp_probability(f32::NAN), 0.0);
  }

  // 最后一个标签胜出，即使它的置信度来自异常值，这是现有行为
  #[test]
  fn test_last_label_wins_not_highest_confidence() {
    let results = vec![classifier(&[("cat", 0.9)]), classifier(&[("dog", 1.5)])];
    let selection = select_label(&results).unwrap();
    assert_eq!(selection.label, "dog");
    assert_eq!(selection.display_text, "dog (1.00)");
  }

  #[test]
  fn test_last_label_wins_within_one_classifier() {
    let results = vec![classifier(&[("red", 0.95), ("blue", 0.10)])];
    let selection = select_label(&results).unwrap();
    assert_eq!(selection.label, "blue");
    assert_eq!(selection.display_text, "blue (0.10)");
  }

  #[test]
  fn test_empty_labels_are_skipped() {
    let results = vec![classifier(&[("car", 0.8)]), classifier(&[("", 0.99)])];
    let selection = select_label(&results).unwrap();
    assert_eq!(selection.display_text, "car (0.80)");
  }

  #[test]
  fn test_no_label_leaves_object_untouched() {
    let mut object = DetectedObject::new(1, 0.5, BBox::default())
      .with_classifier(classifier(&[("", 0.4)]))
      .with_classifier(ClassifierResult::default());
    let label = apply_label(&mut object);
    assert_eq!(label, "");
    assert_eq!(object.display_text, None);
  }

  #[test]
  fn test_apply_label_sets_display_text() {
    let mut object =
      DetectedObject::new(0, 0.7, BBox::default()).with_classifier(classifier(&[("truck", -3.2)]));
    let label = apply_label(&mut object);
    assert_eq!(label, "truck");
    assert_eq!(object.display_text.as_deref(), Some("truck (0.00)"));
  }
}
