// 该文件是 Shoushi （手势） 项目的一部分。
// src/classifier.rs - 手势分类适配
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

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::gesture::{
  Finger, GestureDescription, GestureEstimator, GestureLibrary, GesturePrediction,
};
use crate::keypoint::{HandLandmark, HandPrediction, Keypoint3D};

/// 估计器内部置信度范围约为 0 - 10
pub const DEFAULT_MIN_CONFIDENCE: f32 = 9.0;

/// 每只手每帧最多一个的手势事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedEvent {
  pub event: String,
  pub x: f32,
  pub y: f32,
}

#[derive(Error, Debug)]
pub enum ClassifierError<E> {
  #[error("手势估计失败: {0}")]
  Estimator(E),
  #[error("缺少关键点: {0}")]
  MissingLandmark(&'static str),
  #[error("三维关键点不完整: {finger} 需要 {required} 个, 实际 {found} 个")]
  IncompleteFinger {
    finger: &'static str,
    required: usize,
    found: usize,
  },
}

pub struct GestureClassifier<G> {
  estimator: G,
  known_gestures: Vec<GestureDescription>,
  gesture_strings: HashMap<String, String>,
  min_confidence: f32,
}

impl<G: GestureEstimator> GestureClassifier<G> {
  /// 使用已知手势表立即构造估计器
  pub fn new<F>(
    library: &F,
    known_gestures: &[GestureDescription],
    gesture_strings: HashMap<String, String>,
  ) -> Result<Self, F::Error>
  where
    F: GestureLibrary<Estimator = G>,
  {
    let estimator = library.gesture_estimator(known_gestures)?;
    info!("手势估计器创建完成，已知手势 {} 种", known_gestures.len());
    Ok(GestureClassifier {
      estimator,
      known_gestures: known_gestures.to_vec(),
      gesture_strings,
      min_confidence: DEFAULT_MIN_CONFIDENCE,
    })
  }

  pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
    self.min_confidence = min_confidence;
    self
  }

  pub fn min_confidence(&self) -> f32 {
    self.min_confidence
  }

  pub fn known_gestures(&self) -> &[GestureDescription] {
    &self.known_gestures
  }

  /// 手势名称对应的展示字符串
  pub fn display_name(&self, event: &str) -> Option<&str> {
    self.gesture_strings.get(event).map(String::as_str)
  }

  /// 对一只手的三维关键点进行手势匹配，返回全部候选
  pub fn estimate(
    &self,
    keypoints_3d: &[Keypoint3D],
  ) -> Result<Vec<GesturePrediction>, ClassifierError<G::Error>> {
    for finger in Finger::ALL {
      let required = finger.landmarks().iter().max().map_or(0, |index| index + 1);
      if keypoints_3d.len() < required {
        return Err(ClassifierError::IncompleteFinger {
          finger: finger.name(),
          required,
          found: keypoints_3d.len(),
        });
      }
    }

    let landmarks: Vec<[f32; 3]> = keypoints_3d.iter().map(Keypoint3D::to_landmark).collect();
    let estimation = self
      .estimator
      .estimate(&landmarks, self.min_confidence)
      .map_err(ClassifierError::Estimator)?;
    debug!("候选手势: {:?}", estimation.gestures);
    Ok(estimation.gestures)
  }

  /// 逐只手产生手势事件，每次调用只遍历一帧的预测结果
  pub fn detect_gestures<'a>(&'a self, predictions: &'a [HandPrediction]) -> DetectGestures<'a, G> {
    DetectGestures {
      classifier: self,
      hands: predictions.iter(),
      failed: false,
    }
  }

  fn detect_hand(
    &self,
    hand: &HandPrediction,
  ) -> Result<Option<DetectedEvent>, ClassifierError<G::Error>> {
    let Some(keypoints_3d) = hand.keypoints_3d.as_deref() else {
      return Ok(None);
    };

    let gestures = self.estimate(keypoints_3d)?;
    let Some(best) = best_gesture(&gestures) else {
      return Ok(None);
    };

    let tip_name = HandLandmark::IndexFingerTip.name();
    let tip = hand
      .keypoint(tip_name)
      .ok_or(ClassifierError::<G::Error>::MissingLandmark(tip_name))?;

    Ok(Some(DetectedEvent {
      event: best.name.clone(),
      x: tip.x,
      y: tip.y,
    }))
  }
}

/// 选取得分最高的候选，得分相同时保留先出现的
pub fn best_gesture(gestures: &[GesturePrediction]) -> Option<&GesturePrediction> {
  gestures.iter().fold(None, |best, current| match best {
    Some(best) if best.score >= current.score => Some(best),
    _ => Some(current),
  })
}

/// 单帧手势事件序列，出错后结束
pub struct DetectGestures<'a, G> {
  classifier: &'a GestureClassifier<G>,
  hands: std::slice::Iter<'a, HandPrediction>,
  failed: bool,
}

impl<G: GestureEstimator> Iterator for DetectGestures<'_, G> {
  type Item = Result<DetectedEvent, ClassifierError<G::Error>>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.failed {
      return None;
    }
    for hand in self.hands.by_ref() {
      match self.classifier.detect_hand(hand) {
        Ok(Some(event)) => return Some(Ok(event)),
        Ok(None) => continue,
        Err(e) => {
          warn!("手势识别失败: {}", e);
          self.failed = true;
          return Some(Err(e));
        }
      }
    }
    None
  }
}
