// 该文件是 Shoushi （手势） 项目的一部分。
// src/service.rs - 手势识别服务
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

use crate::classifier::{ClassifierError, DetectGestures, GestureClassifier};
use crate::detector::{DetectorFrame, HandPoseDetection, LandmarkSource, SourceError};
use crate::gesture::{
  GestureDescription, GestureEstimator, GestureLibrary, GesturePrediction, gesture_strings,
  known_gestures,
};
use crate::keypoint::{HandPrediction, Keypoint3D};

/// 构造服务所需的全部外部依赖与配置
pub struct ServiceConfig<P, F> {
  pub hand_pose_detection: P,
  pub fingerpose: F,
  pub hands_version: String,
  pub known_gestures: Vec<GestureDescription>,
  pub gesture_strings: HashMap<String, String>,
}

impl<P, F> ServiceConfig<P, F> {
  /// 使用内置的已知手势表与展示字符串
  pub fn new(hand_pose_detection: P, fingerpose: F, hands_version: impl Into<String>) -> Self {
    ServiceConfig {
      hand_pose_detection,
      fingerpose,
      hands_version: hands_version.into(),
      known_gestures: known_gestures().to_vec(),
      gesture_strings: gesture_strings(),
    }
  }
}

pub struct HandGestureService<P: HandPoseDetection, G> {
  source: LandmarkSource<P>,
  classifier: GestureClassifier<G>,
}

impl<P: HandPoseDetection, G: GestureEstimator> HandGestureService<P, G> {
  pub fn new<F>(config: ServiceConfig<P, F>) -> Result<Self, F::Error>
  where
    F: GestureLibrary<Estimator = G>,
  {
    let classifier = GestureClassifier::new(
      &config.fingerpose,
      &config.known_gestures,
      config.gesture_strings,
    )?;
    let source = LandmarkSource::new(config.hand_pose_detection, config.hands_version);
    Ok(HandGestureService { source, classifier })
  }

  pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
    self.classifier = self.classifier.with_min_confidence(min_confidence);
    self
  }

  pub fn initialize_detector(&self) -> Result<&P::Detector, SourceError<P>> {
    self.source.initialize_detector()
  }

  pub fn estimate_hands(
    &self,
    frame: &DetectorFrame<P>,
  ) -> Result<Vec<HandPrediction>, SourceError<P>> {
    self.source.estimate_hands(frame)
  }

  pub fn estimate(
    &self,
    keypoints_3d: &[Keypoint3D],
  ) -> Result<Vec<GesturePrediction>, ClassifierError<G::Error>> {
    self.classifier.estimate(keypoints_3d)
  }

  pub fn detect_gestures<'a>(&'a self, predictions: &'a [HandPrediction]) -> DetectGestures<'a, G> {
    self.classifier.detect_gestures(predictions)
  }

  pub fn display_name(&self, event: &str) -> Option<&str> {
    self.classifier.display_name(event)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::classifier::tests::{ScriptedLibrary, hand, prediction};
  use crate::detector::tests::MockLibrary;

  #[test]
  fn frame_to_events() {
    let library = MockLibrary {
      hands: vec![hand(true), hand(false)],
      ..Default::default()
    };
    let fingerpose = ScriptedLibrary::new(vec![Ok(vec![
      prediction("victory", 9.2),
      prediction("scissors", 9.6),
    ])]);
    let service =
      HandGestureService::new(ServiceConfig::new(library, fingerpose, "0.4.1646424915")).unwrap();

    service.initialize_detector().unwrap();
    let hands = service.estimate_hands(&0).unwrap();
    assert_eq!(hands.len(), 2);

    let events: Vec<_> = service
      .detect_gestures(&hands)
      .collect::<Result<_, _>>()
      .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event, "scissors");
    assert_eq!((events[0].x, events[0].y), (108.0, 208.0));
    assert_eq!(service.display_name(&events[0].event), Some("✌️"));
  }

  #[test]
  fn estimate_hands_requires_initialization() {
    let service = HandGestureService::new(ServiceConfig::new(
      MockLibrary::default(),
      ScriptedLibrary::new(Vec::new()),
      "0.4",
    ))
    .unwrap();
    assert!(service.estimate_hands(&0).is_err());
  }
}
