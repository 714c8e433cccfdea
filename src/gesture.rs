// 该文件是 Shoushi （手势） 项目的一部分。
// src/gesture.rs - 已知手势定义与手势估计库接口
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

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::keypoint::FINGER_LOOKUP_INDEXES;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Finger {
  Thumb,
  Index,
  Middle,
  Ring,
  Pinky,
}

impl Finger {
  pub const ALL: [Finger; 5] = [
    Finger::Thumb,
    Finger::Index,
    Finger::Middle,
    Finger::Ring,
    Finger::Pinky,
  ];

  pub fn name(self) -> &'static str {
    FINGER_LOOKUP_INDEXES[self as usize].0
  }

  /// 从手腕到指尖的关键点索引
  pub fn landmarks(self) -> [usize; 5] {
    FINGER_LOOKUP_INDEXES[self as usize].1
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerCurl {
  NoCurl,
  HalfCurl,
  FullCurl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerDirection {
  VerticalUp,
  VerticalDown,
  HorizontalLeft,
  HorizontalRight,
  DiagonalUpRight,
  DiagonalUpLeft,
  DiagonalDownRight,
  DiagonalDownLeft,
}

/// 手势的弯曲/朝向特征模板
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureDescription {
  name: String,
  curls: Vec<(Finger, FingerCurl, f32)>,
  directions: Vec<(Finger, FingerDirection, f32)>,
}

impl GestureDescription {
  pub fn new(name: impl Into<String>) -> Self {
    GestureDescription {
      name: name.into(),
      curls: Vec::new(),
      directions: Vec::new(),
    }
  }

  pub fn curl(mut self, finger: Finger, curl: FingerCurl, weight: f32) -> Self {
    self.curls.push((finger, curl, weight));
    self
  }

  pub fn direction(mut self, finger: Finger, direction: FingerDirection, weight: f32) -> Self {
    self.directions.push((finger, direction, weight));
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn curls(&self) -> &[(Finger, FingerCurl, f32)] {
    &self.curls
  }

  pub fn directions(&self) -> &[(Finger, FingerDirection, f32)] {
    &self.directions
  }
}

fn curled(description: GestureDescription, fingers: &[Finger]) -> GestureDescription {
  fingers.iter().fold(description, |description, &finger| {
    description
      .curl(finger, FingerCurl::FullCurl, 1.0)
      .curl(finger, FingerCurl::HalfCurl, 0.9)
  })
}

static KNOWN_GESTURES: Lazy<Vec<GestureDescription>> = Lazy::new(|| {
  use Finger::*;
  use FingerCurl::*;
  use FingerDirection::*;

  let thumbs_up = curled(
    GestureDescription::new("thumbs_up")
      .curl(Thumb, NoCurl, 1.0)
      .direction(Thumb, VerticalUp, 1.0)
      .direction(Thumb, DiagonalUpLeft, 0.25)
      .direction(Thumb, DiagonalUpRight, 0.25),
    &[Index, Middle, Ring, Pinky],
  )
  .direction(Index, HorizontalLeft, 1.0)
  .direction(Index, HorizontalRight, 1.0);

  let victory = GestureDescription::new("victory")
    .curl(Thumb, HalfCurl, 0.5)
    .curl(Thumb, NoCurl, 0.5)
    .direction(Thumb, VerticalUp, 1.0)
    .direction(Thumb, DiagonalUpLeft, 1.0)
    .curl(Index, NoCurl, 1.0)
    .direction(Index, VerticalUp, 0.75)
    .direction(Index, DiagonalUpLeft, 1.0)
    .curl(Middle, NoCurl, 1.0)
    .direction(Middle, VerticalUp, 1.0)
    .direction(Middle, DiagonalUpLeft, 0.75)
    .curl(Ring, FullCurl, 1.0)
    .direction(Ring, VerticalUp, 0.2)
    .direction(Ring, DiagonalUpLeft, 1.0)
    .direction(Ring, HorizontalLeft, 0.2)
    .curl(Pinky, FullCurl, 1.0)
    .direction(Pinky, VerticalUp, 0.2)
    .direction(Pinky, DiagonalUpLeft, 1.0)
    .direction(Pinky, HorizontalLeft, 0.2);

  let rock = curled(
    GestureDescription::new("rock")
      .curl(Thumb, NoCurl, 1.0)
      .curl(Thumb, HalfCurl, 0.4),
    &[Index, Middle, Ring, Pinky],
  );

  let paper = Finger::ALL
    .iter()
    .fold(GestureDescription::new("paper"), |description, &finger| {
      description.curl(finger, NoCurl, 1.0)
    });

  let scissors = curled(
    GestureDescription::new("scissors")
      .curl(Index, NoCurl, 1.0)
      .curl(Middle, NoCurl, 1.0)
      .direction(Index, HorizontalLeft, 1.0)
      .direction(Index, HorizontalRight, 1.0)
      .direction(Middle, HorizontalLeft, 1.0)
      .direction(Middle, HorizontalRight, 1.0),
    &[Ring, Pinky],
  );

  let pointing = |name: &str, direction: FingerDirection| {
    curled(
      GestureDescription::new(name)
        .curl(Index, NoCurl, 1.0)
        .direction(Index, direction, 1.0)
        .curl(Thumb, HalfCurl, 0.5)
        .curl(Thumb, NoCurl, 0.5),
      &[Middle, Ring, Pinky],
    )
  };
  let scroll_up = pointing("scroll_up", VerticalUp).direction(Index, DiagonalUpLeft, 0.5);
  let scroll_down = pointing("scroll_down", VerticalDown).direction(Index, DiagonalDownLeft, 0.5);

  vec![
    thumbs_up,
    victory,
    rock,
    paper,
    scissors,
    scroll_up,
    scroll_down,
  ]
});

/// 进程内常量：已知手势表
pub fn known_gestures() -> &'static [GestureDescription] {
  &KNOWN_GESTURES
}

const GESTURE_STRINGS: [(&str, &str); 7] = [
  ("thumbs_up", "👍"),
  ("victory", "✌🏻"),
  ("rock", "✊️"),
  ("paper", "🖐"),
  ("scissors", "✌️"),
  ("scroll_up", "👆"),
  ("scroll_down", "👇"),
];

/// 手势名称到展示字符串的映射
pub fn gesture_strings() -> HashMap<String, String> {
  GESTURE_STRINGS
    .iter()
    .map(|(name, display)| (name.to_string(), display.to_string()))
    .collect()
}

/// 分类器给出的候选手势
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GesturePrediction {
  pub name: String,
  pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerPose {
  pub finger: Finger,
  pub curl: FingerCurl,
  pub direction: FingerDirection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GestureEstimation {
  #[serde(default)]
  pub pose_data: Vec<FingerPose>,
  pub gestures: Vec<GesturePrediction>,
}

/// 手势估计器：对一只手的 21 个三维关键点进行匹配
pub trait GestureEstimator {
  type Error: std::error::Error + Send + Sync + 'static;

  fn estimate(
    &self,
    landmarks: &[[f32; 3]],
    min_confidence: f32,
  ) -> Result<GestureEstimation, Self::Error>;
}

/// 手势估计库，按已知手势表构造估计器
pub trait GestureLibrary {
  type Estimator: GestureEstimator;
  type Error: std::error::Error + Send + Sync + 'static;

  fn gesture_estimator(
    &self,
    known_gestures: &[GestureDescription],
  ) -> Result<Self::Estimator, Self::Error>;
}
