// 该文件是 Shoushi （手势） 项目的一部分。
// src/keypoint.rs - 手部关键点定义
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

use serde::{Deserialize, Serialize};

/// 手部关键点数量（MediaPipe Hands 拓扑）
pub const HAND_LANDMARK_COUNT: usize = 21;

/// 屏幕坐标系下的二维关键点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
  pub x: f32,
  pub y: f32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
}

/// 以手腕为原点的三维关键点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint3D {
  pub x: f32,
  pub y: f32,
  pub z: f32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
}

impl Keypoint3D {
  pub fn to_landmark(&self) -> [f32; 3] {
    [self.x, self.y, self.z]
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handedness {
  Left,
  Right,
}

/// 检测器对单只手在单帧中的输出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandPrediction {
  pub keypoints: Vec<Keypoint>,
  #[serde(
    rename = "keypoints3D",
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub keypoints_3d: Option<Vec<Keypoint3D>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub handedness: Option<Handedness>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub score: Option<f32>,
}

impl HandPrediction {
  /// 按名称查找二维关键点
  pub fn keypoint(&self, name: &str) -> Option<&Keypoint> {
    self
      .keypoints
      .iter()
      .find(|keypoint| keypoint.name.as_deref() == Some(name))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandLandmark {
  Wrist = 0,
  ThumbCmc = 1,
  ThumbMcp = 2,
  ThumbIp = 3,
  ThumbTip = 4,
  IndexFingerMcp = 5,
  IndexFingerPip = 6,
  IndexFingerDip = 7,
  IndexFingerTip = 8,
  MiddleFingerMcp = 9,
  MiddleFingerPip = 10,
  MiddleFingerDip = 11,
  MiddleFingerTip = 12,
  RingFingerMcp = 13,
  RingFingerPip = 14,
  RingFingerDip = 15,
  RingFingerTip = 16,
  PinkyFingerMcp = 17,
  PinkyFingerPip = 18,
  PinkyFingerDip = 19,
  PinkyFingerTip = 20,
}

impl HandLandmark {
  pub const ALL: [HandLandmark; HAND_LANDMARK_COUNT] = [
    HandLandmark::Wrist,
    HandLandmark::ThumbCmc,
    HandLandmark::ThumbMcp,
    HandLandmark::ThumbIp,
    HandLandmark::ThumbTip,
    HandLandmark::IndexFingerMcp,
    HandLandmark::IndexFingerPip,
    HandLandmark::IndexFingerDip,
    HandLandmark::IndexFingerTip,
    HandLandmark::MiddleFingerMcp,
    HandLandmark::MiddleFingerPip,
    HandLandmark::MiddleFingerDip,
    HandLandmark::MiddleFingerTip,
    HandLandmark::RingFingerMcp,
    HandLandmark::RingFingerPip,
    HandLandmark::RingFingerDip,
    HandLandmark::RingFingerTip,
    HandLandmark::PinkyFingerMcp,
    HandLandmark::PinkyFingerPip,
    HandLandmark::PinkyFingerDip,
    HandLandmark::PinkyFingerTip,
  ];

  /// 检测器输出中使用的关键点名称
  pub fn name(self) -> &'static str {
    match self {
      HandLandmark::Wrist => "wrist",
      HandLandmark::ThumbCmc => "thumb_cmc",
      HandLandmark::ThumbMcp => "thumb_mcp",
      HandLandmark::ThumbIp => "thumb_ip",
      HandLandmark::ThumbTip => "thumb_tip",
      HandLandmark::IndexFingerMcp => "index_finger_mcp",
      HandLandmark::IndexFingerPip => "index_finger_pip",
      HandLandmark::IndexFingerDip => "index_finger_dip",
      HandLandmark::IndexFingerTip => "index_finger_tip",
      HandLandmark::MiddleFingerMcp => "middle_finger_mcp",
      HandLandmark::MiddleFingerPip => "middle_finger_pip",
      HandLandmark::MiddleFingerDip => "middle_finger_dip",
      HandLandmark::MiddleFingerTip => "middle_finger_tip",
      HandLandmark::RingFingerMcp => "ring_finger_mcp",
      HandLandmark::RingFingerPip => "ring_finger_pip",
      HandLandmark::RingFingerDip => "ring_finger_dip",
      HandLandmark::RingFingerTip => "ring_finger_tip",
      HandLandmark::PinkyFingerMcp => "pinky_finger_mcp",
      HandLandmark::PinkyFingerPip => "pinky_finger_pip",
      HandLandmark::PinkyFingerDip => "pinky_finger_dip",
      HandLandmark::PinkyFingerTip => "pinky_finger_tip",
    }
  }

  pub fn index(self) -> usize {
    self as usize
  }
}

/// 每根手指从手腕到指尖的关键点索引链
pub const FINGER_LOOKUP_INDEXES: [(&str, [usize; 5]); 5] = [
  ("thumb", [0, 1, 2, 3, 4]),
  ("index_finger", [0, 5, 6, 7, 8]),
  ("middle_finger", [0, 9, 10, 11, 12]),
  ("ring_finger", [0, 13, 14, 15, 16]),
  ("pinky", [0, 17, 18, 19, 20]),
];
