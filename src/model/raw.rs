// 该文件是 Lianjian （脸检） 项目的一部分。
// src/model/raw.rs - 网络原始输出记录
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

use thiserror::Error;

/// 每条原始检测记录的字段数
pub const RAW_DETECTION_FIELDS: usize = 7;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("模型输出长度 {len} 不是 {RAW_DETECTION_FIELDS} 的整数倍")]
pub struct MalformedOutputError {
  pub len: usize,
}

/// DetectionOutput 层的一行：`[image_id, label, conf, x_min, y_min, x_max, y_max]`
///
/// 坐标为相对图像宽高的归一化值。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
  pub image_id: f32,
  pub label: f32,
  pub confidence: f32,
  pub x_min: f32,
  pub y_min: f32,
  pub x_max: f32,
  pub y_max: f32,
}

impl From<&[f32; RAW_DETECTION_FIELDS]> for RawDetection {
  fn from(row: &[f32; RAW_DETECTION_FIELDS]) -> Self {
    let [image_id, label, confidence, x_min, y_min, x_max, y_max] = *row;
    Self {
      image_id,
      label,
      confidence,
      x_min,
      y_min,
      x_max,
      y_max,
    }
  }
}

impl RawDetection {
  /// 按行解析平铺缓冲区，长度不对齐时整体失败
  pub fn parse_rows(
    tensor: &[f32],
  ) -> Result<impl ExactSizeIterator<Item = RawDetection> + '_, MalformedOutputError> {
    let (rows, rest) = tensor.as_chunks::<RAW_DETECTION_FIELDS>();
    if !rest.is_empty() {
      return Err(MalformedOutputError { len: tensor.len() });
    }

    Ok(rows.iter().map(RawDetection::from))
  }
}
