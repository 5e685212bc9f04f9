// 该文件是 Lianjian （脸检） 项目的一部分。
// src/model/postprocess.rs - 检测结果后处理
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

use tracing::debug;

use crate::model::{DetectResult, Detection, MalformedOutputError, PixelRect, RawDetection};

/// 像素坐标越界时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClampMode {
  /// 限制在 `[0, width] x [0, height]` 内，并保证 min <= max
  #[default]
  Clamp,
  /// 保留原始计算结果，坐标可能为负或超出图像
  Preserve,
}

/// 将网络原始输出转换为像素坐标下的检测结果
///
/// 无内部状态，可在多线程中按图像并行调用。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Postprocessor {
  threshold: f32,
  clamp: ClampMode,
}

impl Postprocessor {
  pub fn new(threshold: f32, clamp: ClampMode) -> Self {
    Self { threshold, clamp }
  }

  /// 仅保留置信度严格大于阈值的行，输出顺序与输入行一致
  pub fn postprocess(
    &self,
    tensor: &[f32],
    image_width: u32,
    image_height: u32,
  ) -> Result<DetectResult, MalformedOutputError> {
    let rows = RawDetection::parse_rows(tensor)?;
    let total = rows.len();

    let items: Vec<Detection> = rows
      .filter(|row| row.confidence > self.threshold)
      .map(|row| Detection {
        confidence: row.confidence,
        rect: self.to_pixel_rect(&row, image_width, image_height),
      })
      .collect();

    debug!(
      "后处理: {} 行原始输出, {} 个高于阈值 {}",
      total,
      items.len(),
      self.threshold
    );

    Ok(items.into())
  }

  fn to_pixel_rect(&self, row: &RawDetection, width: u32, height: u32) -> PixelRect {
    let (w, h) = (width as f32, height as f32);

    // f32::round 为四舍五入（远离零），越界的 as 转换会饱和
    let x_min = (row.x_min * w).round() as i32;
    let y_min = (row.y_min * h).round() as i32;
    let x_max = (row.x_max * w).round() as i32;
    let y_max = (row.y_max * h).round() as i32;

    match self.clamp {
      ClampMode::Preserve => PixelRect::new(x_min, y_min, x_max, y_max),
      ClampMode::Clamp => {
        let (wi, hi) = (width as i32, height as i32);
        let (x0, x1) = (x_min.clamp(0, wi), x_max.clamp(0, wi));
        let (y0, y1) = (y_min.clamp(0, hi), y_max.clamp(0, hi));
        PixelRect::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
      }
    }
  }
}
