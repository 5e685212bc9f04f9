// 该文件是 Lianjian （脸检） 项目的一部分。
// src/frame.rs - NCHW 帧定义
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

use std::str::FromStr;

use image::{RgbImage, imageops::FilterType};
use thiserror::Error;

const COLOR_CHANNELS: usize = 3;

/// 模型期望的通道顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
  /// OpenCV 风格的 BGR 平面
  #[default]
  Bgr,
  Rgb,
}

impl ChannelOrder {
  fn source_channel(self, c: usize) -> usize {
    match self {
      ChannelOrder::Bgr => COLOR_CHANNELS - 1 - c,
      ChannelOrder::Rgb => c,
    }
  }
}

impl FromStr for ChannelOrder {
  type Err = FrameError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "bgr" => Ok(ChannelOrder::Bgr),
      "rgb" => Ok(ChannelOrder::Rgb),
      other => Err(FrameError::UnknownChannelOrder(other.to_string())),
    }
  }
}

#[derive(Error, Debug)]
pub enum FrameError {
  #[error("未知的通道顺序: {0}")]
  UnknownChannelOrder(String),
}

/// 模型输入帧，布局为 1x3xHxW 的 u8 张量
#[derive(Debug, Clone)]
pub struct NchwFrame {
  width: u32,
  height: u32,
  data: Box<[u8]>,
}

impl NchwFrame {
  /// 缩放到目标尺寸并按通道拆分为平面
  pub fn from_image(image: &RgbImage, width: u32, height: u32, order: ChannelOrder) -> Self {
    let resized;
    let source = if image.dimensions() == (width, height) {
      image
    } else {
      resized = image::imageops::resize(image, width, height, FilterType::Triangle);
      &resized
    };

    let plane = width as usize * height as usize;
    let mut data = vec![0u8; COLOR_CHANNELS * plane];
    for (x, y, pixel) in source.enumerate_pixels() {
      let idx = y as usize * width as usize + x as usize;
      for c in 0..COLOR_CHANNELS {
        data[c * plane + idx] = pixel[order.source_channel(c)];
      }
    }

    Self {
      width,
      height,
      data: data.into_boxed_slice(),
    }
  }

  pub fn width(&self) -> usize {
    self.width as usize
  }

  pub fn height(&self) -> usize {
    self.height as usize
  }

  pub fn channels(&self) -> usize {
    COLOR_CHANNELS
  }

  pub fn as_nchw(&self) -> &[u8] {
    &self.data
  }
}
