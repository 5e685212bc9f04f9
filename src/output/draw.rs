// 该文件是 Lianjian （脸检） 项目的一部分。
// src/output/draw.rs - 检测结果可视化
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

use image::{Rgb, RgbImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};

use crate::model::{DetectResult, PixelRect};

const BOX_COLOR: [u8; 3] = [0, 255, 0]; // 绿色

/// 在图像上绘制空心检测框
#[derive(Debug, Clone)]
pub struct Draw {
  color: Rgb<u8>,
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      color: Rgb(BOX_COLOR),
    }
  }
}

impl Draw {
  /// 两个角点都包含在框内，超出图像的部分被裁掉
  pub fn draw_rect(&self, image: &mut RgbImage, rect: &PixelRect) {
    // 收缩到图像外一像素以内，不可见的边仍然不可见
    let (w, h) = (image.width() as i32, image.height() as i32);
    let (x0, x1) = (rect.x_min.clamp(-1, w), rect.x_max.clamp(-1, w));
    let (y0, y1) = (rect.y_min.clamp(-1, h), rect.y_max.clamp(-1, h));

    let width = x0.abs_diff(x1) + 1;
    let height = y0.abs_diff(y1) + 1;
    let rect = Rect::at(x0.min(x1), y0.min(y1)).of_size(width, height);

    draw_hollow_rect_mut(image, rect, self.color);
  }

  pub fn draw_detections(&self, image: &mut RgbImage, result: &DetectResult) {
    for item in result.iter() {
      self.draw_rect(image, &item.rect);
    }
  }

  pub fn draw_detection(&self, image: &RgbImage, result: &DetectResult) -> RgbImage {
    let mut output = image.clone();
    self.draw_detections(&mut output, result);
    output
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::Detection;

  const GREEN: Rgb<u8> = Rgb([0, 255, 0]);

  fn result_of(rects: &[PixelRect]) -> DetectResult {
    rects
      .iter()
      .map(|&rect| Detection {
        confidence: 0.9,
        rect,
      })
      .collect::<Vec<_>>()
      .into()
  }

  #[test]
  fn outline_only() {
    let image = RgbImage::new(5, 5);
    let out = Draw::default().draw_detection(&image, &result_of(&[PixelRect::new(0, 0, 4, 4)]));
    assert_eq!(*out.get_pixel(0, 0), GREEN);
    assert_eq!(*out.get_pixel(4, 4), GREEN);
    assert_eq!(*out.get_pixel(2, 0), GREEN);
    assert_eq!(*out.get_pixel(0, 2), GREEN);
    assert_eq!(*out.get_pixel(2, 2), Rgb([0, 0, 0]));
  }

  #[test]
  fn two_by_two_block_is_fully_outlined() {
    let image = RgbImage::new(2, 2);
    let out = Draw::default().draw_detection(&image, &result_of(&[PixelRect::new(0, 0, 1, 1)]));
    assert!(out.pixels().all(|p| *p == GREEN));
  }

  #[test]
  fn empty_result_is_noop() {
    let image = RgbImage::from_fn(3, 3, |x, y| Rgb([x as u8, y as u8, 7]));
    let out = Draw::default().draw_detection(&image, &DetectResult::default());
    assert_eq!(out, image);
  }

  #[test]
  fn out_of_bounds_rect_is_clipped() {
    let image = RgbImage::new(4, 4);
    let out = Draw::default().draw_detection(&image, &result_of(&[PixelRect::new(-3, 1, 10, 2)]));
    assert_eq!(*out.get_pixel(0, 1), GREEN);
    assert_eq!(*out.get_pixel(3, 2), GREEN);
    assert_eq!(*out.get_pixel(0, 0), Rgb([0, 0, 0]));
  }
}
