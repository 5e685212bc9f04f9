// 该文件是 Lianjian （脸检） 项目的一部分。
// src/bin/face_oneshot.rs - 单张图像人脸检测
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

use anyhow::Result;
use clap::Parser;
use url::Url;

use lianjian::{
  FromUrl,
  input::ImageFileInput,
  model::{ClampMode, FaceDetectorBuilder},
  output::SaveImageFileOutput,
  task::{OneShotTask, Task},
};
use tracing::info;

/// Lianjian 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型描述: onnx:<拓扑>?weights=<权重>[&width=&height=&channels=bgr|rgb]
  #[arg(
    long,
    value_name = "MODEL",
    default_value = "onnx:face-detection-retail-0005.onnx?weights=face-detection-retail-0005.bin"
  )]
  pub model: Url,
  /// 输入图像: image:<路径>
  #[arg(long, value_name = "SOURCE", default_value = "image:face-1.jpg")]
  pub input: Url,
  /// 输出目录: folder:<目录>[?prefix=test]
  #[arg(long, value_name = "OUTPUT", default_value = "folder:.")]
  pub output: Url,
  /// 置信度阈值 (0.0 - 1.0)，严格大于才保留
  #[arg(long, default_value = "0.5", value_name = "THRESHOLD")]
  pub confidence: f32,
  /// 不将检测框限制在图像范围内
  #[arg(long)]
  pub no_clamp: bool,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);
  info!("置信度阈值: {}", args.confidence);

  let clamp = if args.no_clamp {
    ClampMode::Preserve
  } else {
    ClampMode::Clamp
  };

  // 图像缺失时在加载模型之前失败
  let input_image = ImageFileInput::from_url(&args.input)?;
  let model = FaceDetectorBuilder::from_url(&args.model)?
    .threshold(args.confidence)
    .clamp(clamp)
    .build()?;
  let output = SaveImageFileOutput::from_url(&args.output)?;

  let result = OneShotTask.run_task(input_image, model, output)?;
  info!("检测到 {} 张人脸", result.len());

  Ok(())
}
