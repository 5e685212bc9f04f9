// 该文件是 Lianjian （脸检） 项目的一部分。
// src/task.rs - 任务流程
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

use std::time::Instant;

use anyhow::Context;
use tracing::{debug, info};

use crate::{model::Model, output::Render};

pub trait Task<I, M, O>: Sized {
  type Output;
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<Self::Output, Self::Error>;
}

/// 对第一帧推理并渲染，返回推理结果
///
/// 多余的输入帧不会被读取。
pub struct OneShotTask;

impl<
  F,
  D,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Output = D;
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<D, Self::Error> {
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    debug!("输入帧获取成功");

    let started = Instant::now();
    let result = model.infer(&frame).context("推理失败")?;
    let inferred = started.elapsed();

    output
      .render_result(&frame, &result)
      .context("结果输出失败")?;
    info!(
      "单帧任务完成: 推理 {:.2?}, 合计 {:.2?}",
      inferred,
      started.elapsed()
    );

    Ok(result)
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;
  use std::convert::Infallible;

  use super::*;

  struct Doubler;

  impl Model for Doubler {
    type Input = u32;
    type Output = u32;
    type Error = Infallible;

    fn infer(&self, input: &u32) -> Result<u32, Infallible> {
      Ok(input * 2)
    }
  }

  #[derive(Default)]
  struct Collect(RefCell<Vec<(u32, u32)>>);

  impl Render<u32, u32> for &Collect {
    type Error = Infallible;

    fn render_result(&self, frame: &u32, result: &u32) -> Result<(), Infallible> {
      self.0.borrow_mut().push((*frame, *result));
      Ok(())
    }
  }

  #[test]
  fn runs_only_first_frame() {
    let sink = Collect::default();
    let result = OneShotTask
      .run_task(vec![3u32, 4].into_iter(), Doubler, &sink)
      .unwrap();
    assert_eq!(result, 6);
    assert_eq!(*sink.0.borrow(), vec![(3, 6)]);
  }

  #[test]
  fn empty_input_is_error() {
    let sink = Collect::default();
    let err = OneShotTask
      .run_task(std::iter::empty::<u32>(), Doubler, &sink)
      .unwrap_err();
    assert!(err.to_string().contains("没有输入帧"));
    assert!(sink.0.borrow().is_empty());
  }

  struct Refuse;

  impl Render<u32, u32> for Refuse {
    type Error = std::io::Error;

    fn render_result(&self, _frame: &u32, _result: &u32) -> Result<(), std::io::Error> {
      Err(std::io::Error::other("磁盘已满"))
    }
  }

  #[test]
  fn render_failure_is_reported_with_context() {
    let err = OneShotTask
      .run_task(vec![1u32].into_iter(), Doubler, Refuse)
      .unwrap_err();
    assert!(err.to_string().contains("结果输出失败"));
    assert!(format!("{:#}", err).contains("磁盘已满"));
  }
}
