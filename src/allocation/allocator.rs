// src/allocation/allocator.rs

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::campaign::CampaignAdLink;

/// 随机数来源，测试中可以替换成固定序列
pub trait RandomSource {
    /// 返回闭区间 [low, high] 内均匀分布的整数
    fn next_in_range(&mut self, low: u64, high: u64) -> u64;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_in_range(&mut self, low: u64, high: u64) -> u64 {
        (**self).next_in_range(low, high)
    }
}

/// 线程本地随机数（生产环境）
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_in_range(&mut self, low: u64, high: u64) -> u64 {
        rand::thread_rng().gen_range(low..=high)
    }
}

/// 固定种子的随机数，结果可复现
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl RandomSource for SeededRandom {
    fn next_in_range(&mut self, low: u64, high: u64) -> u64 {
        self.rng.gen_range(low..=high)
    }
}

/// 权重总和。单个权重为 u32，累加到 u64 不会溢出
pub fn total_weight(links: &[CampaignAdLink]) -> u64 {
    links.iter().map(|link| u64::from(link.weight)).sum()
}

/// **按抽取值在累计权重上行走**
///
/// 返回第一个累计权重严格大于 `draw` 的广告。抽取区间是 [0, total] 闭区间，
/// `draw == total` 时没有累计值能严格大于它，此时落到最后一个权重非零的广告上，
/// 所以该广告比权重多一次命中机会。总权重为 0 或 `draw` 超出区间时返回 `None`。
pub fn pick(links: &[CampaignAdLink], draw: u64) -> Option<&CampaignAdLink> {
    let mut running = 0u64;
    for link in links {
        running += u64::from(link.weight);
        if running > draw {
            return Some(link);
        }
    }
    if running > 0 && draw == running {
        return links.iter().rev().find(|link| link.weight > 0);
    }
    None
}

/// 加权随机选择一个广告；`None` 表示没有选中任何广告（总权重为 0 或列表为空）
pub fn allocate<'a, R: RandomSource + ?Sized>(
    links: &'a [CampaignAdLink],
    rng: &mut R,
) -> Option<&'a CampaignAdLink> {
    let total = total_weight(links);
    if total == 0 {
        return None;
    }
    let draw = rng.next_in_range(0, total);
    pick(links, draw)
}
