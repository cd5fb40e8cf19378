// src/selection/selector.rs

use std::time::Duration;

use rand::Rng;
use serde::Serialize;

use crate::catalog::Creative;

/// 搜索时如何计算素材时长
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// 按毫秒精确计算
    #[default]
    Exact,
    /// 先把每个素材的时长截断到整秒再计算，不改变素材本身的时长
    TruncateToSeconds,
}

impl RoundingMode {
    /// 搜索中使用的时长（毫秒）
    pub fn accounted_millis(self, duration: Duration) -> u64 {
        match self {
            RoundingMode::Exact => u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            RoundingMode::TruncateToSeconds => duration.as_secs().saturating_mul(1000),
        }
    }
}

/// 多个子集 slack 相同时的选择方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// 在所有最优子集中等概率随机选一个
    #[default]
    Random,
    /// 取深度优先遍历中遇到的第一个最优子集
    First,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionPolicy {
    pub rounding: RoundingMode,
    pub tie_break: TieBreak,
}

/// **候选素材组合**
///
/// 素材互不重复，顺序与素材库顺序一致。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate<'a> {
    creatives: Vec<&'a Creative>,
    slack: Duration,
}

impl<'a> Candidate<'a> {
    pub fn creatives(&self) -> &[&'a Creative] {
        &self.creatives
    }

    /// 预算减去（按 RoundingMode 计算的）总时长，恒为非负
    pub fn slack(&self) -> Duration {
        self.slack
    }

    /// 素材真实时长之和
    pub fn total_duration(&self) -> Duration {
        self.creatives.iter().map(|c| c.duration()).sum()
    }
}

/// 选片结果：slack 最小的候选组合，以及打平的最优组合个数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<'a> {
    pub candidate: Candidate<'a>,
    pub tied: usize,
}

/// **在预算内挑选总时长最接近预算的素材组合**
///
/// 预算为零、素材库为空或任何单个素材都放不下时返回 `None`。
pub fn select<'a>(catalog: &'a [Creative], budget: Duration, policy: SelectionPolicy) -> Option<Selection<'a>> {
    select_with_rng(catalog, budget, policy, &mut rand::thread_rng())
}

/// 与 [`select`] 相同，但使用调用方提供的随机数生成器
pub fn select_with_rng<'a, R: Rng + ?Sized>(
    catalog: &'a [Creative],
    budget: Duration,
    policy: SelectionPolicy,
    rng: &mut R,
) -> Option<Selection<'a>> {
    let budget_ms = RoundingMode::Exact.accounted_millis(budget);
    if budget_ms == 0 || catalog.is_empty() {
        return None;
    }

    let mut search = Search {
        accounted: catalog
            .iter()
            .map(|c| policy.rounding.accounted_millis(c.duration()))
            .collect(),
        tie_break: policy.tie_break,
        rng,
        current: Vec::with_capacity(catalog.len()),
        best: None,
        tied: 0,
    };
    search.visit(0, budget_ms);

    let (slack_ms, indices) = search.best?;
    Some(Selection {
        candidate: Candidate {
            creatives: indices.into_iter().map(|i| &catalog[i]).collect(),
            slack: Duration::from_millis(slack_ms),
        },
        tied: search.tied,
    })
}

/// 深度优先枚举子集的状态
///
/// `current` 保存当前分支的素材下标，回溯时弹出最后一个。
/// 打平的最优子集用蓄水池抽样替换，等价于收集全部后均匀随机选取。
struct Search<'r, R: ?Sized> {
    accounted: Vec<u64>,
    tie_break: TieBreak,
    rng: &'r mut R,
    current: Vec<usize>,
    best: Option<(u64, Vec<usize>)>,
    tied: usize,
}

impl<R: Rng + ?Sized> Search<'_, R> {
    fn visit(&mut self, start: usize, remaining: u64) {
        if !self.current.is_empty() {
            self.record(remaining);
        }
        for i in start..self.accounted.len() {
            // 时长非负，超出预算的分支不可能再变得可行
            let Some(next) = remaining.checked_sub(self.accounted[i]) else {
                continue;
            };
            self.current.push(i);
            self.visit(i + 1, next);
            self.current.pop();
        }
    }

    fn record(&mut self, slack: u64) {
        let best_slack = self.best.as_ref().map(|(best, _)| *best);
        match best_slack {
            Some(best) if slack > best => {}
            Some(best) if slack == best => {
                self.tied += 1;
                if self.tie_break == TieBreak::Random && self.rng.gen_range(0..self.tied) == 0 {
                    if let Some((_, subset)) = self.best.as_mut() {
                        subset.clone_from(&self.current);
                    }
                }
            }
            _ => {
                self.best = Some((slack, self.current.clone()));
                self.tied = 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, CatalogBuilder, CreativeId};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn catalog_of(durations_ms: &[u64]) -> Catalog {
        let mut builder = CatalogBuilder::new();
        for (i, ms) in durations_ms.iter().enumerate() {
            builder.push(&format!("ad{}.mp4", i + 1), 640, 360, Duration::from_millis(*ms));
        }
        builder.build()
    }

    fn ids(selection: &Selection<'_>) -> Vec<CreativeId> {
        selection.candidate.creatives().iter().map(|c| c.id()).collect()
    }

    const FIRST: SelectionPolicy = SelectionPolicy {
        rounding: RoundingMode::Exact,
        tie_break: TieBreak::First,
    };

    #[test]
    fn exact_fit_is_preferred_over_positive_slack() {
        let catalog = catalog_of(&[10_000, 15_000, 20_000]);

        let selection = select(catalog.creatives(), Duration::from_secs(30), FIRST).unwrap();
        assert_eq!(ids(&selection), vec![1, 3]);
        assert_eq!(selection.candidate.slack(), Duration::ZERO);

        let selection = select(catalog.creatives(), Duration::from_secs(35), SelectionPolicy::default()).unwrap();
        assert_eq!(ids(&selection), vec![2, 3]);
        assert_eq!(selection.candidate.slack(), Duration::ZERO);
        assert_eq!(selection.tied, 1);
    }

    #[test]
    fn picks_minimal_positive_slack_when_no_exact_fit() {
        let catalog = catalog_of(&[10_000, 15_000, 20_000]);
        let selection = select(catalog.creatives(), Duration::from_secs(28), FIRST).unwrap();
        assert_eq!(ids(&selection), vec![1, 2]);
        assert_eq!(selection.candidate.slack(), Duration::from_secs(3));
        assert_eq!(selection.candidate.total_duration(), Duration::from_secs(25));
    }

    #[test]
    fn budget_below_every_creative_is_infeasible() {
        let catalog = catalog_of(&[10_000, 12_000, 30_000]);
        assert!(select(catalog.creatives(), Duration::from_secs(5), SelectionPolicy::default()).is_none());
    }

    #[test]
    fn empty_catalog_and_zero_budget_are_infeasible() {
        assert!(select(&[], Duration::from_secs(30), SelectionPolicy::default()).is_none());

        let catalog = catalog_of(&[0, 1_000]);
        assert!(select(catalog.creatives(), Duration::ZERO, SelectionPolicy::default()).is_none());
    }

    #[test]
    fn truncation_admits_creatives_rejected_by_exact_accounting() {
        let catalog = catalog_of(&[10_900]);
        let budget = Duration::from_secs(10);

        assert!(select(catalog.creatives(), budget, FIRST).is_none());

        let truncating = SelectionPolicy {
            rounding: RoundingMode::TruncateToSeconds,
            tie_break: TieBreak::First,
        };
        let selection = select(catalog.creatives(), budget, truncating).unwrap();
        assert_eq!(ids(&selection), vec![1]);
        assert_eq!(selection.candidate.slack(), Duration::ZERO);
        // 素材本身的时长不受截断影响
        assert_eq!(selection.candidate.total_duration(), Duration::from_millis(10_900));
    }

    #[test]
    fn first_tie_break_returns_first_subset_in_search_order() {
        let catalog = catalog_of(&[10_000, 10_000, 5_000, 5_000]);
        for _ in 0..20 {
            let selection = select(catalog.creatives(), Duration::from_secs(10), FIRST).unwrap();
            assert_eq!(ids(&selection), vec![1]);
            assert_eq!(selection.tied, 3);
        }
    }

    #[test]
    fn random_tie_break_reaches_every_optimal_subset() {
        let catalog = catalog_of(&[10_000, 10_000, 5_000, 5_000]);
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = HashSet::new();
        for _ in 0..300 {
            let selection =
                select_with_rng(catalog.creatives(), Duration::from_secs(10), SelectionPolicy::default(), &mut rng)
                    .unwrap();
            assert_eq!(selection.candidate.slack(), Duration::ZERO);
            assert_eq!(selection.tied, 3);
            seen.insert(ids(&selection));
        }
        let expected: HashSet<Vec<CreativeId>> = [vec![1], vec![2], vec![3, 4]].into_iter().collect();
        assert_eq!(seen, expected);
    }

    /// 枚举所有非空子集，返回最小 slack
    fn brute_force_min_slack(durations_ms: &[u64], budget_ms: u64, rounding: RoundingMode) -> Option<u64> {
        if budget_ms == 0 {
            return None;
        }
        (1u32..(1 << durations_ms.len()))
            .filter_map(|mask| {
                let total: u64 = durations_ms
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, ms)| rounding.accounted_millis(Duration::from_millis(*ms)))
                    .sum();
                budget_ms.checked_sub(total)
            })
            .min()
    }

    fn rounding_strategy() -> impl Strategy<Value = RoundingMode> {
        prop_oneof![Just(RoundingMode::Exact), Just(RoundingMode::TruncateToSeconds)]
    }

    fn tie_break_strategy() -> impl Strategy<Value = TieBreak> {
        prop_oneof![Just(TieBreak::Random), Just(TieBreak::First)]
    }

    proptest! {
        #[test]
        fn selection_is_optimal_and_within_budget(
            durations in prop::collection::vec(1u64..30_000, 0..10),
            budget_ms in 0u64..90_000,
            rounding in rounding_strategy(),
            tie_break in tie_break_strategy(),
        ) {
            let catalog = catalog_of(&durations);
            let policy = SelectionPolicy { rounding, tie_break };
            let result = select(catalog.creatives(), Duration::from_millis(budget_ms), policy);
            let oracle = brute_force_min_slack(&durations, budget_ms, rounding);

            prop_assert_eq!(result.as_ref().map(|s| s.candidate.slack().as_millis() as u64), oracle);

            if let Some(selection) = result {
                let chosen = ids(&selection);
                prop_assert!(!chosen.is_empty());
                // 素材不重复且保持素材库顺序
                prop_assert!(chosen.windows(2).all(|w| w[0] < w[1]));
                let accounted: u64 = selection
                    .candidate
                    .creatives()
                    .iter()
                    .map(|c| rounding.accounted_millis(c.duration()))
                    .sum();
                prop_assert_eq!(accounted + selection.candidate.slack().as_millis() as u64, budget_ms);
                prop_assert!(selection.tied >= 1);
            }
        }

        #[test]
        fn budgets_at_or_above_the_shortest_creative_are_feasible(
            durations in prop::collection::vec(1u64..30_000, 1..10),
            extra_ms in 0u64..30_000,
        ) {
            let catalog = catalog_of(&durations);
            let shortest = durations.iter().copied().min().unwrap_or_default();
            let budget = Duration::from_millis(shortest + extra_ms);
            prop_assert!(select(catalog.creatives(), budget, SelectionPolicy::default()).is_some());

            let below = Duration::from_millis(shortest - 1);
            prop_assert!(select(catalog.creatives(), below, SelectionPolicy::default()).is_none());
        }
    }
}
