use std::time::Duration;

use chrono::{Local, NaiveDateTime, TimeDelta, Timelike};

/// 現在時刻の取得元
pub trait Clock {
    /// ローカル時刻（タイムゾーンなし）
    fn now(&self) -> NaiveDateTime;
}

/// システムのローカル時刻
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

/// 次のスキャン時刻の基準
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScheduleAnchor {
    /// 0時からの経過秒が間隔の倍数になる時刻 (60秒なら毎分0秒)
    Grid,
    /// 直前のスキャン開始時刻（秒切り捨て）+ 間隔
    #[default]
    LastScan,
}

/// 秒未満を切り捨てる
pub fn floor_to_second(now: NaiveDateTime) -> NaiveDateTime {
    now.with_nanosecond(0).unwrap_or(now)
}

/// `now` から `target` までの待ち時間。過ぎていれば 0
pub fn pause_until(target: NaiveDateTime, now: NaiveDateTime) -> Duration {
    (target - now).to_std().unwrap_or(Duration::ZERO)
}

/// 次の間隔境界までの待ち時間（既定の基準: 秒切り捨て + 間隔）
pub fn pause_until_next_boundary(now: NaiveDateTime, interval_seconds: u32) -> Duration {
    ScheduleClock::new(interval_seconds, ScheduleAnchor::default()).pause_until_next_boundary(now)
}

/// スキャン間隔の計算
///
/// スキャン開始時刻から次の境界を求め、処理にかかった時間を差し引いて待つことで
/// 1回分の処理遅延を次の待ち時間で吸収します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleClock {
    interval_seconds: u32,
    anchor: ScheduleAnchor,
}

impl ScheduleClock {
    pub fn new(interval_seconds: u32, anchor: ScheduleAnchor) -> Self {
        Self {
            interval_seconds: interval_seconds.max(1),
            anchor,
        }
    }

    pub fn interval_seconds(&self) -> u32 {
        self.interval_seconds
    }

    pub fn anchor(&self) -> ScheduleAnchor {
        self.anchor
    }

    /// `now` より後の最初の境界
    pub fn next_boundary(&self, now: NaiveDateTime) -> NaiveDateTime {
        let floor = floor_to_second(now);
        let interval = i64::from(self.interval_seconds);

        let base = match self.anchor {
            ScheduleAnchor::Grid => {
                let offset = i64::from(floor.num_seconds_from_midnight()) % interval;
                floor - TimeDelta::seconds(offset)
            }
            ScheduleAnchor::LastScan => floor,
        };

        base + TimeDelta::seconds(interval)
    }

    pub fn pause_until_next_boundary(&self, now: NaiveDateTime) -> Duration {
        pause_until(self.next_boundary(now), now)
    }
}
