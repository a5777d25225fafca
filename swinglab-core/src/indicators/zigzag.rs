//! Double ZigZag — streaming swing-point detection at two time scales.
//!
//! Each scale keeps a pair of monotonic deques over the last `period`
//! bars: a max-deque over highs and a min-deque over lows. A bar whose
//! high survives as the window maximum (and whose low does not survive as
//! the minimum) is a pivot-high candidate, and vice versa. Candidates are
//! committed into an alternating high/low pivot sequence; a same-direction
//! candidate only strengthens the live tail pivot in place.
//!
//! `update` is amortized O(1): every bar pushes one entry per deque and
//! each entry is popped at most once.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::domain::Kline;
use crate::error::EngineError;

/// The two time scales of the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scale {
    Short,
    Long,
}

impl Scale {
    pub fn prefix(self) -> &'static str {
        match self {
            Scale::Short => "S",
            Scale::Long => "L",
        }
    }
}

/// Swing classification relative to the previous pivot of the same type
/// (two back in the alternating sequence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwingLabel {
    /// Higher high.
    HH,
    /// Lower high.
    LH,
    /// Higher low.
    HL,
    /// Lower low.
    LL,
}

impl fmt::Display for SwingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SwingLabel::HH => "HH",
            SwingLabel::LH => "LH",
            SwingLabel::HL => "HL",
            SwingLabel::LL => "LL",
        };
        f.write_str(s)
    }
}

/// A local extremum in the price series.
///
/// The first two pivots of a sequence carry no label: there is no earlier
/// same-type pivot to compare against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    /// Bar index the pivot currently sits on.
    pub index: usize,
    pub price: Decimal,
    pub label: Option<SwingLabel>,
}

impl SwingPoint {
    /// Scale-prefixed label, e.g. "SHH" or "LLL". Empty when unlabeled.
    pub fn labeled(&self, scale: Scale) -> String {
        match self.label {
            Some(label) => format!("{}{}", scale.prefix(), label),
            None => String::new(),
        }
    }
}

/// One scale's deques, direction, and pivot sequence.
#[derive(Debug, Clone)]
struct ScaleState {
    period: usize,
    pivots: Vec<SwingPoint>,
    /// +1 after a pivot high, -1 after a pivot low, 0 before the first.
    dir: i8,
    max_deque: VecDeque<(usize, Decimal)>,
    min_deque: VecDeque<(usize, Decimal)>,
    /// Push + pop tally, used to check the amortized bound.
    ops: usize,
}

impl ScaleState {
    fn new(period: usize) -> Self {
        Self {
            period,
            pivots: Vec::new(),
            dir: 0,
            max_deque: VecDeque::new(),
            min_deque: VecDeque::new(),
            ops: 0,
        }
    }

    fn update(&mut self, i: usize, kline: &Kline) {
        // Monotonic push: drop dominated tail entries.
        while matches!(self.max_deque.back(), Some(&(_, v)) if v <= kline.high) {
            self.max_deque.pop_back();
            self.ops += 1;
        }
        self.max_deque.push_back((i, kline.high));
        self.ops += 1;

        while matches!(self.min_deque.back(), Some(&(_, v)) if v >= kline.low) {
            self.min_deque.pop_back();
            self.ops += 1;
        }
        self.min_deque.push_back((i, kline.low));
        self.ops += 1;

        // Expire the head once it leaves the window. At most one entry
        // ages out per bar.
        if i >= self.period {
            let window_start = i - self.period + 1;
            if matches!(self.max_deque.front(), Some(&(idx, _)) if idx < window_start) {
                self.max_deque.pop_front();
                self.ops += 1;
            }
            if matches!(self.min_deque.front(), Some(&(idx, _)) if idx < window_start) {
                self.min_deque.pop_front();
                self.ops += 1;
            }
        }

        if i + 1 < self.period {
            return;
        }

        let pivot_high = matches!(self.max_deque.front(), Some(&(idx, _)) if idx == i);
        let pivot_low = matches!(self.min_deque.front(), Some(&(idx, _)) if idx == i);

        // A bar that heads both deques is degenerate; emit nothing.
        match (pivot_high, pivot_low) {
            (true, false) => self.commit(i, kline.high, 1),
            (false, true) => self.commit(i, kline.low, -1),
            _ => {}
        }
    }

    /// Append the candidate if direction flips (committing the previous
    /// tail pivot), or strengthen the tail in place on a strict new
    /// extreme. Equal prices do not move the pivot.
    fn commit(&mut self, index: usize, price: Decimal, new_dir: i8) {
        if self.dir == 0 || new_dir != self.dir {
            self.pivots.push(SwingPoint {
                index,
                price,
                label: None,
            });
            self.dir = new_dir;
        } else {
            let last = self.pivots.last_mut().expect("non-empty after first pivot");
            let strengthens = (new_dir == 1 && price > last.price)
                || (new_dir == -1 && price < last.price);
            if strengthens {
                last.price = price;
                last.index = index;
            } else {
                return;
            }
        }
        self.label_tail();
    }

    /// Compare the tail pivot to the previous pivot of the same type.
    fn label_tail(&mut self) {
        let n = self.pivots.len();
        if n < 3 {
            return;
        }
        let prev_price = self.pivots[n - 3].price;
        let last = &mut self.pivots[n - 1];
        last.label = Some(match (self.dir, last.price > prev_price) {
            (1, true) => SwingLabel::HH,
            (1, false) => SwingLabel::LH,
            (-1, true) => SwingLabel::HL,
            _ => SwingLabel::LL,
        });
    }

    /// Committed pivots: everything before the live tail.
    fn committed(&self) -> &[SwingPoint] {
        let n = self.pivots.len();
        &self.pivots[..n.saturating_sub(1)]
    }

    fn last_committed(&self, n: usize) -> Result<&SwingPoint, EngineError> {
        let committed = self.committed();
        if committed.len() < n + 1 {
            return Err(EngineError::InsufficientData {
                wanted: n + 1,
                have: committed.len(),
            });
        }
        Ok(&committed[committed.len() - 1 - n])
    }
}

/// Swing-point detector at a short and a long period.
#[derive(Debug, Clone)]
pub struct DoubleZigZag {
    short: ScaleState,
    long: ScaleState,
}

impl DoubleZigZag {
    /// Periods are window lengths in bars; both must be at least 2.
    pub fn new(short_period: usize, long_period: usize) -> Self {
        assert!(short_period >= 2, "short period must be >= 2");
        assert!(long_period >= short_period, "long period must be >= short");
        Self {
            short: ScaleState::new(short_period),
            long: ScaleState::new(long_period),
        }
    }

    /// Feed bar `i`. Amortized O(1).
    pub fn update(&mut self, i: usize, kline: &Kline) {
        self.short.update(i, kline);
        self.long.update(i, kline);
    }

    /// Both pivot sequences: (long, short).
    pub fn swing_points(&self) -> (&[SwingPoint], &[SwingPoint]) {
        (&self.long.pivots, &self.short.pivots)
    }

    /// The n-th-from-last committed pivot at one scale (`n = 0` is the
    /// latest committed; the live tail pivot is excluded because a
    /// same-direction extreme can still move it).
    pub fn last_committed(&self, scale: Scale, n: usize) -> Result<&SwingPoint, EngineError> {
        match scale {
            Scale::Short => self.short.last_committed(n),
            Scale::Long => self.long.last_committed(n),
        }
    }

    /// The n-th-from-last committed pivot at each scale: (long, short).
    pub fn last_committed_pair(
        &self,
        n: usize,
    ) -> Result<(&SwingPoint, &SwingPoint), EngineError> {
        Ok((
            self.last_committed(Scale::Long, n)?,
            self.last_committed(Scale::Short, n)?,
        ))
    }

    #[cfg(test)]
    fn deque_ops(&self) -> (usize, usize) {
        (self.short.ops, self.long.ops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn bars_from_closes(closes: &[i64]) -> Vec<Kline> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let c = Decimal::from(c);
                Kline {
                    start: Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()
                        + chrono::Duration::hours(i as i64),
                    open: c,
                    high: c,
                    low: c,
                    close: c,
                    volume: dec!(1),
                }
            })
            .collect()
    }

    fn feed(zz: &mut DoubleZigZag, bars: &[Kline]) {
        for (i, bar) in bars.iter().enumerate() {
            zz.update(i, bar);
        }
    }

    #[test]
    fn detects_alternating_pivots_with_labels() {
        // Golden fixture at P_s = 3: committed pivots 15, 8, then 14.
        let bars = bars_from_closes(&[10, 12, 15, 11, 8, 9, 14, 13]);
        let mut zz = DoubleZigZag::new(3, 6);
        feed(&mut zz, &bars);

        let (_, short) = zz.swing_points();
        let prices: Vec<Decimal> = short.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![dec!(15), dec!(8), dec!(14)]);

        // First two pivots have no same-type predecessor; the third
        // compares against the high two back (14 < 15).
        assert_eq!(short[0].label, None);
        assert_eq!(short[1].label, None);
        assert_eq!(short[2].label, Some(SwingLabel::LH));

        // Extend the series so the down-leg commits a labeled low.
        let more = bars_from_closes(&[10, 12, 15, 11, 8, 9, 14, 13, 10, 6, 7]);
        let mut zz = DoubleZigZag::new(3, 20);
        feed(&mut zz, &more);
        let (_, short) = zz.swing_points();
        let labeled: Vec<(Decimal, String)> = short
            .iter()
            .map(|p| (p.price, p.labeled(Scale::Short)))
            .collect();
        assert_eq!(labeled[2], (dec!(14), "SLH".into()));
        assert_eq!(labeled[3], (dec!(6), "SLL".into()));
    }

    #[test]
    fn same_direction_extreme_updates_in_place() {
        // Rising highs keep strengthening the same tail pivot.
        let bars = bars_from_closes(&[10, 11, 12, 13, 14, 15]);
        let mut zz = DoubleZigZag::new(3, 10);
        feed(&mut zz, &bars);
        let (_, short) = zz.swing_points();
        assert_eq!(short.len(), 1);
        assert_eq!(short[0].price, dec!(15));
        assert_eq!(short[0].index, 5);
    }

    #[test]
    fn equal_price_does_not_move_pivot() {
        // The equal high at index 4 re-heads the max deque but must not
        // move the pivot committed at index 2.
        let bars = bars_from_closes(&[10, 9, 15, 14, 15, 13]);
        let mut zz = DoubleZigZag::new(3, 10);
        feed(&mut zz, &bars);
        let (_, short) = zz.swing_points();
        assert_eq!(short[0].index, 2);
        assert_eq!(short[0].price, dec!(15));
    }

    #[test]
    fn flat_bars_emit_no_pivot() {
        // With O=H=L=C the max and min deque heads collide on every bar.
        let bars = bars_from_closes(&[100, 100, 100, 100, 100]);
        let mut zz = DoubleZigZag::new(3, 4);
        feed(&mut zz, &bars);
        let (long, short) = zz.swing_points();
        assert!(long.is_empty());
        assert!(short.is_empty());
    }

    #[test]
    fn last_committed_excludes_live_tail() {
        let bars = bars_from_closes(&[10, 12, 15, 11, 8, 9, 14, 13]);
        let mut zz = DoubleZigZag::new(3, 20);
        feed(&mut zz, &bars);

        // Short pivots: 15, 8, live tail 14 -> committed are 15, 8.
        let latest = zz.last_committed(Scale::Short, 0).unwrap();
        assert_eq!(latest.price, dec!(8));
        let prev = zz.last_committed(Scale::Short, 1).unwrap();
        assert_eq!(prev.price, dec!(15));
        assert!(matches!(
            zz.last_committed(Scale::Short, 2),
            Err(EngineError::InsufficientData { wanted: 3, have: 2 })
        ));
    }

    #[test]
    fn insufficient_data_before_warmup() {
        let zz = DoubleZigZag::new(3, 6);
        assert!(zz.last_committed(Scale::Long, 0).is_err());
        assert!(zz.last_committed_pair(0).is_err());
    }

    proptest! {
        /// Committed pivots strictly alternate between high-type and
        /// low-type at each scale. Labels encode the type (HH/LH are
        /// highs, HL/LL are lows), so labeled neighbours must alternate
        /// type groups.
        #[test]
        fn committed_pivots_alternate(closes in prop::collection::vec(1i64..1000, 1..200)) {
            let bars = bars_from_closes(&closes);
            let mut zz = DoubleZigZag::new(3, 8);
            feed(&mut zz, &bars);

            let is_high = |l: SwingLabel| matches!(l, SwingLabel::HH | SwingLabel::LH);
            for pivots in [zz.swing_points().0, zz.swing_points().1] {
                for pair in pivots.windows(2) {
                    prop_assert_ne!(pair[0].index, pair[1].index);
                    if let (Some(a), Some(b)) = (pair[0].label, pair[1].label) {
                        prop_assert_ne!(is_high(a), is_high(b), "labels {} and {} do not alternate", a, b);
                    }
                }
            }
        }

        /// Total deque operations over N bars stay within the amortized
        /// bound: <= 4N per scale (2 deques x push+pop <= 2N each).
        #[test]
        fn deque_ops_amortized_bound(closes in prop::collection::vec(1i64..1000, 1..300)) {
            let bars = bars_from_closes(&closes);
            let mut zz = DoubleZigZag::new(3, 8);
            feed(&mut zz, &bars);

            let n = bars.len();
            let (short_ops, long_ops) = zz.deque_ops();
            prop_assert!(short_ops <= 4 * n, "short ops {} > 4N {}", short_ops, 4 * n);
            prop_assert!(long_ops <= 4 * n, "long ops {} > 4N {}", long_ops, 4 * n);
        }
    }

    /// Direction alternation checked against varied OHLC bars, not just
    /// flat closes.
    #[test]
    fn alternation_with_ranged_bars() {
        let closes = [10, 14, 12, 17, 9, 11, 20, 8, 13, 16, 7, 19];
        let bars: Vec<Kline> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let c = Decimal::from(c);
                Kline {
                    start: Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()
                        + chrono::Duration::hours(i as i64),
                    open: c,
                    high: c + dec!(1),
                    low: c - dec!(1),
                    close: c,
                    volume: dec!(1),
                }
            })
            .collect();

        let mut zz = DoubleZigZag::new(3, 5);
        feed(&mut zz, &bars);

        // An alternating sequence makes every middle pivot a strict
        // extreme against both neighbours.
        for pivots in [zz.swing_points().0, zz.swing_points().1] {
            for triple in pivots.windows(3) {
                let a = triple[0].price;
                let b = triple[1].price;
                let c = triple[2].price;
                // Middle pivot is an extreme relative to both neighbours.
                assert!(
                    (b > a && b > c) || (b < a && b < c),
                    "pivot sequence not alternating: {a} {b} {c}"
                );
            }
        }
    }
}
