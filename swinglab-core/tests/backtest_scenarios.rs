//! End-to-end scenarios driving the dealer and bot together, the way the
//! runner's trial loop does: each bar goes to the dealer first, then the
//! bot.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use swinglab_core::domain::{Asset, Kline, PositionSide, Receiver};
use swinglab_core::error::EngineError;
use swinglab_core::sim::{SimDealer, SimulatedDealer};
use swinglab_core::testkit::{self, ScriptedPredicter};
use swinglab_core::trader::{Bot, FixedSizer, FullRisker, Risker, Sizer, Thresholds};

fn make_bot(scores: Vec<f64>, sizer_capital: Decimal) -> Bot {
    let mut dealer = SimDealer::new();
    dealer
        .set_account_balance(dec!(1000))
        .expect("balance before bars");
    Bot::new(
        Asset::new("BTCUSDT"),
        Box::new(ScriptedPredicter::new(scores)),
        Box::new(FullRisker::new()),
        Box::new(FixedSizer::new(sizer_capital)),
        Box::new(dealer),
    )
    .with_thresholds(Thresholds {
        enter_long: 1.0,
        exit_long: -0.9,
        enter_short: -1.0,
        exit_short: 0.9,
    })
}

fn run(bot: &mut Bot, bars: &[Kline]) {
    for bar in bars {
        bot.dealer_mut().receive_price(bar).unwrap();
        bot.receive_price(bar).unwrap();
    }
}

#[test]
fn flat_market_no_signals() {
    // 100 flat bars, no threshold crossings: nothing happens.
    let bars = testkit::flat_series(100, 100);
    let mut bot = make_bot(vec![0.0; 100], dec!(100));
    run(&mut bot, &bars);

    assert!(bot.dealer().round_turns().is_empty());
    let equity = bot.dealer().equity();
    assert_eq!(equity.len(), 100);
    assert!(equity.amounts().iter().all(|&a| a == dec!(1000)));
}

#[test]
fn one_winning_long() {
    // Entry signal on the second bar fills at the third bar's open
    // (110); exit signal fills at the sixth bar's open (120).
    let bars = testkit::klines_from_closes(&[100, 100, 110, 120, 130, 120, 100]);
    let scores = vec![0.0, 1.0, 1.0, 1.0, -0.9, -0.9, -0.9];
    let mut bot = make_bot(scores, dec!(100));
    run(&mut bot, &bars);

    let turns = bot.dealer().round_turns();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].profit, dec!(10));
    assert_eq!(turns[0].side, PositionSide::Long);
    assert_eq!(turns[0].trade_count, 2);

    let equity = bot.dealer().equity();
    assert_eq!(equity.len(), 7);
    assert_eq!(*equity.last().unwrap().1, dec!(1010));
}

/// Risker with a constant stop distance, for stop-placement scenarios.
struct ConstRisker(Decimal);

impl Receiver for ConstRisker {
    fn receive_price(&mut self, _price: &Kline) -> Result<(), EngineError> {
        Ok(())
    }
}

impl Risker for ConstRisker {
    fn risk(&self) -> Decimal {
        self.0
    }
}

/// Sizer returning a constant size regardless of capital.
struct UnitSizer;

impl Sizer for UnitSizer {
    fn size(&self, _price: Decimal, _capital: Decimal, _risk: Decimal) -> Decimal {
        Decimal::ONE
    }
}

#[test]
fn stop_loss_hit() {
    // Long entered at 110 with a 5-point risk: the bot attaches a stop
    // at 105 once the position is on the ledger. A bar ranging 104..108
    // triggers it at exactly 105 for a -5 round-turn.
    let mut dealer = SimDealer::new();
    dealer.set_account_balance(dec!(1000)).unwrap();
    let mut bot = Bot::new(
        Asset::new("BTCUSDT"),
        Box::new(ScriptedPredicter::new(vec![0.0, 1.0, 1.0, 1.0])),
        Box::new(ConstRisker(dec!(5))),
        Box::new(UnitSizer),
        Box::new(dealer),
    );

    let mut bars = testkit::flat_series(3, 110);
    bars.push(Kline {
        start: testkit::t0() + chrono::Duration::hours(3),
        open: dec!(107),
        high: dec!(108),
        low: dec!(104),
        close: dec!(106),
        volume: dec!(1),
    });
    run(&mut bot, &bars);

    let turns = bot.dealer().round_turns();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].profit, dec!(-5));

    // The stop fill is recorded at the stop price, not the bar open.
    let stop_fill = bot
        .dealer()
        .positions()
        .into_iter()
        .find(|p| !p.is_open())
        .unwrap();
    assert_eq!(stop_fill.entry_price, dec!(110));
    assert_eq!(*bot.dealer().equity().last().unwrap().1, dec!(995));
}

#[test]
fn short_round_turn_profit_sign() {
    // Short entered at 100, covered at 90: +10.
    let bars = testkit::klines_from_closes(&[100, 100, 100, 95, 90, 90, 90]);
    let scores = vec![0.0, -1.0, -1.0, -1.0, 0.9, 0.9, 0.9];
    let mut bot = make_bot(scores, dec!(100));
    run(&mut bot, &bars);

    let turns = bot.dealer().round_turns();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].side, PositionSide::Short);
    assert_eq!(turns[0].profit, dec!(10));
}
