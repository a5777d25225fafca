//! Sizers — convert (price, capital, risk) into an order size.

use rust_decimal::Decimal;

use crate::dec;

/// Position sizing contract. `price` is the intended entry price,
/// `capital` the current account equity, `risk` the stop distance per
/// unit from the risker. Implementations return zero when they cannot
/// produce a sane size.
pub trait Sizer: Send {
    fn size(&self, price: Decimal, capital: Decimal, risk: Decimal) -> Decimal;
}

/// Commits a fixed capital amount per entry: size = capital / price.
#[derive(Debug, Clone, Copy)]
pub struct FixedSizer {
    pub capital: Decimal,
}

impl FixedSizer {
    pub fn new(capital: Decimal) -> Self {
        Self { capital }
    }
}

impl Sizer for FixedSizer {
    fn size(&self, price: Decimal, _capital: Decimal, _risk: Decimal) -> Decimal {
        if price <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.capital / price
    }
}

/// Fixed-fraction sizing with capital-growth damping.
///
/// Risks `f * scale_f` of current capital per unit of stop distance,
/// scaled by the square root of the account's growth over its initial
/// capital. The growth factor is the one place floats enter the money
/// path; the result is converted back to decimal at the end.
#[derive(Debug, Clone, Copy)]
pub struct SafeFSizer {
    pub initial_capital: Decimal,
    pub f: f64,
    pub scale_f: f64,
}

impl SafeFSizer {
    pub fn new(initial_capital: Decimal, f: f64, scale_f: f64) -> Self {
        Self {
            initial_capital,
            f,
            scale_f,
        }
    }
}

impl Sizer for SafeFSizer {
    fn size(&self, _price: Decimal, capital: Decimal, risk: Decimal) -> Decimal {
        if risk <= Decimal::ZERO || capital <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let mut sqrt_growth = 1.0_f64;
        let profit = capital - self.initial_capital;
        if profit > Decimal::ZERO {
            let growth = 1.0 + dec::to_f64(profit / capital);
            sqrt_growth = growth.sqrt();
        }
        let safe_f = self.f * self.scale_f * sqrt_growth;
        let margin = dec::to_f64(capital) * safe_f;

        dec::from_f64(margin / dec::to_f64(risk))
    }
}
