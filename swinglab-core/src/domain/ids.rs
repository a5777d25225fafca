//! Sequential id types for dealer entities.
//!
//! Ids are monotonic by submission order, which is what the simulator's
//! FIFO tie-break keys on. Content-addressed study ids live in the runner.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! seq_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

seq_id!(OrderId);
seq_id!(DealId);

/// Monotonically increasing id generator, one per simulator instance.
#[derive(Debug, Default)]
pub struct IdGen {
    next: u64,
}

impl IdGen {
    pub fn next_order_id(&mut self) -> OrderId {
        let id = OrderId(self.next);
        self.next += 1;
        id
    }

    pub fn next_deal_id(&mut self) -> DealId {
        let id = DealId(self.next);
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_gen_is_monotonic() {
        let mut gen = IdGen::default();
        let a = gen.next_order_id();
        let b = gen.next_order_id();
        assert!(b.0 > a.0);
    }

    #[test]
    fn ids_order_by_submission() {
        let mut gen = IdGen::default();
        let ids: Vec<OrderId> = (0..5).map(|_| gen.next_order_id()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }
}
