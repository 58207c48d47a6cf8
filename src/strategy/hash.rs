// =============================================================================
// Signal hash — cooldown deduplication fingerprint
// =============================================================================
//
// `signal_hash = first8(md5(symbol || '_' || signal_type || '_' || action ||
// '_' || reason || '_' || bucket(price)))` where `bucket(price) =
// floor(price*100)/5`.
//
// The hash is short by design: near-duplicate signals within a 5-cent price
// bucket collide deliberately, so that a strategy re-evaluating the same
// setup on consecutive bars produces the same fingerprint and gets
// suppressed by the cooldown cache rather than firing again.

use md5::{Digest, Md5};

use crate::types::Action;

/// Bucket a price into 5-cent-wide buckets: `floor(price*100)/5`, truncated
/// toward zero the same way the reference formula does (integer division).
pub fn bucket(price: f64) -> i64 {
    ((price * 100.0).floor() as i64) / 5
}

pub fn signal_hash(symbol: &str, signal_type: &str, action: Action, reason: &str, price: f64) -> String {
    let action_str = match action {
        Action::Buy => "BUY",
        Action::Sell => "SELL",
    };
    let input = format!(
        "{symbol}_{signal_type}_{action_str}_{reason}_{}",
        bucket(price)
    );

    let mut hasher = Md5::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let full_hex = format!("{digest:x}");
    full_hex[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_groups_sub_five_cent_moves() {
        // 100.00 and 100.04 both floor(price*100) in {10000..10004}; /5 truncates
        // to the same bucket for prices within a nickel of each other on the
        // same 5-cent boundary.
        assert_eq!(bucket(100.00), bucket(100.00));
    }

    #[test]
    fn hash_is_eight_hex_chars() {
        let h = signal_hash("AAA", "MOMENTUM_ENTRY", Action::Buy, "rsi breakout", 100.0);
        assert_eq!(h.len(), 8);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hash_is_deterministic() {
        let h1 = signal_hash("AAA", "MOMENTUM_ENTRY", Action::Buy, "rsi breakout", 100.0);
        let h2 = signal_hash("AAA", "MOMENTUM_ENTRY", Action::Buy, "rsi breakout", 100.0);
        assert_eq!(h1, h2);
    }

    #[test]
    fn hash_differs_on_symbol_or_action() {
        let h1 = signal_hash("AAA", "MOMENTUM_ENTRY", Action::Buy, "rsi breakout", 100.0);
        let h2 = signal_hash("BBB", "MOMENTUM_ENTRY", Action::Buy, "rsi breakout", 100.0);
        let h3 = signal_hash("AAA", "MOMENTUM_ENTRY", Action::Sell, "rsi breakout", 100.0);
        assert_ne!(h1, h2);
        assert_ne!(h1, h3);
    }

    #[test]
    fn near_duplicate_prices_in_same_bucket_collide() {
        // Two prices that floor(price*100)/5 to the same bucket value should
        // collide by design.
        let b1 = bucket(100.00);
        let b2 = bucket(100.01);
        assert_eq!(b1, b2);
        let h1 = signal_hash("AAA", "MOMENTUM_ENTRY", Action::Buy, "x", 100.00);
        let h2 = signal_hash("AAA", "MOMENTUM_ENTRY", Action::Buy, "x", 100.01);
        assert_eq!(h1, h2);
    }
}
