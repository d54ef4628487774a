//! Money and loyalty-point conversion rules.
//!
//! All amounts are integer minor units (cents). Points are integral and
//! convert at a fixed rate; both rules are shared by checkout and the
//! loyalty ledger so they can never drift apart.

/// Monetary amount in minor units.
pub type Amount = i64;

/// Loyalty point count.
pub type Points = i64;

/// Minor units of spend required to earn one point.
pub const EARN_THRESHOLD: Amount = 10_000;

/// Minor units of discount granted per redeemed point.
pub const POINT_VALUE: Amount = 100;

/// Points earned for a paid order total (floor division).
pub fn points_earned(total: Amount) -> Points {
    if total <= 0 {
        return 0;
    }
    total / EARN_THRESHOLD
}

/// Discount value of a point redemption.
pub fn redemption_value(points: Points) -> Amount {
    points.max(0) * POINT_VALUE
}
