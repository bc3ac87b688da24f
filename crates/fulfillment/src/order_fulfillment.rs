//! Checkout commit sequence constants.

/// Step name: Validate the request before any write.
pub const STEP_VALIDATE: &str = "validate";

/// Step name: Insert the order row.
pub const STEP_INSERT_ORDER: &str = "insert_order";

/// Step name: Insert all order items atomically.
pub const STEP_INSERT_ITEMS: &str = "insert_items";

/// Step name: Decrement stock for each item, best-effort.
pub const STEP_SETTLE_INVENTORY: &str = "settle_inventory";

/// Step name: Accrue loyalty points for an attributable account.
pub const STEP_ACCRUE_LOYALTY: &str = "accrue_loyalty";

/// Step name: Dispatch marketing, accounting and shipping syncs.
pub const STEP_DISPATCH_SYNCS: &str = "dispatch_syncs";

/// Notes prefix recorded on an order whose items failed to persist.
pub const ITEMS_FAILED_NOTE: &str = "Order items failed to persist";
