//! GPIO / peripheral pin assignments for the feeder main board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Dispenser stepper (28BYJ-48 via ULN2003 darlington array)
// ---------------------------------------------------------------------------

pub const STEPPER_IN1_GPIO: i32 = 4;
pub const STEPPER_IN2_GPIO: i32 = 5;
pub const STEPPER_IN3_GPIO: i32 = 6;
pub const STEPPER_IN4_GPIO: i32 = 7;

// ---------------------------------------------------------------------------
// Load cells (HX711, channel A, gain 128)
// ---------------------------------------------------------------------------

/// Bowl cell data output.  LOW = conversion ready.
pub const HX711_FOOD_DOUT_GPIO: i32 = 8;
pub const HX711_FOOD_SCK_GPIO: i32 = 9;

/// Reservoir cell data output.  LOW = conversion ready.
pub const HX711_WATER_DOUT_GPIO: i32 = 10;
pub const HX711_WATER_SCK_GPIO: i32 = 11;

// ---------------------------------------------------------------------------
// Water refill pump (logic-level MOSFET, active HIGH)
// ---------------------------------------------------------------------------

pub const WATER_PUMP_GPIO: i32 = 12;

// ---------------------------------------------------------------------------
// Companion link (UART1)
// ---------------------------------------------------------------------------

pub const UART_TX_GPIO: i32 = 17;
pub const UART_RX_GPIO: i32 = 18;
