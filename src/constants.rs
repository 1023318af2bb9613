//! Protocol constants for the FX programming-port framing
//!
//! The values below pin down the wire format and the driver's operating
//! limits. Frame layout:
//!
//! ```text
//! STX | op | addr[4] | count[2] | payload[count*2]? | ETX | checksum[2]
//! ```
//!
//! All fields except STX, ETX and the raw payload bytes are ASCII digits.

use std::time::Duration;

// ============================================================================
// Framing bytes
// ============================================================================

/// Start-of-text marker opening every frame
pub const STX: u8 = 0x02;

/// End-of-text marker closing the data portion of every frame
pub const ETX: u8 = 0x03;

/// Op byte for a register read command
pub const OP_READ: u8 = b'0';

/// Op byte for a register write command
pub const OP_WRITE: u8 = b'1';

/// Length of a read command frame
///
/// STX(1) + op(1) + address(4) + count(2) + ETX(1) + checksum(2) = 11 bytes
pub const READ_FRAME_LEN: usize = 11;

// ============================================================================
// Address-space bases
// ============================================================================

/// Linear base for input bit blocks (X devices)
pub const INPUT_BITS_BASE: u16 = 0x0080;

/// Linear base for output bit blocks (Y devices)
pub const OUTPUT_BITS_BASE: u16 = 0x00A0;

/// Linear base for 16-bit data registers (D devices); register addresses
/// are doubled before the base is added (two bytes per register)
pub const DATA_REGISTERS_BASE: u16 = 0x1000;

/// Highest addressable register in any space
pub const MAX_ADDRESS: u16 = 255;

// ============================================================================
// Operating limits
// ============================================================================

/// Largest value the two-decimal-digit count field can carry
pub const MAX_COUNT_FIELD: usize = 99;

/// Maximum outgoing frame size accepted for submission
pub const MAX_FRAME_SIZE: usize = 4096;

/// Largest read the worker will wait for, in 16-bit words
pub const MAX_RESPONSE_WORDS: usize = 64;

/// Response-length ceiling in bytes
///
/// Data bytes (words * 2) + STX(1) + ETX(1) + checksum(2)
pub const MAX_RESPONSE_LEN: usize = MAX_RESPONSE_WORDS * 2 + 4;

/// A write command is acknowledged with a single echo byte
pub const WRITE_RESPONSE_LEN: usize = 1;

// ============================================================================
// Queue parameters
// ============================================================================

/// Number of priority buckets; bucket 0 is serviced first
pub const PRIORITY_LEVELS: usize = 10;

/// Slot-arena capacity of a session's command queue; bounds the number of
/// in-flight commands and therefore producer backpressure
pub const POOL_CAPACITY: usize = 65536;

/// Priority assigned to facade-submitted register commands
pub const DEFAULT_PRIORITY: u8 = 1;

// ============================================================================
// Deadlines
// ============================================================================

/// Per-read deadline while the worker accumulates a response; the clock
/// restarts on every successful read, not once per command
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Caller-side deadline a facade request waits for its completion
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);
