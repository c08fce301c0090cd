//! Frame templates and bitfield tables for the X-Core bus.
//!
//! Each [`Field`] describes one value the controller expects, the bit
//! positions it is repeated at, and how to derive it from the command.
//! Positions count from the MSB of byte 0.

/// Base frame for a zone run (15 bytes, 120 bits).
pub const ZONE_TEMPLATE: [u8; 15] = [
    0xff, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x04, 0x00, 0x00, 0x01, 0x00, 0x01, 0xb8, 0x3f,
];

/// Base frame for a program start (7 bytes, 56 bits).
pub const PROGRAM_TEMPLATE: [u8; 7] = [0xff, 0x40, 0x03, 0x96, 0x09, 0xbd, 0x7f];

/// Largest frame the bus carries.
pub const MAX_FRAME_LEN: usize = ZONE_TEMPLATE.len();

/// One encoded value inside a frame.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    /// Bit positions where the value starts (it is repeated at each).
    pub offsets: &'static [usize],
    /// Width in bits.
    pub width: u8,
}

// ── Zone frame ────────────────────────────────────────────────

pub const ZONE_CLASS: Field = Field {
    name: "zone_class",
    offsets: &[9],
    width: 2,
};

pub const ZONE_PLUS_17: Field = Field {
    name: "zone+0x17",
    offsets: &[23, 36],
    width: 7,
};

pub const ZONE_PLUS_23: Field = Field {
    name: "zone+0x23",
    offsets: &[49, 62],
    width: 7,
};

pub const ZONE_PLUS_2F: Field = Field {
    name: "zone+0x2f",
    offsets: &[75, 88],
    width: 7,
};

pub const MINUTES_LOW: Field = Field {
    name: "minutes_low",
    offsets: &[31, 57, 83],
    width: 4,
};

pub const MINUTES_HIGH: Field = Field {
    name: "minutes_high",
    offsets: &[44, 70, 96],
    width: 4,
};

pub const ZONE_INDEX: Field = Field {
    name: "zone_index",
    offsets: &[109],
    width: 4,
};

/// Zone frame layout paired with the value each field carries.
pub const ZONE_FIELDS: [(Field, fn(u32, u32) -> u32); 7] = [
    (ZONE_CLASS, zone_class),
    (ZONE_PLUS_17, zone_plus_17),
    (ZONE_PLUS_23, zone_plus_23),
    (ZONE_PLUS_2F, zone_plus_2f),
    (MINUTES_LOW, minutes_low),
    (MINUTES_HIGH, minutes_high),
    (ZONE_INDEX, zone_index),
];

/// 0x1 above zone 12, 0x2 for the first twelve.
fn zone_class(zone: u32, _minutes: u32) -> u32 {
    if zone > 12 { 0x1 } else { 0x2 }
}

fn zone_plus_17(zone: u32, _minutes: u32) -> u32 {
    zone + 0x17
}

fn zone_plus_23(zone: u32, _minutes: u32) -> u32 {
    zone + 0x23
}

fn zone_plus_2f(zone: u32, _minutes: u32) -> u32 {
    zone + 0x2f
}

fn minutes_low(_zone: u32, minutes: u32) -> u32 {
    minutes
}

fn minutes_high(_zone: u32, minutes: u32) -> u32 {
    minutes >> 4
}

fn zone_index(zone: u32, _minutes: u32) -> u32 {
    zone.wrapping_sub(1)
}

// ── Program frame ─────────────────────────────────────────────

pub const PROGRAM_INDEX: Field = Field {
    name: "program_index",
    offsets: &[31],
    width: 2,
};
