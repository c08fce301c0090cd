//! X-Core bus frame codec.
//!
//! Pure transform from a validated watering command into the bit buffer the
//! timer expects.  A frame starts from a fixed template; each command value
//! is laid into one or more bitfields described in [`layout`].
//!
//! Bit position `p` is bit `0x80 >> (p % 8)` of byte `p / 8`.  Values are
//! written starting at the field offset, least significant value bit first.

pub mod layout;

use heapless::Vec;
use log::trace;

use crate::error::ValidationError;
use layout::{Field, MAX_FRAME_LEN, PROGRAM_INDEX, PROGRAM_TEMPLATE, ZONE_FIELDS, ZONE_TEMPLATE};

pub const ZONE_MIN: i32 = 1;
pub const ZONE_MAX: i32 = 48;
pub const MINUTES_MIN: i32 = 0;
pub const MINUTES_MAX: i32 = 240;
pub const PROGRAM_MIN: i32 = 1;
pub const PROGRAM_MAX: i32 = 4;

/// Which command a [`Frame`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Zone,
    Program,
}

/// An encoded command, ready for the bus driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    kind: FrameKind,
    bytes: Vec<u8, MAX_FRAME_LEN>,
}

impl Frame {
    fn from_template(kind: FrameKind, template: &[u8]) -> Self {
        let mut bytes = Vec::new();
        let copied = bytes.extend_from_slice(template);
        debug_assert!(copied.is_ok(), "template longer than MAX_FRAME_LEN");
        Self { kind, bytes }
    }

    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Zone frames are followed by one extra `1` bit before the stop bit.
    pub fn extra_bit(&self) -> bool {
        self.kind == FrameKind::Zone
    }

    /// Data bits on the wire, excluding the start pulse and stop bit.
    pub fn bit_count(&self) -> usize {
        self.bytes.len() * 8 + usize::from(self.extra_bit())
    }

    fn write_field(&mut self, field: &Field, value: u32) {
        trace!("frame: {} = {:#x}", field.name, value);
        for &offset in field.offsets {
            write_bitfield(&mut self.bytes, offset, value, field.width);
        }
    }
}

/// Lay `width` bits of `value` into `buf` starting at bit `offset`.
///
/// Positions past the end of `buf` are ignored.
pub fn write_bitfield(buf: &mut [u8], offset: usize, value: u32, width: u8) {
    for i in 0..usize::from(width) {
        let pos = offset + i;
        let mask = 0x80u8 >> (pos % 8);
        let Some(byte) = buf.get_mut(pos / 8) else {
            return;
        };
        if (value >> i) & 1 == 1 {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }
}

/// Inverse of [`write_bitfield`].
pub fn read_bitfield(buf: &[u8], offset: usize, width: u8) -> u32 {
    let mut value = 0u32;
    for i in 0..usize::from(width) {
        let pos = offset + i;
        let mask = 0x80u8 >> (pos % 8);
        if buf.get(pos / 8).is_some_and(|b| b & mask != 0) {
            value |= 1 << i;
        }
    }
    value
}

/// Build the frame that runs `zone` for `minutes` (0 stops it).
pub fn encode_zone(zone: i32, minutes: i32) -> Result<Frame, ValidationError> {
    if !(ZONE_MIN..=ZONE_MAX).contains(&zone) {
        return Err(ValidationError::Zone(zone));
    }
    if !(MINUTES_MIN..=MINUTES_MAX).contains(&minutes) {
        return Err(ValidationError::Minutes(minutes));
    }

    let (zone, minutes) = (zone as u32, minutes as u32);
    let mut frame = Frame::from_template(FrameKind::Zone, &ZONE_TEMPLATE);
    for (field, value) in &ZONE_FIELDS {
        frame.write_field(field, value(zone, minutes));
    }
    Ok(frame)
}

/// Build the frame that starts stored program `program`.
pub fn encode_program(program: i32) -> Result<Frame, ValidationError> {
    if !(PROGRAM_MIN..=PROGRAM_MAX).contains(&program) {
        return Err(ValidationError::Program(program));
    }

    let mut frame = Frame::from_template(FrameKind::Program, &PROGRAM_TEMPLATE);
    frame.write_field(&PROGRAM_INDEX, (program - 1) as u32);
    Ok(frame)
}
