//! MC6883 SAM (Synchronous Address Multiplexer) — video-relevant subset
//!
//! The real SAM also multiplexes DRAM refresh and ROM/RAM paging; this
//! core only needs the pieces that feed the VDG: `video_mode` and
//! `video_ram_offset`, captured from a bank of write-only paired toggle
//! addresses at 0xFFC0-0xFFDF.

use super::vdg::Vdg;

/// One bit's paired even(clear)/odd(set) toggle addresses, keyed by bit
/// index within the field they belong to.
struct Field {
    value: u8,
    bits: u8,
}

impl Field {
    const fn new(bits: u8) -> Self {
        Self { value: 0, bits }
    }

    fn toggle(&mut self, bit_index: u8, set: bool) {
        let mask = 1u8 << bit_index;
        if set {
            self.value |= mask;
        } else {
            self.value &= !mask;
        }
        let width_mask = (1u16 << self.bits) as u8 - 1;
        self.value &= width_mask;
    }
}

pub struct Sam {
    video_mode: Field,   // V2..V0, 3 bits
    video_offset: Field, // F6..F0, 7 bits (top 6 used as offset<<9 address)
}

impl Sam {
    pub fn new() -> Self {
        Self {
            video_mode: Field::new(3),
            video_offset: Field::new(7),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn video_mode(&self) -> u8 {
        self.video_mode.value & 0x07
    }

    /// F0 is the least-significant bit of the offset; the video base
    /// address is `offset << 9` (512-byte granularity), so F6 would select
    /// bases above the 32 KiB RAM window and is dropped from the 6-bit
    /// output.
    pub fn video_ram_offset(&self) -> u8 {
        self.video_offset.value & 0x3F
    }

    pub fn read(&self, _addr: u16) -> u8 {
        // SAM toggle addresses are write-only; reads float.
        0xFF
    }

    /// Decode one toggle address and update the captured fields, then
    /// forward the new `video_mode`/`video_ram_offset` to the VDG.
    pub fn write(&mut self, addr: u16, vdg: &mut Vdg) {
        let offset = (addr - 0xFFC0) as u8;
        let field_index = offset / 2;
        let set = offset % 2 == 1;

        match field_index {
            0..=2 => self.video_mode.toggle(field_index, set),
            3..=9 => self.video_offset.toggle(field_index - 3, set),
            // Memory mode, RAM rate, page, and TY bits are acknowledged
            // but otherwise ignored: they have no effect on this core's
            // rendering/bus behavior.
            _ => {}
        }

        vdg.set_sam_mode(self.video_mode());
        vdg.set_video_ram_offset(self.video_ram_offset());
    }

    /// Push the captured fields to the VDG without a toggle write (used
    /// after a save-state restore).
    pub fn sync_vdg(&self, vdg: &mut Vdg) {
        vdg.set_sam_mode(self.video_mode());
        vdg.set_video_ram_offset(self.video_ram_offset());
    }

    pub fn save(&self) -> [u8; 2] {
        [self.video_mode.value, self.video_offset.value]
    }

    pub fn restore(&mut self, bytes: [u8; 2]) {
        self.video_mode.value = bytes[0] & 0x07;
        self.video_offset.value = bytes[1] & 0x7F;
    }
}

impl Default for Sam {
    fn default() -> Self {
        Self::new()
    }
}
