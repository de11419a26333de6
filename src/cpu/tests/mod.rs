//! Instruction-level test suite for the MC6809E interpreter, one file per
//! concern.

mod interrupts;
mod modes;
mod parity;
