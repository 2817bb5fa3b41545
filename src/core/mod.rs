//! Núcleo da camada de hardware: portas, barramento do Z80 e DMA do VDP.

pub mod config;
pub mod memory;
pub mod system;
pub mod vdp;
pub mod z80;
