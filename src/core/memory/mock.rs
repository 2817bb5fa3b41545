// genesis-hal/src/core/memory/mock.rs

//! Porta de registradores para testes.
//!
//! Grava cada acesso em ordem e simula o mínimo de hardware que as esperas
//! ativas consultam: o bit de DMA em andamento no status do VDP e a
//! confirmação do barramento do Z80. Ambos podem ser programados para
//! responder "ocupado" por um número fixo de leituras.

use crate::core::memory::map::MemRegion;
use crate::core::memory::port::RegisterPort;
use crate::core::memory::Z80_RAM_SIZE;
use crate::core::vdp::VdpStatus;
use crate::core::z80::Z80Line;

/// Um acesso feito através da porta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortAccess {
    Write8 { addr: u32, value: u8 },
    Write16 { addr: u32, value: u16 },
    Write32 { addr: u32, value: u32 },
    Read16 { addr: u32, value: u16 },
}

impl PortAccess {
    pub fn addr(&self) -> u32 {
        match *self {
            PortAccess::Write8 { addr, .. }
            | PortAccess::Write16 { addr, .. }
            | PortAccess::Write32 { addr, .. }
            | PortAccess::Read16 { addr, .. } => addr,
        }
    }

    pub fn region(&self) -> MemRegion {
        MemRegion::from_address(self.addr())
    }

    pub fn is_write(&self) -> bool {
        !matches!(self, PortAccess::Read16 { .. })
    }
}

/// Porta que grava os acessos e simula status/barramento
#[derive(Debug, Clone)]
pub struct RecordingPort {
    accesses: Vec<PortAccess>,
    zram: Vec<u8>,
    dma_busy_polls: usize,
    bus_busy_polls: usize,
    bus_requested: bool,
    reset_released: bool,
    relax_count: usize,
}

impl Default for RecordingPort {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingPort {
    pub fn new() -> Self {
        Self {
            accesses: Vec::new(),
            zram: vec![0xFF; Z80_RAM_SIZE],
            dma_busy_polls: 0,
            bus_busy_polls: 0,
            bus_requested: false,
            reset_released: false,
            relax_count: 0,
        }
    }

    /// O status do VDP reporta DMA em andamento nas próximas `polls` leituras
    pub fn set_dma_busy_polls(&mut self, polls: usize) {
        self.dma_busy_polls = polls;
    }

    /// O Z80 demora `polls` leituras para confirmar a cessão do barramento
    pub fn set_bus_busy_polls(&mut self, polls: usize) {
        self.bus_busy_polls = polls;
    }

    pub fn with_dma_busy_polls(mut self, polls: usize) -> Self {
        self.set_dma_busy_polls(polls);
        self
    }

    pub fn with_bus_busy_polls(mut self, polls: usize) -> Self {
        self.set_bus_busy_polls(polls);
        self
    }

    /// Todos os acessos, em ordem
    pub fn accesses(&self) -> &[PortAccess] {
        &self.accesses
    }

    /// Escritas (de qualquer largura) feitas numa região
    pub fn writes_in(&self, region: MemRegion) -> Vec<PortAccess> {
        self.accesses
            .iter()
            .filter(|a| a.is_write() && a.region() == region)
            .copied()
            .collect()
    }

    /// Palavras escritas na porta de controle do VDP; escritas de 32 bits
    /// aparecem como duas palavras, a alta primeiro, como o 68000 as emite
    pub fn ctrl_words(&self) -> Vec<u16> {
        let mut words = Vec::new();
        for access in self.writes_in(MemRegion::VdpCtrl) {
            match access {
                PortAccess::Write16 { value, .. } => words.push(value),
                PortAccess::Write32 { value, .. } => {
                    words.push((value >> 16) as u16);
                    words.push(value as u16);
                }
                PortAccess::Write8 { value, .. } => words.push(value as u16),
                PortAccess::Read16 { .. } => {}
            }
        }
        words
    }

    /// Valores escritos na porta de barramento do Z80
    pub fn bus_writes(&self) -> Vec<u16> {
        self.writes_in(MemRegion::Z80Bus)
            .into_iter()
            .filter_map(|a| match a {
                PortAccess::Write16 { value, .. } => Some(value),
                _ => None,
            })
            .collect()
    }

    /// Número de leituras feitas numa região
    pub fn reads_in(&self, region: MemRegion) -> usize {
        self.accesses
            .iter()
            .filter(|a| !a.is_write() && a.region() == region)
            .count()
    }

    pub fn relax_count(&self) -> usize {
        self.relax_count
    }

    pub fn zram(&self) -> &[u8] {
        &self.zram
    }

    pub fn bus_requested(&self) -> bool {
        self.bus_requested
    }

    pub fn reset_released(&self) -> bool {
        self.reset_released
    }

    /// Esquece os acessos gravados, mantendo o estado simulado
    pub fn clear(&mut self) {
        self.accesses.clear();
        self.relax_count = 0;
    }

    fn latch_line(&mut self, addr: u32, value: u16) {
        let asserted = Z80Line::from_bits_truncate(value).contains(Z80Line::ACTIVE);
        match MemRegion::from_address(addr) {
            MemRegion::Z80Bus => self.bus_requested = asserted,
            MemRegion::Z80Reset => self.reset_released = asserted,
            _ => {}
        }
    }
}

impl RegisterPort for RecordingPort {
    fn write_u8(&mut self, addr: u32, value: u8) {
        self.accesses.push(PortAccess::Write8 { addr, value });
        if let Some(offset) = MemRegion::zram_offset(addr) {
            self.zram[offset] = value;
        }
    }

    fn write_u16(&mut self, addr: u32, value: u16) {
        self.accesses.push(PortAccess::Write16 { addr, value });
        self.latch_line(addr, value);
    }

    fn write_u32(&mut self, addr: u32, value: u32) {
        self.accesses.push(PortAccess::Write32 { addr, value });
    }

    fn read_u16(&mut self, addr: u32) -> u16 {
        let value = match MemRegion::from_address(addr) {
            MemRegion::VdpCtrl => {
                let mut status = VdpStatus::FIFO_EMPTY;
                if self.dma_busy_polls > 0 {
                    self.dma_busy_polls -= 1;
                    status |= VdpStatus::DMA;
                }
                status.bits()
            }
            MemRegion::Z80Bus => {
                // Bit 8 em 1: o Z80 ainda é dono do barramento
                if !self.bus_requested {
                    Z80Line::ACTIVE.bits()
                } else if self.bus_busy_polls > 0 {
                    self.bus_busy_polls -= 1;
                    Z80Line::ACTIVE.bits()
                } else {
                    0
                }
            }
            _ => 0xFFFF,
        };
        self.accesses.push(PortAccess::Read16 { addr, value });
        value
    }

    fn relax(&mut self) {
        self.relax_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory::{VDP_PORT_CTRL, Z80_BUS_PORT};

    #[test]
    fn test_dma_busy_script() {
        let mut port = RecordingPort::new().with_dma_busy_polls(2);
        assert!(VdpStatus::from_bits_truncate(port.read_u16(VDP_PORT_CTRL)).contains(VdpStatus::DMA));
        assert!(VdpStatus::from_bits_truncate(port.read_u16(VDP_PORT_CTRL)).contains(VdpStatus::DMA));
        assert!(!VdpStatus::from_bits_truncate(port.read_u16(VDP_PORT_CTRL)).contains(VdpStatus::DMA));
        assert_eq!(port.reads_in(MemRegion::VdpCtrl), 3);
    }

    #[test]
    fn test_bus_grant_follows_request() {
        let mut port = RecordingPort::new().with_bus_busy_polls(1);
        assert_eq!(port.read_u16(Z80_BUS_PORT), 0x100);

        port.write_u16(Z80_BUS_PORT, 0x100);
        assert!(port.bus_requested());
        assert_eq!(port.read_u16(Z80_BUS_PORT), 0x100);
        assert_eq!(port.read_u16(Z80_BUS_PORT), 0);

        port.write_u16(Z80_BUS_PORT, 0);
        assert_eq!(port.read_u16(Z80_BUS_PORT), 0x100);
    }

    #[test]
    fn test_ctrl_words_split_long_writes() {
        let mut port = RecordingPort::new();
        port.write_u16(VDP_PORT_CTRL, 0x8F02);
        port.write_u32(VDP_PORT_CTRL, 0x4000_0083);
        assert_eq!(port.ctrl_words(), vec![0x8F02, 0x4000, 0x0083]);

        port.clear();
        assert!(port.accesses().is_empty());
    }

    #[test]
    fn test_zram_byte_writes() {
        let mut port = RecordingPort::new();
        port.write_u8(0xA00010, 0x42);
        assert_eq!(port.zram()[0x10], 0x42);
        assert_eq!(port.writes_in(MemRegion::Zram).len(), 1);
    }
}
