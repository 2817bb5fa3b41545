//! Classificação dos endereços de porta usados pela camada.
//! Baseado no mapa de memória do 68000 no Genesis/Mega Drive.

use crate::core::memory::{
    ADDRESS_MASK, VDP_PORT_CTRL, VDP_PORT_DATA, VDP_PORT_HV_COUNTER, Z80_BUS_PORT,
    Z80_RAM_ADDRESS, Z80_RAM_SIZE, Z80_RESET_PORT,
};

/// Região de memória
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemRegion {
    Zram,       // RAM do Z80 (8KB), offset dentro da janela
    Z80Bus,     // Requisição/liberação do barramento do Z80
    Z80Reset,   // Linha de reset do Z80
    VdpData,    // Porta de dados do VDP
    VdpCtrl,    // Porta de controle/status do VDP
    VdpHv,      // Contador HV
    Unmapped,   // Nada mapeado
}

impl MemRegion {
    /// Identifica a região de um endereço do 68000
    pub fn from_address(addr: u32) -> Self {
        let addr = addr & ADDRESS_MASK;
        let zram_end = Z80_RAM_ADDRESS + Z80_RAM_SIZE as u32;

        match addr {
            a if (Z80_RAM_ADDRESS..zram_end).contains(&a) => MemRegion::Zram,
            // As portas do Z80 e do VDP são espelhadas nos bytes pares/ímpares
            a if a & !1 == Z80_BUS_PORT => MemRegion::Z80Bus,
            a if a & !1 == Z80_RESET_PORT => MemRegion::Z80Reset,
            a if a & !3 == VDP_PORT_DATA => MemRegion::VdpData,
            a if a & !3 == VDP_PORT_CTRL => MemRegion::VdpCtrl,
            a if a & !3 == VDP_PORT_HV_COUNTER => MemRegion::VdpHv,
            _ => MemRegion::Unmapped,
        }
    }

    /// Offset dentro da RAM do Z80, se o endereço pertencer a ela
    pub fn zram_offset(addr: u32) -> Option<usize> {
        match Self::from_address(addr) {
            MemRegion::Zram => Some(((addr & ADDRESS_MASK) - Z80_RAM_ADDRESS) as usize),
            _ => None,
        }
    }

    pub fn is_vdp(&self) -> bool {
        matches!(self, MemRegion::VdpData | MemRegion::VdpCtrl | MemRegion::VdpHv)
    }
}
