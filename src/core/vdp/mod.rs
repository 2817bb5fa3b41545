// genesis-hal/src/core/vdp/mod.rs

//! Suporte a DMA do VDP
//!
//! O VDP copia blocos da RAM/ROM do 68000 para as suas memórias (VRAM, CRAM,
//! VSRAM) e preenche a VRAM sem ajuda da CPU. Cada operação é programada pela
//! porta de controle como uma sequência fixa de escritas de registrador,
//! seguida do comando de endereço que dispara a operação.
//!
//! Palavra de escrita de registrador: `1 0 R4 R3 R2 R1 R0 | valor`, onde
//! R4..R0 escolhe o registrador.

pub mod dma;
pub mod queue;

pub use dma::DmaEngine;
pub use queue::{DmaCommand, DmaQueue, QueueState};

use bitflags::bitflags;
use thiserror::Error;

use crate::core::memory::ADDRESS_MASK;
use crate::core::z80::BusError;

/// Uma transferência de DMA não pode ler através desta fronteira de origem
pub const DMA_BOUNDARY: u32 = 0x2_0000;

/// Valor de origem (alta) que transforma o próximo DMA em preenchimento de VRAM
pub const DMA_FILL_MODE: u8 = 0x80;

bitflags! {
    /// Registrador de status do VDP, lido na porta de controle
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct VdpStatus: u16 {
        const PAL = 0x0001;
        /// Cópia/preenchimento por DMA em andamento
        const DMA = 0x0002;
        const HBLANK = 0x0004;
        const VBLANK = 0x0008;
        const ODD_FRAME = 0x0010;
        const COLLISION = 0x0020;
        const SPRITE_OVERFLOW = 0x0040;
        const VINT = 0x0080;
        const FIFO_FULL = 0x0100;
        const FIFO_EMPTY = 0x0200;
    }
}

/// Registradores do VDP usados na programação de DMA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum VdpRegister {
    AutoIncrement = 0x0F,
    DmaLengthLow = 0x13,
    DmaLengthHigh = 0x14,
    DmaSourceLow = 0x15,
    DmaSourceMid = 0x16,
    DmaSourceHigh = 0x17,
}

impl VdpRegister {
    const ALL: [VdpRegister; 6] = [
        VdpRegister::AutoIncrement,
        VdpRegister::DmaLengthLow,
        VdpRegister::DmaLengthHigh,
        VdpRegister::DmaSourceLow,
        VdpRegister::DmaSourceMid,
        VdpRegister::DmaSourceHigh,
    ];

    /// Palavra da porta de controle que grava `value` neste registrador
    #[inline]
    pub const fn write_word(self, value: u8) -> u16 {
        0x8000 | ((self as u16) << 8) | value as u16
    }

    /// Separa uma palavra da porta de controle em registrador e valor
    pub fn decode(word: u16) -> Option<(VdpRegister, u8)> {
        if word & 0xC000 != 0x8000 {
            return None;
        }
        let index = ((word >> 8) & 0x1F) as u8;
        Self::ALL
            .iter()
            .find(|reg| **reg as u8 == index)
            .map(|reg| (*reg, word as u8))
    }
}

/// Memória de destino de um DMA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DmaTarget {
    Vram,
    Cram,
    Vsram,
}

impl DmaTarget {
    /// Comando base de escrita por DMA nesta memória
    #[inline]
    pub const fn dma_write_command(self) -> u32 {
        match self {
            DmaTarget::Vram => 0x4000_0080,
            DmaTarget::Cram => 0xC000_0080,
            DmaTarget::Vsram => 0x4000_0090,
        }
    }

    /// Recupera o destino a partir do comando de disparo
    pub fn from_command(command: u32) -> Option<DmaTarget> {
        match command & 0xC000_00F0 {
            0x4000_0080 => Some(DmaTarget::Vram),
            0xC000_0080 => Some(DmaTarget::Cram),
            0x4000_0090 => Some(DmaTarget::Vsram),
            _ => None,
        }
    }
}

impl std::fmt::Display for DmaTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DmaTarget::Vram => write!(f, "VRAM"),
            DmaTarget::Cram => write!(f, "CRAM"),
            DmaTarget::Vsram => write!(f, "VSRAM"),
        }
    }
}

/// Monta o comando de endereço de 32 bits para `dest` sobre `base`
#[inline]
pub const fn ctrl_addr_build(base: u32, dest: u16) -> u32 {
    let dest = dest as u32;
    base | ((dest & 0x3FFF) << 16) | (dest >> 14)
}

/// Recupera o offset de destino de um comando de endereço
#[inline]
pub const fn ctrl_addr_dest(command: u32) -> u16 {
    (((command >> 16) & 0x3FFF) | ((command & 0x3) << 14)) as u16
}

/// Erros das operações de DMA
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DmaError {
    #[error("autoincrement {0} is outside 2..=255")]
    InvalidIncrement(u16),
    #[error("transfer length is zero")]
    ZeroLength,
    #[error("fill length {0} is below 2 bytes")]
    FillTooShort(u16),
    #[error("DMA queue full: {needed} slot(s) needed, {free} free")]
    QueueFull { needed: usize, free: usize },
    #[error("bus arbitration failed: {0}")]
    Bus(#[from] BusError),
}

/// Resultado das operações de DMA
pub type DmaResult<T> = Result<T, DmaError>;

/// Palavras restantes na janela de 128KiB de `src`.
///
/// Conta a partir do endereço de palavra, como o VDP: um `src` ímpar logo
/// abaixo da fronteira ainda tem 1 palavra. Nunca retorna 0.
#[inline]
pub(crate) fn words_to_boundary(src: u32) -> u32 {
    const WINDOW_WORDS: u32 = DMA_BOUNDARY >> 1;
    WINDOW_WORDS - (((src & ADDRESS_MASK) >> 1) & (WINDOW_WORDS - 1))
}

/// Endereço em bytes da palavra `words` posições após `src`.
///
/// `src` é reduzido ao barramento de 24 bits, então a soma não transborda.
#[inline]
pub(crate) fn source_after(src: u32, words: u32) -> u32 {
    (src & ADDRESS_MASK & !1) + (words << 1)
}

/// O registrador de autoincremento tem 8 bits
pub(crate) fn check_increment(increment: u16) -> DmaResult<()> {
    if increment > 0xFF {
        return Err(DmaError::InvalidIncrement(increment));
    }
    Ok(())
}

pub(crate) fn check_transfer(length: u16, increment: u16) -> DmaResult<()> {
    if increment < 2 {
        return Err(DmaError::InvalidIncrement(increment));
    }
    check_increment(increment)?;
    if length == 0 {
        return Err(DmaError::ZeroLength);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_words() {
        assert_eq!(VdpRegister::AutoIncrement.write_word(2), 0x8F02);
        assert_eq!(VdpRegister::DmaLengthLow.write_word(0x0A), 0x930A);
        assert_eq!(VdpRegister::DmaSourceHigh.write_word(0x7F), 0x977F);
        assert_eq!(
            VdpRegister::decode(0x9680),
            Some((VdpRegister::DmaSourceMid, 0x80))
        );
        // Registrador de modo 2 não é de DMA
        assert_eq!(VdpRegister::decode(0x8174), None);
        // Comandos de endereço não são escritas de registrador
        assert_eq!(VdpRegister::decode(0x4000), None);
    }

    #[test]
    fn test_ctrl_addr_build() {
        let cmd = ctrl_addr_build(DmaTarget::Vram.dma_write_command(), 0xC000);
        assert_eq!(cmd, 0x4000_0083);
        assert_eq!(ctrl_addr_dest(cmd), 0xC000);
        assert_eq!(DmaTarget::from_command(cmd), Some(DmaTarget::Vram));

        let cmd = ctrl_addr_build(DmaTarget::Cram.dma_write_command(), 0x0020);
        assert_eq!(cmd, 0xC020_0080);
        assert_eq!(DmaTarget::from_command(cmd), Some(DmaTarget::Cram));

        let cmd = ctrl_addr_build(DmaTarget::Vsram.dma_write_command(), 0x0004);
        assert_eq!(DmaTarget::from_command(cmd), Some(DmaTarget::Vsram));
    }

    #[test]
    fn test_words_to_boundary() {
        assert_eq!(words_to_boundary(0x0000_0000), 0x1_0000);
        assert_eq!(words_to_boundary(0x0001_FFF0), 8);
        assert_eq!(words_to_boundary(0x00FF_0000), 0x8000);
        // Origem ímpar conta pela palavra que contém o byte
        assert_eq!(words_to_boundary(0x0001_FFFF), 1);
        assert_eq!(words_to_boundary(0x0001_FFFE), 1);
        assert_eq!(words_to_boundary(0x0000_0001), 0x1_0000);
        // Bits acima do barramento de 24 bits são ignorados
        assert_eq!(words_to_boundary(0xFFFF_FFF0), 8);
        assert_eq!(words_to_boundary(u32::MAX), 1);
    }

    #[test]
    fn test_source_after() {
        assert_eq!(source_after(0x0001_FFF0, 8), 0x0002_0000);
        assert_eq!(source_after(0x0001_FFFF, 1), 0x0002_0000);
        assert_eq!(source_after(0xFFFF_FFF0, 8), 0x0100_0000);
        assert_eq!(source_after(u32::MAX, 1), 0x0100_0000);
    }

    #[test]
    fn test_check_transfer() {
        assert_eq!(check_transfer(1, 2), Ok(()));
        assert_eq!(check_transfer(1, 1), Err(DmaError::InvalidIncrement(1)));
        assert_eq!(check_transfer(0, 2), Err(DmaError::ZeroLength));
        assert_eq!(check_transfer(1, 0xFF), Ok(()));
        assert_eq!(check_transfer(1, 0x100), Err(DmaError::InvalidIncrement(0x100)));
        assert_eq!(check_transfer(1, 0x102), Err(DmaError::InvalidIncrement(0x102)));
    }
}
