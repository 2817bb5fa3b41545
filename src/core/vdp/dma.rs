// genesis-hal/src/core/vdp/dma.rs

//! Operações de DMA imediatas
//!
//! Toda operação espera o DMA em andamento no VDP, programa os registradores
//! em ordem e escreve o comando de disparo. A segunda metade do disparo de
//! uma transferência é escrita com o Z80 parado: um acesso do Z80 entre as
//! duas metades corrompe o comando.

use log::{debug, trace};

use crate::core::memory::port::RegisterPort;
use crate::core::memory::{ADDRESS_MASK, VDP_PORT_CTRL, VDP_PORT_DATA};
use crate::core::vdp::queue::DmaCommand;
use crate::core::vdp::{
    check_increment, check_transfer, ctrl_addr_build, source_after, words_to_boundary, DmaError,
    DmaResult, DmaTarget, VdpRegister, VdpStatus, DMA_FILL_MODE,
};
use crate::core::z80::{BusArbiter, BusError};

/// Visão emprestada da porta e do árbitro do barramento que dispara DMA
pub struct DmaEngine<'a, P: RegisterPort> {
    port: &'a mut P,
    bus: &'a mut BusArbiter,
}

impl<'a, P: RegisterPort> DmaEngine<'a, P> {
    pub fn new(port: &'a mut P, bus: &'a mut BusArbiter) -> Self {
        Self { port, bus }
    }

    /// Verdadeiro enquanto o VDP indica cópia/preenchimento em andamento
    pub fn is_busy(&mut self) -> bool {
        VdpStatus::from_bits_truncate(self.port.read_u16(VDP_PORT_CTRL)).contains(VdpStatus::DMA)
    }

    /// Espera ativa até o DMA em andamento terminar. Não há timeout.
    pub fn wait(&mut self) {
        while self.is_busy() {
            self.port.relax();
        }
    }

    /// Dispara uma transferência sem validar parâmetros nem a fronteira de
    /// 128KiB. Só o byte baixo de `increment` é programado.
    ///
    /// Só falha se o chamador já tem o barramento do Z80; nesse caso nada é
    /// escrito.
    pub fn transfer_fast(
        &mut self,
        src: u32,
        dest: u16,
        length: u16,
        increment: u16,
        target: DmaTarget,
    ) -> DmaResult<()> {
        if self.bus.is_held() {
            return Err(DmaError::Bus(BusError::AlreadyOwned));
        }

        let words = DmaCommand::transfer(src, dest, length, increment, target).to_words();
        let (program, trigger_l) = words.split_at(DmaCommand::WORDS - 1);

        self.wait();
        for word in program {
            self.port.write_u16(VDP_PORT_CTRL, *word);
        }
        let mut guard = self.bus.lock_fast(&mut *self.port)?;
        guard.write_u16(VDP_PORT_CTRL, trigger_l[0]);
        drop(guard);

        trace!(
            "{} DMA: src={:06X} dest={:04X} len={} inc={}",
            target,
            src,
            dest,
            length,
            increment
        );
        Ok(())
    }

    /// Dispara uma transferência, dividida em duas se a origem cruza uma
    /// fronteira de 128KiB. A parte após a fronteira é disparada primeiro.
    ///
    /// `src` é reduzido ao barramento de 24 bits do 68000.
    pub fn transfer(
        &mut self,
        src: u32,
        dest: u16,
        length: u16,
        increment: u16,
        target: DmaTarget,
    ) -> DmaResult<()> {
        check_transfer(length, increment)?;

        let src = src & ADDRESS_MASK;
        let mut length = length;
        let remaining = words_to_boundary(src);
        if length as u32 > remaining {
            // remaining < length, então cabe em 16 bits e é pelo menos 1
            let head = remaining as u16;
            let bytes = remaining << 1;
            debug!(
                "{} DMA from {:06X} crosses 128KiB boundary: split {}+{} words",
                target,
                src,
                head,
                length - head
            );
            self.transfer_fast(
                source_after(src, remaining),
                dest.wrapping_add(bytes as u16),
                length - head,
                increment,
                target,
            )?;
            length = head;
        }
        self.transfer_fast(src, dest, length, increment, target)
    }

    /// Preenche `length` bytes da VRAM em `dest` com `value`.
    ///
    /// O preenchimento não para o 68000; chamar `wait` antes de mexer na
    /// área preenchida.
    pub fn fill(&mut self, dest: u16, length: u16, value: u8, increment: u16) -> DmaResult<()> {
        if length < 2 {
            return Err(DmaError::FillTooShort(length));
        }
        check_increment(increment)?;
        // A primeira escrita grava uma palavra inteira, as seguintes um byte
        let length = length - 1;

        self.wait();
        self.port.write_u16(VDP_PORT_CTRL, VdpRegister::AutoIncrement.write_word(increment as u8));
        self.port.write_u16(VDP_PORT_CTRL, VdpRegister::DmaLengthLow.write_word(length as u8));
        self.port.write_u16(VDP_PORT_CTRL, VdpRegister::DmaLengthHigh.write_word((length >> 8) as u8));
        self.port.write_u16(VDP_PORT_CTRL, VdpRegister::DmaSourceHigh.write_word(DMA_FILL_MODE));
        self.port.write_u32(
            VDP_PORT_CTRL,
            ctrl_addr_build(DmaTarget::Vram.dma_write_command(), dest),
        );
        self.port.write_u16(VDP_PORT_DATA, ((value as u16) << 8) | value as u16);

        trace!("VRAM fill: dest={:04X} len={} value={:02X}", dest, length + 1, value);
        Ok(())
    }

    pub fn vram_transfer(&mut self, src: u32, dest: u16, length: u16, increment: u16) -> DmaResult<()> {
        self.transfer(src, dest, length, increment, DmaTarget::Vram)
    }

    pub fn cram_transfer(&mut self, src: u32, dest: u16, length: u16, increment: u16) -> DmaResult<()> {
        self.transfer(src, dest, length, increment, DmaTarget::Cram)
    }

    pub fn vsram_transfer(&mut self, src: u32, dest: u16, length: u16, increment: u16) -> DmaResult<()> {
        self.transfer(src, dest, length, increment, DmaTarget::Vsram)
    }

    pub fn vram_transfer_fast(&mut self, src: u32, dest: u16, length: u16, increment: u16) -> DmaResult<()> {
        self.transfer_fast(src, dest, length, increment, DmaTarget::Vram)
    }

    pub fn cram_transfer_fast(&mut self, src: u32, dest: u16, length: u16, increment: u16) -> DmaResult<()> {
        self.transfer_fast(src, dest, length, increment, DmaTarget::Cram)
    }

    pub fn vsram_transfer_fast(&mut self, src: u32, dest: u16, length: u16, increment: u16) -> DmaResult<()> {
        self.transfer_fast(src, dest, length, increment, DmaTarget::Vsram)
    }
}
