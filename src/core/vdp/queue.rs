// genesis-hal/src/core/vdp/queue.rs

//! Comandos de DMA adiados
//!
//! Transferências enfileiradas durante a lógica do quadro ficam guardadas
//! como programas de registradores prontos e são executadas de uma vez, em
//! geral logo após o início do VBlank. A fila tem capacidade fixa e nunca
//! aceita um push pela metade.

use bytemuck::{Pod, Zeroable};
use log::{debug, trace, warn};

use crate::core::memory::port::RegisterPort;
use crate::core::memory::{ADDRESS_MASK, VDP_PORT_CTRL};
use crate::core::vdp::{
    check_transfer, ctrl_addr_build, ctrl_addr_dest, source_after, words_to_boundary, DmaError,
    DmaResult, DmaTarget, VdpRegister,
};
use crate::core::z80::BusArbiter;

/// Uma transferência de DMA como as oito palavras da porta de controle que
/// a programam.
///
/// Os campos seguem a ordem em que o VDP precisa recebê-los.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct DmaCommand {
    /// Registrador de autoincremento, em bytes
    pub autoinc: u16,
    /// Tamanho (baixo), em palavras
    pub length_l: u16,
    /// Tamanho (alto), em palavras
    pub length_h: u16,
    /// Origem (baixo), em palavras
    pub src_l: u16,
    /// Origem (meio), em palavras
    pub src_m: u16,
    /// Origem (alto), em palavras
    pub src_h: u16,
    /// Comando de destino, primeira metade
    pub trigger_h: u16,
    /// Comando de destino, segunda metade; esta escrita dispara a transferência
    pub trigger_l: u16,
}

impl DmaCommand {
    /// Escritas na porta de controle por comando
    pub const WORDS: usize = 8;

    /// Monta o programa de registradores de uma cópia RAM/ROM -> VDP.
    /// Só o byte baixo de `increment` cabe no registrador.
    pub fn transfer(src: u32, dest: u16, length: u16, increment: u16, target: DmaTarget) -> Self {
        // O VDP endereça o espaço do 68000 em palavras
        let src_words = src >> 1;
        let trigger = ctrl_addr_build(target.dma_write_command(), dest);

        Self {
            autoinc: VdpRegister::AutoIncrement.write_word(increment as u8),
            length_l: VdpRegister::DmaLengthLow.write_word(length as u8),
            length_h: VdpRegister::DmaLengthHigh.write_word((length >> 8) as u8),
            src_l: VdpRegister::DmaSourceLow.write_word(src_words as u8),
            src_m: VdpRegister::DmaSourceMid.write_word((src_words >> 8) as u8),
            src_h: VdpRegister::DmaSourceHigh.write_word(((src_words >> 16) & 0x7F) as u8),
            trigger_h: (trigger >> 16) as u16,
            trigger_l: trigger as u16,
        }
    }

    /// Palavras da porta de controle na ordem do programa
    pub fn to_words(&self) -> [u16; Self::WORDS] {
        [
            self.autoinc,
            self.length_l,
            self.length_h,
            self.src_l,
            self.src_m,
            self.src_h,
            self.trigger_h,
            self.trigger_l,
        ]
    }

    /// Remonta um comando a partir de oito palavras
    pub fn from_words(words: [u16; Self::WORDS]) -> Self {
        let [autoinc, length_l, length_h, src_l, src_m, src_h, trigger_h, trigger_l] = words;
        Self { autoinc, length_l, length_h, src_l, src_m, src_h, trigger_h, trigger_l }
    }

    pub fn trigger(&self) -> u32 {
        ((self.trigger_h as u32) << 16) | self.trigger_l as u32
    }

    pub fn increment(&self) -> u8 {
        self.autoinc as u8
    }

    /// Tamanho da transferência em palavras
    pub fn length(&self) -> u16 {
        (self.length_h << 8) | (self.length_l & 0xFF)
    }

    /// Endereço de origem em bytes
    pub fn source(&self) -> u32 {
        let words = (self.src_l & 0xFF) as u32
            | ((self.src_m & 0xFF) as u32) << 8
            | ((self.src_h & 0x7F) as u32) << 16;
        words << 1
    }

    pub fn dest(&self) -> u16 {
        ctrl_addr_dest(self.trigger())
    }

    pub fn target(&self) -> Option<DmaTarget> {
        DmaTarget::from_command(self.trigger())
    }
}

/// Ocupação da fila
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Empty,
    Accumulating,
    Full,
}

/// FIFO de capacidade fixa com os comandos de DMA pendentes
#[derive(Debug, Clone)]
pub struct DmaQueue {
    slots: Box<[DmaCommand]>,
    cursor: usize,
}

impl DmaQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![DmaCommand::zeroed(); capacity].into_boxed_slice(),
            cursor: 0,
        }
    }

    /// Guarda um comando sem validar parâmetros nem a fronteira.
    ///
    /// Só recusa quando não há posição livre.
    pub fn push_fast(
        &mut self,
        src: u32,
        dest: u16,
        length: u16,
        increment: u16,
        target: DmaTarget,
    ) -> DmaResult<()> {
        if self.is_full() {
            warn!("DMA queue full ({} slots), {} transfer dropped", self.capacity(), target);
            return Err(DmaError::QueueFull { needed: 1, free: 0 });
        }
        self.slots[self.cursor] = DmaCommand::transfer(src, dest, length, increment, target);
        self.cursor += 1;
        trace!(
            "queued {} DMA #{}: src={:06X} dest={:04X} len={}",
            target,
            self.cursor,
            src,
            dest,
            length
        );
        Ok(())
    }

    /// Guarda uma transferência, dividida em duas na fronteira de 128KiB da
    /// origem. `src` é reduzido ao barramento de 24 bits.
    ///
    /// A divisão precisa de duas posições livres; sem elas nada entra na
    /// fila. A segunda metade entra primeiro.
    pub fn push(
        &mut self,
        src: u32,
        dest: u16,
        length: u16,
        increment: u16,
        target: DmaTarget,
    ) -> DmaResult<()> {
        check_transfer(length, increment)?;
        if self.is_full() {
            warn!("DMA queue full ({} slots), {} transfer dropped", self.capacity(), target);
            return Err(DmaError::QueueFull { needed: 1, free: 0 });
        }

        let src = src & ADDRESS_MASK;
        let mut length = length;
        let remaining = words_to_boundary(src);
        if length as u32 > remaining {
            if self.free_slots() < 2 {
                warn!("DMA queue has no room for a split {} transfer", target);
                return Err(DmaError::QueueFull { needed: 2, free: self.free_slots() });
            }
            // remaining < length, então cabe em 16 bits e é pelo menos 1
            let head = remaining as u16;
            let bytes = remaining << 1;
            self.push_fast(
                source_after(src, remaining),
                dest.wrapping_add(bytes as u16),
                length - head,
                increment,
                target,
            )?;
            length = head;
        }
        self.push_fast(src, dest, length, increment, target)
    }

    pub fn push_vram(&mut self, src: u32, dest: u16, length: u16, increment: u16) -> DmaResult<()> {
        self.push(src, dest, length, increment, DmaTarget::Vram)
    }

    pub fn push_cram(&mut self, src: u32, dest: u16, length: u16, increment: u16) -> DmaResult<()> {
        self.push(src, dest, length, increment, DmaTarget::Cram)
    }

    pub fn push_vsram(&mut self, src: u32, dest: u16, length: u16, increment: u16) -> DmaResult<()> {
        self.push(src, dest, length, increment, DmaTarget::Vsram)
    }

    /// Executa todos os comandos em ordem FIFO e esvazia a fila.
    ///
    /// O Z80 fica parado por um pedido rápido de barramento durante toda a
    /// execução. Fila vazia não mexe no VDP nem no barramento. Retorna o
    /// número de comandos disparados.
    pub fn flush<P: RegisterPort>(&mut self, port: &mut P, bus: &mut BusArbiter) -> DmaResult<usize> {
        let count = self.cursor;
        if count == 0 {
            return Ok(0);
        }

        let mut guard = bus.lock_fast(port)?;
        for command in &self.slots[..count] {
            for word in command.to_words() {
                guard.write_u16(VDP_PORT_CTRL, word);
            }
        }
        drop(guard);

        self.clear();
        debug!("DMA queue flushed: {} command(s)", count);
        Ok(count)
    }

    /// Número de comandos na fila
    pub fn size(&self) -> usize {
        self.cursor
    }

    /// Descarta os comandos sem mexer no hardware
    pub fn clear(&mut self) {
        self.cursor = 0;
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn free_slots(&self) -> usize {
        self.capacity() - self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    pub fn is_full(&self) -> bool {
        self.cursor >= self.capacity()
    }

    pub fn state(&self) -> QueueState {
        if self.is_full() {
            QueueState::Full
        } else if self.is_empty() {
            QueueState::Empty
        } else {
            QueueState::Accumulating
        }
    }

    /// Comandos pendentes na ordem de execução
    pub fn commands(&self) -> &[DmaCommand] {
        &self.slots[..self.cursor]
    }
}
