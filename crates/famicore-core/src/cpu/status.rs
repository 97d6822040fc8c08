use bitflags::bitflags;

bitflags! {
    /// The 8-bit processor status register (P) of the 2A03.
    ///
    /// Bit layout:
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// N V U B D I Z C
    /// ```
    /// `U` reads as 1 whenever the register is pushed; `B` only exists on
    /// the stack copy (1 for PHP/BRK, 0 for NMI/IRQ pushes).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u8 {
        /// Carry flag (C).
        const CARRY     = 0b0000_0001;
        /// Zero flag (Z).
        const ZERO      = 0b0000_0010;
        /// Interrupt disable (I); masks IRQ, never NMI.
        const INTERRUPT = 0b0000_0100;
        /// Decimal mode (D). Storable, but ADC/SBC ignore it on the 2A03.
        const DECIMAL   = 0b0000_1000;
        /// Break flag (B); only meaningful in the pushed copy.
        const BREAK     = 0b0001_0000;
        /// Unused bit; always 1 in the pushed copy.
        const UNUSED    = 0b0010_0000;
        /// Overflow flag (V).
        const OVERFLOW  = 0b0100_0000;
        /// Negative flag (N); mirrors bit 7 of the last result.
        const NEGATIVE  = 0b1000_0000;
    }
}

impl Status {
    /// Update Z and N from a result byte.
    #[inline]
    pub fn set_zn(&mut self, value: u8) {
        self.set(Status::ZERO, value == 0);
        self.set(Status::NEGATIVE, value & 0x80 != 0);
    }

    #[inline]
    pub fn set_c(&mut self, value: bool) {
        self.set(Status::CARRY, value);
    }

    #[inline]
    pub fn set_v(&mut self, value: bool) {
        self.set(Status::OVERFLOW, value);
    }

    #[inline]
    pub fn c(&self) -> bool {
        self.contains(Status::CARRY)
    }

    #[inline]
    pub fn i(&self) -> bool {
        self.contains(Status::INTERRUPT)
    }
}
