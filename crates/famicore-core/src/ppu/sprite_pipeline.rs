use crate::ppu::sprite::SpriteAttributes;

/// A single sprite slot for the current scanline.
#[derive(Debug, Clone, Copy)]
struct SpriteSlot {
    /// Pattern bitplane 0 (shifted left once per dot after X expires).
    pattern_low: u8,
    /// Pattern bitplane 1.
    pattern_high: u8,
    /// Latched attributes (palette select, priority, flips).
    attributes: SpriteAttributes,
    /// X counter delaying sprite visibility.
    x_counter: u8,
    /// Indicates this slot belongs to OAM sprite 0.
    sprite0: bool,
}

impl Default for SpriteSlot {
    fn default() -> Self {
        Self {
            pattern_low: 0,
            pattern_high: 0,
            attributes: SpriteAttributes::empty(),
            x_counter: 0,
            sprite0: false,
        }
    }
}

/// Sprite pixel information produced for a single dot.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SpritePixel {
    /// Sprite palette select (0..=3).
    pub(crate) palette: u8,
    /// Color index within the palette (0 means transparent).
    pub(crate) color: u8,
    /// Whether the sprite is drawn behind the background.
    pub(crate) priority_behind_bg: bool,
    /// Whether this pixel came from sprite 0.
    pub(crate) is_sprite0: bool,
}

/// Sprite pixel pipeline for the current scanline.
///
/// Eight slots, each with two pattern shifters and an X counter. When the
/// counter reaches zero the shifters begin outputting one bit per dot.
#[derive(Debug, Clone)]
pub(crate) struct SpritePipeline {
    slots: [SpriteSlot; 8],
    active_count: u8,
}

impl SpritePipeline {
    pub(crate) fn new() -> Self {
        Self {
            slots: [SpriteSlot::default(); 8],
            active_count: 0,
        }
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::new();
    }

    /// Loads sprite data for the new scanline from the evaluation/fetch
    /// buffers.
    ///
    /// Pattern bytes are pre-reversed when horizontal flip is set so that
    /// shifting left always walks pixels left-to-right.
    pub(crate) fn load_scanline(
        &mut self,
        count: u8,
        sprite0_in_range: bool,
        attrs: &[u8; 8],
        xs: &[u8; 8],
        pattern_low: &[u8; 8],
        pattern_high: &[u8; 8],
    ) {
        self.clear();
        self.active_count = count.min(8);

        for i in 0..self.active_count as usize {
            let attributes = SpriteAttributes::from_bits_retain(attrs[i]);
            let mut low = pattern_low[i];
            let mut high = pattern_high[i];
            if attributes.contains(SpriteAttributes::FLIP_HORIZONTAL) {
                low = low.reverse_bits();
                high = high.reverse_bits();
            }

            self.slots[i] = SpriteSlot {
                pattern_low: low,
                pattern_high: high,
                attributes,
                x_counter: xs[i],
                sprite0: sprite0_in_range && i == 0,
            };
        }
    }

    /// Samples the current sprite pixel (first opaque slot wins) and
    /// advances the active shifters by one dot.
    pub(crate) fn sample_and_shift(&mut self) -> SpritePixel {
        let mut chosen: Option<SpritePixel> = None;

        for slot in self.slots.iter_mut().take(self.active_count as usize) {
            if slot.x_counter > 0 {
                slot.x_counter -= 1;
                continue;
            }

            let bit0 = (slot.pattern_low >> 7) & 1;
            let bit1 = (slot.pattern_high >> 7) & 1;
            let color = (bit1 << 1) | bit0;

            if chosen.is_none() && color != 0 {
                chosen = Some(SpritePixel {
                    palette: (slot.attributes & SpriteAttributes::PALETTE).bits(),
                    color,
                    priority_behind_bg: slot
                        .attributes
                        .contains(SpriteAttributes::PRIORITY_BEHIND_BACKGROUND),
                    is_sprite0: slot.sprite0,
                });
            }

            slot.pattern_low <<= 1;
            slot.pattern_high <<= 1;
        }

        chosen.unwrap_or_default()
    }
}

impl Default for SpritePipeline {
    fn default() -> Self {
        Self::new()
    }
}
