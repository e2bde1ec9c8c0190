//! Packed per-voxel light: `SSSS RRRR GGGG BBBB`, one nibble per channel.
//!
//! The packing is part of the persistence contract; all callers go through
//! these accessors instead of open-coding the bit layout.

/// One of the four light channels stored per voxel.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum LightChannel {
    Sky,
    Red,
    Green,
    Blue,
}

impl LightChannel {
    /// All four channels, sky first.
    pub const ALL: [LightChannel; 4] = [
        LightChannel::Sky,
        LightChannel::Red,
        LightChannel::Green,
        LightChannel::Blue,
    ];

    /// The three block-light channels.
    pub const BLOCK: [LightChannel; 3] =
        [LightChannel::Red, LightChannel::Green, LightChannel::Blue];

    #[inline]
    pub const fn shift(self) -> u16 {
        match self {
            LightChannel::Sky => 12,
            LightChannel::Red => 8,
            LightChannel::Green => 4,
            LightChannel::Blue => 0,
        }
    }
}

/// Packed light value of one voxel. Each channel is `0..=15`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct PackedLight(pub u16);

impl PackedLight {
    pub const DARK: PackedLight = PackedLight(0);
    pub const MAX_LEVEL: u8 = 15;

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn from_channels(sky: u8, r: u8, g: u8, b: u8) -> Self {
        PackedLight(
            ((sky as u16 & 0xF) << 12)
                | ((r as u16 & 0xF) << 8)
                | ((g as u16 & 0xF) << 4)
                | (b as u16 & 0xF),
        )
    }

    #[inline]
    pub const fn channel(self, ch: LightChannel) -> u8 {
        ((self.0 >> ch.shift()) & 0xF) as u8
    }

    #[inline]
    pub fn with_channel(self, ch: LightChannel, v: u8) -> Self {
        debug_assert!(v <= Self::MAX_LEVEL);
        let shift = ch.shift();
        PackedLight((self.0 & !(0xF << shift)) | (((v & 0xF) as u16) << shift))
    }

    #[inline]
    pub const fn sky(self) -> u8 {
        self.channel(LightChannel::Sky)
    }

    #[inline]
    pub const fn red(self) -> u8 {
        self.channel(LightChannel::Red)
    }

    #[inline]
    pub const fn green(self) -> u8 {
        self.channel(LightChannel::Green)
    }

    #[inline]
    pub const fn blue(self) -> u8 {
        self.channel(LightChannel::Blue)
    }
}
