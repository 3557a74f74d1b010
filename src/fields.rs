//! Optional-field descriptors for GTAB records.
//!
//! Each set bit in the header's fields mask contributes one fixed-width
//! sub-field per record, in the canonical order below. Format v1 only decodes
//! `TideBps`; the other fields still count toward the record size so that
//! offsets of any present field stay correct.

pub const FIELD_TIDE_BPS: u32 = 0x01;
pub const FIELD_TIDE_RAW_F32: u32 = 0x02;
pub const FIELD_MOON_RKM_F32: u32 = 0x04;
pub const FIELD_SUN_RKM_F32: u32 = 0x08;
pub const FIELD_MOON_RINV3_F32: u32 = 0x10;
pub const FIELD_SUN_RINV3_F32: u32 = 0x20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    TideBps,
    TideRawF32,
    MoonRkmF32,
    SunRkmF32,
    MoonRinv3F32,
    SunRinv3F32,
}

impl FieldKind {
    /// Canonical record order. Record layout walks this list, never the raw
    /// mask bits.
    pub const ORDER: [FieldKind; 6] = [
        FieldKind::TideBps,
        FieldKind::TideRawF32,
        FieldKind::MoonRkmF32,
        FieldKind::SunRkmF32,
        FieldKind::MoonRinv3F32,
        FieldKind::SunRinv3F32,
    ];

    pub fn bit(self) -> u32 {
        match self {
            FieldKind::TideBps => FIELD_TIDE_BPS,
            FieldKind::TideRawF32 => FIELD_TIDE_RAW_F32,
            FieldKind::MoonRkmF32 => FIELD_MOON_RKM_F32,
            FieldKind::SunRkmF32 => FIELD_SUN_RKM_F32,
            FieldKind::MoonRinv3F32 => FIELD_MOON_RINV3_F32,
            FieldKind::SunRinv3F32 => FIELD_SUN_RINV3_F32,
        }
    }

    pub fn width(self) -> u64 {
        match self {
            FieldKind::TideBps => 2,
            _ => 4,
        }
    }
}

/// Per-record byte layout derived from a fields mask: the ordered list of
/// present fields with precomputed offsets, and the total record size.
///
/// Unknown mask bits are ignored and contribute nothing, matching the on-disk
/// contract that reserves them for future format revisions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordLayout {
    present: Vec<(FieldKind, u64)>,
    record_size: u64,
}

impl RecordLayout {
    pub fn from_mask(mask: u32) -> RecordLayout {
        let mut present = Vec::new();
        let mut offset = 0u64;
        for kind in FieldKind::ORDER {
            if mask & kind.bit() != 0 {
                present.push((kind, offset));
                offset += kind.width();
            }
        }
        RecordLayout {
            present,
            record_size: offset,
        }
    }

    pub fn record_size(&self) -> u64 {
        self.record_size
    }

    pub fn offset_of(&self, kind: FieldKind) -> Option<u64> {
        self.present
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|&(_, off)| off)
    }

    pub fn present(&self) -> &[(FieldKind, u64)] {
        &self.present
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tide_only_layout() {
        let layout = RecordLayout::from_mask(FIELD_TIDE_BPS);
        assert_eq!(layout.record_size(), 2);
        assert_eq!(layout.offset_of(FieldKind::TideBps), Some(0));
        assert_eq!(layout.offset_of(FieldKind::TideRawF32), None);
    }

    #[test]
    fn full_mask_offsets_follow_canonical_order() {
        let layout = RecordLayout::from_mask(0x3F);
        assert_eq!(layout.record_size(), 2 + 4 * 5);
        assert_eq!(layout.offset_of(FieldKind::TideBps), Some(0));
        assert_eq!(layout.offset_of(FieldKind::TideRawF32), Some(2));
        assert_eq!(layout.offset_of(FieldKind::MoonRkmF32), Some(6));
        assert_eq!(layout.offset_of(FieldKind::SunRinv3F32), Some(18));
    }

    #[test]
    fn tide_absent_when_bit_unset() {
        let layout = RecordLayout::from_mask(FIELD_TIDE_RAW_F32 | FIELD_MOON_RKM_F32);
        assert_eq!(layout.record_size(), 8);
        assert_eq!(layout.offset_of(FieldKind::TideBps), None);
        assert_eq!(layout.offset_of(FieldKind::MoonRkmF32), Some(4));
    }

    #[test]
    fn unknown_bits_are_ignored() {
        let layout = RecordLayout::from_mask(FIELD_TIDE_BPS | 0x8000_0000);
        assert_eq!(layout.record_size(), 2);
        let empty = RecordLayout::from_mask(0x4000_0000);
        assert_eq!(empty.record_size(), 0);
        assert!(empty.present().is_empty());
    }
}
