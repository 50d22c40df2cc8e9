//! Payload entries attached to spans.
//!
//! A payload entry is an opaque byte blob. Entries produced by this crate start
//! with a [`PayloadKind`] byte that tells consumers how to decode the remainder;
//! all integers are stored big-endian.
//!
//! | kind            | layout                                               |
//! |-----------------|------------------------------------------------------|
//! | `Opaque`        | `0x00`, arbitrary bytes                              |
//! | `TokenOffsets`  | `0x01`, char start (u32), char end (u32)             |
//! | `Class`         | `0x02`, start (u32), end (u32), class number (u8)    |
//!
//! Payload is carried as an unordered multiset. Operators that combine spans
//! concatenate their children's entries; when two derivations produce the same
//! interval their entries are merged without duplicates (see [`merge_unique`]).

use std::fmt;

use tinyvec::TinyVec;

use crate::{class::ClassNumber, span::Position};

/// Discriminates the payload entry layouts known to this crate.
///
/// The `#[repr(u8)]` values are part of the payload format and must not change.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[repr(u8)]
pub enum PayloadKind {
    Opaque = 0,
    TokenOffsets = 1,
    Class = 2,
}

impl TryFrom<u8> for PayloadKind {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PayloadKind::Opaque),
            1 => Ok(PayloadKind::TokenOffsets),
            2 => Ok(PayloadKind::Class),
            _ => Err("PayloadKind: invalid value"),
        }
    }
}

const CLASS_ENTRY_LEN: usize = 10;
const OFFSETS_ENTRY_LEN: usize = 9;

/// A single payload blob. Entries up to 16 bytes (all structured kinds) are
/// stored inline.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PayloadEntry(TinyVec<[u8; 16]>);

impl PayloadEntry {
    /// Wraps raw bytes as they came from a position source.
    pub fn from_bytes(bytes: &[u8]) -> PayloadEntry {
        let mut buf = TinyVec::new();
        buf.extend_from_slice(bytes);
        PayloadEntry(buf)
    }

    /// Creates an `Opaque` entry around `bytes`.
    pub fn opaque(bytes: &[u8]) -> PayloadEntry {
        let mut buf = TinyVec::with_capacity(bytes.len() + 1);
        buf.push(PayloadKind::Opaque as u8);
        buf.extend_from_slice(bytes);
        PayloadEntry(buf)
    }

    /// Creates a `TokenOffsets` entry holding the character offsets of a token.
    pub fn token_offsets(char_start: u32, char_end: u32) -> PayloadEntry {
        let mut buf = TinyVec::new();
        buf.push(PayloadKind::TokenOffsets as u8);
        buf.extend_from_slice(&char_start.to_be_bytes());
        buf.extend_from_slice(&char_end.to_be_bytes());
        PayloadEntry(buf)
    }

    /// Creates a `Class` entry marking `[start, end)` with `class`.
    pub fn class(start: Position, end: Position, class: ClassNumber) -> PayloadEntry {
        ClassPayload { start, end, class }.encode()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The entry kind, or `None` if the entry is empty or carries an unknown tag.
    pub fn kind(&self) -> Option<PayloadKind> {
        self.0.first().and_then(|&b| PayloadKind::try_from(b).ok())
    }

    /// Decodes a class entry. Returns `None` for any other kind or a malformed entry.
    pub fn as_class(&self) -> Option<ClassPayload> {
        if self.kind() != Some(PayloadKind::Class) || self.0.len() != CLASS_ENTRY_LEN {
            return None;
        }
        Some(ClassPayload {
            start: read_u32(&self.0[1..5]),
            end: read_u32(&self.0[5..9]),
            class: ClassNumber::from_raw(self.0[9]),
        })
    }

    /// Decodes a token offsets entry into `(char_start, char_end)`.
    pub fn as_token_offsets(&self) -> Option<(u32, u32)> {
        if self.kind() != Some(PayloadKind::TokenOffsets) || self.0.len() != OFFSETS_ENTRY_LEN {
            return None;
        }
        Some((read_u32(&self.0[1..5]), read_u32(&self.0[5..9])))
    }
}

impl fmt::Debug for PayloadEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(class) = self.as_class() {
            write!(f, "Class({}: {}-{})", class.class, class.start, class.end)
        } else if let Some((start, end)) = self.as_token_offsets() {
            write!(f, "Offsets({start}-{end})")
        } else {
            write!(f, "Bytes({:02x?})", self.as_bytes())
        }
    }
}

/// Decoded form of a `Class` payload entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassPayload {
    pub start: Position,
    pub end: Position,
    pub class: ClassNumber,
}

impl ClassPayload {
    pub fn encode(&self) -> PayloadEntry {
        let mut buf = TinyVec::new();
        buf.push(PayloadKind::Class as u8);
        buf.extend_from_slice(&self.start.to_be_bytes());
        buf.extend_from_slice(&self.end.to_be_bytes());
        buf.push(self.class.get());
        PayloadEntry(buf)
    }
}

/// Returns the convex hull `(min start, max end)` of all class entries in
/// `payload` whose class satisfies `select`, or `None` if there are none.
pub fn class_hull(
    payload: &[PayloadEntry],
    mut select: impl FnMut(ClassNumber) -> bool,
) -> Option<(Position, Position)> {
    payload
        .iter()
        .filter_map(PayloadEntry::as_class)
        .filter(|entry| select(entry.class))
        .fold(None, |hull, entry| match hull {
            None => Some((entry.start, entry.end)),
            Some((start, end)) => Some((start.min(entry.start), end.max(entry.end))),
        })
}

/// Appends the entries of `src` that are not already present in `dst`.
pub fn merge_unique(dst: &mut Vec<PayloadEntry>, src: &[PayloadEntry]) {
    for entry in src {
        if !dst.contains(entry) {
            dst.push(entry.clone());
        }
    }
}

#[inline]
fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
