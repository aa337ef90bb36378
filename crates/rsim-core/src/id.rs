//! Strongly-typed identifiers for components and message types.

use std::fmt;

use slotmap::{new_key_type, Key};

new_key_type! {
    /// Identifies a component attached to a kernel.
    ///
    /// Issued by the kernel's component registry when a component is
    /// added. Keys are generational: the id of a removed component never
    /// aliases a component added later in the same slot.
    pub struct ComponentId;
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.data())
    }
}

/// Structural message type identifier.
///
/// A `(major, minor)` pair packed into one `u32`: the major number lives
/// in the high 16 bits and the minor number in the low 16 bits, so
/// related message kinds can share a major group while staying distinct.
///
/// # Examples
///
/// ```
/// use rsim_core::MessageType;
///
/// let ty = MessageType::new(1003, 0xffff);
/// assert_eq!(ty.major(), 1003);
/// assert_eq!(ty.minor(), 0xffff);
/// assert_eq!(MessageType::from_raw(ty.raw()), ty);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageType(u32);

impl MessageType {
    /// Compose a type identifier from its major and minor halves.
    pub const fn new(major: u16, minor: u16) -> Self {
        Self(((major as u32) << 16) | minor as u32)
    }

    /// Rebuild an identifier from its packed representation.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Packed `major << 16 | minor` value.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Major group number.
    pub const fn major(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Minor number within the major group.
    pub const fn minor(self) -> u16 {
        (self.0 & 0xffff) as u16
    }

    /// Whether both identifiers belong to the same major group.
    pub const fn same_major(self, other: MessageType) -> bool {
        self.major() == other.major()
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.major(), self.minor())
    }
}

impl From<u32> for MessageType {
    fn from(raw: u32) -> Self {
        Self::from_raw(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn packs_major_into_high_half() {
        let ty = MessageType::new(1001, 0);
        assert_eq!(ty.raw(), 1001 << 16);
        assert_eq!(ty.major(), 1001);
        assert_eq!(ty.minor(), 0);
    }

    #[test]
    fn full_width_halves_do_not_bleed() {
        let ty = MessageType::new(0xffff, 2);
        assert_eq!(ty.raw(), 0xffff_0002);
        assert_eq!(ty.major(), 0xffff);
        assert_eq!(ty.minor(), 2);
    }

    #[test]
    fn same_major_groups_related_kinds() {
        let a = MessageType::new(1003, 0);
        let b = MessageType::new(1003, 0xffff);
        let c = MessageType::new(1002, 1);
        assert!(a.same_major(b));
        assert!(!a.same_major(c));
        assert_ne!(a, b);
    }

    #[test]
    fn display_is_major_colon_minor() {
        assert_eq!(MessageType::new(10, 3).to_string(), "10:3");
    }

    proptest! {
        #[test]
        fn major_minor_roundtrip(major: u16, minor: u16) {
            let ty = MessageType::new(major, minor);
            prop_assert_eq!(ty.major(), major);
            prop_assert_eq!(ty.minor(), minor);
        }
    }
}
