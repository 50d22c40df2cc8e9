//! Class numbers: the capture-group tags carried in class payload entries.
//!
//! Class numbers occupy a single byte. `0` is reserved for the whole-match marker
//! used by result highlighting and cannot be assigned by queries. Numbers from
//! [`ClassNumber::TEMPORARY_MIN`] upwards are temporary: intermediate operators
//! may use them to mark sub-spans, and [`focus`](crate::SpanQuery::focus) strips
//! them from the payload it emits.

use std::fmt;

use lexspan_common::{Result, error::Error};
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ClassNumber(u8);

impl ClassNumber {
    /// Reserved marker for the whole match.
    pub const MATCH: ClassNumber = ClassNumber(0);

    /// The class used when a query marks a span without naming a number.
    pub const DEFAULT: ClassNumber = ClassNumber(1);

    /// Lowest temporary class number.
    pub const TEMPORARY_MIN: u8 = 128;

    /// Validates a user-supplied class number.
    pub fn new(value: i64) -> Result<ClassNumber> {
        if value == Self::MATCH.0 as i64 {
            return Err(Error::invalid_class_number(
                value,
                "class 0 is reserved for the match marker",
            ));
        }
        u8::try_from(value)
            .map(ClassNumber)
            .map_err(|_| Error::invalid_class_number(value, "class numbers range from 1 to 255"))
    }

    /// Returns the `index`-th temporary class number.
    pub fn temporary(index: u8) -> Result<ClassNumber> {
        ClassNumber::new(Self::TEMPORARY_MIN as i64 + index as i64)
    }

    /// Reinterprets a byte read from a class payload entry. No validation.
    #[inline]
    pub(crate) const fn from_raw(value: u8) -> ClassNumber {
        ClassNumber(value)
    }

    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn is_temporary(self) -> bool {
        self.0 >= Self::TEMPORARY_MIN
    }
}

impl fmt::Display for ClassNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A set of class numbers, stored as a 256-bit bitmap.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ClassSet([u64; 4]);

impl ClassSet {
    pub fn new() -> ClassSet {
        ClassSet::default()
    }

    pub fn insert(&mut self, class: ClassNumber) {
        let value = class.get() as usize;
        self.0[value / 64] |= 1u64 << (value % 64);
    }

    #[inline]
    pub fn contains(&self, class: ClassNumber) -> bool {
        let value = class.get() as usize;
        self.0[value / 64] & (1u64 << (value % 64)) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&word| word == 0)
    }

    pub fn len(&self) -> usize {
        self.0.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Iterates the members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = ClassNumber> + '_ {
        (0..=u8::MAX)
            .map(ClassNumber::from_raw)
            .filter(|&class| self.contains(class))
    }
}

impl FromIterator<ClassNumber> for ClassSet {
    fn from_iter<T: IntoIterator<Item = ClassNumber>>(iter: T) -> Self {
        let mut set = ClassSet::new();
        for class in iter {
            set.insert(class);
        }
        set
    }
}

impl fmt::Debug for ClassSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|c| c.get())).finish()
    }
}

impl Serialize for ClassSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_number_validation() {
        assert_eq!(ClassNumber::new(1).unwrap(), ClassNumber::DEFAULT);
        assert_eq!(ClassNumber::new(255).unwrap().get(), 255);
        assert!(ClassNumber::new(0).is_err());
        assert!(ClassNumber::new(256).is_err());
        assert!(ClassNumber::new(-3).is_err());
        let err = ClassNumber::new(0).unwrap_err();
        assert!(err.is_construction_error());
    }

    #[test]
    fn test_temporary_classes() {
        assert!(!ClassNumber::new(127).unwrap().is_temporary());
        let temp = ClassNumber::temporary(0).unwrap();
        assert_eq!(temp.get(), 128);
        assert!(temp.is_temporary());
        assert!(ClassNumber::temporary(128).is_err());
    }

    #[test]
    fn test_class_set() {
        let set: ClassSet = [3, 1, 200, 3]
            .into_iter()
            .map(|n| ClassNumber::new(n).unwrap())
            .collect();
        assert_eq!(set.len(), 3);
        assert!(set.contains(ClassNumber::new(200).unwrap()));
        assert!(!set.contains(ClassNumber::new(2).unwrap()));
        let members: Vec<u8> = set.iter().map(ClassNumber::get).collect();
        assert_eq!(members, vec![1, 3, 200]);
        assert_eq!(format!("{set:?}"), "{1, 3, 200}");
        assert!(ClassSet::new().is_empty());
    }
}
