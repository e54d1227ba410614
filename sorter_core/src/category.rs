//! Object categories and the wire codes that name them.

use std::fmt;

/// Classification label assigned upstream.
///
/// Adding a category means adding a variant here and a lane in the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    A,
    B,
    C,
}

impl Category {
    pub const COUNT: usize = 3;
    pub const ALL: [Category; Self::COUNT] = [Category::A, Category::B, Category::C];

    /// Position of this category's lane, queue and actuator.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Category::A => 0,
            Category::B => 1,
            Category::C => 2,
        }
    }

    /// Code sent by the classifier for this category.
    #[inline]
    pub const fn code(self) -> u8 {
        match self {
            Category::A => 0,
            Category::B => 1,
            Category::C => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Category::A => "a",
            Category::B => "b",
            Category::C => "c",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Code the classifier sends when it could not settle on a category.
pub const UNIDENTIFIED_CODE: u8 = 3;

/// Meaning of one inbound code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    Category(Category),
    Unidentified,
    Unknown(u8),
}

impl Inbound {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Inbound::Category(Category::A),
            1 => Inbound::Category(Category::B),
            2 => Inbound::Category(Category::C),
            UNIDENTIFIED_CODE => Inbound::Unidentified,
            other => Inbound::Unknown(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_inbound() {
        for c in Category::ALL {
            assert_eq!(Inbound::from_code(c.code()), Inbound::Category(c));
            assert_eq!(Category::ALL[c.index()], c);
        }
    }

    #[test]
    fn non_category_codes() {
        assert_eq!(Inbound::from_code(3), Inbound::Unidentified);
        assert_eq!(Inbound::from_code(4), Inbound::Unknown(4));
        assert_eq!(Inbound::from_code(255), Inbound::Unknown(255));
    }
}
