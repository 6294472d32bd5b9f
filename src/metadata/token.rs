//! Identity tokens for types and members.
//!
//! Every type, method, property, event and field known to a
//! [`TypeRegistry`](crate::metadata::typesystem::TypeRegistry) is addressed by a [`Token`].
//! Tokens follow the CLI layout: the high byte names the table the entity lives in, the low
//! 24 bits are its row. Tokens are cheap to copy and are what synthesized proxy members capture
//! as the identity of the capability member they forward to.

use std::fmt;

use strum::{Display, EnumIter};

/// The table a [`Token`] points into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
#[repr(u8)]
pub enum TableKind {
    /// Type definitions (interfaces, classes, synthesized proxies)
    TypeDef = 0x02,
    /// Field definitions
    Field = 0x04,
    /// Method definitions, including property and event accessors
    MethodDef = 0x06,
    /// Event definitions
    Event = 0x14,
    /// Property definitions
    Property = 0x17,
}

impl TableKind {
    /// Maps a raw table byte back to its kind.
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x02 => Some(TableKind::TypeDef),
            0x04 => Some(TableKind::Field),
            0x06 => Some(TableKind::MethodDef),
            0x14 => Some(TableKind::Event),
            0x17 => Some(TableKind::Property),
            _ => None,
        }
    }
}

/// A token identifying one registered type or member.
///
/// - The high byte (bits 24-31) indicates the table
/// - The low 24 bits (bits 0-23) indicate the row index within that table
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(pub u32);

impl Token {
    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Creates a token for `row` in `table`
    #[must_use]
    pub fn from_parts(table: TableKind, row: u32) -> Self {
        Token(((table as u32) << 24) | (row & 0x00FF_FFFF))
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the table byte from the token (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// The table kind, if the table byte is one this crate assigns
    #[must_use]
    pub fn kind(&self) -> Option<TableKind> {
        TableKind::from_byte(self.table())
    }

    /// Extracts the row index from the token (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true if this is a null token (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Some(kind) => write!(f, "Token(0x{:08x}, {}, row: {})", self.0, kind, self.row()),
            None => write!(
                f,
                "Token(0x{:08x}, table: 0x{:02x}, row: {})",
                self.0,
                self.table(),
                self.row()
            ),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_token_from_parts() {
        let token = Token::from_parts(TableKind::MethodDef, 1);
        assert_eq!(token.value(), 0x06000001);
        assert_eq!(token.table(), 0x06);
        assert_eq!(token.row(), 1);
        assert_eq!(token.kind(), Some(TableKind::MethodDef));
    }

    #[test]
    fn test_token_row_is_masked() {
        let token = Token::from_parts(TableKind::Property, 0x0100_0002);
        assert_eq!(token.row(), 2);
        assert_eq!(token.kind(), Some(TableKind::Property));
    }

    #[test]
    fn test_table_kind_round_trip() {
        for kind in TableKind::iter() {
            assert_eq!(TableKind::from_byte(kind as u8), Some(kind));
        }
        assert_eq!(TableKind::from_byte(0x7F), None);
    }

    #[test]
    fn test_token_is_null() {
        assert!(Token(0).is_null());
        assert!(!Token::from_parts(TableKind::TypeDef, 1).is_null());
    }

    #[test]
    fn test_token_display_and_debug() {
        let token = Token::from_parts(TableKind::Event, 3);
        assert_eq!(format!("{token}"), "0x14000003");

        let debug_str = format!("{token:?}");
        assert!(debug_str.contains("Event"));
        assert!(debug_str.contains("row: 3"));

        let unknown = format!("{:?}", Token(0x7F000001));
        assert!(unknown.contains("table: 0x7f"));
    }

    #[test]
    fn test_token_ordering_groups_by_table() {
        let ty = Token::from_parts(TableKind::TypeDef, 9);
        let method = Token::from_parts(TableKind::MethodDef, 1);
        assert!(ty < method);
    }
}
