//! # Fixed-Layout Rows
//!
//! A row is exactly 291 bytes on disk:
//!
//! ```text
//! Offset  Size  Field     Description
//! ------  ----  --------  -----------------------------------
//! 0       4     id        little-endian; the B+tree key as u32
//! 4       32    username  zero-padded bytes
//! 36      255   email     zero-padded bytes
//! ```
//!
//! The id is signed for display but its raw bits are used as an unsigned
//! B+tree key, so serialization is identical either way. Unused trailing
//! bytes of the string fields are zero and are trimmed by the accessors.

use std::borrow::Cow;
use std::fmt;

use eyre::{Result, ensure};

use crate::config::{
    EMAIL_OFFSET, EMAIL_SIZE, ID_OFFSET, ROW_SIZE, USERNAME_OFFSET, USERNAME_SIZE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row {
    id: i32,
    username: [u8; USERNAME_SIZE],
    email: [u8; EMAIL_SIZE],
}

impl Row {
    /// Builds a row, rejecting string fields that exceed their fixed width.
    pub fn new(id: i32, username: &str, email: &str) -> Result<Self> {
        ensure!(username.len() <= USERNAME_SIZE, "string is too long");
        ensure!(email.len() <= EMAIL_SIZE, "string is too long");

        let mut row = Self {
            id,
            username: [0; USERNAME_SIZE],
            email: [0; EMAIL_SIZE],
        };
        row.username[..username.len()].copy_from_slice(username.as_bytes());
        row.email[..email.len()].copy_from_slice(email.as_bytes());

        Ok(row)
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    /// The id reinterpreted as the unsigned B+tree key.
    pub fn key(&self) -> u32 {
        self.id as u32
    }

    pub fn username(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(trim_padding(&self.username))
    }

    pub fn email(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(trim_padding(&self.email))
    }

    /// Writes the 291-byte wire form into `dest[..ROW_SIZE]`.
    pub fn serialize(&self, dest: &mut [u8]) {
        debug_assert!(dest.len() >= ROW_SIZE);
        dest[ID_OFFSET..ID_OFFSET + 4].copy_from_slice(&(self.id as u32).to_le_bytes());
        dest[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE].copy_from_slice(&self.username);
        dest[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE].copy_from_slice(&self.email);
    }

    /// Reads a row back from its 291-byte wire form.
    pub fn deserialize(src: &[u8]) -> Self {
        debug_assert!(src.len() >= ROW_SIZE);
        let mut id_bytes = [0u8; 4];
        id_bytes.copy_from_slice(&src[ID_OFFSET..ID_OFFSET + 4]);

        let mut username = [0u8; USERNAME_SIZE];
        username.copy_from_slice(&src[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE]);

        let mut email = [0u8; EMAIL_SIZE];
        email.copy_from_slice(&src[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE]);

        Self {
            id: u32::from_le_bytes(id_bytes) as i32,
            username,
            email,
        }
    }
}

fn trim_padding(field: &[u8]) -> &[u8] {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    &field[..end]
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username(), self.email())
    }
}
