//! Ordered list of keys returned by prefix listings.
//!
//! The list keeps keys in the order they were appended (scan order). Two
//! external encodings exist:
//!
//! - JSON: an array of strings, always emitted **sorted**. Sorting happens on a
//!   copy; the list itself is never reordered.
//! - Binary: keys joined by a single `0x00` byte with no terminator. The empty
//!   list encodes to zero bytes.
//!
//! A list holding exactly one empty key encodes to zero bytes as well and
//! therefore decodes back as an empty list. Keys containing `0x00` do not
//! survive the binary encoding.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;
use thiserror::Error;

const KEY_SEPARATOR: u8 = 0x00;

/// Errors decoding a [`KeyList`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyListError {
    #[error("key list contains invalid UTF-8 at byte {offset}")]
    InvalidUtf8 { offset: usize },
}

/// Ordered sequence of key strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct KeyList {
    keys: Vec<String>,
}

impl KeyList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append keys to the end of the list. Duplicates are kept.
    pub fn append<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys.extend(keys.into_iter().map(Into::into));
    }

    pub fn push(&mut self, key: impl Into<String>) {
        self.keys.push(key.into());
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.keys.iter()
    }

    pub fn into_keys(self) -> Vec<String> {
        self.keys
    }

    /// Keys in ascending order, leaving the list untouched.
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut sorted: Vec<&str> = self.keys.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted
    }

    /// JSON array of the keys in sorted order.
    pub fn to_sorted_json(&self) -> Vec<u8> {
        // A Vec<&str> always serializes.
        serde_json::to_vec(&self.sorted_keys()).unwrap_or_else(|_| b"[]".to_vec())
    }

    /// Keys joined by `0x00`.
    pub fn to_binary(&self) -> Vec<u8> {
        let total: usize = self.keys.iter().map(String::len).sum::<usize>() + self.keys.len().saturating_sub(1);
        let mut out = Vec::with_capacity(total);
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                out.push(KEY_SEPARATOR);
            }
            out.extend_from_slice(key.as_bytes());
        }
        out
    }

    /// Split `data` on `0x00`. Empty input yields an empty list.
    pub fn from_binary(data: &[u8]) -> Result<Self, KeyListError> {
        if data.is_empty() {
            return Ok(Self::default());
        }
        let mut keys = Vec::new();
        let mut offset = 0usize;
        for part in data.split(|b| *b == KEY_SEPARATOR) {
            let key = std::str::from_utf8(part).map_err(|e| KeyListError::InvalidUtf8 {
                offset: offset + e.valid_up_to(),
            })?;
            keys.push(key.to_owned());
            offset += part.len() + 1;
        }
        Ok(Self { keys })
    }
}

impl Serialize for KeyList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.sorted_keys().serialize(serializer)
    }
}

impl fmt::Display for KeyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(key)?;
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for KeyList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl IntoIterator for KeyList {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.into_iter()
    }
}

impl<'a> IntoIterator for &'a KeyList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn append_keeps_order_and_duplicates() {
        let mut list = KeyList::new();
        list.append(["b", "a"]);
        list.append(["b"]);
        assert_eq!(list.keys(), ["b", "a", "b"]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn json_is_sorted_without_reordering_list() {
        let list: KeyList = ["b", "a", "c"].into_iter().collect();
        assert_eq!(list.to_sorted_json(), br#"["a","b","c"]"#.to_vec());
        assert_eq!(serde_json::to_string(&list).unwrap(), r#"["a","b","c"]"#);
        assert_eq!(list.keys(), ["b", "a", "c"]);
    }

    #[test]
    fn json_deserialize_keeps_given_order() {
        let list: KeyList = serde_json::from_str(r#"["z","a"]"#).unwrap();
        assert_eq!(list.keys(), ["z", "a"]);
    }

    #[test]
    fn empty_list_json() {
        assert_eq!(KeyList::new().to_sorted_json(), b"[]".to_vec());
    }

    #[test]
    fn binary_layout() {
        let list: KeyList = ["a", "bc"].into_iter().collect();
        assert_eq!(list.to_binary(), b"a\0bc".to_vec());
        assert!(KeyList::new().to_binary().is_empty());
    }

    #[test]
    fn empty_bytes_decode_to_empty_list() {
        assert!(KeyList::from_binary(&[]).unwrap().is_empty());
    }

    #[test]
    fn single_empty_key_collapses_to_empty_list() {
        let list: KeyList = [""].into_iter().collect();
        assert!(list.to_binary().is_empty());
        assert!(KeyList::from_binary(&list.to_binary()).unwrap().is_empty());
    }

    #[test]
    fn empty_keys_between_separators_survive() {
        let decoded = KeyList::from_binary(b"\0a\0").unwrap();
        assert_eq!(decoded.keys(), ["", "a", ""]);
    }

    #[test]
    fn invalid_utf8_reports_offset() {
        let err = KeyList::from_binary(b"ok\0\xff").unwrap_err();
        assert_eq!(err, KeyListError::InvalidUtf8 { offset: 3 });
    }

    #[test]
    fn display_joins_with_newline() {
        let list: KeyList = ["x", "y"].into_iter().collect();
        assert_eq!(list.to_string(), "x\ny");
        assert_eq!(KeyList::new().to_string(), "");
    }

    proptest! {
        #[test]
        fn prop_binary_roundtrip(keys in proptest::collection::vec("[a-z0-9/:_]{1,12}", 0..16)) {
            let list: KeyList = keys.iter().cloned().collect();
            let decoded = KeyList::from_binary(&list.to_binary()).unwrap();
            prop_assert_eq!(decoded, list);
        }
    }
}
