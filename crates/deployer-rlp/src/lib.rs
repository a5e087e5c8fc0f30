//! Recursive-Length-Prefix codec.
//!
//! RLP has exactly two kinds of item: byte strings and lists of items.
//! Integers are byte strings holding the minimal big-endian representation of
//! the value, so zero is the empty string (`0x80`) and never `0x00`.
//!
//! Encoding is infallible: every byte string and list addressable in memory
//! has a length that fits the 8-byte length-of-length field. Decoding rejects
//! anything that is not the canonical (shortest) encoding.

use alloy_primitives::U256;
use thiserror::Error;

mod decode;

pub use decode::{decode, Item, MAX_DEPTH};

/// Offset of the single-byte header for short strings.
const STRING_OFFSET: u8 = 0x80;
/// Offset of the single-byte header for short lists.
const LIST_OFFSET: u8 = 0xc0;
/// Longest payload that still fits the short (single-byte header) form.
const SHORT_PAYLOAD_MAX: usize = 55;

/// Errors that can occur while decoding RLP input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RlpError {
	/// The input was empty.
	#[error("Empty input")]
	EmptyInput,
	/// The header announced more bytes than the input holds.
	#[error("Unexpected end of input: needed {needed} bytes, {available} available")]
	UnexpectedEnd { needed: usize, available: usize },
	/// The item is valid RLP but not its shortest encoding.
	#[error("Non-canonical encoding: {0}")]
	NonCanonical(&'static str),
	/// Bytes remained after the top-level item.
	#[error("{0} trailing bytes after item")]
	TrailingBytes(usize),
	/// A byte string was expected but a list was found.
	#[error("Expected a byte string, found a list")]
	ExpectedString,
	/// A list was expected but a byte string was found.
	#[error("Expected a list, found a byte string")]
	ExpectedList,
	/// An integer does not fit the requested width.
	#[error("Integer of {len} bytes exceeds {max} bytes")]
	IntegerOverflow { len: usize, max: usize },
	/// A list had a different number of elements than expected.
	#[error("Expected {expected} list elements, found {found}")]
	UnexpectedLength { expected: usize, found: usize },
	/// Lists are nested deeper than the decoder allows.
	#[error("Lists nested deeper than {max} levels")]
	TooDeep { max: usize },
}

/// Strips leading zero bytes, yielding the minimal big-endian form.
pub fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
	let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
	&bytes[first..]
}

/// Encodes a header for a payload of `len` bytes using `offset` as the base.
///
/// Short payloads get `offset + len`; long payloads get
/// `offset + 55 + len(len_bytes)` followed by the big-endian length.
fn encode_header(len: usize, offset: u8, out: &mut Vec<u8>) {
	if len <= SHORT_PAYLOAD_MAX {
		out.push(offset + len as u8);
	} else {
		let len_be = (len as u64).to_be_bytes();
		let len_bytes = trim_leading_zeros(&len_be);
		out.push(offset + SHORT_PAYLOAD_MAX as u8 + len_bytes.len() as u8);
		out.extend_from_slice(len_bytes);
	}
}

/// Encodes a byte string.
///
/// A single byte below `0x80` is its own encoding; everything else gets a
/// length header.
pub fn encode_bytes(bytes: &[u8]) -> Vec<u8> {
	if bytes.len() == 1 && bytes[0] < STRING_OFFSET {
		return vec![bytes[0]];
	}
	let mut out = Vec::with_capacity(bytes.len() + 9);
	encode_header(bytes.len(), STRING_OFFSET, &mut out);
	out.extend_from_slice(bytes);
	out
}

/// Encodes an unsigned 64-bit integer.
pub fn encode_u64(value: u64) -> Vec<u8> {
	encode_bytes(trim_leading_zeros(&value.to_be_bytes()))
}

/// Encodes an unsigned 256-bit integer.
pub fn encode_uint(value: U256) -> Vec<u8> {
	encode_bytes(trim_leading_zeros(&value.to_be_bytes::<32>()))
}

/// Wraps already-encoded items into a list.
pub fn encode_list<I: AsRef<[u8]>>(items: &[I]) -> Vec<u8> {
	let payload_len: usize = items.iter().map(|item| item.as_ref().len()).sum();
	let mut out = Vec::with_capacity(payload_len + 9);
	encode_header(payload_len, LIST_OFFSET, &mut out);
	for item in items {
		out.extend_from_slice(item.as_ref());
	}
	out
}
