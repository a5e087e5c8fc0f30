//! Canonical RLP decoding.

use crate::{RlpError, LIST_OFFSET, SHORT_PAYLOAD_MAX, STRING_OFFSET};
use alloy_primitives::U256;

/// A decoded RLP item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
	String(Vec<u8>),
	List(Vec<Item>),
}

impl Item {
	/// Returns the byte string payload.
	pub fn as_bytes(&self) -> Result<&[u8], RlpError> {
		match self {
			Item::String(bytes) => Ok(bytes),
			Item::List(_) => Err(RlpError::ExpectedString),
		}
	}

	/// Returns the list elements.
	pub fn as_list(&self) -> Result<&[Item], RlpError> {
		match self {
			Item::List(items) => Ok(items),
			Item::String(_) => Err(RlpError::ExpectedList),
		}
	}

	/// Interprets the item as a minimal big-endian unsigned integer.
	pub fn as_u64(&self) -> Result<u64, RlpError> {
		let bytes = integer_bytes(self, 8)?;
		Ok(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
	}

	/// Interprets the item as a minimal big-endian 256-bit integer.
	pub fn as_uint(&self) -> Result<U256, RlpError> {
		let bytes = integer_bytes(self, 32)?;
		Ok(U256::from_be_slice(bytes))
	}
}

fn integer_bytes(item: &Item, max: usize) -> Result<&[u8], RlpError> {
	let bytes = item.as_bytes()?;
	if bytes.len() > max {
		return Err(RlpError::IntegerOverflow {
			len: bytes.len(),
			max,
		});
	}
	if bytes.first() == Some(&0) {
		return Err(RlpError::NonCanonical("integer with leading zero byte"));
	}
	Ok(bytes)
}

/// Deepest list nesting the decoder accepts. A signed transaction is one
/// list of strings, so anything close to this is not a transaction.
pub const MAX_DEPTH: usize = 32;

/// Decodes exactly one item spanning the whole input.
pub fn decode(input: &[u8]) -> Result<Item, RlpError> {
	if input.is_empty() {
		return Err(RlpError::EmptyInput);
	}
	let (item, consumed) = decode_item(input, 0)?;
	if consumed != input.len() {
		return Err(RlpError::TrailingBytes(input.len() - consumed));
	}
	Ok(item)
}

/// Decodes the item at the start of `input`, returning it and its encoded length.
/// `depth` is the number of lists enclosing this item.
fn decode_item(input: &[u8], depth: usize) -> Result<(Item, usize), RlpError> {
	let prefix = *input.first().ok_or(RlpError::UnexpectedEnd {
		needed: 1,
		available: 0,
	})?;

	if prefix < STRING_OFFSET {
		return Ok((Item::String(vec![prefix]), 1));
	}

	let is_list = prefix >= LIST_OFFSET;
	let offset = if is_list { LIST_OFFSET } else { STRING_OFFSET };
	let short = prefix - offset;

	let (header_len, payload_len) = if (short as usize) <= SHORT_PAYLOAD_MAX {
		(1, short as usize)
	} else {
		let len_of_len = short as usize - SHORT_PAYLOAD_MAX;
		let len_bytes = take(input, 1, len_of_len)?;
		if len_bytes[0] == 0 {
			return Err(RlpError::NonCanonical("length with leading zero byte"));
		}
		if len_of_len > std::mem::size_of::<usize>() {
			return Err(RlpError::UnexpectedEnd {
				needed: usize::MAX,
				available: input.len(),
			});
		}
		let len = len_bytes
			.iter()
			.fold(0usize, |acc, b| (acc << 8) | usize::from(*b));
		if len <= SHORT_PAYLOAD_MAX {
			return Err(RlpError::NonCanonical("long form used for short payload"));
		}
		(1 + len_of_len, len)
	};

	let payload = take(input, header_len, payload_len)?;
	let consumed = header_len + payload_len;

	if !is_list {
		if payload_len == 1 && payload[0] < STRING_OFFSET {
			return Err(RlpError::NonCanonical("single byte below 0x80 with prefix"));
		}
		return Ok((Item::String(payload.to_vec()), consumed));
	}

	if depth >= MAX_DEPTH {
		return Err(RlpError::TooDeep { max: MAX_DEPTH });
	}

	let mut items = Vec::new();
	let mut rest = payload;
	while !rest.is_empty() {
		let (item, used) = decode_item(rest, depth + 1)?;
		items.push(item);
		rest = &rest[used..];
	}
	Ok((Item::List(items), consumed))
}

fn take(input: &[u8], start: usize, len: usize) -> Result<&[u8], RlpError> {
	let end = start.checked_add(len).ok_or(RlpError::UnexpectedEnd {
		needed: usize::MAX,
		available: input.len(),
	})?;
	input.get(start..end).ok_or(RlpError::UnexpectedEnd {
		needed: end,
		available: input.len(),
	})
}

/// Re-encodes a decoded item. Used to check that decoding is lossless.
#[cfg(test)]
fn reencode(item: &Item) -> Vec<u8> {
	match item {
		Item::String(bytes) => crate::encode_bytes(bytes),
		Item::List(items) => {
			let encoded: Vec<Vec<u8>> = items.iter().map(reencode).collect();
			crate::encode_list(&encoded)
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{encode_bytes, encode_list, encode_u64};

	#[test]
	fn test_decode_strings() {
		assert_eq!(decode(&[0x80]).unwrap(), Item::String(vec![]));
		assert_eq!(decode(&[0x7f]).unwrap(), Item::String(vec![0x7f]));
		assert_eq!(
			decode(&[0x83, b'd', b'o', b'g']).unwrap(),
			Item::String(b"dog".to_vec())
		);
	}

	#[test]
	fn test_decode_nested_list() {
		let encoded = [0xc7, 0xc0, 0xc1, 0xc0, 0xc3, 0xc0, 0xc1, 0xc0];
		let item = decode(&encoded).unwrap();
		let top = item.as_list().unwrap();
		assert_eq!(top.len(), 3);
		assert_eq!(top[0], Item::List(vec![]));
		assert_eq!(reencode(&item), encoded.to_vec());
	}

	#[test]
	fn test_decode_long_forms() {
		let long_string = encode_bytes(&[0x42; 300]);
		assert_eq!(decode(&long_string).unwrap().as_bytes().unwrap().len(), 300);

		let items: Vec<Vec<u8>> = (0..20).map(encode_u64).collect();
		let long_list = encode_list(&items);
		let decoded = decode(&long_list).unwrap();
		assert_eq!(decoded.as_list().unwrap().len(), 20);
		assert_eq!(reencode(&decoded), long_list);
	}

	#[test]
	fn test_rejects_empty_and_truncated() {
		assert_eq!(decode(&[]), Err(RlpError::EmptyInput));
		assert!(matches!(
			decode(&[0x83, b'd', b'o']),
			Err(RlpError::UnexpectedEnd { .. })
		));
		assert!(matches!(
			decode(&[0xb8]),
			Err(RlpError::UnexpectedEnd { .. })
		));
	}

	#[test]
	fn test_rejects_trailing_bytes() {
		assert_eq!(decode(&[0x80, 0x80]), Err(RlpError::TrailingBytes(1)));
	}

	#[test]
	fn test_rejects_non_canonical() {
		// 0x05 wrapped in a length prefix
		assert!(matches!(
			decode(&[0x81, 0x05]),
			Err(RlpError::NonCanonical(_))
		));
		// long form for a 3-byte payload
		assert!(matches!(
			decode(&[0xb8, 0x03, b'd', b'o', b'g']),
			Err(RlpError::NonCanonical(_))
		));
		// length with leading zero
		let mut padded = vec![0xb9, 0x00, 0x38];
		padded.extend_from_slice(&[0u8; 56]);
		assert!(matches!(decode(&padded), Err(RlpError::NonCanonical(_))));
	}

	#[test]
	fn test_integer_accessors() {
		assert_eq!(decode(&[0x80]).unwrap().as_u64(), Ok(0));
		assert!(matches!(
			decode(&[0x82, 0x00, 0x01]).unwrap().as_u64(),
			Err(RlpError::NonCanonical(_))
		));
		let nine_bytes = encode_bytes(&[0x01; 9]);
		assert_eq!(
			decode(&nine_bytes).unwrap().as_u64(),
			Err(RlpError::IntegerOverflow { len: 9, max: 8 })
		);
		assert!(decode(&nine_bytes).unwrap().as_uint().is_ok());
		assert_eq!(
			decode(&[0xc0]).unwrap().as_u64(),
			Err(RlpError::ExpectedString)
		);
	}

	fn nested_empty_lists(levels: usize) -> Vec<u8> {
		let mut encoded = encode_list::<Vec<u8>>(&[]);
		for _ in 1..levels {
			encoded = encode_list(&[encoded]);
		}
		encoded
	}

	#[test]
	fn test_nesting_up_to_limit_decodes() {
		let mut item = decode(&nested_empty_lists(MAX_DEPTH)).unwrap();
		let mut levels = 1;
		while let Item::List(mut inner) = item {
			match inner.pop() {
				Some(next) => {
					levels += 1;
					item = next;
				},
				None => break,
			}
		}
		assert_eq!(levels, MAX_DEPTH);
	}

	#[test]
	fn test_nesting_past_limit_is_rejected() {
		assert_eq!(
			decode(&nested_empty_lists(MAX_DEPTH + 1)),
			Err(RlpError::TooDeep { max: MAX_DEPTH })
		);
	}

	#[test]
	fn test_deeply_nested_input_returns_error() {
		let input = nested_empty_lists(5_000);
		assert!(input.len() > 10_000);
		assert_eq!(decode(&input), Err(RlpError::TooDeep { max: MAX_DEPTH }));
	}
}
