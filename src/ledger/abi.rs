//! Minimal contract ABI codec covering the poll contract's call and return shapes.
//!
//! Only the types the contract uses are supported: `uint256` (restricted to the `u64` range),
//! `address`, `bool`, `string`, `string[]` and `uint256[]`.

use super::types::{Address, LedgerError};
use sha3::{Digest, Keccak256};

const WORD: usize = 32;

/// An argument to a contract call.
#[derive(Debug, Clone)]
pub enum Token {
	Uint(u64),
	Address(Address),
	String(String),
	StringArray(Vec<String>),
}

impl Token {
	fn is_dynamic(&self) -> bool {
		matches!(self, Token::String(_) | Token::StringArray(_))
	}
}

/// First four bytes of the Keccak-256 hash of a function signature.
pub fn selector(signature: &str) -> [u8; 4] {
	let digest = Keccak256::digest(signature.as_bytes());
	[digest[0], digest[1], digest[2], digest[3]]
}

/// Encode a call to `signature` with the given arguments.
pub fn encode_call(signature: &str, tokens: &[Token]) -> Vec<u8> {
	let mut data = selector(signature).to_vec();
	data.extend(encode_tuple(tokens));
	data
}

fn encode_tuple(tokens: &[Token]) -> Vec<u8> {
	let mut head = Vec::with_capacity(tokens.len() * WORD);
	let mut tail = Vec::new();
	let head_len = tokens.len() * WORD;

	for token in tokens {
		if token.is_dynamic() {
			head.extend(uint_word((head_len + tail.len()) as u64));
			tail.extend(encode_dynamic(token));
		} else {
			head.extend(encode_static(token));
		}
	}

	head.extend(tail);
	head
}

fn encode_static(token: &Token) -> [u8; WORD] {
	match token {
		Token::Uint(value) => uint_word(*value),
		Token::Address(address) => {
			let mut word = [0u8; WORD];
			word[12..].copy_from_slice(address.as_bytes());
			word
		}
		Token::String(_) | Token::StringArray(_) => [0u8; WORD],
	}
}

fn encode_dynamic(token: &Token) -> Vec<u8> {
	match token {
		Token::String(value) => encode_bytes(value.as_bytes()),
		Token::StringArray(values) => {
			let mut out = uint_word(values.len() as u64).to_vec();
			let elements: Vec<Token> = values.iter().cloned().map(Token::String).collect();
			out.extend(encode_tuple(&elements));
			out
		}
		Token::Uint(_) | Token::Address(_) => encode_static(token).to_vec(),
	}
}

fn encode_bytes(bytes: &[u8]) -> Vec<u8> {
	let mut out = uint_word(bytes.len() as u64).to_vec();
	out.extend_from_slice(bytes);
	let padding = (WORD - bytes.len() % WORD) % WORD;
	out.extend(std::iter::repeat_n(0u8, padding));
	out
}

fn uint_word(value: u64) -> [u8; WORD] {
	let mut word = [0u8; WORD];
	word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
	word
}

/// Reader over ABI-encoded return data.
///
/// Slot indices address the words of the top-level return tuple; dynamic values are
/// followed through their offsets.
pub struct Decoder<'a> {
	data: &'a [u8],
}

impl<'a> Decoder<'a> {
	pub fn new(data: &'a [u8]) -> Self {
		Self { data }
	}

	pub fn uint(&self, slot: usize) -> Result<u64, LedgerError> {
		read_u64(self.data, slot * WORD)
	}

	pub fn bool(&self, slot: usize) -> Result<bool, LedgerError> {
		match self.uint(slot)? {
			0 => Ok(false),
			1 => Ok(true),
			other => Err(LedgerError::AbiError(format!(
				"invalid bool value {}",
				other
			))),
		}
	}

	pub fn address(&self, slot: usize) -> Result<Address, LedgerError> {
		let word = read_word(self.data, slot * WORD)?;
		if word[..12].iter().any(|b| *b != 0) {
			return Err(LedgerError::AbiError("dirty address padding".to_string()));
		}
		let mut bytes = [0u8; 20];
		bytes.copy_from_slice(&word[12..]);
		Ok(Address::from_bytes(bytes))
	}

	pub fn string(&self, slot: usize) -> Result<String, LedgerError> {
		let offset = read_offset(self.data, slot * WORD)?;
		read_string(self.data, offset)
	}

	pub fn string_array(&self, slot: usize) -> Result<Vec<String>, LedgerError> {
		let offset = read_offset(self.data, slot * WORD)?;
		let len = read_len(self.data, offset)?;
		let base = offset + WORD;
		(0..len)
			.map(|i| {
				let element = base + read_offset(self.data, base + i * WORD)?;
				read_string(self.data, element)
			})
			.collect()
	}

	pub fn uint_array(&self, slot: usize) -> Result<Vec<u64>, LedgerError> {
		let offset = read_offset(self.data, slot * WORD)?;
		let len = read_len(self.data, offset)?;
		(0..len)
			.map(|i| read_u64(self.data, offset + WORD + i * WORD))
			.collect()
	}
}

fn read_word(data: &[u8], pos: usize) -> Result<&[u8], LedgerError> {
	data.get(pos..pos + WORD).ok_or_else(|| {
		LedgerError::AbiError(format!(
			"data too short: need {} bytes, have {}",
			pos + WORD,
			data.len()
		))
	})
}

fn read_u64(data: &[u8], pos: usize) -> Result<u64, LedgerError> {
	let word = read_word(data, pos)?;
	if word[..WORD - 8].iter().any(|b| *b != 0) {
		return Err(LedgerError::AbiError("value overflows u64".to_string()));
	}
	let mut bytes = [0u8; 8];
	bytes.copy_from_slice(&word[WORD - 8..]);
	Ok(u64::from_be_bytes(bytes))
}

fn read_offset(data: &[u8], pos: usize) -> Result<usize, LedgerError> {
	let offset = read_u64(data, pos)?;
	usize::try_from(offset)
		.ok()
		.filter(|offset| *offset < data.len())
		.ok_or_else(|| LedgerError::AbiError(format!("offset {} out of range", offset)))
}

fn read_len(data: &[u8], pos: usize) -> Result<usize, LedgerError> {
	let len = read_u64(data, pos)?;
	usize::try_from(len)
		.ok()
		.filter(|len| *len <= data.len())
		.ok_or_else(|| LedgerError::AbiError(format!("length {} out of range", len)))
}

fn read_string(data: &[u8], pos: usize) -> Result<String, LedgerError> {
	let len = read_len(data, pos)?;
	let start = pos + WORD;
	let bytes = data.get(start..start + len).ok_or_else(|| {
		LedgerError::AbiError(format!("string of {} bytes runs past end of data", len))
	})?;
	String::from_utf8(bytes.to_vec())
		.map_err(|e| LedgerError::AbiError(format!("string is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn word(value: u64) -> Vec<u8> {
		uint_word(value).to_vec()
	}

	#[test]
	fn selector_matches_well_known_signatures() {
		assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
		assert_eq!(selector("balanceOf(address)"), [0x70, 0xa0, 0x82, 0x31]);
	}

	#[test]
	fn static_arguments_fill_the_head() {
		let data = encode_call("vote(uint256,uint256)", &[Token::Uint(3), Token::Uint(1)]);
		assert_eq!(data.len(), 4 + 2 * WORD);
		assert_eq!(&data[4..36], word(3).as_slice());
		assert_eq!(&data[36..68], word(1).as_slice());
	}

	#[test]
	fn dynamic_arguments_are_referenced_by_offset() {
		let data = encode_call(
			"createPoll(string,string[],uint256)",
			&[
				Token::String("Tabs?".to_string()),
				Token::StringArray(vec!["yes".to_string(), "no".to_string()]),
				Token::Uint(7),
			],
		);
		let args = &data[4..];
		// head: offset(question), offset(options), 7
		assert_eq!(&args[0..32], word(0x60).as_slice());
		// question: len word + one padded word
		assert_eq!(&args[32..64], word(0xa0).as_slice());
		assert_eq!(&args[64..96], word(7).as_slice());
		assert_eq!(&args[0x60..0x80], word(5).as_slice());
		assert_eq!(&args[0x80..0x85], b"Tabs?");
		// options array: length then element offsets relative to the element block
		assert_eq!(&args[0xa0..0xc0], word(2).as_slice());
		assert_eq!(&args[0xc0..0xe0], word(0x40).as_slice());
		assert_eq!(&args[0xe0..0x100], word(0x80).as_slice());
	}

	#[test]
	fn decodes_poll_tuple() {
		let mut creator = [0u8; 20];
		creator[19] = 0x42;

		let mut data = Vec::new();
		// head: question, options, voteCounts, totalVotes, creator, active
		data.extend(word(0xc0));
		data.extend(word(0x100));
		data.extend(word(0x1e0));
		data.extend(word(5));
		let mut address_word = [0u8; WORD];
		address_word[12..].copy_from_slice(&creator);
		data.extend(address_word);
		data.extend(word(1));
		// question at 0xc0
		data.extend(encode_bytes(b"Best editor?"));
		// options at 0x100
		data.extend(word(2));
		data.extend(word(0x40));
		data.extend(word(0x80));
		data.extend(encode_bytes(b"vim"));
		data.extend(encode_bytes(b"emacs"));
		// voteCounts at 0x1e0
		data.extend(word(2));
		data.extend(word(3));
		data.extend(word(2));

		let decoder = Decoder::new(&data);
		assert_eq!(decoder.string(0).unwrap(), "Best editor?");
		assert_eq!(decoder.string_array(1).unwrap(), vec!["vim", "emacs"]);
		assert_eq!(decoder.uint_array(2).unwrap(), vec![3, 2]);
		assert_eq!(decoder.uint(3).unwrap(), 5);
		assert_eq!(decoder.address(4).unwrap(), Address::from_bytes(creator));
		assert!(decoder.bool(5).unwrap());
	}

	#[test]
	fn truncated_data_is_an_error() {
		let data = word(0x20);
		let decoder = Decoder::new(&data);
		assert!(matches!(decoder.string(0), Err(LedgerError::AbiError(_))));
		assert!(matches!(decoder.uint(1), Err(LedgerError::AbiError(_))));
	}
}
