use crate::ledger::Address;

/// Render an address as `0x1234...abcd`.
pub fn short_address(address: &Address) -> String {
	let full = address.to_string();
	format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

/// Current wall-clock time in seconds since the epoch.
pub fn unix_now() -> u64 {
	u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn shortens_addresses() {
		let address: Address = "0x1234567890abcdef1234567890abcdef1234abcd".parse().unwrap();
		assert_eq!(short_address(&address), "0x1234...abcd");
	}
}
