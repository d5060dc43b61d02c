use rcgen::{DistinguishedName, DnType, DnValue, PrintableString, SerialNumber};
use ring::rand::{SecureRandom, SystemRandom};

use crate::{name::OID_SERIAL_NUMBER, Error, Result};

/// A positive, non-zero 128 bit certificate serial number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Serial([u8; 16]);

impl Serial {
	/// Big-endian bytes of the serial.
	pub fn as_bytes(&self) -> &[u8; 16] {
		&self.0
	}

	/// Base 10 rendering, as used in the subject `serialNumber` attribute.
	pub fn to_decimal(&self) -> String {
		u128::from_be_bytes(self.0).to_string()
	}

	/// Record the serial as the subject `serialNumber` attribute of `dn`,
	/// replacing any previous value.
	pub(crate) fn add_to_subject(&self, dn: &mut DistinguishedName) -> Result<()> {
		let value = PrintableString::try_from(self.to_decimal())?;
		dn.push(
			DnType::CustomDnType(OID_SERIAL_NUMBER.to_vec()),
			DnValue::PrintableString(value),
		);
		Ok(())
	}
}

impl From<Serial> for SerialNumber {
	fn from(serial: Serial) -> Self {
		SerialNumber::from_slice(&serial.0)
	}
}

/// Draw a serial number from the system CSPRNG.
///
/// The high bit is cleared so the DER INTEGER stays positive without a
/// padding byte.
pub fn generate_serial() -> Result<Serial> {
	let rng = SystemRandom::new();
	loop {
		let mut bytes = [0u8; 16];
		rng.fill(&mut bytes).map_err(|_| Error::Random)?;
		bytes[0] &= 0x7f;
		if bytes.iter().any(|b| *b != 0) {
			return Ok(Serial(bytes));
		}
	}
}
