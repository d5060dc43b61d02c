//! Certificate, CSR and key generation.
use std::{
	borrow::Cow,
	fs::{self, File, OpenOptions},
	io::Write,
	net::IpAddr,
	path::Path,
};

use rcgen::{Ia5String, SanType};

use crate::{Error, Result};

mod ca;
pub use ca::{Ca, CaBuilder, DEFAULT_CA_MONTHS};
mod csr;
pub use csr::{check_identities, Csr, CsrBuilder};
mod key;
pub use key::{load_key_pair, KeyAlgorithm};
mod serial;
pub use serial::{generate_serial, Serial};
mod sign;
pub use sign::{CaIssuer, CertType, IssuedCertificate};
mod validity;
pub use validity::{add_months, Validity};

/// PEM label of an X.509 certificate.
pub const PEM_CERTIFICATE: &str = "CERTIFICATE";
/// PEM label of a PKCS#10 certificate signing request.
pub const PEM_CERTIFICATE_REQUEST: &str = "CERTIFICATE REQUEST";

/// Encoded artefact (certificate or CSR) and the encoded private key
/// belonging to it.
#[derive(Debug, Clone)]
pub struct KeyedOutput {
	/// Certificate or CSR bytes.
	pub data: Vec<u8>,
	/// Private key bytes.
	pub private_key: Vec<u8>,
}

impl KeyedOutput {
	/// Write `data` to `data_path` and the key to `key_path`, both
	/// readable by the owner only.
	pub fn write(&self, data_path: &Path, key_path: &Path) -> Result<()> {
		write_private(data_path, &self.data)?;
		write_private(key_path, &self.private_key)?;
		Ok(())
	}
}

/// Read a whole file, naming it in the error.
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
	fs::read(path).map_err(|source| Error::Read {
		path: path.to_owned(),
		source,
	})
}

/// Create or truncate `path` with mode 0600 and write `contents` to it.
pub fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
	let wrap = |source| Error::Write {
		path: path.to_owned(),
		source,
	};
	let mut out = private_file(path).map_err(wrap)?;
	out.write_all(contents).map_err(wrap)?;
	tracing::info!(path = %path.display(), bytes = contents.len(), "wrote file");
	Ok(())
}

#[cfg(unix)]
fn private_file(path: &Path) -> std::io::Result<File> {
	use std::os::unix::fs::OpenOptionsExt;
	OpenOptions::new()
		.write(true)
		.create(true)
		.truncate(true)
		.mode(0o600)
		.open(path)
}

#[cfg(not(unix))]
fn private_file(path: &Path) -> std::io::Result<File> {
	OpenOptions::new()
		.write(true)
		.create(true)
		.truncate(true)
		.open(path)
}

/// DER payloads found in `input`.
///
/// PEM input yields the contents of every block whose label satisfies
/// `label`, in file order. Input without any PEM block is returned as-is,
/// on the assumption that it already is DER.
pub(crate) fn der_payloads<'a>(input: &'a [u8], label: impl Fn(&str) -> bool) -> Vec<Cow<'a, [u8]>> {
	match pem::parse_many(input) {
		Ok(blocks) if !blocks.is_empty() => blocks
			.into_iter()
			.filter(|block| label(block.tag()))
			.map(|block| Cow::Owned(block.into_contents()))
			.collect(),
		_ => vec![Cow::Borrowed(input)],
	}
}

/// Build `SanType`s from DNS names and IP addresses. A name that parses as
/// an IP address is recorded as one.
pub fn subject_alt_names(names: &[String], ips: &[IpAddr]) -> Result<Vec<SanType>> {
	let mut sans = Vec::with_capacity(names.len() + ips.len());
	for name in names {
		sans.push(parse_san(name)?);
	}
	sans.extend(ips.iter().copied().map(SanType::IpAddress));
	Ok(sans)
}

fn parse_san(host: &str) -> Result<SanType> {
	if let Ok(ip) = host.parse::<IpAddr>() {
		Ok(SanType::IpAddress(ip))
	} else {
		Ok(SanType::DnsName(Ia5String::try_from(host)?))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_write_files() -> anyhow::Result<()> {
		use assert_fs::prelude::*;
		let temp = assert_fs::TempDir::new()?;
		let cert = temp.child("ca.cer");
		let key = temp.child("ca.key");

		let output = KeyedOutput {
			data: b"x".to_vec(),
			private_key: b"y".to_vec(),
		};

		output.write(cert.path(), key.path())?;

		// assert contents of created files
		cert.assert("x");
		key.assert("y");

		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;
			let mode = std::fs::metadata(key.path())?.permissions().mode();
			assert_eq!(mode & 0o777, 0o600);
		}
		Ok(())
	}

	#[test]
	fn write_truncates_existing_file() -> anyhow::Result<()> {
		use assert_fs::prelude::*;
		let temp = assert_fs::TempDir::new()?;
		let file = temp.child("out.der");
		file.write_str("a much longer previous content")?;

		write_private(file.path(), b"short")?;
		file.assert("short");
		Ok(())
	}

	#[test]
	fn read_missing_file_names_path() {
		let err = read_file(Path::new("/nonexistent/ca.cer")).unwrap_err();
		assert!(err.to_string().contains("/nonexistent/ca.cer"));
	}

	#[test]
	fn test_parse_san() {
		let names = vec!["my.host.com".to_string(), "185.199.108.153".to_string()];
		let ips = vec!["::1".parse().unwrap()];
		let sans = subject_alt_names(&names, &ips).unwrap();
		assert_eq!(
			SanType::DnsName(Ia5String::try_from("my.host.com").unwrap()),
			sans[0]
		);
		assert_eq!(
			SanType::IpAddress("185.199.108.153".parse().unwrap()),
			sans[1]
		);
		assert_eq!(SanType::IpAddress("::1".parse().unwrap()), sans[2]);
	}

	#[test]
	fn non_ascii_san_is_rejected() {
		assert!(subject_alt_names(&["bücher.example".to_string()], &[]).is_err());
	}

	#[test]
	fn der_payloads_filters_by_label() {
		let input = "-----BEGIN FOO-----\nAQI=\n-----END FOO-----\n\
			-----BEGIN CERTIFICATE-----\nAwQ=\n-----END CERTIFICATE-----\n";
		let found = der_payloads(input.as_bytes(), |tag| tag == PEM_CERTIFICATE);
		assert_eq!(found.len(), 1);
		assert_eq!(&found[0][..], &[3u8, 4][..]);
	}

	#[test]
	fn der_payloads_passes_raw_der_through() {
		let der = [0x30u8, 0x03, 0x02, 0x01, 0x01];
		let found = der_payloads(&der, |_| true);
		assert_eq!(found, vec![Cow::Borrowed(&der[..])]);
	}
}
