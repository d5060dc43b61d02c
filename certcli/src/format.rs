//! PEM and DER transcoding of certificates and private keys.
use std::{fmt, path::Path, str::FromStr};

use pem::{EncodeConfig, LineEnding, Pem};
use pki_types::PrivateKeyDer;
use x509_parser::prelude::{FromDer, X509Certificate};

use crate::{
	cert::{read_file, write_private, PEM_CERTIFICATE},
	prompt::OverwriteGuard,
	Error, Result,
};

/// On-disk encoding of a certificate, CSR or key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
	/// Binary ASN.1 DER
	#[default]
	Der,
	/// Base64 DER between `-----BEGIN ...-----` lines
	Pem,
}

impl fmt::Display for Encoding {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Encoding::Der => write!(f, "DER"),
			Encoding::Pem => write!(f, "PEM"),
		}
	}
}

/// What is being converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
	/// An X.509 certificate
	Certificate,
	/// A private key in PKCS#8, PKCS#1 or SEC1 form
	PrivateKey,
}

impl FromStr for ObjectKind {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s.to_lowercase().as_str() {
			"cert" | "certificate" => Ok(ObjectKind::Certificate),
			"key" | "private_key" | "private-key" => Ok(ObjectKind::PrivateKey),
			_ => Err(Error::UnknownObjectKind(s.to_owned())),
		}
	}
}

impl ObjectKind {
	fn not_found(self) -> Error {
		match self {
			ObjectKind::Certificate => Error::NotACertificate,
			ObjectKind::PrivateKey => Error::NotAPrivateKey,
		}
	}

	fn matches_label(self, label: &str) -> bool {
		match self {
			ObjectKind::Certificate => label == PEM_CERTIFICATE,
			ObjectKind::PrivateKey => label.ends_with("PRIVATE KEY"),
		}
	}

	/// PEM label for the DER encoded `der`, after checking that it holds
	/// this kind of object.
	fn pem_label(self, der: &[u8]) -> Result<&'static str> {
		match self {
			ObjectKind::Certificate => {
				X509Certificate::from_der(der).map_err(|_| Error::NotACertificate)?;
				Ok(PEM_CERTIFICATE)
			},
			ObjectKind::PrivateKey => match PrivateKeyDer::try_from(der) {
				Ok(PrivateKeyDer::Pkcs1(_)) => Ok("RSA PRIVATE KEY"),
				Ok(PrivateKeyDer::Sec1(_)) => Ok("EC PRIVATE KEY"),
				Ok(_) => Ok("PRIVATE KEY"),
				Err(_) => Err(Error::NotAPrivateKey),
			},
		}
	}
}

/// PEM encode `der` under `label` with LF line endings.
pub fn encode_pem(label: &str, der: &[u8]) -> String {
	let config = EncodeConfig::new().set_line_ending(LineEnding::LF);
	pem::encode_config(&Pem::new(label, der), config)
}

/// Re-encode `input` from one encoding to the other.
///
/// PEM input yields the first block of the requested kind. DER
/// certificates are checked to parse, and DER keys are labelled by the
/// format they are in.
pub fn transcode(kind: ObjectKind, from: Encoding, to: Encoding, input: &[u8]) -> Result<Vec<u8>> {
	let der = match from {
		Encoding::Der => input.to_vec(),
		Encoding::Pem => pem::parse_many(input)?
			.into_iter()
			.find(|block| kind.matches_label(block.tag()))
			.ok_or_else(|| kind.not_found())?
			.into_contents(),
	};
	match to {
		Encoding::Der => Ok(der),
		Encoding::Pem => {
			let label = kind.pem_label(&der)?;
			Ok(encode_pem(label, &der).into_bytes())
		},
	}
}

/// Convert the file at `input` and write the result to `output`.
///
/// If `output` exists, `guard` is asked first; a refusal leaves it
/// untouched and returns [`Error::OverwriteDeclined`].
pub fn convert_file(
	kind: ObjectKind,
	from: Encoding,
	to: Encoding,
	input: &Path,
	output: &Path,
	guard: &mut impl OverwriteGuard,
) -> Result<()> {
	if output.exists() && !guard.allow_overwrite(output)? {
		return Err(Error::OverwriteDeclined(output.to_owned()));
	}
	let converted = transcode(kind, from, to, &read_file(input)?)?;
	tracing::debug!(?kind, %from, %to, "converted");
	write_private(output, &converted)
}
