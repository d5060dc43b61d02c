use std::{fmt, str::FromStr};

use pki_types::PrivatePkcs8KeyDer;
use rcgen::KeyPair;

use super::der_payloads;
use crate::{Error, Result};

/// Supported key pair algorithms
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyAlgorithm {
	/// RSA, 2048 bit modulus
	Rsa2048,
	/// RSA, 3072 bit modulus
	Rsa3072,
	/// RSA, 4096 bit modulus
	#[default]
	Rsa4096,
	/// ECDSA on P-256 with SHA-256
	EcdsaP256,
	/// ECDSA on P-384 with SHA-384
	EcdsaP384,
	/// Ed25519
	Ed25519,
}

impl fmt::Display for KeyAlgorithm {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			KeyAlgorithm::Rsa2048 => write!(f, "rsa2048"),
			KeyAlgorithm::Rsa3072 => write!(f, "rsa3072"),
			KeyAlgorithm::Rsa4096 => write!(f, "rsa4096"),
			KeyAlgorithm::EcdsaP256 => write!(f, "ecdsa-p256"),
			KeyAlgorithm::EcdsaP384 => write!(f, "ecdsa-p384"),
			KeyAlgorithm::Ed25519 => write!(f, "ed25519"),
		}
	}
}

impl FromStr for KeyAlgorithm {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s.to_lowercase().replace('_', "-").as_str() {
			"rsa" | "rsa4096" => Ok(KeyAlgorithm::Rsa4096),
			"rsa2048" => Ok(KeyAlgorithm::Rsa2048),
			"rsa3072" => Ok(KeyAlgorithm::Rsa3072),
			"ecdsa-p256" => Ok(KeyAlgorithm::EcdsaP256),
			"ecdsa-p384" => Ok(KeyAlgorithm::EcdsaP384),
			"ed25519" => Ok(KeyAlgorithm::Ed25519),
			_ => Err(Error::UnknownKeyAlgorithm(s.to_owned())),
		}
	}
}

impl KeyAlgorithm {
	/// Generate a fresh `rcgen::KeyPair` for the given variant
	pub fn generate(&self) -> Result<KeyPair> {
		tracing::debug!(algorithm = %self, "generating key pair");
		let key_pair = match self {
			KeyAlgorithm::Rsa2048 => self.generate_rsa(aws_lc_rs::rsa::KeySize::Rsa2048)?,
			KeyAlgorithm::Rsa3072 => self.generate_rsa(aws_lc_rs::rsa::KeySize::Rsa3072)?,
			KeyAlgorithm::Rsa4096 => self.generate_rsa(aws_lc_rs::rsa::KeySize::Rsa4096)?,
			KeyAlgorithm::EcdsaP256 => KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256)?,
			KeyAlgorithm::EcdsaP384 => KeyPair::generate_for(&rcgen::PKCS_ECDSA_P384_SHA384)?,
			KeyAlgorithm::Ed25519 => KeyPair::generate_for(&rcgen::PKCS_ED25519)?,
		};
		Ok(key_pair)
	}

	fn generate_rsa(&self, size: aws_lc_rs::rsa::KeySize) -> Result<KeyPair> {
		use aws_lc_rs::encoding::AsDer;
		use aws_lc_rs::rsa::KeyPair as RsaKeyPair;

		let failed = |_| Error::KeyGeneration(self.to_string());
		let key_pair = RsaKeyPair::generate(size).map_err(failed)?;
		let pkcs8 = key_pair.as_der().map_err(failed)?;
		let pkcs8 = PrivatePkcs8KeyDer::from(pkcs8.as_ref());

		Ok(KeyPair::from_pkcs8_der_and_sign_algo(
			&pkcs8,
			&rcgen::PKCS_RSA_SHA256,
		)?)
	}
}

/// Load a private key from PEM (`PRIVATE KEY`, `RSA PRIVATE KEY`,
/// `EC PRIVATE KEY`) or raw DER (PKCS#8, PKCS#1 or SEC1).
pub fn load_key_pair(input: &[u8]) -> Result<KeyPair> {
	der_payloads(input, |tag| tag.ends_with("PRIVATE KEY"))
		.into_iter()
		.find_map(|der| KeyPair::try_from(&*der).ok())
		.ok_or(Error::NotAPrivateKey)
}
