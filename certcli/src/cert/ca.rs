use rcgen::{
	BasicConstraints, Certificate, CertificateParams, ExtendedKeyUsagePurpose, IsCa, KeyPair,
	KeyUsagePurpose, SanType,
};

use super::{generate_serial, KeyAlgorithm, KeyedOutput, Validity};
use crate::{name::SubjectName, Error, Result};

/// Months a root CA stays valid unless told otherwise.
pub const DEFAULT_CA_MONTHS: u32 = 3;

/// [CertificateParams] from which a self-signed [Ca] can be built
pub struct CaBuilder {
	params: CertificateParams,
	key_algorithm: KeyAlgorithm,
}

impl CaBuilder {
	/// Initialize `CaBuilder` for `common_name` and the attributes in
	/// `name`. Rejects an empty common name.
	pub fn new(common_name: &str, name: &SubjectName) -> Result<Self> {
		let common_name = common_name.trim();
		if common_name.is_empty() {
			return Err(Error::Usage("a common name is required".into()));
		}

		let serial = generate_serial()?;
		let mut params = CertificateParams::default();
		params.distinguished_name = name.to_distinguished_name(common_name)?;
		serial.add_to_subject(&mut params.distinguished_name)?;
		params.serial_number = Some(serial.into());
		params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
		params.key_usages = vec![
			KeyUsagePurpose::DigitalSignature,
			KeyUsagePurpose::KeyCertSign,
		];
		params.extended_key_usages = vec![
			ExtendedKeyUsagePurpose::ServerAuth,
			ExtendedKeyUsagePurpose::ClientAuth,
		];
		Validity::months(DEFAULT_CA_MONTHS)?.apply(&mut params);

		Ok(Self {
			params,
			key_algorithm: KeyAlgorithm::default(),
		})
	}
	/// Replace the validity window.
	pub fn validity(mut self, validity: Validity) -> Self {
		validity.apply(&mut self.params);
		self
	}
	/// `SanTypes` that will be recorded as
	/// `subject_alt_names`. Multiple calls will append to previous
	/// values.
	pub fn subject_alternative_names(mut self, sans: Vec<SanType>) -> Self {
		self.params.subject_alt_names.extend(sans);
		self
	}
	/// Set key algorithm (instead of default).
	pub fn key_algorithm(mut self, alg: KeyAlgorithm) -> Self {
		self.key_algorithm = alg;
		self
	}
	/// Generate the key pair and self-sign.
	pub fn build(self) -> Result<Ca> {
		let key_pair = self.key_algorithm.generate()?;
		tracing::debug!(
			not_after = %self.params.not_after,
			sans = self.params.subject_alt_names.len(),
			"self-signing CA certificate"
		);
		let cert = self.params.self_signed(&key_pair)?;
		Ok(Ca { cert, key_pair })
	}
}

/// Self-signed CA [Certificate] and its key
pub struct Ca {
	cert: Certificate,
	key_pair: KeyPair,
}

impl Ca {
	/// Serialize certificate and private key as PEM.
	pub fn serialize_pem(&self) -> KeyedOutput {
		KeyedOutput {
			data: self.cert.pem().into_bytes(),
			private_key: self.key_pair.serialize_pem().into_bytes(),
		}
	}
	/// Return `&Certificate`
	pub fn cert(&self) -> &Certificate {
		&self.cert
	}
	/// Return `&KeyPair`
	pub fn key_pair(&self) -> &KeyPair {
		&self.key_pair
	}
}
