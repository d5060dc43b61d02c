use rcgen::{CertificateParams, CertificateSigningRequest, KeyPair, SanType};

use super::{KeyAlgorithm, KeyedOutput, PEM_CERTIFICATE_REQUEST};
use crate::{
	format::{encode_pem, Encoding},
	name::SubjectName,
	Error, Result,
};

/// Check the identities requested for a certificate.
///
/// Server certificates need at least one DNS name or IP address; client
/// certificates must not carry any.
pub fn check_identities(is_client: bool, sans: &[SanType]) -> Result<()> {
	match (is_client, sans.is_empty()) {
		(false, true) => Err(Error::Usage(
			"At least one IP and/or SAN must be specified".into(),
		)),
		(true, false) => Err(Error::Usage(
			"No SAN or IP is allowed for client authentication".into(),
		)),
		_ => Ok(()),
	}
}

/// [CertificateParams] from which a [Csr] can be built
pub struct CsrBuilder {
	params: CertificateParams,
	key_algorithm: KeyAlgorithm,
	is_client: bool,
}

impl CsrBuilder {
	/// Initialize `CsrBuilder` for `common_name` and the attributes in
	/// `name`. Rejects an empty common name.
	pub fn new(common_name: &str, name: &SubjectName) -> Result<Self> {
		let common_name = common_name.trim();
		if common_name.is_empty() {
			return Err(Error::Usage("a common name is required".into()));
		}
		let mut params = CertificateParams::default();
		params.distinguished_name = name.to_distinguished_name(common_name)?;
		Ok(Self {
			params,
			key_algorithm: KeyAlgorithm::default(),
			is_client: false,
		})
	}
	/// `SanTypes` that will be recorded as
	/// `subject_alt_names`. Multiple calls will append to previous
	/// values.
	pub fn subject_alternative_names(mut self, sans: Vec<SanType>) -> Self {
		self.params.subject_alt_names.extend(sans);
		self
	}
	/// Request is for a client certificate.
	pub fn client(mut self, is_client: bool) -> Self {
		self.is_client = is_client;
		self
	}
	/// Set key algorithm (instead of default).
	pub fn key_algorithm(mut self, alg: KeyAlgorithm) -> Self {
		self.key_algorithm = alg;
		self
	}
	/// Validate the identities, generate a key pair and sign the request
	/// with it.
	pub fn build(self) -> Result<Csr> {
		check_identities(self.is_client, &self.params.subject_alt_names)?;
		let key_pair = self.key_algorithm.generate()?;
		let request = self.params.serialize_request(&key_pair)?;
		tracing::debug!(
			client = self.is_client,
			sans = self.params.subject_alt_names.len(),
			"created certificate signing request"
		);
		Ok(Csr { request, key_pair })
	}
}

/// Signed certificate request and its private key
pub struct Csr {
	request: CertificateSigningRequest,
	key_pair: KeyPair,
}

impl Csr {
	/// Serialize request and private key (PKCS#8) in `encoding`.
	pub fn serialize(&self, encoding: Encoding) -> Result<KeyedOutput> {
		let request = self.request.der();
		Ok(match encoding {
			Encoding::Der => KeyedOutput {
				data: request.to_vec(),
				private_key: self.key_pair.serialize_der(),
			},
			Encoding::Pem => KeyedOutput {
				data: encode_pem(PEM_CERTIFICATE_REQUEST, request).into_bytes(),
				private_key: self.key_pair.serialize_pem().into_bytes(),
			},
		})
	}
	/// Return the DER encoded request
	pub fn der(&self) -> &[u8] {
		self.request.der()
	}
}

#[cfg(test)]
mod tests {
	use x509_parser::{
		certification_request::X509CertificationRequest, extensions::GeneralName,
		extensions::ParsedExtension, prelude::FromDer,
	};

	use super::*;

	fn server_csr() -> Csr {
		CsrBuilder::new("www.example.com", &SubjectName::default())
			.unwrap()
			.key_algorithm(KeyAlgorithm::EcdsaP256)
			.subject_alternative_names(vec![
				SanType::DnsName("www.example.com".try_into().unwrap()),
				SanType::IpAddress("192.0.2.7".parse().unwrap()),
			])
			.build()
			.unwrap()
	}

	#[test]
	fn identities_rules() {
		let san = [SanType::IpAddress("::1".parse().unwrap())];
		assert!(check_identities(false, &san).is_ok());
		assert!(check_identities(true, &[]).is_ok());

		let err = check_identities(false, &[]).unwrap_err();
		assert_eq!(err.to_string(), "At least one IP and/or SAN must be specified");
		let err = check_identities(true, &san).unwrap_err();
		assert_eq!(
			err.to_string(),
			"No SAN or IP is allowed for client authentication"
		);
	}

	#[test]
	fn request_is_self_signed_and_carries_sans() -> anyhow::Result<()> {
		let csr = server_csr();
		let (_, request) = X509CertificationRequest::from_der(csr.der())?;
		assert!(request.verify_signature().is_ok());

		let cn = request
			.certification_request_info
			.subject
			.iter_common_name()
			.next()
			.unwrap()
			.as_str()?;
		assert_eq!(cn, "www.example.com");

		let names: Vec<_> = request
			.requested_extensions()
			.into_iter()
			.flatten()
			.filter_map(|ext| match ext {
				ParsedExtension::SubjectAlternativeName(san) => Some(san.general_names.clone()),
				_ => None,
			})
			.flatten()
			.collect();
		assert!(matches!(names[0], GeneralName::DNSName("www.example.com")));
		assert!(matches!(names[1], GeneralName::IPAddress(&[192, 0, 2, 7])));
		Ok(())
	}

	#[test]
	fn client_request_without_sans() -> anyhow::Result<()> {
		let csr = CsrBuilder::new("alice", &SubjectName::default())?
			.key_algorithm(KeyAlgorithm::Ed25519)
			.client(true)
			.build()?;
		let (_, request) = X509CertificationRequest::from_der(csr.der())?;
		assert!(request.verify_signature().is_ok());
		Ok(())
	}

	#[test]
	fn server_request_without_sans_fails() {
		let result = CsrBuilder::new("www.example.com", &SubjectName::default())
			.unwrap()
			.key_algorithm(KeyAlgorithm::Ed25519)
			.build();
		assert!(matches!(result, Err(Error::Usage(_))));
	}

	#[test]
	fn serialize_in_both_encodings() -> anyhow::Result<()> {
		let csr = server_csr();

		let der = csr.serialize(Encoding::Der)?;
		assert_eq!(der.data, csr.der());
		assert!(pem::parse(&der.data).is_err());
		KeyPair::try_from(der.private_key.as_slice())?;

		let pem = csr.serialize(Encoding::Pem)?;
		let block = pem::parse(&pem.data)?;
		assert_eq!(block.tag(), "CERTIFICATE REQUEST");
		assert_eq!(block.contents(), csr.der());
		assert_eq!(pem::parse(&pem.private_key)?.tag(), "PRIVATE KEY");
		Ok(())
	}
}
