use std::{
	net::{IpAddr, Ipv4Addr, Ipv6Addr},
	path::Path,
};

use pki_types::CertificateDer;
use rcgen::{
	BasicConstraints, Certificate, CertificateParams, ExtendedKeyUsagePurpose, Ia5String, IsCa,
	KeyPair, KeyUsagePurpose, SanType, SubjectPublicKeyInfo,
};
use x509_parser::{
	certification_request::X509CertificationRequest,
	extensions::{GeneralName, ParsedExtension},
	prelude::{FromDer, X509Certificate},
};

use super::{
	der_payloads, generate_serial, load_key_pair, read_file, Validity, PEM_CERTIFICATE,
	PEM_CERTIFICATE_REQUEST,
};
use crate::{
	format::{encode_pem, Encoding},
	name::distinguished_name_from_x509,
	Error, Result,
};

/// Class of certificate issued for a CSR.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CertType {
	/// TLS server, valid for 3 months
	#[default]
	ServerAuth,
	/// TLS client, valid for 30 days
	ClientAuth,
	/// Intermediate CA, valid for 6 months
	Ca,
}

impl CertType {
	/// Pick the class from the `--is-ca` and `--is-client` flags.
	pub fn from_flags(is_ca: bool, is_client: bool) -> Result<Self> {
		match (is_ca, is_client) {
			(true, true) => Err(Error::Usage(
				"--is-ca and --is-client cannot be used together".into(),
			)),
			(true, false) => Ok(CertType::Ca),
			(false, true) => Ok(CertType::ClientAuth),
			(false, false) => Ok(CertType::ServerAuth),
		}
	}

	fn validity(self) -> Result<Validity> {
		match self {
			CertType::ServerAuth => Validity::months(3),
			CertType::ClientAuth => Validity::days(30),
			CertType::Ca => Validity::months(6),
		}
	}

	fn apply(self, params: &mut CertificateParams) -> Result<()> {
		use ExtendedKeyUsagePurpose::{ClientAuth, ServerAuth};

		self.validity()?.apply(params);
		params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
		match self {
			CertType::ServerAuth => {
				params.extended_key_usages = vec![ClientAuth, ServerAuth];
			},
			CertType::ClientAuth => {
				params.extended_key_usages = vec![ClientAuth];
			},
			CertType::Ca => {
				params.key_usages.push(KeyUsagePurpose::KeyCertSign);
				params.extended_key_usages = vec![ClientAuth, ServerAuth];
				params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
			},
		}
		Ok(())
	}
}

/// A CA certificate together with its private key, ready to sign CSRs.
pub struct CaIssuer {
	der: Vec<u8>,
	issuer: Certificate,
	key_pair: KeyPair,
}

impl CaIssuer {
	/// Read the CA certificate and key from disk.
	pub fn load(cert_path: &Path, key_path: &Path) -> Result<Self> {
		Self::from_encoded(&read_file(cert_path)?, &read_file(key_path)?)
	}

	/// Parse a CA certificate and key, each PEM or DER.
	///
	/// The certificate must carry the CA basic constraint, its public
	/// key must belong to `key` and its subject must be reproducible as
	/// the issuer name of the certificates it signs.
	pub fn from_encoded(cert: &[u8], key: &[u8]) -> Result<Self> {
		let der = der_payloads(cert, |tag| tag == PEM_CERTIFICATE)
			.into_iter()
			.find(|der| X509Certificate::from_der(der).is_ok())
			.ok_or(Error::NotACertificate)?
			.into_owned();
		let key_pair = load_key_pair(key)?;

		let (_, parsed) = X509Certificate::from_der(&der).map_err(|_| Error::NotACertificate)?;
		if !parsed.is_ca() {
			return Err(Error::NotACa);
		}
		if &*parsed.public_key().subject_public_key.data != key_pair.public_key_raw() {
			return Err(Error::KeyMismatch);
		}

		distinguished_name_from_x509(parsed.subject())?;

		let params = CertificateParams::from_ca_cert_der(&CertificateDer::from(der.as_slice()))?;
		let issuer = params.self_signed(&key_pair)?;
		let (_, rebuilt) =
			X509Certificate::from_der(issuer.der()).map_err(|_| Error::NotACertificate)?;
		if rebuilt.subject().as_raw() != parsed.subject().as_raw() {
			return Err(Error::IssuerName);
		}
		Ok(Self {
			der,
			issuer,
			key_pair,
		})
	}

	/// Verify the self-signature of `csr` (PEM or DER) and issue a
	/// certificate of class `cert_type` for it.
	///
	/// Only the subject, DNS names and IP addresses are taken from the
	/// request; any other requested extension is ignored. The issued
	/// certificate is checked against the CA before it is returned.
	pub fn sign(&self, csr: &[u8], cert_type: CertType) -> Result<IssuedCertificate> {
		let is_request = |tag: &str| {
			tag == PEM_CERTIFICATE_REQUEST || tag == "NEW CERTIFICATE REQUEST"
		};
		let csr_der = der_payloads(csr, is_request)
			.into_iter()
			.next()
			.ok_or_else(|| Error::NotACsr("no certificate request found".into()))?;

		let (_, request) =
			X509CertificationRequest::from_der(&csr_der).map_err(|e| Error::NotACsr(e.to_string()))?;
		request
			.verify_signature()
			.map_err(|e| Error::CsrSignature(e.to_string()))?;

		let info = &request.certification_request_info;
		let public_key = SubjectPublicKeyInfo::from_der(info.subject_pki.raw)
			.map_err(|e| Error::NotACsr(e.to_string()))?;

		let serial = generate_serial()?;
		let mut params = CertificateParams::default();
		params.distinguished_name = distinguished_name_from_x509(&info.subject)?;
		serial.add_to_subject(&mut params.distinguished_name)?;
		params.serial_number = Some(serial.into());
		params.subject_alt_names = requested_identities(&request)?;
		params.use_authority_key_identifier_extension = true;
		cert_type.apply(&mut params)?;

		let cert = params.signed_by(&public_key, &self.issuer, &self.key_pair)?;
		let der = cert.der().to_vec();
		let common_name = self.verify_issued(&der)?;
		tracing::info!(
			subject = %common_name,
			serial = %serial.to_decimal(),
			?cert_type,
			"issued certificate"
		);
		Ok(IssuedCertificate { der, common_name })
	}

	/// Check the issuer name and signature of `der` against the CA
	/// certificate and return its subject common name.
	fn verify_issued(&self, der: &[u8]) -> Result<String> {
		let (_, ca) = X509Certificate::from_der(&self.der)
			.map_err(|e| Error::IssuedSignature(e.to_string()))?;
		let (_, issued) =
			X509Certificate::from_der(der).map_err(|e| Error::IssuedSignature(e.to_string()))?;
		if issued.issuer().as_raw() != ca.subject().as_raw() {
			return Err(Error::IssuerName);
		}
		issued
			.verify_signature(Some(ca.public_key()))
			.map_err(|e| Error::IssuedSignature(e.to_string()))?;

		let common_name = issued
			.subject()
			.iter_common_name()
			.next()
			.and_then(|cn| cn.as_str().ok())
			.unwrap_or_default()
			.to_owned();
		Ok(common_name)
	}
}

/// DNS names and IP addresses from the request's subjectAltName.
fn requested_identities(request: &X509CertificationRequest<'_>) -> Result<Vec<SanType>> {
	let mut sans = Vec::new();
	let Some(extensions) = request.requested_extensions() else {
		return Ok(sans);
	};
	for ext in extensions {
		let ParsedExtension::SubjectAlternativeName(san) = ext else {
			continue;
		};
		for name in &san.general_names {
			match name {
				GeneralName::DNSName(dns) => sans.push(SanType::DnsName(Ia5String::try_from(*dns)?)),
				GeneralName::IPAddress(bytes) => {
					let ip = ip_from_bytes(bytes)
						.ok_or_else(|| Error::NotACsr(format!("bad IP address length {}", bytes.len())))?;
					sans.push(SanType::IpAddress(ip));
				},
				_ => {},
			}
		}
	}
	Ok(sans)
}

fn ip_from_bytes(bytes: &[u8]) -> Option<IpAddr> {
	if let Ok(v4) = <[u8; 4]>::try_from(bytes) {
		Some(Ipv4Addr::from(v4).into())
	} else if let Ok(v6) = <[u8; 16]>::try_from(bytes) {
		Some(Ipv6Addr::from(v6).into())
	} else {
		None
	}
}

/// DER encoded certificate issued by [CaIssuer::sign]
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
	/// DER bytes
	pub der: Vec<u8>,
	/// Subject common name, empty if the request had none
	pub common_name: String,
}

impl IssuedCertificate {
	/// Encode the certificate as DER or PEM.
	pub fn encode(&self, encoding: Encoding) -> Vec<u8> {
		match encoding {
			Encoding::Der => self.der.clone(),
			Encoding::Pem => encode_pem(PEM_CERTIFICATE, &self.der).into_bytes(),
		}
	}
}
