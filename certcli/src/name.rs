//! Subject name attributes collected from the operator.
use std::{
	fmt,
	io::{BufRead, Write},
};

use rcgen::{BmpString, DistinguishedName, DnType, DnValue, PrintableString, UniversalString};
use x509_parser::{
	der_parser::asn1_rs::Tag,
	x509::{AttributeTypeAndValue, X509Name},
};

use crate::{prompt::Prompt, Error, Result};

/// X.520 streetAddress
pub(crate) const OID_STREET_ADDRESS: &[u64] = &[2, 5, 4, 9];
/// X.520 postalCode
pub(crate) const OID_POSTAL_CODE: &[u64] = &[2, 5, 4, 17];
/// X.520 serialNumber
pub(crate) const OID_SERIAL_NUMBER: &[u64] = &[2, 5, 4, 5];

/// The optional parts of a subject distinguished name. The common name is
/// always supplied separately on the command line.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectName {
	pub country: Option<String>,
	pub organization: Option<String>,
	pub organizational_unit: Option<String>,
	pub street_address: Option<String>,
	pub locality: Option<String>,
	pub province: Option<String>,
	pub postal_code: Option<String>,
}

impl SubjectName {
	fn fields_mut(&mut self) -> [(&'static str, &mut Option<String>); 7] {
		[
			("Country", &mut self.country),
			("Organization", &mut self.organization),
			("Organizational Unit", &mut self.organizational_unit),
			("Street Address", &mut self.street_address),
			("Locality", &mut self.locality),
			("Province", &mut self.province),
			("Postal Code", &mut self.postal_code),
		]
	}

	/// Build a distinguished name from every attribute that is set,
	/// followed by `common_name`.
	pub fn to_distinguished_name(&self, common_name: &str) -> Result<DistinguishedName> {
		let mut dn = DistinguishedName::new();
		if let Some(country) = &self.country {
			let country = PrintableString::try_from(country.as_str())?;
			dn.push(DnType::CountryName, DnValue::PrintableString(country));
		}
		if let Some(org) = &self.organization {
			dn.push(DnType::OrganizationName, org.as_str());
		}
		if let Some(unit) = &self.organizational_unit {
			dn.push(DnType::OrganizationalUnitName, unit.as_str());
		}
		if let Some(street) = &self.street_address {
			dn.push(DnType::CustomDnType(OID_STREET_ADDRESS.to_vec()), street.as_str());
		}
		if let Some(locality) = &self.locality {
			dn.push(DnType::LocalityName, locality.as_str());
		}
		if let Some(province) = &self.province {
			dn.push(DnType::StateOrProvinceName, province.as_str());
		}
		if let Some(postal_code) = &self.postal_code {
			dn.push(DnType::CustomDnType(OID_POSTAL_CODE.to_vec()), postal_code.as_str());
		}
		dn.push(DnType::CommonName, common_name);
		Ok(dn)
	}
}

/// Rebuild a parsed X.509 name as an rcgen [DistinguishedName], keeping
/// attribute order and string types.
///
/// rcgen holds one value per attribute type and one attribute per RDN, so
/// names with repeated types or multi-valued RDNs are refused rather than
/// silently shortened.
pub(crate) fn distinguished_name_from_x509(name: &X509Name<'_>) -> Result<DistinguishedName> {
	let mut dn = DistinguishedName::new();
	for rdn in name.iter() {
		let mut attrs = rdn.iter();
		let (Some(attr), None) = (attrs.next(), attrs.next()) else {
			return Err(Error::UnsupportedName(
				"multi-valued relative distinguished name".into(),
			));
		};
		let oid = attr
			.attr_type()
			.iter()
			.ok_or_else(|| Error::UnsupportedName(format!("attribute type {}", attr.attr_type())))?
			.collect::<Vec<_>>();
		let ty = DnType::from_oid(&oid);
		if dn.get(&ty).is_some() {
			return Err(Error::UnsupportedName(format!(
				"repeated attribute {}",
				attr.attr_type()
			)));
		}
		dn.push(ty, dn_value(attr)?);
	}
	Ok(dn)
}

fn dn_value(attr: &AttributeTypeAndValue<'_>) -> Result<DnValue> {
	let any = attr.attr_value();
	let text = || {
		std::str::from_utf8(any.data)
			.map_err(|_| Error::UnsupportedName(format!("value of {} is not text", attr.attr_type())))
	};
	let value = match any.header.tag() {
		Tag::PrintableString => DnValue::PrintableString(text()?.try_into()?),
		Tag::Ia5String => DnValue::Ia5String(text()?.try_into()?),
		Tag::T61String => DnValue::TeletexString(text()?.try_into()?),
		Tag::Utf8String => DnValue::Utf8String(text()?.to_owned()),
		Tag::BmpString => DnValue::BmpString(BmpString::from_utf16be(any.data.to_vec())?),
		Tag::UniversalString => {
			DnValue::UniversalString(UniversalString::from_utf32be(any.data.to_vec())?)
		},
		tag => {
			return Err(Error::UnsupportedName(format!(
				"value of {} has type {tag:?}",
				attr.attr_type()
			)))
		},
	};
	Ok(value)
}

impl fmt::Display for SubjectName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let show = |v: &Option<String>| v.clone().unwrap_or_default();
		writeln!(f, "Country:             '{}'", show(&self.country))?;
		writeln!(f, "Organization:        '{}'", show(&self.organization))?;
		writeln!(f, "Organizational Unit: '{}'", show(&self.organizational_unit))?;
		writeln!(f, "Street Address:      '{}'", show(&self.street_address))?;
		writeln!(f, "Locality:            '{}'", show(&self.locality))?;
		writeln!(f, "Province:            '{}'", show(&self.province))?;
		write!(f, "Postal Code:         '{}'", show(&self.postal_code))
	}
}

/// Interactively collect a [`SubjectName`].
///
/// All fields are asked in turn, then the operator confirms the result.
/// Anything but `y` starts another round. Closing the input at any point
/// returns [`Error::Cancelled`].
pub fn prompt_subject_name<R: BufRead, W: Write>(
	prompt: &mut Prompt<R, W>,
) -> Result<SubjectName> {
	loop {
		let mut name = SubjectName::default();
		prompt.say("\nEnter certificate name details.\n")?;
		for (label, field) in name.fields_mut() {
			let value = prompt.ask(label)?;
			let value = value.trim();
			*field = (!value.is_empty()).then(|| value.to_owned());
		}

		prompt.say(&format!("Are these details correct?\n{name}\n\n(y/n): "))?;
		let answer = prompt.answer()?.ok_or(Error::Cancelled)?;
		if answer.trim().eq_ignore_ascii_case("y") {
			tracing::debug!(?name, "subject name confirmed");
			return Ok(name);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn run(input: &str) -> Result<SubjectName> {
		let mut prompt = Prompt::new(input.as_bytes(), Vec::new());
		prompt_subject_name(&mut prompt)
	}

	#[test]
	fn collects_every_field_in_order() {
		let name = run("US\nAcme\nOps\n1 Main St\nSpringfield\nIL\n62701\ny\n").unwrap();
		assert_eq!(
			name,
			SubjectName {
				country: Some("US".into()),
				organization: Some("Acme".into()),
				organizational_unit: Some("Ops".into()),
				street_address: Some("1 Main St".into()),
				locality: Some("Springfield".into()),
				province: Some("IL".into()),
				postal_code: Some("62701".into()),
			}
		);
	}

	#[test]
	fn empty_answers_are_unset() {
		let name = run("\n\n\n\n\n\n\nY\n").unwrap();
		assert_eq!(name, SubjectName::default());
	}

	#[test]
	fn rejecting_restarts_the_round() {
		let name = run("US\n\n\n\n\n\n\nn\nDE\nBund\n\n\n\n\n\ny\n").unwrap();
		assert_eq!(name.country.as_deref(), Some("DE"));
		assert_eq!(name.organization.as_deref(), Some("Bund"));
	}

	#[test]
	fn eof_while_asking_cancels() {
		assert!(matches!(run("US\nAcme\n"), Err(Error::Cancelled)));
	}

	#[test]
	fn eof_at_confirmation_cancels() {
		assert!(matches!(run("\n\n\n\n\n\n\n"), Err(Error::Cancelled)));
	}

	#[test]
	fn distinguished_name_keeps_fields_apart() {
		let name = SubjectName {
			country: Some("US".into()),
			locality: Some("Springfield".into()),
			province: Some("IL".into()),
			postal_code: Some("62701".into()),
			..Default::default()
		};
		let dn = name.to_distinguished_name("example.com").unwrap();
		assert_eq!(
			dn.get(&DnType::LocalityName),
			Some(&DnValue::Utf8String("Springfield".into()))
		);
		assert_eq!(
			dn.get(&DnType::StateOrProvinceName),
			Some(&DnValue::Utf8String("IL".into()))
		);
		assert_eq!(
			dn.get(&DnType::CustomDnType(OID_POSTAL_CODE.to_vec())),
			Some(&DnValue::Utf8String("62701".into()))
		);
		assert_eq!(
			dn.get(&DnType::CommonName),
			Some(&DnValue::Utf8String("example.com".into()))
		);
		assert!(dn.get(&DnType::OrganizationName).is_none());
	}

	#[test]
	fn parsed_name_keeps_order_and_string_types() -> anyhow::Result<()> {
		use x509_parser::prelude::{FromDer, X509CertificationRequest};

		let csr = pem::parse(include_bytes!("../tests/data/leaf_extra_ext.csr"))?;
		let (_, request) = X509CertificationRequest::from_der(csr.contents())?;
		let dn = distinguished_name_from_x509(&request.certification_request_info.subject)?;

		let types: Vec<_> = dn.iter().map(|(ty, _)| ty.clone()).collect();
		assert_eq!(
			types,
			[DnType::CountryName, DnType::OrganizationName, DnType::CommonName]
		);
		assert_eq!(
			dn.get(&DnType::CountryName),
			Some(&DnValue::PrintableString("SE".try_into()?))
		);
		assert_eq!(
			dn.get(&DnType::CommonName),
			Some(&DnValue::Utf8String("leaf.example.com".into()))
		);

		let csr = pem::parse(include_bytes!("../tests/data/multi_ou.csr"))?;
		let (_, request) = X509CertificationRequest::from_der(csr.contents())?;
		assert!(matches!(
			distinguished_name_from_x509(&request.certification_request_info.subject),
			Err(Error::UnsupportedName(_))
		));
		Ok(())
	}

	#[test]
	fn country_must_be_printable() {
		let name = SubjectName {
			country: Some("Ü".into()),
			..Default::default()
		};
		assert!(name.to_distinguished_name("x").is_err());
	}
}
