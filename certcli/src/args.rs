//! Command Line argument parsing
#![allow(missing_docs)]

use std::{net::IpAddr, path::PathBuf};

use bpaf::{Bpaf, Parser};
use certcli::{
	cert::KeyAlgorithm,
	format::ObjectKind,
	name::{prompt_subject_name, SubjectName},
	prompt::Prompt,
};

/// Environment variable naming the default key algorithm.
pub const KEY_ALGO_ENV: &str = "CERTCLI_KEY_ALGO";

#[derive(Clone, Debug, Bpaf)]
#[bpaf(options, version)]
/// certcli: root CAs, CSRs and CA-signed certificates
pub struct Options {
	/// Log debug output to stderr
	#[bpaf(short, long)]
	pub verbose: bool,
	#[bpaf(external)]
	pub action: Action,
}

#[derive(Clone, Debug, Bpaf)]
pub enum Action {
	/// Create a new, self-signed root CA certificate and key
	#[bpaf(command("ca-cert"))]
	CaCert {
		#[bpaf(external(subject_args))]
		subject: SubjectArgs,
		/// Validity in months, takes precedence over --expire-days [default: 3]
		#[bpaf(long, argument("MONTHS"))]
		expire_months: Option<u32>,
		/// Validity in days
		#[bpaf(long, argument("DAYS"))]
		expire_days: Option<u32>,
		/// Subject Alternative Name (apply multiple times for multiple names)
		#[bpaf(long("san"), argument::<String>("NAME"), many)]
		sans: Vec<String>,
		/// IP address (apply multiple times for multiple addresses)
		#[bpaf(long("ip"), argument::<IpAddr>("IP"), many)]
		ips: Vec<IpAddr>,
		#[bpaf(external(key_algo))]
		key_algo: KeyAlgorithm,
		/// Output path for the CA cert [default: ./<common-name>.cer]
		#[bpaf(long, argument("PATH"))]
		cert_out: Option<PathBuf>,
		/// Output path for the CA key [default: ./<common-name>.key]
		#[bpaf(long, argument("PATH"))]
		key_out: Option<PathBuf>,
		/// The CN of the certificate
		#[bpaf(positional("COMMON_NAME"))]
		common_name: String,
	},
	/// Create a new DER encoded Certificate Signing Request and key
	#[bpaf(command("csr"))]
	Csr {
		#[bpaf(external(subject_args))]
		subject: SubjectArgs,
		/// Subject Alternative Name. At least one --san or --ip is required unless --is-client
		#[bpaf(long("san"), argument::<String>("NAME"), many)]
		sans: Vec<String>,
		/// IP address. At least one --san or --ip is required unless --is-client
		#[bpaf(long("ip"), argument::<IpAddr>("IP"), many)]
		ips: Vec<IpAddr>,
		/// Request is for client authentication, no SAN or IP allowed
		#[bpaf(long)]
		is_client: bool,
		/// Write CSR and key as PEM instead of DER
		#[bpaf(long)]
		pem: bool,
		#[bpaf(external(key_algo))]
		key_algo: KeyAlgorithm,
		/// Output path for the CSR [default: ./<common-name>.csr]
		#[bpaf(long, argument("PATH"))]
		csr_out: Option<PathBuf>,
		/// Output path for the private key [default: ./<common-name>.key]
		#[bpaf(long, argument("PATH"))]
		key_out: Option<PathBuf>,
		/// The CN of the request
		#[bpaf(positional("COMMON_NAME"))]
		common_name: String,
	},
	/// Sign a Certificate Signing Request with a CA cert, also for sub-CAs
	#[bpaf(command("sign"))]
	Sign {
		/// Issue a CA certificate
		#[bpaf(long)]
		is_ca: bool,
		/// Issue a client authentication certificate
		#[bpaf(long)]
		is_client: bool,
		/// Write the certificate as PEM instead of DER
		#[bpaf(long)]
		pem: bool,
		/// Output path for the certificate [default: ./<subject-common-name>.cer]
		#[bpaf(long, argument("PATH"))]
		cert_out: Option<PathBuf>,
		/// The CSR to sign
		#[bpaf(positional("CSR_FILE"))]
		csr: PathBuf,
		/// The CA's certificate
		#[bpaf(positional("CA_CERT"))]
		ca_cert: PathBuf,
		/// The CA's private key
		#[bpaf(positional("CA_KEY"))]
		ca_key: PathBuf,
	},
	/// Change a certificate or key to another encoding
	#[bpaf(command("format"))]
	Format {
		/// Source is DER
		#[bpaf(long)]
		from_der: bool,
		/// Source is PEM
		#[bpaf(long)]
		from_pem: bool,
		/// Target is DER
		#[bpaf(long)]
		to_der: bool,
		/// Target is PEM
		#[bpaf(long)]
		to_pem: bool,
		/// Overwrite OUT_FILE without asking
		#[bpaf(short, long)]
		yes: bool,
		/// 'cert' or 'private_key'
		#[bpaf(positional("TYPE"))]
		kind: ObjectKind,
		/// The file to read
		#[bpaf(positional("IN_FILE"))]
		input: PathBuf,
		/// The file to write
		#[bpaf(positional("OUT_FILE"))]
		output: PathBuf,
	},
	/// Parse PEM or DER encoded certificates and display their details
	#[bpaf(command("cert-info"))]
	CertInfo {
		/// Certificate files
		#[bpaf(positional::<PathBuf>("PATH"), some("Need at least 1 path argument pointing to a certificate file"))]
		paths: Vec<PathBuf>,
	},
}

/// Subject name attributes. Without any of them, and without
/// `--no-prompt`, they are asked for interactively.
#[derive(Clone, Debug, Default, Bpaf)]
pub struct SubjectArgs {
	/// Country
	#[bpaf(long, argument("COUNTRY"))]
	pub country: Option<String>,
	/// Organization
	#[bpaf(long("org"), argument("ORG"))]
	pub organization: Option<String>,
	/// Organizational Unit
	#[bpaf(long("org-unit"), argument("UNIT"))]
	pub organizational_unit: Option<String>,
	/// Street Address
	#[bpaf(long("street"), argument("STREET"))]
	pub street_address: Option<String>,
	/// Locality
	#[bpaf(long, argument("LOCALITY"))]
	pub locality: Option<String>,
	/// Province
	#[bpaf(long, argument("PROVINCE"))]
	pub province: Option<String>,
	/// Postal Code
	#[bpaf(long, argument("CODE"))]
	pub postal_code: Option<String>,
	/// Do not ask for name details
	#[bpaf(long)]
	pub no_prompt: bool,
}

impl SubjectArgs {
	/// The name given by flags, or the one entered at the prompt.
	pub fn resolve(self) -> certcli::Result<SubjectName> {
		let name = SubjectName {
			country: self.country,
			organization: self.organization,
			organizational_unit: self.organizational_unit,
			street_address: self.street_address,
			locality: self.locality,
			province: self.province,
			postal_code: self.postal_code,
		};
		if self.no_prompt || name != SubjectName::default() {
			return Ok(name);
		}
		prompt_subject_name(&mut Prompt::stdio())
	}
}

fn key_algo() -> impl Parser<KeyAlgorithm> {
	bpaf::long("key-algo")
		.env(KEY_ALGO_ENV)
		.help("Key pair algorithm: rsa2048, rsa3072, rsa4096, ecdsa-p256, ecdsa-p384 or ed25519")
		.argument::<KeyAlgorithm>("ALGO")
		.fallback(KeyAlgorithm::default())
		.display_fallback()
}
