use std::{io, path::PathBuf};

use thiserror::Error;

/// Everything that can go wrong while building, signing or reading
/// certificate material.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
	/// The operator closed the input stream while being prompted.
	#[error("user cancelled input")]
	Cancelled,
	/// The operator refused to replace an existing output file.
	#[error("user declined to overwrite '{}'", .0.display())]
	OverwriteDeclined(PathBuf),
	/// Flags or positional arguments that cannot be combined.
	#[error("{0}")]
	Usage(String),
	/// No certificate could be found in the input.
	#[error("the file is not in a known format or does not contain a certificate")]
	NotACertificate,
	/// No private key could be found in the input.
	#[error("the file is not in a known format or does not contain a private key")]
	NotAPrivateKey,
	/// The input was expected to contain a CSR.
	#[error("could not parse certificate signing request: {0}")]
	NotACsr(String),
	/// The issuing certificate lacks the CA basic constraint.
	#[error("the issuing certificate is not a CA cert")]
	NotACa,
	/// The issuing key does not belong to the issuing certificate.
	#[error("CA key does not match the public key of the CA certificate")]
	KeyMismatch,
	/// The CSR is not signed by the key it carries.
	#[error("error checking CSR signature: {0}")]
	CsrSignature(String),
	/// The freshly issued certificate does not verify against the CA.
	#[error("unable to verify CA signature: {0}")]
	IssuedSignature(String),
	/// The issuer name written into a certificate would differ from the
	/// CA certificate's subject.
	#[error("issuer name does not match the subject of the CA certificate")]
	IssuerName,
	/// A distinguished name that cannot be carried over unchanged.
	#[error("unsupported distinguished name: {0}")]
	UnsupportedName(String),
	/// Key generation in the crypto backend failed.
	#[error("failed to generate {0} key pair")]
	KeyGeneration(String),
	/// Unknown key algorithm name.
	#[error("unknown key algorithm '{0}'")]
	UnknownKeyAlgorithm(String),
	/// Unknown object kind for format conversion.
	#[error("unknown file type '{0}'")]
	UnknownObjectKind(String),
	/// The system random number generator failed.
	#[error("random number generator failure")]
	Random,
	/// Reading an input file failed.
	#[error("failed to read '{}': {source}", path.display())]
	Read {
		/// File that could not be read
		path: PathBuf,
		/// Underlying I/O error
		#[source]
		source: io::Error,
	},
	/// Writing an output file failed.
	#[error("failed to write '{}': {source}", path.display())]
	Write {
		/// File that could not be written
		path: PathBuf,
		/// Underlying I/O error
		#[source]
		source: io::Error,
	},
	/// Terminal I/O failed.
	#[error(transparent)]
	Io(#[from] io::Error),
	/// Certificate generation in rcgen failed.
	#[error(transparent)]
	Rcgen(#[from] rcgen::Error),
	/// Malformed PEM input.
	#[error("PEM error: {0}")]
	Pem(#[from] pem::PemError),
}
