use std::{path::PathBuf, process::ExitCode};

use anyhow::{bail, Context};
use certcli::{
	cert::{
		check_identities, read_file, subject_alt_names, CaBuilder, CaIssuer, CertType, CsrBuilder,
		Validity, DEFAULT_CA_MONTHS,
	},
	format::{convert_file, Encoding},
	inspect::CertificateSummary,
	logging::initialize_logging,
	prompt::{AssumeYes, Prompt},
	Error,
};

mod args;
use args::Action;

fn main() -> ExitCode {
	let opts = args::options().run();
	initialize_logging(opts.verbose);

	match run(opts.action) {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			if let Some(Error::OverwriteDeclined(_)) = err.downcast_ref::<Error>() {
				println!("{err}");
				return ExitCode::SUCCESS;
			}
			eprintln!("Error: {err:#}");
			ExitCode::FAILURE
		},
	}
}

fn run(action: Action) -> anyhow::Result<()> {
	match action {
		Action::CaCert {
			subject,
			expire_months,
			expire_days,
			sans,
			ips,
			key_algo,
			cert_out,
			key_out,
			common_name,
		} => {
			let stem = file_stem(&common_name);
			if stem.is_empty() {
				bail!("Common name is a required parameter");
			}
			let validity = match (expire_months, expire_days) {
				(Some(months), _) if months > 0 => Validity::months(months)?,
				(_, Some(days)) if days > 0 => Validity::days(days)?,
				_ => Validity::months(DEFAULT_CA_MONTHS)?,
			};
			let sans = subject_alt_names(&sans, &ips)?;
			let name = subject
				.resolve()
				.context("Error prompting for certificate details")?;

			let ca = CaBuilder::new(&common_name, &name)?
				.validity(validity)
				.subject_alternative_names(sans)
				.key_algorithm(key_algo)
				.build()
				.context("Error generating CA certificate")?;

			let cert_out = cert_out.unwrap_or_else(|| PathBuf::from(format!("{stem}.cer")));
			let key_out = key_out.unwrap_or_else(|| PathBuf::from(format!("{stem}.key")));
			ca.serialize_pem().write(&cert_out, &key_out)?;
		},
		Action::Csr {
			subject,
			sans,
			ips,
			is_client,
			pem,
			key_algo,
			csr_out,
			key_out,
			common_name,
		} => {
			let common_name = common_name.trim().to_owned();
			if common_name.is_empty() {
				bail!("Must pass the common name as an argument");
			}
			let sans = subject_alt_names(&sans, &ips)?;
			check_identities(is_client, &sans)?;
			let name = subject
				.resolve()
				.context("Error getting certificate details")?;

			let csr = CsrBuilder::new(&common_name, &name)?
				.subject_alternative_names(sans)
				.client(is_client)
				.key_algorithm(key_algo)
				.build()?;

			let encoding = if pem { Encoding::Pem } else { Encoding::Der };
			let csr_out = csr_out.unwrap_or_else(|| PathBuf::from(format!("{common_name}.csr")));
			let key_out = key_out.unwrap_or_else(|| PathBuf::from(format!("{common_name}.key")));
			csr.serialize(encoding)?.write(&csr_out, &key_out)?;
		},
		Action::Sign {
			is_ca,
			is_client,
			pem,
			cert_out,
			csr,
			ca_cert,
			ca_key,
		} => {
			let cert_type = CertType::from_flags(is_ca, is_client)?;
			let issuer = CaIssuer::load(&ca_cert, &ca_key)?;
			let issued = issuer
				.sign(&read_file(&csr)?, cert_type)
				.context("Failed to create signed certificate")?;

			let out = match cert_out {
				Some(path) => path,
				None if issued.common_name.is_empty() => {
					bail!("The certificate has no common name, pass --cert-out")
				},
				None => PathBuf::from(format!("{}.cer", issued.common_name)),
			};
			let encoding = if pem { Encoding::Pem } else { Encoding::Der };
			certcli::cert::write_private(&out, &issued.encode(encoding))?;
		},
		Action::Format {
			from_der,
			from_pem,
			to_der,
			to_pem,
			yes,
			kind,
			input,
			output,
		} => {
			let from = pick_encoding(from_der, from_pem, "source")?;
			let to = pick_encoding(to_der, to_pem, "target")?;
			if from == to {
				println!("Formats are the same, exiting");
				return Ok(());
			}
			if yes {
				convert_file(kind, from, to, &input, &output, &mut AssumeYes)?;
			} else {
				convert_file(kind, from, to, &input, &output, &mut Prompt::stdio())?;
			}
		},
		Action::CertInfo { paths } => {
			for path in paths {
				let summary = CertificateSummary::load(&path)
					.with_context(|| format!("Failed to parse certificate '{}'", path.display()))?;
				println!("{summary}\n");
			}
		},
	}
	Ok(())
}

/// Default output file name for `common_name`: lower-cased, whitespace
/// removed.
fn file_stem(common_name: &str) -> String {
	common_name.to_lowercase().split_whitespace().collect()
}

fn pick_encoding(der: bool, pem: bool, side: &str) -> anyhow::Result<Encoding> {
	match (der, pem) {
		(true, false) => Ok(Encoding::Der),
		(false, true) => Ok(Encoding::Pem),
		(false, false) => bail!("Must specify a {side} format"),
		(true, true) => bail!("Only one {side} format may be specified"),
	}
}
