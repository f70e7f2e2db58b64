use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

/// Default locations for the serve certificate and key, inside the
/// glucolog data directory.
pub fn default_cert_paths() -> Result<(PathBuf, PathBuf)> {
    let proj_dirs = directories::ProjectDirs::from("", "", "glucolog")
        .context("Could not determine home directory")?;
    let dir = proj_dirs.data_dir().join("tls");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create TLS directory: {}", dir.display()))?;
    Ok((dir.join("cert.pem"), dir.join("key.pem")))
}

/// Make sure a certificate/key pair exists at the given paths, generating
/// a self-signed pair on first use. Returns the certificate's SHA-256
/// fingerprint so the operator can verify it on a connecting device.
pub fn ensure_cert(cert_path: &Path, key_path: &Path) -> Result<String> {
    if cert_path.exists() && key_path.exists() {
        return read_fingerprint(cert_path);
    }
    eprintln!(
        "Generating self-signed TLS certificate at {}",
        cert_path.display()
    );

    let mut params = rcgen::CertificateParams::new(vec![
        "localhost".to_string(),
        "127.0.0.1".to_string(),
        "0.0.0.0".to_string(),
    ])
    .context("failed to create certificate params")?;
    params
        .distinguished_name
        .push(rcgen::DnType::CommonName, "glucolog self-signed");
    params
        .distinguished_name
        .push(rcgen::DnType::OrganizationName, "glucolog");
    params
        .subject_alt_names
        .push(rcgen::SanType::IpAddress(std::net::IpAddr::V4(
            std::net::Ipv4Addr::LOCALHOST,
        )));

    let key_pair = rcgen::KeyPair::generate().context("failed to generate key pair")?;
    let cert = params
        .self_signed(&key_pair)
        .context("failed to generate self-signed certificate")?;

    std::fs::write(cert_path, cert.pem())
        .with_context(|| format!("Failed to write certificate to {}", cert_path.display()))?;
    std::fs::write(key_path, key_pair.serialize_pem())
        .with_context(|| format!("Failed to write private key to {}", key_path.display()))?;

    Ok(fingerprint(cert.der()))
}

/// SHA-256 fingerprint of an existing PEM certificate file.
fn read_fingerprint(cert_path: &Path) -> Result<String> {
    let pem_data = std::fs::read(cert_path)
        .with_context(|| format!("Failed to read certificate from {}", cert_path.display()))?;

    let mut reader = std::io::BufReader::new(pem_data.as_slice());
    let certs: Vec<_> =
        rustls_pemfile::certs(&mut reader).collect::<std::result::Result<_, _>>()?;
    let cert = certs.first().context("No certificate found in PEM file")?;

    Ok(fingerprint(cert.as_ref()))
}

fn fingerprint(der: &[u8]) -> String {
    Sha256::digest(der)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_cert_generates_pair() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cert_path = tmp.path().join("cert.pem");
        let key_path = tmp.path().join("key.pem");

        let fp = ensure_cert(&cert_path, &key_path).unwrap();

        assert!(cert_path.exists());
        assert!(key_path.exists());
        assert!(
            std::fs::read_to_string(&cert_path)
                .unwrap()
                .contains("BEGIN CERTIFICATE")
        );
        assert!(
            std::fs::read_to_string(&key_path)
                .unwrap()
                .contains("BEGIN PRIVATE KEY")
        );

        // SHA-256 = 32 hex pairs separated by colons
        let parts: Vec<&str> = fp.split(':').collect();
        assert_eq!(parts.len(), 32);
        for part in parts {
            assert_eq!(part.len(), 2);
            assert!(part.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn test_ensure_cert_reuses_existing_pair() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cert_path = tmp.path().join("cert.pem");
        let key_path = tmp.path().join("key.pem");

        let fp1 = ensure_cert(&cert_path, &key_path).unwrap();
        let fp2 = ensure_cert(&cert_path, &key_path).unwrap();
        assert_eq!(fp1, fp2);
    }
}
