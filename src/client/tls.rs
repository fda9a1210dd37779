use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::{ClientBuilder, Identity};

use crate::config::types::MtlsConfig;
use crate::error::ClientError;

const PEM_BEGIN: &str = "-----BEGIN ";
const PEM_DASHES: &str = "-----";
const PEM_LINE_WIDTH: usize = 64;
const PKCS8_LABEL: &str = "PRIVATE KEY";
const PKCS1_RSA_LABEL: &str = "RSA PRIVATE KEY";
const SEC1_EC_LABEL: &str = "EC PRIVATE KEY";

const DER_OCTET_STRING: u8 = 0x04;
const DER_SEQUENCE: u8 = 0x30;
const DER_EC_PARAMETERS: u8 = 0xa0;
const DER_LONG_FORM: u8 = 0x80;
const DER_NULL: [u8; 2] = [0x05, 0x00];
const PKCS8_VERSION: [u8; 3] = [0x02, 0x01, 0x00];
/// 1.2.840.113549.1.1.1
const RSA_ENCRYPTION_OID: [u8; 11] = [
    0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01,
];
/// 1.2.840.10045.2.1
const EC_PUBLIC_KEY_OID: [u8; 9] = [0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01];

/// Presents the configured client certificate. Server certificates are
/// always verified; there is no switch to skip verification.
///
/// The key may be PKCS#8, PKCS#1 RSA or SEC1 EC PEM; the latter two are
/// rewrapped as PKCS#8 before loading.
pub(super) fn apply_mtls(
    builder: ClientBuilder,
    mtls: &MtlsConfig,
) -> Result<ClientBuilder, ClientError> {
    if !mtls.enabled {
        return Ok(builder);
    }

    let key = pkcs8_key_pem(&mtls.client_key)?;
    let identity = Identity::from_pkcs8_pem(mtls.client_cert.as_bytes(), key.as_bytes())
        .map_err(|err| ClientError::TlsSetup { source: err })?;
    Ok(builder.identity(identity))
}

struct PemBlock<'pem> {
    label: &'pem str,
    body: &'pem str,
}

/// First PEM block whose label names a private key. `EC PARAMETERS` and
/// certificate blocks are skipped.
fn private_key_block(pem: &str) -> Option<PemBlock<'_>> {
    let mut rest = pem;
    while let Some((_, after_begin)) = rest.split_once(PEM_BEGIN) {
        let (label, after_label) = after_begin.split_once(PEM_DASHES)?;
        let end_marker = format!("-----END {}-----", label);
        let (body, remainder) = after_label.split_once(end_marker.as_str())?;
        if label.ends_with(PKCS8_LABEL) {
            return Some(PemBlock { label, body });
        }
        rest = remainder;
    }
    None
}

fn pkcs8_key_pem(key: &str) -> Result<String, ClientError> {
    let block = private_key_block(key).ok_or(ClientError::TlsKey {
        reason: "no PEM private key block found",
    })?;
    let der = STANDARD
        .decode(block.body.split_whitespace().collect::<String>())
        .map_err(|_err| ClientError::TlsKey {
            reason: "private key is not valid base64",
        })?;

    let pkcs8 = match block.label {
        PKCS8_LABEL => der,
        PKCS1_RSA_LABEL => wrap_pkcs8(&rsa_algorithm(), &der),
        SEC1_EC_LABEL => wrap_pkcs8(&ec_algorithm(&der)?, &der),
        _ => {
            return Err(ClientError::TlsKey {
                reason: "unsupported private key type, expected PKCS#8, PKCS#1 RSA or SEC1 EC",
            });
        }
    };
    Ok(encode_pem(PKCS8_LABEL, &pkcs8))
}

fn rsa_algorithm() -> Vec<u8> {
    let mut algorithm = RSA_ENCRYPTION_OID.to_vec();
    algorithm.extend_from_slice(&DER_NULL);
    der_tlv(DER_SEQUENCE, &algorithm)
}

/// Lifts the named curve out of `ECPrivateKey.parameters`.
fn ec_algorithm(der: &[u8]) -> Result<Vec<u8>, ClientError> {
    let malformed = ClientError::TlsKey {
        reason: "EC private key is malformed or does not name its curve",
    };
    let Some((DER_SEQUENCE, mut fields, _)) = read_tlv(der) else {
        return Err(malformed);
    };
    while let Some((tag, content, rest)) = read_tlv(fields) {
        if tag == DER_EC_PARAMETERS {
            let mut algorithm = EC_PUBLIC_KEY_OID.to_vec();
            algorithm.extend_from_slice(content);
            return Ok(der_tlv(DER_SEQUENCE, &algorithm));
        }
        fields = rest;
    }
    Err(malformed)
}

fn wrap_pkcs8(algorithm: &[u8], private_key: &[u8]) -> Vec<u8> {
    let mut info = PKCS8_VERSION.to_vec();
    info.extend_from_slice(algorithm);
    info.extend_from_slice(&der_tlv(DER_OCTET_STRING, private_key));
    der_tlv(DER_SEQUENCE, &info)
}

fn der_tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    match u8::try_from(content.len()) {
        Ok(short) if short < DER_LONG_FORM => out.push(short),
        Ok(_) | Err(_) => {
            let significant: Vec<u8> = content
                .len()
                .to_be_bytes()
                .into_iter()
                .skip_while(|byte| *byte == 0)
                .collect();
            let count = u8::try_from(significant.len()).unwrap_or(u8::MAX);
            out.push(DER_LONG_FORM | count);
            out.extend_from_slice(&significant);
        }
    }
    out.extend_from_slice(content);
    out
}

/// Splits one definite-length TLV off the front of `input`.
fn read_tlv(input: &[u8]) -> Option<(u8, &[u8], &[u8])> {
    let (&tag, rest) = input.split_first()?;
    let (&first, rest) = rest.split_first()?;
    let (len, rest) = if first < DER_LONG_FORM {
        (usize::from(first), rest)
    } else {
        let count = usize::from(first & !DER_LONG_FORM);
        if count == 0 || count > size_of::<usize>() {
            return None;
        }
        let (len_bytes, rest) = rest.split_at_checked(count)?;
        let len = len_bytes.iter().try_fold(0_usize, |acc, byte| {
            acc.checked_mul(256)?.checked_add(usize::from(*byte))
        })?;
        (len, rest)
    };
    let (content, rest) = rest.split_at_checked(len)?;
    Some((tag, content, rest))
}

fn encode_pem(label: &str, der: &[u8]) -> String {
    let encoded = STANDARD.encode(der);
    let body: String = encoded
        .as_bytes()
        .chunks(PEM_LINE_WIDTH)
        .map(|line| format!("{}\n", std::str::from_utf8(line).unwrap_or_default()))
        .collect();
    format!("-----BEGIN {}-----\n{}-----END {}-----\n", label, body, label)
}
