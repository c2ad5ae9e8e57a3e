//! AWS Signature Version 4 request signing for S3-compatible services.
//!
//! Only what path-style object GET and PUT need: no query string, and the
//! payload hash is always sent in `x-amz-content-sha256`.

use std::{collections::BTreeMap, fmt::Write as _};

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::Credentials;

type HmacSha256 = Hmac<Sha256>;

pub(crate) const ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub(crate) const SERVICE: &str = "s3";

/// `x-amz-date` form of `at`.
pub(crate) fn amz_date(at: DateTime<Utc>) -> String {
  at.format("%Y%m%dT%H%M%SZ").to_string()
}

pub(crate) fn payload_hash(body: &[u8]) -> String { hex::encode(Sha256::digest(body)) }

/// Percent-encode a path the way SigV4 expects: everything except unreserved
/// characters and `/` becomes `%XX` with uppercase hex.
pub(crate) fn encode_path(path: &str) -> String {
  let mut out = String::with_capacity(path.len());
  for b in path.bytes() {
    if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~' | b'/') {
      out.push(b as char);
    } else {
      let _ = write!(out, "%{b:02X}");
    }
  }
  out
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
  let mut mac = HmacSha256::new_from_slice(key)
    .unwrap_or_else(|_| unreachable!("HMAC-SHA256 accepts any key length"));
  mac.update(data);
  mac.finalize().into_bytes().to_vec()
}

pub(crate) fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
  let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), date.as_bytes());
  let k_region = hmac_sha256(&k_date, region.as_bytes());
  let k_service = hmac_sha256(&k_region, service.as_bytes());
  hmac_sha256(&k_service, b"aws4_request")
}

/// One request to sign.
pub(crate) struct Request<'a> {
  pub method:       &'a str,
  /// Already encoded with [`encode_path`].
  pub path:         &'a str,
  /// Lowercase header names. Must include `host` and `x-amz-date`.
  pub headers:      &'a BTreeMap<String, String>,
  pub payload_hash: &'a str,
  pub at:           DateTime<Utc>,
}

pub(crate) struct Signer<'a> {
  pub credentials: &'a Credentials,
  pub region:      &'a str,
  pub service:     &'a str,
}

impl Signer<'_> {
  /// The `Authorization` header value for `req`.
  pub(crate) fn authorization(&self, req: &Request<'_>) -> String {
    let date = req.at.format("%Y%m%d").to_string();
    let scope = format!("{date}/{}/{}/aws4_request", self.region, self.service);

    let mut canonical_headers = String::new();
    for (name, value) in req.headers {
      let _ = writeln!(canonical_headers, "{name}:{}", value.trim());
    }
    let signed_headers = req
      .headers
      .keys()
      .map(String::as_str)
      .collect::<Vec<_>>()
      .join(";");

    let canonical_request = format!(
      "{}\n{}\n\n{canonical_headers}\n{signed_headers}\n{}",
      req.method, req.path, req.payload_hash
    );
    let string_to_sign = format!(
      "{ALGORITHM}\n{}\n{scope}\n{}",
      amz_date(req.at),
      hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );

    let key = signing_key(
      &self.credentials.secret_access_key,
      &date,
      self.region,
      self.service,
    );
    let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes()));

    format!(
      "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, \
       Signature={signature}",
      self.credentials.access_key_id
    )
  }
}
