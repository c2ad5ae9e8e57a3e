//! [`HttpObjectStore`]: an [`ObjectStore`] over an S3-compatible HTTP API.

use std::{collections::BTreeMap, time::Duration};

use bytes::Bytes;
use canopy_core::store::{ObjectStore, StorageKey};
use chrono::Utc;
use reqwest::{Client, Method, StatusCode, Url, header};

use crate::{
  Error, RemoteStoreConfig, Result,
  sign::{self, Request, Signer},
};

/// Async client for one remote bucket.
///
/// Every request is signed with AWS Signature Version 4, so it works with S3
/// itself and with compatible services such as MinIO. Objects are addressed
/// path-style: `{endpoint}/{bucket}/{key}`.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpObjectStore {
  client:    Client,
  config:    RemoteStoreConfig,
  /// `scheme://host[:port]` of the endpoint.
  origin:    String,
  /// The `host` header the client will send, and therefore sign.
  host:      String,
  /// Endpoint path without a trailing slash; empty for a bare host.
  base_path: String,
}

impl HttpObjectStore {
  /// Validate `config` and build a client for it.
  pub fn new(config: RemoteStoreConfig) -> Result<Self> {
    config.validate()?;
    let endpoint = Url::parse(&config.endpoint).map_err(|e| Error::InvalidConfig {
      field:  "endpoint",
      reason: e.to_string(),
    })?;
    let host = match (endpoint.host_str(), endpoint.port()) {
      (Some(host), Some(port)) => format!("{host}:{port}"),
      (Some(host), None) => host.to_owned(),
      (None, _) => {
        return Err(Error::InvalidConfig {
          field:  "endpoint",
          reason: "missing host".into(),
        });
      }
    };
    let origin = format!("{}://{host}", endpoint.scheme());
    let base_path = endpoint.path().trim_end_matches('/').to_owned();

    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self {
      client,
      config,
      origin,
      host,
      base_path,
    })
  }

  /// Encoded request path for `key`; this exact string is signed.
  fn path(&self, key: &StorageKey) -> String {
    format!(
      "{}{}",
      self.base_path,
      sign::encode_path(&format!("/{}/{key}", self.config.bucket))
    )
  }

  fn signed(&self, method: Method, key: &StorageKey, body: &[u8]) -> reqwest::RequestBuilder {
    let path = self.path(key);
    let at = Utc::now();
    let payload_hash = sign::payload_hash(body);
    let headers = BTreeMap::from([
      ("host".to_owned(), self.host.clone()),
      ("x-amz-content-sha256".to_owned(), payload_hash.clone()),
      ("x-amz-date".to_owned(), sign::amz_date(at)),
    ]);

    let signer = Signer {
      credentials: &self.config.credentials,
      region:      &self.config.region,
      service:     sign::SERVICE,
    };
    let authorization = signer.authorization(&Request {
      method: method.as_str(),
      path: &path,
      headers: &headers,
      payload_hash: &payload_hash,
      at,
    });

    // `host` is set by the client from the URL.
    let mut request = self
      .client
      .request(method, format!("{}{path}", self.origin))
      .header(header::AUTHORIZATION, authorization);
    for (name, value) in headers.iter().filter(|(name, _)| *name != "host") {
      request = request.header(name.as_str(), value.as_str());
    }
    request
  }
}

impl ObjectStore for HttpObjectStore {
  type Error = Error;

  /// `GET {endpoint}/{bucket}/{key}`; a 404 means the object does not exist.
  async fn get(&self, key: &StorageKey) -> Result<Option<Bytes>> {
    let resp = self.signed(Method::GET, key, &[]).send().await?;

    match resp.status() {
      StatusCode::NOT_FOUND => {
        tracing::debug!(%key, "remote object not found");
        Ok(None)
      }
      status if status.is_success() => Ok(Some(resp.bytes().await?)),
      status => Err(Error::Status {
        method: Method::GET,
        key: key.to_string(),
        status,
      }),
    }
  }

  /// `PUT {endpoint}/{bucket}/{key}` with a JSON body.
  async fn put(&self, key: &StorageKey, body: Bytes) -> Result<()> {
    let size = body.len();
    let resp = self
      .signed(Method::PUT, key, &body)
      .header(header::CONTENT_TYPE, "application/json")
      .body(body)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      return Err(Error::Status {
        method: Method::PUT,
        key: key.to_string(),
        status,
      });
    }
    tracing::debug!(%key, size, "remote object written");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use canopy_core::{action::ActionType, registry::Locode};
  use chrono::NaiveDateTime;
  use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    sync::oneshot,
  };

  use super::*;
  use crate::Credentials;

  /// A captured request: the request line, headers and body.
  struct Captured {
    head: String,
    body: Vec<u8>,
  }

  /// Serve exactly one HTTP request with a canned response.
  async fn one_shot_server(
    status: &'static str,
    body: &'static str,
  ) -> (String, oneshot::Receiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
      let (mut socket, _) = listener.accept().await.unwrap();
      let mut buf = Vec::new();
      let mut chunk = [0u8; 1024];
      let head_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
          break pos + 4;
        }
      };
      let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
      let content_length = head
        .lines()
        .find_map(|l| {
          let (name, value) = l.split_once(':')?;
          name
            .eq_ignore_ascii_case("content-length")
            .then(|| value.trim().parse::<usize>().ok())
            .flatten()
        })
        .unwrap_or(0);
      while buf.len() < head_end + content_length {
        let n = socket.read(&mut chunk).await.unwrap();
        buf.extend_from_slice(&chunk[..n]);
      }

      let response = format!(
        "HTTP/1.1 {status}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
      );
      socket.write_all(response.as_bytes()).await.unwrap();
      socket.shutdown().await.ok();
      tx.send(Captured {
        head,
        body: buf[head_end..].to_vec(),
      })
      .ok();
    });

    (format!("http://{addr}"), rx)
  }

  fn store(endpoint: String) -> HttpObjectStore {
    HttpObjectStore::new(RemoteStoreConfig {
      endpoint,
      bucket: "cap-rankings".into(),
      region: "sa-east-1".into(),
      credentials: Credentials {
        access_key_id:     "reader".into(),
        secret_access_key: "hunter2".into(),
      },
      timeout_secs: 5,
    })
    .unwrap()
  }

  fn key() -> StorageKey {
    StorageKey::for_ranking(ActionType::Adaptation, &Locode::parse("BR RIO").unwrap())
  }

  #[test]
  fn invalid_config_is_rejected_at_construction() {
    let result = HttpObjectStore::new(RemoteStoreConfig {
      endpoint:     "http://localhost:9000".into(),
      bucket:       "X".into(),
      region:       "us-east-1".into(),
      credentials:  Credentials {
        access_key_id:     "a".into(),
        secret_access_key: "b".into(),
      },
      timeout_secs: 5,
    });
    assert!(matches!(result, Err(Error::InvalidConfig { field: "bucket", .. })));
  }

  /// Value of header `name` in a captured request head.
  fn header<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().find_map(|line| {
      let (n, v) = line.split_once(':')?;
      n.eq_ignore_ascii_case(name).then(|| v.trim())
    })
  }

  /// Recompute the signature from what the server received and compare it
  /// with the `authorization` header that came with it.
  fn assert_signed(captured: &Captured, method: &str, path: &str) {
    let date = header(&captured.head, "x-amz-date").expect("x-amz-date");
    let at = NaiveDateTime::parse_from_str(date, "%Y%m%dT%H%M%SZ")
      .unwrap()
      .and_utc();
    let payload_hash = sign::payload_hash(&captured.body);
    assert_eq!(
      header(&captured.head, "x-amz-content-sha256"),
      Some(payload_hash.as_str())
    );

    let headers = BTreeMap::from([
      ("host".to_owned(), header(&captured.head, "host").unwrap().to_owned()),
      ("x-amz-content-sha256".to_owned(), payload_hash.clone()),
      ("x-amz-date".to_owned(), date.to_owned()),
    ]);
    let credentials = Credentials {
      access_key_id:     "reader".into(),
      secret_access_key: "hunter2".into(),
    };
    let expected = Signer {
      credentials: &credentials,
      region:      "sa-east-1",
      service:     sign::SERVICE,
    }
    .authorization(&Request {
      method,
      path,
      headers: &headers,
      payload_hash: &payload_hash,
      at,
    });

    let sent = header(&captured.head, "authorization").expect("authorization");
    assert!(sent.starts_with("AWS4-HMAC-SHA256 Credential=reader/"));
    assert!(sent.contains("/sa-east-1/s3/aws4_request"));
    assert_eq!(sent, expected);
  }

  #[test]
  fn url_is_path_style_and_encoded() {
    let s = store("http://localhost:9000/".into());
    assert_eq!(
      format!("{}{}", s.origin, s.path(&key())),
      "http://localhost:9000/cap-rankings/data/adaptation/BR%20RIO.json"
    );

    let prefixed = store("https://gateway.example.org/s3".into());
    assert_eq!(
      format!("{}{}", prefixed.origin, prefixed.path(&key())),
      "https://gateway.example.org/s3/cap-rankings/data/adaptation/BR%20RIO.json"
    );
    assert_eq!(prefixed.host, "gateway.example.org");
  }

  #[tokio::test]
  async fn get_returns_body_on_success() {
    let (endpoint, captured) = one_shot_server("200 OK", "[]").await;
    let body = store(endpoint).get(&key()).await.unwrap();
    assert_eq!(body.as_deref(), Some(&b"[]"[..]));

    let captured = captured.await.unwrap();
    let path = "/cap-rankings/data/adaptation/BR%20RIO.json";
    assert!(captured.head.starts_with(&format!("GET {path} ")));
    assert_signed(&captured, "GET", path);
  }

  #[tokio::test]
  async fn get_maps_404_to_none() {
    let (endpoint, _captured) = one_shot_server("404 Not Found", "").await;
    assert!(store(endpoint).get(&key()).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn get_surfaces_other_statuses() {
    let (endpoint, _captured) = one_shot_server("503 Service Unavailable", "").await;
    let err = store(endpoint).get(&key()).await.unwrap_err();
    assert!(matches!(
      err,
      Error::Status { status: StatusCode::SERVICE_UNAVAILABLE, .. }
    ));
  }

  #[tokio::test]
  async fn put_sends_body() {
    let (endpoint, captured) = one_shot_server("200 OK", "").await;
    store(endpoint)
      .put(&key(), Bytes::from_static(b"[{\"a\":1}]"))
      .await
      .unwrap();

    let captured = captured.await.unwrap();
    assert!(captured.head.starts_with("PUT "));
    assert_eq!(captured.body, b"[{\"a\":1}]");
    assert_signed(&captured, "PUT", "/cap-rankings/data/adaptation/BR%20RIO.json");
  }

  #[tokio::test]
  async fn put_surfaces_failure_status() {
    let (endpoint, _captured) = one_shot_server("403 Forbidden", "").await;
    let err = store(endpoint)
      .put(&key(), Bytes::from_static(b"[]"))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Status { status: StatusCode::FORBIDDEN, .. }));
  }
}
