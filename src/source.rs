//! Where image bytes come from: a browser upload or a remote URL.

use std::net::IpAddr;

use crate::error::{AppError, Result};
use url::{Host, Url};

/// An image as submitted by the user, before decoding.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Upload {
        bytes: Vec<u8>,
        file_name: Option<String>,
        content_type: Option<String>,
    },
    Url(String),
}

impl ImageSource {
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Upload {
                file_name,
                content_type,
                bytes,
            } => format!(
                "upload {} [{}] ({} bytes)",
                file_name.as_deref().unwrap_or("<unnamed>"),
                content_type.as_deref().unwrap_or("unknown type"),
                bytes.len()
            ),
            ImageSource::Url(url) => format!("url {}", url),
        }
    }
}

/// Limits applied to a URL download.
#[derive(Debug, Clone, Copy)]
pub struct FetchLimits {
    pub max_bytes: u64,
    /// Refuse hosts that resolve to loopback, private or link-local addresses.
    pub block_private_hosts: bool,
}

/// Parses a user-typed URL, accepting only http and https.
pub fn parse_image_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::MissingImage);
    }

    let url = Url::parse(trimmed).map_err(|e| AppError::InvalidUrl(format!("{}: {}", trimmed, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AppError::InvalidUrl(format!(
            "unsupported scheme '{}', use http or https",
            other
        ))),
    }
}

/// True for addresses that point back into the host or its local network.
pub fn is_private_address(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
        }
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_private_address(IpAddr::V4(mapped));
            }
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
        }
    }
}

/// Resolves the URL's host and rejects it if any address is private.
async fn ensure_public_host(url: &Url) -> Result<()> {
    let port = url.port_or_known_default().unwrap_or(80);
    let addrs: Vec<IpAddr> = match url.host() {
        Some(Host::Ipv4(ip)) => vec![IpAddr::V4(ip)],
        Some(Host::Ipv6(ip)) => vec![IpAddr::V6(ip)],
        Some(Host::Domain(domain)) => tokio::net::lookup_host((domain, port))
            .await
            .map_err(|e| AppError::Fetch(format!("cannot resolve {}: {}", domain, e)))?
            .map(|addr| addr.ip())
            .collect(),
        None => return Err(AppError::InvalidUrl(format!("{} has no host", url))),
    };

    match addrs.into_iter().find(|ip| is_private_address(*ip)) {
        Some(ip) => Err(AppError::InvalidUrl(format!(
            "{} points at a private address ({})",
            url, ip
        ))),
        None => Ok(()),
    }
}

/// Downloads an image, refusing bodies larger than `limits.max_bytes`.
pub async fn fetch_url(client: &reqwest::Client, raw: &str, limits: FetchLimits) -> Result<Vec<u8>> {
    let url = parse_image_url(raw)?;
    let max_bytes = limits.max_bytes;

    if limits.block_private_hosts {
        ensure_public_host(&url).await?;
    }

    tracing::debug!("📥 Fetching image from {}", url);

    let mut response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| AppError::Fetch(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Fetch(format!("{} returned HTTP {}", url, status)));
    }

    if let Some(length) = response.content_length() {
        if length > max_bytes {
            return Err(AppError::TooLarge { limit: max_bytes });
        }
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| AppError::Fetch(e.to_string()))?
    {
        if (bytes.len() + chunk.len()) as u64 > max_bytes {
            return Err(AppError::TooLarge { limit: max_bytes });
        }
        bytes.extend_from_slice(&chunk);
    }

    if bytes.is_empty() {
        return Err(AppError::Fetch(format!("{} returned an empty body", url)));
    }

    tracing::debug!("📦 Downloaded {} bytes from {}", bytes.len(), url);
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::net::{Ipv4Addr, Ipv6Addr};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn limits(max_bytes: u64) -> FetchLimits {
        FetchLimits {
            max_bytes,
            block_private_hosts: false,
        }
    }

    /// Serves one chunked response (no Content-Length) made of `chunks`.
    async fn serve_chunked(chunks: Vec<Vec<u8>>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    return;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let mut response =
                b"HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nTransfer-Encoding: chunked\r\n\r\n"
                    .to_vec();
            for chunk in chunks {
                response.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
                response.extend_from_slice(&chunk);
                response.extend_from_slice(b"\r\n");
            }
            response.extend_from_slice(b"0\r\n\r\n");
            let _ = socket.write_all(&response).await;
            let _ = socket.shutdown().await;
        });

        format!("http://{}/stream.png", addr)
    }

    #[test]
    fn accepts_http_and_https() {
        assert!(parse_image_url("https://example.com/cat.jpg").is_ok());
        assert!(parse_image_url("  http://example.com/cat.png  ").is_ok());
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        assert!(matches!(
            parse_image_url("file:///etc/passwd"),
            Err(AppError::InvalidUrl(_))
        ));
        assert!(matches!(
            parse_image_url("not a url"),
            Err(AppError::InvalidUrl(_))
        ));
        assert!(matches!(parse_image_url("   "), Err(AppError::MissingImage)));
    }

    #[tokio::test]
    async fn fetches_body_bytes() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/img.png");
            then.status(200).body(vec![1u8, 2, 3, 4]);
        });

        let client = reqwest::Client::new();
        let bytes = fetch_url(&client, &server.url("/img.png"), limits(1024)).await.unwrap();

        mock.assert();
        assert_eq!(bytes, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn non_success_status_is_a_fetch_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing.png");
            then.status(404);
        });

        let client = reqwest::Client::new();
        let err = fetch_url(&client, &server.url("/missing.png"), limits(1024))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Fetch(_)));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/big.png");
            then.status(200).body(vec![0u8; 64]);
        });

        let client = reqwest::Client::new();
        let err = fetch_url(&client, &server.url("/big.png"), limits(16))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::TooLarge { limit: 16 }));
    }

    #[tokio::test]
    async fn chunked_body_over_the_limit_is_cut_off() {
        let url = serve_chunked(vec![vec![7u8; 32], vec![7u8; 32]]).await;

        let client = reqwest::Client::new();
        let err = fetch_url(&client, &url, limits(40)).await.unwrap_err();

        assert!(matches!(err, AppError::TooLarge { limit: 40 }));
    }

    #[tokio::test]
    async fn chunked_body_within_the_limit_is_collected() {
        let url = serve_chunked(vec![vec![1u8; 10], vec![2u8; 10]]).await;

        let client = reqwest::Client::new();
        let bytes = fetch_url(&client, &url, limits(40)).await.unwrap();

        assert_eq!(bytes.len(), 20);
        assert_eq!(&bytes[..10], &[1u8; 10]);
        assert_eq!(&bytes[10..], &[2u8; 10]);
    }

    #[test]
    fn private_ranges_are_recognised() {
        assert!(is_private_address(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))));
        assert!(is_private_address(IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3))));
        assert!(is_private_address(IpAddr::V4(Ipv4Addr::new(192, 168, 0, 10))));
        assert!(is_private_address(IpAddr::V4(Ipv4Addr::new(169, 254, 169, 254))));
        assert!(is_private_address(IpAddr::V6(Ipv6Addr::LOCALHOST)));
        assert!(is_private_address(IpAddr::V6("fe80::1".parse().unwrap())));
        assert!(is_private_address(IpAddr::V6("fd00::1".parse().unwrap())));
        assert!(is_private_address(IpAddr::V6("::ffff:127.0.0.1".parse().unwrap())));

        assert!(!is_private_address(IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34))));
        assert!(!is_private_address(IpAddr::V6("2606:4700::1111".parse().unwrap())));
    }

    #[tokio::test]
    async fn private_hosts_are_refused_when_blocking() {
        let client = reqwest::Client::new();
        let blocking = FetchLimits {
            max_bytes: 1024,
            block_private_hosts: true,
        };

        for url in [
            "http://169.254.169.254/latest/meta-data",
            "http://127.0.0.1:9/cat.png",
            "http://[::1]/cat.png",
            "http://localhost/cat.png",
        ] {
            let err = fetch_url(&client, url, blocking).await.unwrap_err();
            assert!(
                matches!(err, AppError::InvalidUrl(ref m) if m.contains("private address")),
                "{} gave {:?}",
                url,
                err
            );
        }
    }

    #[test]
    fn upload_description_names_file_and_type() {
        let source = ImageSource::Upload {
            bytes: vec![0u8; 3],
            file_name: Some("cat.png".to_string()),
            content_type: Some("image/png".to_string()),
        };
        assert_eq!(source.describe(), "upload cat.png [image/png] (3 bytes)");

        let anonymous = ImageSource::Upload {
            bytes: Vec::new(),
            file_name: None,
            content_type: None,
        };
        assert_eq!(anonymous.describe(), "upload <unnamed> [unknown type] (0 bytes)");
    }
}
