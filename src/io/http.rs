use async_trait::async_trait;
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, HeaderMap, RANGE};
use reqwest::{Client, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::ReadAt;
use anyhow::{Context, Result, anyhow, bail};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u32 = 10;
const RETRY_STEP: Duration = Duration::from_millis(500);

/// Archive served over HTTP, read with `Range` requests.
///
/// Every worker opens its own reader, so connections are never shared
/// between search threads.
pub struct HttpRangeReader {
    client: Client,
    url: String,
    size: u64,
    transferred_bytes: AtomicU64,
}

impl HttpRangeReader {
    /// Probe `url` with a HEAD request for its size and Range support.
    pub async fn new(url: String) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        let resp = client
            .head(&url)
            .send()
            .await
            .with_context(|| format!("HEAD {}", url))?;
        if !resp.status().is_success() {
            bail!("HEAD {} returned {}", url, resp.status());
        }
        let size = probe(resp.headers())?;

        tracing::debug!(%url, size, "remote archive opened");
        Ok(Self {
            client,
            url,
            size,
            transferred_bytes: AtomicU64::new(0),
        })
    }

    /// Bytes received from the server by this reader.
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }

    /// One ranged GET for `[start, end]` copied into `out`, retried on
    /// timeouts and connection failures with a linear backoff.
    async fn fetch(&self, start: u64, end: u64, out: &mut [u8]) -> Result<usize> {
        let range = format!("bytes={}-{}", start, end);
        let mut attempt = 1;

        loop {
            let sent = self
                .client
                .get(&self.url)
                .header(RANGE, &range)
                .send()
                .await;

            let err = match sent {
                Ok(resp) if resp.status() == StatusCode::PARTIAL_CONTENT => {
                    match resp.bytes().await {
                        Ok(body) if body.is_empty() => {
                            bail!("Remote server returned an empty range at {}", start)
                        }
                        Ok(body) => {
                            let n = body.len().min(out.len());
                            out[..n].copy_from_slice(&body[..n]);
                            return Ok(n);
                        }
                        Err(e) => e,
                    }
                }
                Ok(resp) => bail!("GET {} ({}) returned {}", self.url, range, resp.status()),
                Err(e) => e,
            };

            if !(err.is_timeout() || err.is_connect()) || attempt >= MAX_ATTEMPTS {
                return Err(
                    anyhow::Error::new(err).context(format!("GET {} ({})", self.url, range))
                );
            }
            tracing::warn!(
                url = %self.url,
                %range,
                attempt,
                "range request failed, retrying: {}",
                err
            );
            tokio::time::sleep(RETRY_STEP * attempt).await;
            attempt += 1;
        }
    }
}

/// Archive size from a HEAD response, provided the server accepts byte
/// ranges.
fn probe(headers: &HeaderMap) -> Result<u64> {
    let accepts_bytes = headers
        .get(ACCEPT_RANGES)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("bytes"));
    if !accepts_bytes {
        bail!("Remote server does not support Range requests");
    }

    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| anyhow!("Remote server did not return Content-Length"))
}

#[async_trait]
impl ReadAt for HttpRangeReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }

        let last = (offset + buf.len() as u64 - 1).min(self.size - 1);
        let wanted = (last - offset + 1) as usize;
        let mut filled = 0;

        // Servers may answer with fewer bytes than asked; keep asking for
        // the rest.
        while filled < wanted {
            let n = self
                .fetch(offset + filled as u64, last, &mut buf[filled..wanted])
                .await?;
            filled += n;
            self.transferred_bytes.fetch_add(n as u64, Ordering::Relaxed);
        }

        Ok(filled)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
