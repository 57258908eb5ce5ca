//! Polite blocking HTTP client: global pacing between requests, bounded
//! retries with linear backoff, and per-host header profiles. Fetch failures
//! never escape as errors; a `None` means "this data unit is unavailable this
//! run" and callers move on.

use std::thread;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;

/// Baseline browser header set applied to every request.
const BASE_HEADERS: &[(&str, &str)] = &[
    (
        "user-agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    ),
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ),
    ("accept-language", "zh-CN,zh;q=0.9,en;q=0.8"),
    ("referer", "https://nba.hupu.com/"),
];

/// Fuller browser profile for hosts that reject the baseline set.
const VERBOSE_HEADERS: &[(&str, &str)] = &[
    (
        "user-agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    ),
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ),
    ("accept-language", "en-US,en;q=0.5"),
    ("upgrade-insecure-requests", "1"),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "none"),
    ("sec-fetch-user", "?1"),
    ("cache-control", "max-age=0"),
];

fn build_header_map(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        map.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    map
}

pub struct Fetcher {
    client: Client,
    base_url: String,
    delay: Duration,
    max_retries: u32,
    verbose_hosts: Vec<String>,
    base_headers: HeaderMap,
    verbose_headers: HeaderMap,
    /// Completion time of the previous request; owned by this instance so
    /// independently-paced fetchers do not cross-talk.
    last_request: Option<Instant>,
}

impl Fetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            // Hand-edited configs may carry a negative or non-finite delay;
            // anything unusable means "no pacing".
            delay: Duration::try_from_secs_f64(config.request_delay_secs)
                .unwrap_or(Duration::ZERO),
            max_retries: config.max_retries.max(1),
            verbose_hosts: config.verbose_header_hosts.clone(),
            base_headers: build_header_map(BASE_HEADERS),
            verbose_headers: build_header_map(VERBOSE_HEADERS),
            last_request: None,
        })
    }

    /// Fetches a page body. `url` may be a full URL or a path relative to the
    /// configured base origin. Returns `None` once retries are exhausted.
    pub fn fetch(&mut self, url: &str) -> Option<String> {
        self.fetch_with_params(url, &[])
    }

    pub fn fetch_with_params(&mut self, url: &str, params: &[(&str, &str)]) -> Option<String> {
        let url = self.resolve(url);
        let headers = self.headers_for(&url).clone();

        self.wait_for_delay();

        for attempt in 1..=self.max_retries {
            if attempt == 1 {
                info!(%url, "request");
            } else {
                info!(%url, attempt, "request (retry)");
            }

            let mut request = self.client.get(&url).headers(headers.clone());
            if !params.is_empty() {
                request = request.query(params);
            }

            match request.send() {
                Ok(response) => {
                    self.last_request = Some(Instant::now());
                    let status = response.status();
                    if status.is_success() {
                        match response.text() {
                            Ok(body) => return Some(body),
                            Err(e) => warn!(%url, error = %e, "failed to read response body"),
                        }
                    } else {
                        warn!(%url, status = %status, "unexpected status");
                    }
                }
                Err(e) if e.is_timeout() => warn!(%url, "request timed out"),
                Err(e) if e.is_connect() => warn!(%url, "connection failed"),
                Err(e) => warn!(%url, error = %e, "request error"),
            }

            if attempt < self.max_retries {
                let wait = Duration::from_secs(u64::from(attempt) * 2);
                info!(wait_secs = wait.as_secs(), "backing off before retry");
                thread::sleep(wait);
            }
        }

        warn!(%url, "giving up after {} attempts", self.max_retries);
        None
    }

    fn resolve(&self, url: &str) -> String {
        if url.starts_with("http") {
            url.to_string()
        } else {
            format!("{}{}", self.base_url, url)
        }
    }

    fn headers_for(&self, url: &str) -> &HeaderMap {
        if self.verbose_hosts.iter().any(|host| url.contains(host.as_str())) {
            &self.verbose_headers
        } else {
            &self.base_headers
        }
    }

    /// Blocks until the minimum inter-request interval has elapsed, measured
    /// from the end of the previous request. Applied before the first attempt
    /// of each fetch, not between retries (those use the backoff schedule).
    fn wait_for_delay(&self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                thread::sleep(self.delay - elapsed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_resolve_against_base_origin() {
        let fetcher = Fetcher::new(&Config::default()).unwrap();
        assert_eq!(
            fetcher.resolve("/stats/players/pts"),
            "https://nba.hupu.com/stats/players/pts"
        );
        assert_eq!(
            fetcher.resolve("https://www.espn.com/nba/standings"),
            "https://www.espn.com/nba/standings"
        );
    }

    #[test]
    fn unusable_delay_values_disable_pacing() {
        for bad in [-1.5, f64::NAN, f64::INFINITY] {
            let config = Config {
                request_delay_secs: bad,
                ..Config::default()
            };
            let fetcher = Fetcher::new(&config).unwrap();
            assert_eq!(fetcher.delay, Duration::ZERO);
        }
    }

    #[test]
    fn verbose_hosts_get_the_full_header_profile() {
        let fetcher = Fetcher::new(&Config::default()).unwrap();
        let headers = fetcher.headers_for("https://www.basketball-reference.com/leagues/");
        assert!(headers.contains_key("sec-fetch-mode"));
        let headers = fetcher.headers_for("https://nba.hupu.com/standings");
        assert!(!headers.contains_key("sec-fetch-mode"));
        assert!(headers.contains_key("referer"));
    }
}
