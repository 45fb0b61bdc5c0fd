//! Image content-type probing for URL-shaped values.
//!
//! A probe answers one question: does this URL serve `image/*`? Every
//! failure (bad scheme, unsafe host, network error, timeout) is "no".

use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use std::collections::HashMap;
use std::io;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use url::{Host, Url};

/// Default per-request timeout
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Default bound on remembered probe results
pub const DEFAULT_MEMO_CAPACITY: usize = 1024;

/// Default lifetime of a remembered probe result
pub const DEFAULT_MEMO_TTL: Duration = Duration::from_secs(600);

pub trait ImageProbe: Send + Sync {
    fn is_image(&self, url: &str) -> bool;
}

/// Probe that never reports an image, for when outbound calls are disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProbe;

impl ImageProbe for NoProbe {
    fn is_image(&self, _url: &str) -> bool {
        false
    }
}

impl<F> ImageProbe for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_image(&self, url: &str) -> bool {
        self(url)
    }
}

/// Host name resolution used before every probe
pub type Resolver = Arc<dyn Fn(&str, u16) -> io::Result<Vec<IpAddr>> + Send + Sync>;

/// Blocking HTTP probe with a timeout and a bounded per-URL result memo.
///
/// The host is resolved up front and every address must pass the address
/// policy; the request is then pinned to the checked address and redirects
/// are never followed. Call it off the async executor (e.g. inside
/// `spawn_blocking`); clients are built lazily for the same reason.
pub struct HttpImageProbe {
    timeout: Duration,
    allow_private: bool,
    resolver: Resolver,
    client: OnceCell<Client>,
    memo: Mutex<ProbeMemo>,
}

impl Default for HttpImageProbe {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT, false)
    }
}

impl HttpImageProbe {
    pub fn new(timeout: Duration, allow_private: bool) -> Self {
        Self {
            timeout,
            allow_private,
            resolver: Arc::new(system_resolve),
            client: OnceCell::new(),
            memo: Mutex::new(ProbeMemo::new(DEFAULT_MEMO_CAPACITY, DEFAULT_MEMO_TTL)),
        }
    }

    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_memo_limits(mut self, capacity: usize, ttl: Duration) -> Self {
        self.memo = Mutex::new(ProbeMemo::new(capacity, ttl));
        self
    }

    /// Number of remembered results, expired ones included until swept
    pub fn memo_len(&self) -> usize {
        self.memo.lock().map(|m| m.entries.len()).unwrap_or(0)
    }

    fn build_client(&self, pin: Option<(&str, SocketAddr)>) -> Result<Client, reqwest::Error> {
        let mut builder = Client::builder().timeout(self.timeout).redirect(Policy::none());
        if let Some((host, addr)) = pin {
            builder = builder.resolve(host, addr);
        }
        builder.build()
    }

    /// Resolve the host and apply the address policy to every address
    fn resolve_target(&self, url: &Url) -> Option<(String, bool, Vec<SocketAddr>)> {
        let host = url.host_str()?;
        let bare = host
            .strip_prefix('[')
            .and_then(|inner| inner.strip_suffix(']'))
            .unwrap_or(host);
        let port = url.port_or_known_default()?;

        let ips = match (self.resolver)(bare, port) {
            Ok(ips) if !ips.is_empty() => ips,
            Ok(_) => return None,
            Err(err) => {
                tracing::debug!(host = bare, error = %err, "image probe host resolution failed");
                return None;
            }
        };
        if !self.allow_private {
            if let Some(ip) = ips.iter().find(|ip| !is_public_ip(**ip)) {
                tracing::debug!(host = bare, %ip, "image probe host resolves to a private address");
                return None;
            }
        }

        let is_domain = bare.parse::<IpAddr>().is_err();
        let mut addrs: Vec<SocketAddr> = ips.into_iter().map(|ip| SocketAddr::new(ip, port)).collect();
        addrs.dedup();
        Some((bare.to_string(), is_domain, addrs))
    }

    fn fetch_is_image(&self, url: &Url) -> bool {
        let Some((host, is_domain, addrs)) = self.resolve_target(url) else {
            return false;
        };

        for addr in addrs {
            let client = if is_domain {
                self.build_client(Some((host.as_str(), addr)))
            } else {
                self.client.get_or_try_init(|| self.build_client(None)).cloned()
            };
            let client = match client {
                Ok(client) => client,
                Err(err) => {
                    tracing::warn!(error = %err, "image probe client unavailable");
                    return false;
                }
            };

            let resp = match client.get(url.as_str()).send() {
                Ok(resp) => resp,
                Err(err) => {
                    tracing::debug!(url = %url, %addr, error = %err, "image probe request failed");
                    continue;
                }
            };
            if resp.url() != url || !resp.status().is_success() {
                tracing::debug!(url = %url, status = resp.status().as_u16(), "image probe got no direct answer");
                return false;
            }
            return resp
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("image/"))
                .unwrap_or(false);
        }
        false
    }
}

impl ImageProbe for HttpImageProbe {
    fn is_image(&self, url: &str) -> bool {
        let now = Instant::now();
        if let Ok(memo) = self.memo.lock() {
            if let Some(hit) = memo.get(url, now) {
                return hit;
            }
        }

        let verdict = match Url::parse(url) {
            Ok(parsed) if is_probe_target(&parsed, self.allow_private) => self.fetch_is_image(&parsed),
            Ok(_) => {
                tracing::debug!(url, "refusing to probe unsafe target");
                false
            }
            Err(_) => false,
        };

        if let Ok(mut memo) = self.memo.lock() {
            memo.insert(url, verdict, Instant::now());
        }
        verdict
    }
}

/// Probe results with a lifetime and a size cap. On overflow expired
/// results go first, then the oldest one.
struct ProbeMemo {
    entries: HashMap<String, (bool, Instant)>,
    capacity: usize,
    ttl: Duration,
}

impl ProbeMemo {
    fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            ttl,
        }
    }

    fn get(&self, url: &str, now: Instant) -> Option<bool> {
        self.entries
            .get(url)
            .filter(|(_, stored)| now.duration_since(*stored) < self.ttl)
            .map(|(verdict, _)| *verdict)
    }

    fn insert(&mut self, url: &str, verdict: bool, now: Instant) {
        if !self.entries.contains_key(url) && self.entries.len() >= self.capacity {
            let ttl = self.ttl;
            self.entries.retain(|_, (_, stored)| now.duration_since(*stored) < ttl);
            if self.entries.len() >= self.capacity {
                let oldest = self
                    .entries
                    .iter()
                    .min_by_key(|(_, (_, stored))| *stored)
                    .map(|(key, _)| key.clone());
                if let Some(oldest) = oldest {
                    self.entries.remove(&oldest);
                }
            }
        }
        self.entries.insert(url.to_string(), (verdict, now));
    }
}

fn system_resolve(host: &str, port: u16) -> io::Result<Vec<IpAddr>> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(vec![ip]);
    }
    Ok((host, port).to_socket_addrs()?.map(|addr| addr.ip()).collect())
}

/// Only http(s), and unless allowed, no loopback/private/link-local hosts
pub fn is_probe_target(url: &Url, allow_private: bool) -> bool {
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    if !url.username().is_empty() || url.password().is_some() {
        return false;
    }
    if allow_private {
        return url.host().is_some();
    }

    match url.host() {
        Some(Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            domain != "localhost" && !domain.ends_with(".localhost")
        }
        Some(Host::Ipv4(ip)) => is_public_ip(IpAddr::V4(ip)),
        Some(Host::Ipv6(ip)) => is_public_ip(IpAddr::V6(ip)),
        None => false,
    }
}

fn is_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_multicast()
                || v4.is_broadcast())
        }
        IpAddr::V6(v6) => {
            let seg0 = v6.segments()[0];
            let unique_local = (seg0 & 0xfe00) == 0xfc00;
            let link_local = (seg0 & 0xffc0) == 0xfe80;
            let mapped_private = v6
                .to_ipv4_mapped()
                .map(|v4| !is_public_ip(IpAddr::V4(v4)))
                .unwrap_or(false);
            !(v6.is_loopback() || v6.is_unspecified() || v6.is_multicast() || unique_local || link_local || mapped_private)
        }
    }
}
