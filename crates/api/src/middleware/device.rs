//! Device identification used to key trials.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::{ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, USER_AGENT};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use breedid_core::fingerprint::device_fingerprint;

/// Header fingerprint plus best-known client IP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub fingerprint: String,
    /// First `X-Forwarded-For` entry, else the socket peer address.
    pub ip: Option<String>,
}

impl DeviceInfo {
    pub fn from_parts(parts: &Parts) -> Self {
        let header = |name| parts.headers.get(name).and_then(|v| v.to_str().ok());
        let fingerprint = device_fingerprint(
            header(USER_AGENT),
            header(ACCEPT),
            header(ACCEPT_LANGUAGE),
            header(ACCEPT_ENCODING),
        );

        let ip = forwarded_for(&parts.headers).or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        });

        Self { fingerprint, ip }
    }
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl<S: Send + Sync> FromRequestParts<S> for DeviceInfo {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(DeviceInfo::from_parts(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn forwarded_header_wins_over_socket() {
        let mut p = parts(
            Request::builder()
                .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
                .header(USER_AGENT, "curl/8"),
        );
        p.extensions
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
        let info = DeviceInfo::from_parts(&p);
        assert_eq!(info.ip.as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn falls_back_to_peer_address() {
        let mut p = parts(Request::builder());
        p.extensions
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 9], 4000))));
        assert_eq!(DeviceInfo::from_parts(&p).ip.as_deref(), Some("192.168.1.9"));
    }

    #[test]
    fn no_ip_without_header_or_peer() {
        let p = parts(Request::builder());
        assert_eq!(DeviceInfo::from_parts(&p).ip, None);
    }

    #[test]
    fn fingerprint_follows_headers() {
        let a = DeviceInfo::from_parts(&parts(Request::builder().header(USER_AGENT, "a")));
        let b = DeviceInfo::from_parts(&parts(Request::builder().header(USER_AGENT, "b")));
        assert_ne!(a.fingerprint, b.fingerprint);
    }
}
