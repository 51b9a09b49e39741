//! GeoIP lookup for new analytics sessions.
//!
//! Best effort: any failure yields an empty `Geo`, never an error.

use std::net::IpAddr;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::analytics::models::Geo;

pub const DEFAULT_GEO_BASE_URL: &str = "http://ip-api.com";
const DEMO_COUNTRY: &str = "Guatemala";
const DEMO_CITY: &str = "Ciudad de Guatemala";

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: Option<String>,
    country: Option<String>,
    city: Option<String>,
}

#[derive(Clone)]
pub struct GeoResolver {
    client: Client,
    base_url: String,
    demo_mode: bool,
}

impl GeoResolver {
    pub fn new(base_url: impl Into<String>, timeout: Duration, demo_mode: bool) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            demo_mode,
        })
    }

    /// Resolves the caller's location from `X-Forwarded-For` or the peer address.
    pub async fn resolve(&self, forwarded_for: Option<&str>, peer: Option<IpAddr>) -> Geo {
        if self.demo_mode {
            return demo_geo();
        }

        let Some(ip) = client_ip(forwarded_for, peer) else {
            return Geo::default();
        };

        match self.lookup(&ip).await {
            Ok(geo) => geo,
            Err(e) => {
                debug!("GeoIP lookup failed for {ip}: {e}");
                Geo::default()
            }
        }
    }

    async fn lookup(&self, ip: &str) -> Result<Geo, reqwest::Error> {
        let url = format!("{}/json/{ip}", self.base_url);
        let body: IpApiResponse = self
            .client
            .get(url)
            .query(&[("fields", "status,country,city")])
            .send()
            .await?
            .json()
            .await?;

        if body.status.as_deref() == Some("success") {
            Ok(Geo {
                country: body.country,
                city: body.city,
            })
        } else {
            Ok(Geo::default())
        }
    }
}

fn demo_geo() -> Geo {
    Geo {
        country: Some(DEMO_COUNTRY.to_string()),
        city: Some(DEMO_CITY.to_string()),
    }
}

/// First `X-Forwarded-For` hop, else the peer. Loopback and empty
/// addresses resolve to nothing.
pub fn client_ip(forwarded_for: Option<&str>, peer: Option<IpAddr>) -> Option<String> {
    let ip = match forwarded_for {
        Some(header) => header.split(',').next().unwrap_or("").trim().to_string(),
        None => peer.map(|p| p.to_string()).unwrap_or_default(),
    };

    if ip.is_empty() || ip.starts_with("127.") || ip == "localhost" || ip == "::1" {
        None
    } else {
        Some(ip)
    }
}
