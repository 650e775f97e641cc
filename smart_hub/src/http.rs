// http.rs
use anyhow::{anyhow, bail};
use core::time::Duration;
use embedded_svc::http::client::Client;
use esp_idf_svc::http::client::{Configuration as HttpConfiguration, EspHttpConnection};
use log::*;
use smart_hub_core::{HttpResponse, HttpTransport, HubConfig};

/// Upper bound for a control response; the expected body is a few dozen bytes.
const MAX_BODY_LEN: usize = 4096;

/// Blocking HTTP client. Opens a fresh connection per request.
pub struct EspHttpTransport {
    timeout: Option<Duration>,
}

impl EspHttpTransport {
    pub fn new(config: &HubConfig) -> Self {
        Self {
            timeout: config.http_timeout_secs.map(Duration::from_secs),
        }
    }
}

impl HttpTransport for EspHttpTransport {
    fn get(&mut self, url: &str) -> anyhow::Result<HttpResponse> {
        let mut config = HttpConfiguration {
            timeout: self.timeout,
            ..Default::default()
        };
        // The CRT bundle is only needed for HTTPS endpoints
        if url.starts_with("https://") {
            config.use_global_ca_store = true;
            config.crt_bundle_attach = Some(esp_idf_sys::esp_crt_bundle_attach);
        }

        let connection = EspHttpConnection::new(&config)?;
        let mut client = Client::wrap(connection);

        let request = client.get(url)?;
        let mut response = request.submit()?;

        let status = response.status();
        debug!("Control endpoint response status: {}", status);

        // Read the whole body in chunks
        let mut body = Vec::new();
        let mut chunk = [0u8; 512];
        loop {
            let bytes_read = response.read(&mut chunk)?;
            if bytes_read == 0 {
                break;
            }
            if body.len() + bytes_read > MAX_BODY_LEN {
                bail!("response body exceeds {} bytes", MAX_BODY_LEN);
            }
            body.extend_from_slice(&chunk[..bytes_read]);
        }

        let body = String::from_utf8(body).map_err(|e| anyhow!("response is not UTF-8: {}", e))?;
        Ok(HttpResponse { status, body })
    }
}
