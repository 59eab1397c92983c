use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::{build_http_client, normalize_base_url, ClientError, Query};

pub const DEFAULT_HARDWARE_URL: &str = "http://localhost:8080";

#[derive(Debug, Error)]
pub enum HardwareError {
    #[error("hardware app is not running: {source}")]
    Unreachable {
        #[source]
        source: reqwest::Error,
    },

    #[error("hardware app returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected hardware response: {source}")]
    Decode {
        #[source]
        source: reqwest::Error,
    },

    #[error("scale did not report a weight")]
    MissingWeight,

    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Device {
    Scanner,
    Scale,
    Printer,
}

impl Device {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "scanner" => Some(Self::Scanner),
            "scale" => Some(Self::Scale),
            "printer" => Some(Self::Printer),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scanner => "scanner",
            Self::Scale => "scale",
            Self::Printer => "printer",
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct SerialPort {
    #[serde(default)]
    pub port_name: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

fn default_baud_rate() -> u32 {
    9600
}

impl Default for SerialPort {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: default_baud_rate(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct BridgeSettings {
    #[serde(default)]
    pub scanner: SerialPort,
    #[serde(default)]
    pub scale: SerialPort,
}

impl BridgeSettings {
    pub fn is_configured(&self) -> bool {
        !self.scanner.port_name.is_empty() && !self.scale.port_name.is_empty()
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct DeviceTest {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize)]
struct WeightReading {
    weight: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct PrintJob<'a> {
    pdf_data: &'a str,
}

pub fn round_weight(weight: f64) -> f64 {
    ((weight + f64::EPSILON) * 1000.0).round() / 1000.0
}

/// Local companion app that owns the scale, the label printer and the
/// barcode scanner.
#[derive(Clone, Debug)]
pub struct HardwareBridge {
    http: reqwest::Client,
    base_url: String,
}

impl HardwareBridge {
    pub fn new(base_url: &str, timeout_seconds: usize) -> Result<Self, HardwareError> {
        let base_url = normalize_base_url(base_url)?;
        let http = build_http_client(None, None, timeout_seconds)?;
        Ok(Self { http, base_url })
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        query: Option<&Query>,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, HardwareError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, url = %url, "hardware request");
        let mut request = self.http.request(method, &url);
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            request = request.query(query.pairs());
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| HardwareError::Unreachable { source: e })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HardwareError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Current scale reading in kg, rounded to grams.
    pub async fn weight(&self) -> Result<f64, HardwareError> {
        let reading: WeightReading = self
            .request(Method::GET, "/api/app/weight", None, None)
            .await?
            .json()
            .await
            .map_err(|e| HardwareError::Decode { source: e })?;
        let weight = match reading.weight {
            Some(serde_json::Value::Number(n)) => n.as_f64(),
            Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .ok_or(HardwareError::MissingWeight)?;
        Ok(round_weight(weight))
    }

    pub async fn print_pdf(&self, pdf: &[u8]) -> Result<(), HardwareError> {
        let encoded = STANDARD.encode(pdf);
        let body = serde_json::to_value(PrintJob {
            pdf_data: &encoded,
        })
        .unwrap_or_default();
        self.request(Method::POST, "/api/app/print", None, Some(&body))
            .await?;
        Ok(())
    }

    pub async fn last_update(&self) -> Result<String, HardwareError> {
        let text = self
            .request(Method::GET, "/api/app/last_update", None, None)
            .await?
            .text()
            .await
            .map_err(|e| HardwareError::Decode { source: e })?;
        Ok(text.trim().trim_matches('"').to_string())
    }

    pub async fn run_update(&self, api_base_url: Option<&str>) -> Result<String, HardwareError> {
        let query = Query::new().push_opt("base_url", api_base_url);
        let text = self
            .request(Method::GET, "/api/app/update", Some(&query), None)
            .await?
            .text()
            .await
            .map_err(|e| HardwareError::Decode { source: e })?;
        Ok(text)
    }

    pub async fn settings(&self) -> Result<BridgeSettings, HardwareError> {
        self.request(Method::GET, "/api/settings", None, None)
            .await?
            .json()
            .await
            .map_err(|e| HardwareError::Decode { source: e })
    }

    pub async fn save_settings(&self, settings: &BridgeSettings) -> Result<(), HardwareError> {
        let body = serde_json::to_value(settings).unwrap_or_default();
        self.request(Method::PUT, "/api/settings/update", None, Some(&body))
            .await?;
        Ok(())
    }

    pub async fn test_device(&self, device: Device) -> Result<DeviceTest, HardwareError> {
        let path = format!("/api/settings/test/{}", device.as_str());
        self.request(Method::GET, &path, None, None)
            .await?
            .json()
            .await
            .map_err(|e| HardwareError::Decode { source: e })
    }
}
