use super::diagnostics::InputError;
use crate::common::{BACKENDS_PATH, BackendKey, REGISTER_PATH, Transport, TransportError};
use crate::constants::DEFAULT_REGISTER_WEIGHT;
use serde_json::{Value, json};

/// A validated registration request.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub key: BackendKey,
    pub weight: u32,
}

impl Registration {
    /// Validates the dialog fields; a blank or unparseable weight takes the
    /// control plane's default.
    pub fn parse(ip: &str, port: &str, weight: &str) -> Result<Self, InputError> {
        let ip = ip.trim();
        if ip.is_empty() {
            return Err(InputError::MissingIp);
        }

        let port = match port.trim().parse::<u16>() {
            Ok(port) if port > 0 => port,
            _ => return Err(InputError::InvalidPort(port.trim().to_string())),
        };

        let weight = weight.trim().parse::<u32>().unwrap_or(DEFAULT_REGISTER_WEIGHT);
        Ok(Self {
            key: BackendKey::new(ip, port),
            weight,
        })
    }

    pub fn body(&self) -> Value {
        json!({
            "ip": self.key.ip,
            "port": self.key.port,
            "weight": self.weight,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegisterResult {
    pub registration: Registration,
    pub write: Result<Value, TransportError>,
    pub refresh: Option<Result<Value, TransportError>>,
}

/// Registers the backend, then reads the backend list so it shows up.
pub async fn register<T: Transport>(transport: &T, registration: Registration) -> RegisterResult {
    tracing::info!(
        backend = %registration.key,
        weight = registration.weight,
        "registering backend"
    );

    let write = transport.write(REGISTER_PATH, registration.body()).await;
    let refresh = match &write {
        Ok(_) => Some(transport.read(BACKENDS_PATH).await),
        Err(_) => None,
    };

    RegisterResult {
        registration,
        write,
        refresh,
    }
}
