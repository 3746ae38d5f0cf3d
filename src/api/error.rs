//! API error taxonomy
//!
//! Every backend call fails in one of three ways: the request never got a
//! response, the response carried a non-2xx status, or the body was not the
//! JSON we expected. The UI mostly collapses these into one status line, but
//! they stay distinct here so callers and tests can tell them apart.

use thiserror::Error;

/// Failure of a single backend round trip
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request could not be sent or the connection dropped
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status
    #[error("API request failed: {status}")]
    Status { status: u16, body: String },

    /// The body could not be decoded as the expected JSON
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    /// Short message suitable for the status line.
    /// Raw backend bodies are never shown to the user, only logged.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => {
                "No se pudo conectar con el servidor. Verifique la conexión.".to_string()
            },
            Self::Decode(_) => "Respuesta inválida del servidor.".to_string(),
            Self::Status { status, .. } => match status {
                400 | 422 => "Solicitud inválida. Revise los datos ingresados.".to_string(),
                404 => "Registro no encontrado.".to_string(),
                409 => "Conflicto: el registro ya existe o está en uso.".to_string(),
                s if *s >= 500 => {
                    "El servidor no está disponible. Intente nuevamente.".to_string()
                },
                s => format!("La operación falló (HTTP {}).", s),
            },
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
