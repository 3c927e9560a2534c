//! # Construcción de Respuestas HTTP
//!
//! API para construir respuestas HTTP/1.1 y convertirlas a bytes.
//!
//! ## Formato
//!
//! ```text
//! HTTP/1.1 404 Not Found\r\n
//! Content-Length: 10\r\n
//! \r\n
//! Not Found\n
//! ```
//!
//! Las respuestas de estado llevan como body el reason phrase más `\n`.
//! Un GET exitoso solo usa el head (`head_bytes`) y el contenido del
//! archivo se transmite aparte.

use super::StatusCode;

/// Representa una respuesta HTTP/1.1 completa
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,

    /// Headers en orden de inserción; un nombre repetido se sobrescribe
    headers: Vec<(String, String)>,

    body: Vec<u8>,
}

impl Response {
    /// Crea una respuesta sin headers ni body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Respuesta de estado: body = reason phrase + `\n`
    ///
    /// # Ejemplo
    /// ```
    /// use httpserver::http::{Response, StatusCode};
    ///
    /// let response = Response::status_only(StatusCode::NotFound);
    /// assert_eq!(response.body(), b"Not Found\n");
    /// assert_eq!(response.header("Content-Length"), Some("10"));
    /// ```
    pub fn status_only(status: StatusCode) -> Self {
        let body = format!("{}\n", status.reason_phrase());
        Self::new(status).with_body(&body)
    }

    /// Agrega un header (builder)
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Agrega un header; si ya existe, se sobrescribe
    pub fn add_header(&mut self, name: &str, value: &str) {
        match self.headers.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Establece el body y el `Content-Length`
    pub fn with_body(self, body: &str) -> Self {
        self.with_body_bytes(body.as_bytes().to_vec())
    }

    /// Establece el body desde bytes y el `Content-Length`
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        let len = self.body.len().to_string();
        self.add_header("Content-Length", &len);
        self
    }

    /// Status line + headers + línea vacía
    pub fn head_bytes(&self) -> Vec<u8> {
        let mut result = format!("HTTP/1.1 {}\r\n", self.status).into_bytes();

        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }

        result.extend_from_slice(b"\r\n");
        result
    }

    /// Respuesta completa lista para el socket
    ///
    /// # Ejemplo
    /// ```
    /// use httpserver::http::{Response, StatusCode};
    ///
    /// let bytes = Response::status_only(StatusCode::Created).to_bytes();
    /// assert_eq!(bytes, b"HTTP/1.1 201 Created\r\nContent-Length: 8\r\n\r\nCreated\n");
    /// ```
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = self.head_bytes();
        result.extend_from_slice(&self.body);
        result
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
