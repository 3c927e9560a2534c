//! # Parsing de Requests HTTP/1.1
//! src/http/request.rs
//!
//! Parser del "head" de un request (request line + headers). El body de un
//! PUT no pasa por aquí: lo transfiere `Connection` directo al archivo.
//!
//! ## Formato
//!
//! ```text
//! PUT /archivo.txt HTTP/1.1\r\n
//! Content-Length: 5\r\n
//! Request-Id: 17\r\n
//! \r\n
//! hello
//! ```
//!
//! ## Orden de validación
//!
//! 1. Request line: `METHOD SP URI SP VERSION` (400 si está malformada)
//! 2. Headers: `Key: Value` (400)
//! 3. Versión soportada: solo `HTTP/1.1` (505)
//! 4. Método soportado: `GET` o `PUT` (501)
//! 5. `Content-Length` obligatorio en PUT (400)

use super::StatusCode;
use std::collections::HashMap;

/// Largo máximo del método (`OPTIONS`, `CONNECT`, ...)
const MAX_METHOD_LEN: usize = 8;

/// Largo máximo del nombre de recurso (sin el `/` inicial)
pub const MAX_NAME_LEN: usize = 64;

/// Métodos HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Leer un recurso (lock de lectura)
    GET,

    /// PUT - Crear o reemplazar un recurso (lock de escritura)
    PUT,
}

impl Method {
    /// Parsea un método ya validado sintácticamente
    fn from_token(s: &str) -> Result<Self, ParseError> {
        match s {
            "GET" => Ok(Method::GET),
            "PUT" => Ok(Method::PUT),
            _ => Err(ParseError::NotImplemented(s.to_string())),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::PUT => "PUT",
        }
    }
}

/// Representa el head de un request HTTP/1.1 parseado
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,

    /// URI tal cual llegó (con `/` inicial)
    uri: String,

    version: String,

    /// Headers en el orden de nombre recibido
    headers: HashMap<String, String>,

    /// Presente siempre en PUT
    content_length: Option<u64>,
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// El head no terminó con `\r\n\r\n` antes del EOF
    IncompleteRequest,

    /// El head supera el máximo permitido
    HeadTooLarge,

    /// Formato inválido de la request line
    InvalidRequestLine,

    /// Versión con formato inválido (no es `HTTP/d.d`)
    InvalidHttpVersion(String),

    /// Versión bien formada pero distinta de HTTP/1.1
    UnsupportedVersion(String),

    /// Método bien formado pero no soportado
    NotImplemented(String),

    /// Header malformado
    InvalidHeader(String),

    /// PUT sin `Content-Length`
    MissingContentLength,

    /// `Content-Length` no numérico
    InvalidContentLength(String),

    /// URI con caracteres fuera del conjunto permitido
    InvalidUri(String),
}

impl ParseError {
    /// Código de estado con el que se responde este error
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::UnsupportedVersion(_) => StatusCode::VersionNotSupported,
            ParseError::NotImplemented(_) => StatusCode::NotImplemented,
            _ => StatusCode::BadRequest,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::IncompleteRequest => write!(f, "Incomplete HTTP request"),
            ParseError::HeadTooLarge => write!(f, "Request head too large"),
            ParseError::InvalidRequestLine => write!(f, "Invalid request line format"),
            ParseError::InvalidHttpVersion(v) => write!(f, "Invalid HTTP version: {}", v),
            ParseError::UnsupportedVersion(v) => write!(f, "Unsupported HTTP version: {}", v),
            ParseError::NotImplemented(m) => write!(f, "Unsupported HTTP method: {}", m),
            ParseError::InvalidHeader(h) => write!(f, "Invalid header: {}", h),
            ParseError::MissingContentLength => write!(f, "Missing Content-Length"),
            ParseError::InvalidContentLength(v) => write!(f, "Invalid Content-Length: {}", v),
            ParseError::InvalidUri(u) => write!(f, "Invalid URI: {}", u),
        }
    }
}

impl std::error::Error for ParseError {}

impl Request {
    /// Parsea el head de un request (sin el `\r\n\r\n` final o con él)
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use httpserver::http::Request;
    /// use httpserver::http::request::Method;
    ///
    /// let raw = "PUT /a.txt HTTP/1.1\r\nContent-Length: 5\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.method(), Method::PUT);
    /// assert_eq!(request.uri(), "/a.txt");
    /// assert_eq!(request.content_length(), Some(5));
    /// ```
    pub fn parse(head: &str) -> Result<Self, ParseError> {
        let head = head.strip_suffix("\r\n\r\n").unwrap_or(head);
        let mut lines = head.split("\r\n");

        // 1. Request line
        let line = lines.next().unwrap_or("");
        let (method_token, uri, version) = Self::parse_request_line(line)?;

        // 2. Headers
        let headers = Self::parse_headers(lines)?;

        // 3. Versión
        if version != "HTTP/1.1" {
            return Err(ParseError::UnsupportedVersion(version.to_string()));
        }

        // 4. Método
        let method = Method::from_token(method_token)?;

        let mut request = Request {
            method,
            uri: uri.to_string(),
            version: version.to_string(),
            headers,
            content_length: None,
        };

        // 5. Content-Length
        request.content_length = match request.header("Content-Length") {
            Some(value) => Some(
                value
                    .parse::<u64>()
                    .map_err(|_| ParseError::InvalidContentLength(value.to_string()))?,
            ),
            None if method == Method::PUT => return Err(ParseError::MissingContentLength),
            None => None,
        };

        Ok(request)
    }

    /// Parsea `METHOD SP URI SP VERSION`
    fn parse_request_line(line: &str) -> Result<(&str, &str, &str), ParseError> {
        let parts: Vec<&str> = line.split(' ').collect();

        // Exactamente 3 partes separadas por un solo espacio
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(ParseError::InvalidRequestLine);
        }

        let (method, uri, version) = (parts[0], parts[1], parts[2]);

        if method.len() > MAX_METHOD_LEN || !method.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(ParseError::InvalidRequestLine);
        }

        if !uri.starts_with('/') {
            return Err(ParseError::InvalidRequestLine);
        }

        if !Self::is_well_formed_version(version) {
            return Err(ParseError::InvalidHttpVersion(version.to_string()));
        }

        Ok((method, uri, version))
    }

    /// `HTTP/d.d`
    fn is_well_formed_version(version: &str) -> bool {
        match version.strip_prefix("HTTP/").map(str::as_bytes) {
            Some([major, b'.', minor]) => major.is_ascii_digit() && minor.is_ascii_digit(),
            _ => false,
        }
    }

    /// Parsea los headers `Key: Value`
    fn parse_headers<'a>(
        lines: impl Iterator<Item = &'a str>,
    ) -> Result<HashMap<String, String>, ParseError> {
        let mut headers = HashMap::new();

        for line in lines {
            if line.is_empty() {
                break;
            }

            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| ParseError::InvalidHeader(line.to_string()))?;

            let valid_name = !name.is_empty()
                && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-');

            if !valid_name || !value.starts_with(' ') {
                return Err(ParseError::InvalidHeader(line.to_string()));
            }

            headers.insert(name.to_ascii_lowercase(), value.trim().to_string());
        }

        Ok(headers)
    }

    // === Métodos públicos para acceder a los campos ===

    pub fn method(&self) -> Method {
        self.method
    }

    /// URI completa, con el `/` inicial
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Headers con el nombre en minúsculas; si uno se repite gana el último
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Obtiene un header (el nombre no distingue mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Valor de `Request-Id`, o `"0"` si no viene
    pub fn request_id(&self) -> &str {
        self.header("Request-Id").unwrap_or("0")
    }

    /// Nombre del recurso: la URI sin `/`, validada
    ///
    /// Solo se permiten letras, dígitos, `.`, `-`, espacio y `:`. Se valida
    /// antes de tocar el filesystem o el registro de locks.
    ///
    /// # Ejemplo
    /// ```
    /// use httpserver::http::Request;
    ///
    /// let ok = Request::parse("GET /notes.txt HTTP/1.1\r\n\r\n").unwrap();
    /// assert_eq!(ok.resource_name(), Ok("notes.txt"));
    ///
    /// let bad = Request::parse("GET /a$b HTTP/1.1\r\n\r\n").unwrap();
    /// assert!(bad.resource_name().is_err());
    /// ```
    pub fn resource_name(&self) -> Result<&str, ParseError> {
        let name = &self.uri[1..];

        let valid = !name.is_empty()
            && name.len() <= MAX_NAME_LEN
            && name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b' ' | b':'));

        if valid {
            Ok(name)
        } else {
            Err(ParseError::InvalidUri(self.uri.clone()))
        }
    }
}

/// Extrae método y URI crudos de la primera línea, sin validar
///
/// Se usa para el audit log cuando el request no se pudo parsear.
pub fn peek_target(head: &str) -> (&str, &str) {
    let line = head.split("\r\n").next().unwrap_or("");
    let mut parts = line.split(' ');
    let method = parts.next().unwrap_or("");
    let uri = parts.next().unwrap_or("");
    (method, uri)
}
