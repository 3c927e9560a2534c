//! # Conexión HTTP
//! src/http/connection.rs
//!
//! Envuelve un stream aceptado (normalmente `TcpStream`) y ofrece las
//! operaciones que usan los workers:
//!
//! - `parse`: lee el head hasta `\r\n\r\n` y lo parsea
//! - `recv_file`: copia `Content-Length` bytes del body a un archivo
//! - `send_file`: envía `200 OK` + contenido de un archivo
//! - `send_response`: envía una respuesta completa
//!
//! Al leer el head pueden llegar bytes del body en el mismo `read`; esos
//! bytes quedan en `pending` y se consumen primero en `recv_file`.

use super::request::{self, ParseError, Request};
use super::{Response, StatusCode};
use std::io::{self, Read, Write};

/// Máximo de bytes del head (request line + headers)
pub const MAX_HEAD_BYTES: usize = 2048;

const TERMINATOR: &[u8] = b"\r\n\r\n";

/// Errores al recibir un request
#[derive(Debug)]
pub enum ConnectionError {
    /// El peer cerró sin enviar un solo byte
    Disconnected,

    /// Error de transporte en el socket
    Io(io::Error),

    /// Request malformado o no soportado
    Parse(ParseError),
}

impl std::fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionError::Disconnected => write!(f, "Peer closed before sending a request"),
            ConnectionError::Io(e) => write!(f, "I/O error: {}", e),
            ConnectionError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for ConnectionError {}

impl From<io::Error> for ConnectionError {
    fn from(e: io::Error) -> Self {
        ConnectionError::Io(e)
    }
}

impl From<ParseError> for ConnectionError {
    fn from(e: ParseError) -> Self {
        ConnectionError::Parse(e)
    }
}

/// Conexión con un cliente
pub struct Connection<S> {
    stream: S,

    /// Head crudo (para el audit log cuando el parse falla)
    head: String,

    /// Bytes del body leídos junto con el head
    pending: Vec<u8>,
}

impl<S: Read + Write> Connection<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            head: String::new(),
            pending: Vec::new(),
        }
    }

    /// Lee y parsea el head del request
    pub fn parse(&mut self) -> Result<Request, ConnectionError> {
        let mut buffer = vec![0u8; MAX_HEAD_BYTES];
        let mut filled = 0;

        let head_end = loop {
            if let Some(pos) = find_terminator(&buffer[..filled]) {
                break pos + TERMINATOR.len();
            }

            if filled == MAX_HEAD_BYTES {
                self.head = String::from_utf8_lossy(&buffer[..filled]).into_owned();
                return Err(ParseError::HeadTooLarge.into());
            }

            let n = match self.stream.read(&mut buffer[filled..]) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            if n == 0 {
                if filled == 0 {
                    return Err(ConnectionError::Disconnected);
                }
                self.head = String::from_utf8_lossy(&buffer[..filled]).into_owned();
                return Err(ParseError::IncompleteRequest.into());
            }

            filled += n;
        };

        self.pending = buffer[head_end..filled].to_vec();
        self.head = String::from_utf8_lossy(&buffer[..head_end]).into_owned();

        let head = std::str::from_utf8(&buffer[..head_end])
            .map_err(|_| ParseError::InvalidRequestLine)?;

        Ok(Request::parse(head)?)
    }

    /// Método y URI crudos del head leído (vacíos si no hubo head)
    pub fn target(&self) -> (&str, &str) {
        request::peek_target(&self.head)
    }

    /// Copia exactamente `len` bytes del body a `dst`
    ///
    /// Retorna los bytes copiados; si el cliente cierra antes, el total es
    /// menor que `len` y el caller decide cómo responder.
    pub fn recv_file<W: Write>(&mut self, dst: &mut W, len: u64) -> io::Result<u64> {
        let from_pending = (self.pending.len() as u64).min(len) as usize;
        dst.write_all(&self.pending[..from_pending])?;
        self.pending.drain(..from_pending);

        let remaining = len - from_pending as u64;
        let copied = io::copy(&mut (&mut self.stream).take(remaining), dst)?;
        dst.flush()?;

        Ok(from_pending as u64 + copied)
    }

    /// Envía `200 OK` con `Content-Length: len` y el contenido de `src`
    pub fn send_file<R: Read>(&mut self, src: &mut R, len: u64) -> io::Result<()> {
        let head = Response::new(StatusCode::Ok)
            .with_header("Content-Length", &len.to_string())
            .head_bytes();
        self.stream.write_all(&head)?;

        let sent = io::copy(&mut src.take(len), &mut self.stream)?;
        if sent != len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("file ended after {} of {} bytes", sent, len),
            ));
        }

        self.stream.flush()
    }

    pub fn send_response(&mut self, response: &Response) -> io::Result<()> {
        self.stream.write_all(&response.to_bytes())?;
        self.stream.flush()
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(TERMINATOR.len()).position(|w| w == TERMINATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Stream en memoria: lee de `input`, escribe en `output`
    struct MockStream {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl MockStream {
        fn new(input: &[u8]) -> Self {
            Self {
                input: Cursor::new(input.to_vec()),
                output: Vec::new(),
            }
        }
    }

    impl Read for MockStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for MockStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_parse_and_recv_body() {
        let raw = b"PUT /a HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
        let mut conn = Connection::new(MockStream::new(raw));

        let request = conn.parse().unwrap();
        assert_eq!(request.content_length(), Some(5));

        let mut file = Vec::new();
        assert_eq!(conn.recv_file(&mut file, 5).unwrap(), 5);
        assert_eq!(file, b"hello");
    }

    #[test]
    fn test_recv_ignores_bytes_past_length() {
        let raw = b"PUT /a HTTP/1.1\r\nContent-Length: 3\r\n\r\nbyeEXTRA";
        let mut conn = Connection::new(MockStream::new(raw));
        conn.parse().unwrap();

        let mut file = Vec::new();
        conn.recv_file(&mut file, 3).unwrap();
        assert_eq!(file, b"bye");
    }

    #[test]
    fn test_recv_short_body() {
        let raw = b"PUT /a HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc";
        let mut conn = Connection::new(MockStream::new(raw));
        conn.parse().unwrap();

        let mut file = Vec::new();
        assert_eq!(conn.recv_file(&mut file, 10).unwrap(), 3);
    }

    #[test]
    fn test_disconnected_without_bytes() {
        let mut conn = Connection::new(MockStream::new(b""));
        assert!(matches!(conn.parse(), Err(ConnectionError::Disconnected)));
        assert_eq!(conn.target(), ("", ""));
    }

    #[test]
    fn test_incomplete_head() {
        let mut conn = Connection::new(MockStream::new(b"GET /a HTTP/1.1\r\n"));
        let err = conn.parse().unwrap_err();
        assert!(matches!(err, ConnectionError::Parse(ParseError::IncompleteRequest)));
        assert_eq!(conn.target(), ("GET", "/a"));
    }

    #[test]
    fn test_head_too_large() {
        let mut raw = b"GET /a HTTP/1.1\r\nX-Pad: ".to_vec();
        raw.extend(std::iter::repeat(b'x').take(MAX_HEAD_BYTES));
        let mut conn = Connection::new(MockStream::new(&raw));

        let err = conn.parse().unwrap_err();
        assert!(matches!(err, ConnectionError::Parse(ParseError::HeadTooLarge)));
    }

    #[test]
    fn test_target_after_parse_error() {
        let mut conn = Connection::new(MockStream::new(b"DELETE /x HTTP/1.1\r\n\r\n"));
        let err = conn.parse().unwrap_err();

        assert!(matches!(err, ConnectionError::Parse(ParseError::NotImplemented(_))));
        assert_eq!(conn.target(), ("DELETE", "/x"));
    }

    #[test]
    fn test_send_file() {
        let mut conn = Connection::new(MockStream::new(b""));
        conn.send_file(&mut Cursor::new(b"hello".to_vec()), 5).unwrap();

        let out = conn.into_inner().output;
        assert_eq!(out, b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello");
    }

    #[test]
    fn test_send_file_truncated_source() {
        let mut conn = Connection::new(MockStream::new(b""));
        let err = conn.send_file(&mut Cursor::new(b"hi".to_vec()), 5).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_send_response() {
        let mut conn = Connection::new(MockStream::new(b""));
        conn.send_response(&Response::status_only(StatusCode::NotFound)).unwrap();

        let out = String::from_utf8(conn.into_inner().output).unwrap();
        assert_eq!(out, "HTTP/1.1 404 Not Found\r\nContent-Length: 10\r\n\r\nNot Found\n");
    }
}
