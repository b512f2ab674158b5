use std::io::{BufRead, BufReader, Read, Write};

use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::TransportError;

/// Frame protocol version written in the first header byte.
pub const FRAME_VERSION: u8 = 1;
/// Header flag marking a JSON-encoded body.
pub const FRAME_FLAG_JSON: u8 = 0x01;
/// `[version][flags][seq: u64 BE][len: u32 BE]`
pub const FRAME_HEADER_LEN: usize = 14;
/// Largest frame body accepted in either direction.
pub const MAX_FRAME_LEN: u32 = 64 * 1024 * 1024;

/// A decoded response, before remote errors are surfaced.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    pub seq: u64,
    pub result: Value,
    pub error: Option<String>,
}

/// Client half of a wire encoding.
pub trait ClientCodec: Send {
    fn write_request(&mut self, seq: u64, method: &str, params: &Value)
    -> Result<(), TransportError>;

    fn read_response(&mut self) -> Result<Response, TransportError>;
}

/// Line-delimited JSON-RPC 1.0: one object per line, params wrapped in a
/// single-element array.
pub struct JsonCodec<R, W> {
    reader: BufReader<R>,
    writer: W,
}

impl<R: Read, W: Write> JsonCodec<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }
}

#[derive(Deserialize)]
struct JsonResponse {
    id: u64,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Value,
}

impl<R: Read + Send, W: Write + Send> ClientCodec for JsonCodec<R, W> {
    fn write_request(
        &mut self,
        seq: u64,
        method: &str,
        params: &Value,
    ) -> Result<(), TransportError> {
        let request = json!({ "method": method, "params": [params], "id": seq });
        serde_json::to_writer(&mut self.writer, &request).map_err(TransportError::Encode)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    fn read_response(&mut self) -> Result<Response, TransportError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(TransportError::Io(std::io::ErrorKind::UnexpectedEof.into()));
        }
        let decoded: JsonResponse =
            serde_json::from_str(line.trim_end()).map_err(TransportError::Decode)?;
        Ok(Response {
            seq: decoded.id,
            result: decoded.result,
            error: remote_error(decoded.error),
        })
    }
}

/// Binary framing: a fixed header followed by a JSON body.
pub struct FrameCodec<R, W> {
    reader: R,
    writer: W,
}

impl<R: Read, W: Write> FrameCodec<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

#[derive(Deserialize)]
struct FrameResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Value,
}

impl<R: Read + Send, W: Write + Send> ClientCodec for FrameCodec<R, W> {
    fn write_request(
        &mut self,
        seq: u64,
        method: &str,
        params: &Value,
    ) -> Result<(), TransportError> {
        let body = serde_json::to_vec(&json!({ "method": method, "params": params }))
            .map_err(TransportError::Encode)?;
        let len = u32::try_from(body.len())
            .ok()
            .filter(|len| *len <= MAX_FRAME_LEN)
            .ok_or_else(|| TransportError::Frame(format!("body of {} bytes", body.len())))?;
        self.writer.write_all(&encode_header(FRAME_FLAG_JSON, seq, len))?;
        self.writer.write_all(&body)?;
        self.writer.flush()?;
        Ok(())
    }

    fn read_response(&mut self) -> Result<Response, TransportError> {
        let mut header = [0u8; FRAME_HEADER_LEN];
        self.reader.read_exact(&mut header)?;
        let (flags, seq, len) = decode_header(&header)?;
        if flags & FRAME_FLAG_JSON == 0 {
            return Err(TransportError::Frame(format!(
                "unsupported body flags {flags:#04x}"
            )));
        }
        if len > MAX_FRAME_LEN {
            return Err(TransportError::Frame(format!(
                "body of {len} bytes exceeds {MAX_FRAME_LEN}"
            )));
        }
        let mut body = vec![0u8; len as usize];
        self.reader.read_exact(&mut body)?;
        let decoded: FrameResponse =
            serde_json::from_slice(&body).map_err(TransportError::Decode)?;
        Ok(Response {
            seq,
            result: decoded.result,
            error: remote_error(decoded.error),
        })
    }
}

pub fn encode_header(flags: u8, seq: u64, len: u32) -> [u8; FRAME_HEADER_LEN] {
    let mut header = [0u8; FRAME_HEADER_LEN];
    header[0] = FRAME_VERSION;
    header[1] = flags;
    header[2..10].copy_from_slice(&seq.to_be_bytes());
    header[10..14].copy_from_slice(&len.to_be_bytes());
    header
}

pub fn decode_header(header: &[u8; FRAME_HEADER_LEN]) -> Result<(u8, u64, u32), TransportError> {
    if header[0] != FRAME_VERSION {
        return Err(TransportError::Frame(format!(
            "unknown protocol version {}",
            header[0]
        )));
    }
    let mut seq = [0u8; 8];
    seq.copy_from_slice(&header[2..10]);
    let mut len = [0u8; 4];
    len.copy_from_slice(&header[10..14]);
    Ok((header[1], u64::from_be_bytes(seq), u32::from_be_bytes(len)))
}

fn remote_error(error: Value) -> Option<String> {
    match error {
        Value::Null => None,
        Value::String(message) => Some(message),
        other => Some(other.to_string()),
    }
}
