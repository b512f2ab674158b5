use std::io;
use std::net::{Shutdown, TcpStream, ToSocketAddrs};

use serde_json::Value;
use tracing::debug;

use crate::Transport;
use crate::codec::{ClientCodec, FrameCodec, JsonCodec};
use crate::config::{CodecKind, Network};
use crate::error::TransportError;

/// A dialed TCP connection speaking one codec.
pub struct Connection {
    stream: TcpStream,
    codec: Box<dyn ClientCodec>,
    address: String,
    seq: u64,
    closed: bool,
}

impl Connection {
    /// Dial `address` (`host:port`) over `network` and attach `codec`.
    pub fn dial(network: Network, address: &str, codec: CodecKind) -> Result<Self, TransportError> {
        let candidates = address
            .to_socket_addrs()
            .map_err(|err| TransportError::dial(address, err))?;

        let mut last_err = None;
        for addr in candidates.filter(|addr| network.admits(addr)) {
            match TcpStream::connect(addr) {
                Ok(stream) => {
                    debug!(%address, %addr, %network, %codec, "connection established");
                    return Self::from_stream(stream, address, codec)
                        .map_err(|err| TransportError::dial(address, err));
                }
                Err(err) => last_err = Some(err),
            }
        }

        let err = last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("no {network} address found"),
            )
        });
        Err(TransportError::dial(address, err))
    }

    fn from_stream(stream: TcpStream, address: &str, codec: CodecKind) -> io::Result<Self> {
        let reader = stream.try_clone()?;
        let writer = stream.try_clone()?;
        let codec: Box<dyn ClientCodec> = match codec {
            CodecKind::Json => Box::new(JsonCodec::new(reader, writer)),
            CodecKind::Goridge => Box::new(FrameCodec::new(reader, writer)),
        };
        Ok(Self {
            stream,
            codec,
            address: address.to_string(),
            seq: 0,
            closed: false,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Transport for Connection {
    fn call(&mut self, method: &str, params: &Value) -> Result<Value, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }

        self.seq = self.seq.wrapping_add(1);
        let seq = self.seq;
        self.codec.write_request(seq, method, params)?;
        debug!(seq, method, "request sent");

        let response = self.codec.read_response()?;
        debug!(seq = response.seq, method, "response received");
        if response.seq != seq {
            return Err(TransportError::SequenceMismatch {
                expected: seq,
                actual: response.seq,
            });
        }
        match response.error {
            Some(message) => Err(TransportError::Remote(message)),
            None => Ok(response.result),
        }
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(TransportError::Io(err)),
        }
    }
}
