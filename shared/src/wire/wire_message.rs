use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use crate::{
    constants::{HEADER_SIZE, SELECTOR_OFFSET, SEQUENCE_OFFSET, TIMESTAMP_OFFSET},
    types::{Micros, SequenceNumber},
};

use super::error::WireError;

/// A single numbered message as exchanged between clients and the mixing
/// server.
///
/// The header is fixed-size: destination IPv4 address (network order), a
/// one-byte destination selector, the sender's send timestamp in
/// microseconds and the sender-local sequence number (both little-endian).
/// Everything after the header is an opaque payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WireMessage {
    destination: Ipv4Addr,
    selector: u8,
    send_time: Micros,
    seq_n: SequenceNumber,
    payload: Vec<u8>,
}

impl WireMessage {
    pub fn new(
        destination: Ipv4Addr,
        selector: u8,
        send_time: Micros,
        seq_n: SequenceNumber,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            destination,
            selector,
            send_time,
            seq_n,
            payload,
        }
    }

    /// Decodes a message received from the network.
    ///
    /// SECURITY: `bytes` is untrusted. Anything shorter than the header is
    /// rejected instead of being partially read.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() < HEADER_SIZE {
            return Err(WireError::MalformedMessage {
                length: bytes.len(),
                expected: HEADER_SIZE,
            });
        }

        let destination = Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]);
        let selector = bytes[SELECTOR_OFFSET];

        let mut time_bytes = [0u8; 8];
        time_bytes.copy_from_slice(&bytes[TIMESTAMP_OFFSET..SEQUENCE_OFFSET]);
        let send_time = Micros::from_le_bytes(time_bytes);

        let mut seq_bytes = [0u8; 4];
        seq_bytes.copy_from_slice(&bytes[SEQUENCE_OFFSET..HEADER_SIZE]);
        let seq_n = SequenceNumber::from_le_bytes(seq_bytes);

        Ok(Self {
            destination,
            selector,
            send_time,
            seq_n,
            payload: bytes[HEADER_SIZE..].to_vec(),
        })
    }

    /// Encodes the message into a freshly allocated buffer
    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut buffer);
        buffer
    }

    /// Appends the encoded message to `buffer`
    pub fn encode_into(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(&self.destination.octets());
        buffer.push(self.selector);
        buffer.extend_from_slice(&self.send_time.to_le_bytes());
        buffer.extend_from_slice(&self.seq_n.to_le_bytes());
        buffer.extend_from_slice(&self.payload);
    }

    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    pub fn destination(&self) -> Ipv4Addr {
        self.destination
    }

    pub fn selector(&self) -> u8 {
        self.selector
    }

    /// The header destination as a socket address, using the selector as port
    pub fn destination_address(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(
            self.destination,
            u16::from(self.selector),
        ))
    }

    pub fn send_time(&self) -> Micros {
        self.send_time
    }

    pub fn seq_n(&self) -> SequenceNumber {
        self.seq_n
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    // Header rewriting, used when a slot is released

    pub fn set_seq_n(&mut self, seq_n: SequenceNumber) {
        self.seq_n = seq_n;
    }

    pub fn set_destination(&mut self, destination: Ipv4Addr) {
        self.destination = destination;
    }

    pub fn set_send_time(&mut self, send_time: Micros) {
        self.send_time = send_time;
    }

    pub fn set_payload(&mut self, payload: Vec<u8>) {
        self.payload = payload;
    }
}
