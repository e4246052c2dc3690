use std::{
    collections::VecDeque,
    net::{SocketAddr, UdpSocket as StdUdpSocket},
    sync::{Arc, Mutex},
};

use log::{error, info, trace, warn};
use tokio::{net::UdpSocket, sync::mpsc};

use super::{
    PacketReceiver as TransportReceiver, PacketSender as TransportSender, RecvError, SendError,
    Socket as TransportSocket,
};
use crate::IomustServerError;

// Constants
const MAX_DATAGRAM_SIZE: usize = 65_507;

type DatagramBuffer = Arc<Mutex<VecDeque<(SocketAddr, Vec<u8>)>>>;

/// A UDP socket whose I/O runs on a dedicated thread with its own tokio
/// runtime, so the server loop itself never blocks
pub struct Socket {
    socket: StdUdpSocket,
}

impl Socket {
    /// Binds the listening address right away so that failures surface here
    /// rather than on the I/O thread
    pub fn bind(listen_addr: SocketAddr) -> Result<Self, IomustServerError> {
        let bind_error = |e: std::io::Error| IomustServerError::Bind {
            address: listen_addr,
            reason: e.to_string(),
        };
        let socket = StdUdpSocket::bind(listen_addr).map_err(bind_error)?;
        socket.set_nonblocking(true).map_err(bind_error)?;
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.local_addr().ok()
    }
}

impl Into<Box<dyn TransportSocket>> for Socket {
    fn into(self) -> Box<dyn TransportSocket> {
        Box::new(self)
    }
}

impl TransportSocket for Socket {
    fn listen(self: Box<Self>) -> (Box<dyn TransportSender>, Box<dyn TransportReceiver>) {
        let datagram_buffer: DatagramBuffer = Arc::new(Mutex::new(VecDeque::new()));
        let (outgoing_sender, outgoing_receiver) = mpsc::unbounded_channel();

        spawn_socket_thread(self.socket, datagram_buffer.clone(), outgoing_receiver);

        (
            Box::new(UdpPacketSender {
                sender: outgoing_sender,
            }),
            Box::new(UdpPacketReceiver::new(datagram_buffer)),
        )
    }
}

fn spawn_socket_thread(
    socket: StdUdpSocket,
    datagram_buffer: DatagramBuffer,
    mut outgoing: mpsc::UnboundedReceiver<(SocketAddr, Vec<u8>)>,
) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("Failed to create tokio runtime: {}", e);
                return;
            }
        };

        runtime.block_on(async move {
            let socket = match UdpSocket::from_std(socket) {
                Ok(socket) => Arc::new(socket),
                Err(e) => {
                    error!("Failed to register UDP socket with tokio: {}", e);
                    return;
                }
            };
            info!("UDP socket listening on {:?}", socket.local_addr());

            let send_socket = socket.clone();
            tokio::spawn(async move {
                while let Some((address, payload)) = outgoing.recv().await {
                    if let Err(e) = send_socket.send_to(&payload, address).await {
                        warn!("Failed to send {} bytes to {}: {}", payload.len(), address, e);
                    }
                }
            });

            let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];
            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((length, from)) => {
                        trace!("Received {} bytes from {}", length, from);
                        let Ok(mut datagrams) = datagram_buffer.lock() else {
                            error!("Datagram buffer poisoned, stopping UDP receiver");
                            return;
                        };
                        datagrams.push_back((from, buffer[..length].to_vec()));
                    }
                    // ICMP port-unreachable surfaces here on some platforms
                    Err(e) => warn!("UDP receive error: {}", e),
                }
            }
        });
    });
}

// Packet Sender
struct UdpPacketSender {
    sender: mpsc::UnboundedSender<(SocketAddr, Vec<u8>)>,
}

impl TransportSender for UdpPacketSender {
    fn send(&self, address: &SocketAddr, payload: &[u8]) -> Result<(), SendError> {
        self.sender
            .send((*address, payload.to_vec()))
            .map_err(|_| SendError)
    }
}

// Packet Receiver
struct UdpPacketReceiver {
    buffer: DatagramBuffer,
    current_packet: Option<Vec<u8>>,
}

impl UdpPacketReceiver {
    fn new(buffer: DatagramBuffer) -> Self {
        Self {
            buffer,
            current_packet: None,
        }
    }
}

impl TransportReceiver for UdpPacketReceiver {
    fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, RecvError> {
        let next = {
            let mut buffer = self.buffer.lock().map_err(|_| RecvError)?;
            buffer.pop_front()
        };
        match next {
            Some((address, data)) => {
                let packet = self.current_packet.insert(data);
                Ok(Some((address, packet.as_slice())))
            }
            None => Ok(None),
        }
    }
}
