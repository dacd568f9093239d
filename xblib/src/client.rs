use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::dispatch::{Dispatcher, ReceiveHandler};
use crate::init::ReplyBuffer;
use crate::pending::PendingTable;
use crate::protocol::{
    AtCommand, AtCommandResponse, Frame, FrameSerialize, RemoteAtCommand,
    RemoteAtCommandResponse, Status, TransmitRequest, TransmitStatus,
};
use crate::{Address, Config, DioLevel, DioPin, Error, NetworkId, Result};

/// Re-export to allow using [Client] with [std::io] streams.
pub use embedded_io_adapters::std::FromStd;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Settings {
    default_dst: Address,
    net_id: Option<NetworkId>,
}

/// State shared between a [Client] and its [Dispatcher].
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) pending: PendingTable,
    pub(crate) replies: ReplyBuffer,
    pub(crate) config: Config,
    settings: RwLock<Settings>,
}

/// A client for an XBee radio in API mode.
///
/// The client owns the write half of the port. Responses are read by
/// a [Dispatcher], made with [Client::dispatcher()], which must be
/// running on another thread for any acknowledged operation to
/// finish.
#[derive(Debug)]
pub struct Client<W> {
    port: Mutex<W>,
    pub(crate) shared: Arc<Shared>,
}

/// A client using an [std::io] port.
pub type ClientStd<W> = Client<FromStd<W>>;

impl<W> ClientStd<W>
where
    W: std::io::Write,
{
    /// Create a new client using an [std::io] port.
    pub fn new_std(port: W, config: Config) -> Self {
        Self::with_config(FromStd::new(port), config)
    }
}

impl<W> Client<W>
where
    W: embedded_io::Write,
{
    /// Create a new client with the default [Config].
    pub fn new(port: W) -> Self {
        Self::with_config(port, Config::default())
    }

    pub fn with_config(port: W, config: Config) -> Self {
        Self {
            port: Mutex::new(port),
            shared: Arc::new(Shared {
                pending: PendingTable::new(),
                replies: ReplyBuffer::new(),
                config,
                settings: RwLock::new(Settings {
                    default_dst: Address::BROADCAST,
                    net_id: None,
                }),
            }),
        }
    }

    /// Create the [Dispatcher] that reads responses and received
    /// packets for this client.
    pub fn dispatcher<R, H>(&self, port: R, handler: H) -> Dispatcher<R, H>
    where
        R: embedded_io::Read,
        H: ReceiveHandler,
    {
        Dispatcher::new(port, handler, self.shared.clone())
    }

    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// Number of requests still waiting on a response.
    pub fn outstanding(&self) -> usize {
        self.shared.pending.outstanding()
    }

    fn settings(&self) -> Settings {
        *self
            .shared
            .settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn update_settings<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        f(&mut self
            .shared
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner))
    }

    /// Where [Client::send()] sends. Starts as [Address::BROADCAST].
    pub fn default_dst(&self) -> Address {
        self.settings().default_dst
    }

    pub fn set_default_dst(&self, dst: Address) {
        tracing::debug!(%dst, "default destination");
        self.update_settings(|s| s.default_dst = dst);
    }

    /// The last network id successfully configured.
    pub fn net_id(&self) -> Option<NetworkId> {
        self.settings().net_id
    }

    /// Write raw bytes to the port, in one piece.
    pub fn write_raw(&self, bytes: &[u8]) -> Result<()> {
        tracing::trace!("write {:02x?}", bytes);
        let mut port = self.port.lock().unwrap_or_else(PoisonError::into_inner);
        port.write_all(bytes).map_err(Error::transport)?;
        port.flush().map_err(Error::transport)?;
        Ok(())
    }

    /// Send a frame built around a fresh frame id, and wait for the
    /// response carrying that id.
    pub fn request<M, F>(&self, build: F) -> Result<Frame>
    where
        M: FrameSerialize + core::fmt::Debug,
        F: FnOnce(u8) -> M,
    {
        let ticket = self.shared.pending.allocate()?;
        let frame = build(ticket.frame_id());
        let bytes = frame.encode()?;
        tracing::debug!(?frame, "request");
        self.write_raw(&bytes)?;
        let response = ticket.wait(self.shared.config.ack_timeout)?;
        tracing::debug!(?response, "response");
        Ok(response)
    }

    /// Send a payload to the default destination.
    pub fn send(&self, payload: &[u8]) -> Result<TransmitStatus> {
        self.send_to(self.default_dst(), payload)
    }

    /// Send a payload, and wait for its delivery status.
    pub fn send_to(&self, dst: Address, payload: &[u8]) -> Result<TransmitStatus> {
        let response = self.request(|id| TransmitRequest::new(id, dst, payload.to_vec()))?;
        match response {
            Frame::TransmitStatus(status) if status.delivery.is_success() => Ok(status),
            Frame::TransmitStatus(status) => {
                Err(Error::NegativeAck(Status::Delivery(status.delivery)))
            }
            other => Err(Error::UnexpectedResponse(other.frame_type())),
        }
    }

    /// Run an AT command on the local radio, returning the response
    /// data.
    pub fn at_command(&self, command: [u8; 2], parameter: &[u8]) -> Result<Vec<u8>> {
        let response = self.request(|frame_id| AtCommand {
            frame_id,
            command,
            parameter: parameter.to_vec(),
        })?;
        match response {
            Frame::AtCommandResponse(AtCommandResponse { status, data, .. }) => {
                if status.is_ok() {
                    Ok(data)
                } else {
                    Err(Error::NegativeAck(Status::Command(status)))
                }
            }
            other => Err(Error::UnexpectedResponse(other.frame_type())),
        }
    }

    /// Run an AT command on a remote radio, applying changes
    /// immediately. Returns the response data.
    pub fn remote_at_command(
        &self,
        dst: Address,
        command: [u8; 2],
        parameter: &[u8],
    ) -> Result<Vec<u8>> {
        let response =
            self.request(|id| RemoteAtCommand::new(id, dst, command, parameter.to_vec()))?;
        match response {
            Frame::RemoteAtCommandResponse(RemoteAtCommandResponse { status, data, .. }) => {
                if status.is_ok() {
                    Ok(data)
                } else {
                    Err(Error::NegativeAck(Status::Command(status)))
                }
            }
            other => Err(Error::UnexpectedResponse(other.frame_type())),
        }
    }

    /// Set the network id on the local radio.
    ///
    /// Ids above [NetworkId::MAX] are rejected before anything is sent.
    pub fn set_net_id(&self, id: u16) -> Result<()> {
        let id = NetworkId::new(id)?;
        self.at_command(*b"ID", &id.to_be_bytes())?;
        tracing::info!(%id, "network id set");
        self.update_settings(|s| s.net_id = Some(id));
        Ok(())
    }

    /// Drive a digital output on the local radio.
    pub fn cmd_dio(&self, pin: DioPin, level: DioLevel) -> Result<()> {
        self.at_command(pin.at_command(), &[level.parameter()])?;
        Ok(())
    }

    /// Drive a digital output on the default destination.
    pub fn cmd_remote_dio(&self, pin: DioPin, level: DioLevel) -> Result<()> {
        self.cmd_remote_dio_to(self.default_dst(), pin, level)
    }

    /// Drive a digital output on a remote radio.
    pub fn cmd_remote_dio_to(&self, dst: Address, pin: DioPin, level: DioLevel) -> Result<()> {
        self.remote_at_command(dst, pin.at_command(), &[level.parameter()])?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dispatch::Received;
    use crate::protocol::{
        CommandStatus, DecodeResult, DeliveryStatus, FrameDecoder, ReceivePacket, UNKNOWN_16,
    };
    use crate::testing::{HostRx, HostTx, Radio};
    use std::time::Duration;

    fn test_config() -> Config {
        Config::default().ack_timeout(Duration::from_millis(200))
    }

    /// Run `f` with a dispatcher going in the background.
    fn with_dispatcher<T>(client: &Client<HostTx>, rx: HostRx, f: impl FnOnce() -> T) -> T {
        let mut dispatcher = client.dispatcher(rx, |_: Address, _: &[u8]| {});
        let stop = dispatcher.stop_handle();
        std::thread::scope(|s| {
            s.spawn(move || dispatcher.run());
            let result = f();
            stop.stop();
            result
        })
    }

    fn written_frames(radio: &Radio) -> Vec<Frame> {
        FrameDecoder::new()
            .feed(&radio.written())
            .filter_map(DecodeResult::ok)
            .collect()
    }

    fn ack(frame: &Frame) -> Vec<Vec<u8>> {
        let reply: Frame = match frame {
            Frame::TransmitRequest(req) => TransmitStatus {
                frame_id: req.frame_id,
                destination_16: UNKNOWN_16,
                retry_count: 0,
                delivery: DeliveryStatus::SUCCESS,
                discovery: 0,
            }
            .into(),
            Frame::AtCommand(cmd) => AtCommandResponse {
                frame_id: cmd.frame_id,
                command: cmd.command,
                status: CommandStatus::Ok,
                data: vec![],
            }
            .into(),
            Frame::RemoteAtCommand(cmd) => RemoteAtCommandResponse {
                frame_id: cmd.frame_id,
                source: cmd.destination,
                source_16: UNKNOWN_16,
                command: cmd.command,
                status: CommandStatus::Ok,
                data: vec![],
            }
            .into(),
            _ => return vec![],
        };
        vec![reply.encode().unwrap()]
    }

    #[test]
    fn send_broadcast_ping() {
        let (radio, tx, rx) = Radio::frames(ack);
        let client = Client::with_config(tx, test_config());
        assert_eq!(client.default_dst(), Address::BROADCAST);

        let status = with_dispatcher(&client, rx, || client.send(b"ping")).unwrap();
        assert!(status.delivery.is_success());

        let frames = written_frames(&radio);
        assert_eq!(frames.len(), 1);
        match &frames[0] {
            Frame::TransmitRequest(req) => {
                assert_eq!(req.destination.as_u64(), 0x000000000000ffff);
                assert_eq!(req.data, b"ping");
                assert_eq!(req.frame_id, status.frame_id);
            }
            other => panic!("unexpected frame {:?}", other),
        }
        assert_eq!(client.outstanding(), 0);
    }

    #[test]
    fn send_delivery_failure() {
        let (_radio, tx, rx) = Radio::frames(|frame| match frame {
            Frame::TransmitRequest(req) => vec![Frame::from(TransmitStatus {
                frame_id: req.frame_id,
                destination_16: UNKNOWN_16,
                retry_count: 3,
                delivery: DeliveryStatus(0x21),
                discovery: 0,
            })
            .encode()
            .unwrap()],
            _ => vec![],
        });
        let client = Client::with_config(tx, test_config());
        let result = with_dispatcher(&client, rx, || client.send(b"ping"));
        assert_eq!(
            result,
            Err(Error::NegativeAck(Status::Delivery(DeliveryStatus(0x21))))
        );
    }

    #[test]
    fn send_timeout_frees_id() {
        let (radio, tx, rx) = Radio::frames(|_| vec![]);
        let client = Client::with_config(tx, test_config());
        let result = with_dispatcher(&client, rx, || client.send_to(Address::new(5), b"x"));
        assert_eq!(result, Err(Error::Timeout { frame_id: Some(1) }));
        assert_eq!(client.outstanding(), 0);

        // the same id is free to register again
        let ticket = client.shared.pending.register(1).unwrap();
        drop(ticket);
        assert_eq!(written_frames(&radio).len(), 1);
    }

    #[test]
    fn set_net_id_out_of_range() {
        let (radio, tx, _rx) = Radio::frames(ack);
        let client = Client::with_config(tx, test_config());
        assert!(matches!(
            client.set_net_id(0x8000),
            Err(Error::InvalidArgument(_))
        ));
        assert!(radio.written().is_empty());
        assert_eq!(client.net_id(), None);
    }

    #[test]
    fn set_net_id_ok() {
        let (radio, tx, rx) = Radio::frames(ack);
        let client = Client::with_config(tx, test_config());
        with_dispatcher(&client, rx, || client.set_net_id(0x3332)).unwrap();
        assert_eq!(client.net_id(), Some(NetworkId::new(0x3332).unwrap()));
        assert_eq!(
            written_frames(&radio),
            vec![Frame::AtCommand(AtCommand {
                frame_id: 1,
                command: *b"ID",
                parameter: vec![0x33, 0x32],
            })]
        );
    }

    #[test]
    fn at_command_negative() {
        let (_radio, tx, rx) = Radio::frames(|frame| match frame {
            Frame::AtCommand(cmd) => vec![Frame::from(AtCommandResponse {
                frame_id: cmd.frame_id,
                command: cmd.command,
                status: CommandStatus::InvalidParameter,
                data: vec![],
            })
            .encode()
            .unwrap()],
            _ => vec![],
        });
        let client = Client::with_config(tx, test_config());
        let result = with_dispatcher(&client, rx, || client.set_net_id(0x0001));
        assert_eq!(
            result,
            Err(Error::NegativeAck(Status::Command(
                CommandStatus::InvalidParameter
            )))
        );
        assert_eq!(client.net_id(), None);
    }

    #[test]
    fn local_and_remote_vtx() {
        let (radio, tx, rx) = Radio::frames(ack);
        let client = Client::with_config(tx, test_config());
        let dst = Address::new(0x0013a20040a1b2c3);
        client.set_default_dst(dst);
        with_dispatcher(&client, rx, || {
            client.cmd_dio(DioPin::VTX, DioLevel::High)?;
            client.cmd_remote_dio(DioPin::VTX, DioLevel::Low)
        })
        .unwrap();

        assert_eq!(
            written_frames(&radio),
            vec![
                Frame::AtCommand(AtCommand {
                    frame_id: 1,
                    command: *b"P2",
                    parameter: vec![0x05],
                }),
                Frame::RemoteAtCommand(RemoteAtCommand::new(2, dst, *b"P2", vec![0x04])),
            ]
        );
    }

    #[test]
    fn wrong_response_type() {
        let (_radio, tx, rx) = Radio::frames(|frame| match frame {
            Frame::AtCommand(cmd) => vec![Frame::from(TransmitStatus {
                frame_id: cmd.frame_id,
                destination_16: UNKNOWN_16,
                retry_count: 0,
                delivery: DeliveryStatus::SUCCESS,
                discovery: 0,
            })
            .encode()
            .unwrap()],
            _ => vec![],
        });
        let client = Client::with_config(tx, test_config());
        let result = with_dispatcher(&client, rx, || client.at_command(*b"AP", &[]));
        assert_eq!(result, Err(Error::UnexpectedResponse(0x8b)));
    }

    #[test]
    fn concurrent_requests() {
        // answer in reverse order of arrival, once two are waiting
        let mut held: Vec<Frame> = vec![];
        let (_radio, tx, rx) = Radio::frames(move |frame| {
            held.push(frame.clone());
            if held.len() < 2 {
                return vec![];
            }
            held.drain(..).rev().flat_map(|f| ack(&f)).collect()
        });
        let client = Client::with_config(tx, test_config().ack_timeout(Duration::from_secs(2)));
        let (a, b) = with_dispatcher(&client, rx, || {
            std::thread::scope(|s| {
                let a = s.spawn(|| client.send_to(Address::new(0xa), b"a"));
                let b = s.spawn(|| client.send_to(Address::new(0xb), b"b"));
                (a.join().unwrap(), b.join().unwrap())
            })
        });
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.frame_id, b.frame_id);
        assert_eq!(client.outstanding(), 0);
    }

    #[test]
    fn receive_packet_reaches_handler() {
        let (radio, tx, rx) = Radio::frames(|_| vec![]);
        let client = Client::with_config(tx, test_config());
        let (sender, receiver) = std::sync::mpsc::channel::<Received>();
        let mut dispatcher = client.dispatcher(rx, sender);
        let stop = dispatcher.stop_handle();

        let packet = ReceivePacket {
            source: Address::new(0x1234),
            source_16: 0x0001,
            options: 0,
            data: b"hello".to_vec(),
        };
        radio.inject(Frame::from(packet).encode().unwrap());

        std::thread::scope(|s| {
            s.spawn(move || dispatcher.run());
            let received = receiver.recv_timeout(Duration::from_secs(2)).unwrap();
            stop.stop();
            assert_eq!(received.source, Address::new(0x1234));
            assert_eq!(received.data, b"hello");
        });
    }
}
