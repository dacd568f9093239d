use std::io::{Read, Write};
use std::time::Duration;

use xblib::{Address, ReceiveHandler};

use crate::debug::{DebugArgs, DebugPort};

/// How long a read waits before giving the dispatcher a chance to stop.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(clap::Args, Debug, Clone)]
pub struct SerialPortArgs {
    #[arg(default_value_t = default_serial_port())]
    port: String,
    #[arg(short, long, default_value_t = xblib::protocol::BAUD_RATE)]
    baud: u32,
    /// Treat PORT as a plain file.
    #[arg(long)]
    plain_file: bool,
    /// Treat PORT as a TCP address, like a serial-to-network bridge.
    #[arg(long)]
    tcp: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ClientArgs {
    /// How long to wait for each acknowledgement.
    #[arg(long, value_name = "MS", default_value_t = 3000)]
    ack_timeout: u64,
}

impl ClientArgs {
    pub fn config(&self) -> xblib::Config {
        xblib::Config::default().ack_timeout(Duration::from_millis(self.ack_timeout))
    }
}

pub enum SerialPort {
    Serial(std::io::BufWriter<Box<dyn serialport::SerialPort>>),
    File(std::io::BufWriter<std::fs::File>),
    Tcp(std::io::BufWriter<std::net::TcpStream>),
}

pub fn default_serial_port() -> String {
    if let Ok(infos) = serialport::available_ports() {
        for info in infos {
            #[cfg(target_os = "macos")]
            if info.port_name.ends_with(".Bluetooth-Incoming-Port") {
                // these ports are almost always *not* what we want
                continue;
            }

            #[cfg(target_os = "macos")]
            if info.port_name.starts_with("/dev/tty.") {
                // macos ports with tty. have flow control we don't use
                // use cu. ports instead!
                continue;
            }

            return info.port_name.clone();
        }
    }

    // not great, but reasonable fallback
    "/dev/ttyUSB0".to_owned()
}

impl std::io::Read for SerialPort {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let res = match self {
            Self::Serial(port) => port.get_mut().read(buf),
            Self::File(port) => port.get_mut().read(buf),
            Self::Tcp(port) => port.get_mut().read(buf),
        };
        // the dispatcher only knows TimedOut as "nothing yet"
        match res {
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                Err(std::io::ErrorKind::TimedOut.into())
            }
            other => other,
        }
    }
}

impl std::io::Write for SerialPort {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::Serial(port) => port.write(buf),
            Self::File(port) => port.write(buf),
            Self::Tcp(port) => port.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::Serial(port) => port.flush(),
            Self::File(port) => port.flush(),
            Self::Tcp(port) => port.flush(),
        }
    }
}

impl SerialPort {
    /// Get a second handle, so reads and writes can happen on
    /// different threads.
    pub fn try_clone(&self) -> anyhow::Result<Self> {
        Ok(match self {
            Self::Serial(port) => Self::Serial(std::io::BufWriter::new(
                serialport::SerialPort::try_clone(port.get_ref().as_ref())?,
            )),
            Self::File(port) => Self::File(std::io::BufWriter::new(port.get_ref().try_clone()?)),
            Self::Tcp(port) => Self::Tcp(std::io::BufWriter::new(port.get_ref().try_clone()?)),
        })
    }
}

impl SerialPortArgs {
    pub fn open(&self) -> anyhow::Result<SerialPort> {
        if self.tcp {
            let port = std::net::TcpStream::connect(&self.port)?;
            port.set_read_timeout(Some(READ_TIMEOUT))?;
            Ok(SerialPort::Tcp(std::io::BufWriter::new(port)))
        } else if self.plain_file {
            let port = std::fs::File::options()
                .read(true)
                .write(true)
                .open(&self.port)?;

            Ok(SerialPort::File(std::io::BufWriter::new(port)))
        } else {
            let mut port = serialport::new(&self.port, self.baud).open()?;
            port.set_timeout(READ_TIMEOUT)?;
            Ok(SerialPort::Serial(std::io::BufWriter::new(port)))
        }
    }
}

pub type ToolClient = xblib::ClientStd<DebugPort<SerialPort>>;

/// Open the port, and run `f` with a client whose dispatcher is
/// running in the background.
pub fn with_client<H, T, F>(
    port: &SerialPortArgs,
    debug: &DebugArgs,
    client: &ClientArgs,
    handler: H,
    f: F,
) -> anyhow::Result<T>
where
    H: ReceiveHandler + Send,
    F: FnOnce(&ToolClient) -> anyhow::Result<T>,
{
    let writer = port.open()?;
    let reader = writer.try_clone()?;

    let client = xblib::Client::new_std(debug.wrap(writer, ">>>"), client.config());
    let mut dispatcher = client.dispatcher(xblib::FromStd::new(debug.wrap(reader, "<<<")), handler);
    let stop = dispatcher.stop_handle();

    std::thread::scope(|s| {
        s.spawn(move || dispatcher.run());
        let result = f(&client);
        stop.stop();
        result
    })
}

/// Describe a received payload for humans.
pub fn format_packet(source: Address, data: &[u8]) -> String {
    let mut out = format!("received {} bytes from {}\n", data.len(), source);
    out += &crate::hexdump::hexdump_format(data);
    if let Ok(text) = std::str::from_utf8(data) {
        if text.chars().all(|c| !c.is_control() || c.is_whitespace()) {
            out += &format!("text: {:?}\n", text);
        }
    }
    out
}
