use xblib::{Address, Received};

#[derive(clap::Args, Debug)]
pub struct SendOpts {
    #[command(flatten)]
    port: crate::common::SerialPortArgs,
    #[command(flatten)]
    debug: crate::debug::DebugArgs,
    #[command(flatten)]
    client: crate::common::ClientArgs,

    /// Destination address, in hex. Broadcast if not given.
    #[arg(long)]
    dst: Option<Address>,
    /// Put the radio into API mode first.
    #[arg(long)]
    init: bool,

    text: String,
}

impl crate::ToolRun for SendOpts {
    fn run(&self) -> anyhow::Result<()> {
        self.debug.init_logging();

        // payloads that arrive meanwhile are shown after the result
        let (sender, receiver) = std::sync::mpsc::channel::<Received>();
        crate::common::with_client(&self.port, &self.debug, &self.client, sender, |client| {
            if self.init {
                client.initialize(&mut xblib::StdDelay)?;
            }
            if let Some(dst) = self.dst {
                client.set_default_dst(dst);
            }

            let status = client.send(self.text.as_bytes())?;
            println!(
                "delivered to {} after {} retries",
                client.default_dst(),
                status.retry_count
            );
            Ok(())
        })?;

        for packet in receiver.try_iter() {
            print!("{}", crate::common::format_packet(packet.source, &packet.data));
        }
        Ok(())
    }
}
