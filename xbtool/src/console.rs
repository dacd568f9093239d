use rustyline::{error::ReadlineError, DefaultEditor, ExternalPrinter};

use xblib::{Address, DioLevel, DioPin};

use crate::commands::{ConsoleCommand, HELP};
use crate::common::ToolClient;

#[derive(clap::Args, Debug)]
pub struct ConsoleOpts {
    #[command(flatten)]
    port: crate::common::SerialPortArgs,
    #[command(flatten)]
    debug: crate::debug::DebugArgs,
    #[command(flatten)]
    client: crate::common::ClientArgs,
}

impl crate::ToolRun for ConsoleOpts {
    fn run(&self) -> anyhow::Result<()> {
        self.debug.init_logging();

        let mut rl = DefaultEditor::new()?;
        let mut printer = rl.create_external_printer()?;
        let handler = move |source: Address, data: &[u8]| {
            if let Err(e) = printer.print(crate::common::format_packet(source, data)) {
                tracing::warn!("could not print packet: {}", e);
            }
        };

        crate::common::with_client(&self.port, &self.debug, &self.client, handler, |client| {
            Console { client, rl: &mut rl }.run()
        })
    }
}

fn level_name(level: DioLevel) -> &'static str {
    match level {
        DioLevel::High => "high",
        DioLevel::Low => "low",
    }
}

/// Confirmation for a VTX change, on a remote radio or the local one.
fn vtx_done(remote: Option<Address>, level: DioLevel) -> String {
    let radio = match remote {
        Some(dst) => dst.to_string(),
        None => "local radio".to_owned(),
    };
    format!("{} on {} set {}", DioPin::VTX, radio, level_name(level))
}

pub struct Console<'a> {
    client: &'a ToolClient,
    rl: &'a mut DefaultEditor,
}

impl<'a> Console<'a> {
    pub fn run(&mut self) -> anyhow::Result<()> {
        println!("type `help` for commands");
        loop {
            match self.rl.readline("xbee> ") {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    self.rl.add_history_entry(line)?;

                    match line.parse::<ConsoleCommand>() {
                        Ok(ConsoleCommand::Quit) => return Ok(()),
                        Ok(command) => {
                            if let Err(e) = self.execute(command) {
                                println!("error: {}", e);
                            }
                        }
                        Err(e) => println!("{}", e),
                    }
                }

                Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => return Ok(()),

                Err(e) => Err(e)?,
            }
        }
    }

    fn execute(&mut self, command: ConsoleCommand) -> xblib::Result<()> {
        use ConsoleCommand::*;
        match command {
            Init => {
                self.client.initialize(&mut xblib::StdDelay)?;
                println!("radio is in API mode");
            }
            Send(text) => {
                let status = self.client.send(text.as_bytes())?;
                println!(
                    "delivered to {} after {} retries",
                    self.client.default_dst(),
                    status.retry_count
                );
            }
            Dst(dst) => {
                self.client.set_default_dst(dst);
                println!("destination is {}", dst);
            }
            NetId(id) => {
                self.client.set_net_id(id.as_u16())?;
                println!("network id is {}", id);
            }
            RemoteVtx(level) => {
                self.client.cmd_remote_dio(DioPin::VTX, level)?;
                println!("{}", vtx_done(Some(self.client.default_dst()), level));
            }
            LocalVtx(level) => {
                self.client.cmd_dio(DioPin::VTX, level)?;
                println!("{}", vtx_done(None, level));
            }
            Status => {
                println!("destination: {}", self.client.default_dst());
                match self.client.net_id() {
                    Some(id) => println!("network id: {}", id),
                    None => println!("network id: not set"),
                }
                println!("waiting on: {}", self.client.outstanding());
            }
            Help => println!("{}", HELP),
            // handled by the caller
            Quit => {}
        }
        Ok(())
    }
}
