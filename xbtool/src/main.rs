use clap::Parser;

mod commands;
mod common;
mod console;
mod debug;
mod hexdump;
mod parsedump;
mod send;

trait ToolRun {
    fn run(&self) -> anyhow::Result<()>;
}

/// Talk to XBee radios in API mode.
#[derive(Parser, Debug)]
#[command(version, about)]
struct ToolOptions {
    #[command(subcommand)]
    command: ToolCommand,
}

#[derive(clap::Subcommand, Debug)]
enum ToolCommand {
    /// Interactive console for a radio.
    Console(console::ConsoleOpts),
    /// Send one payload and wait for its delivery status.
    Send(send::SendOpts),
    /// Decode frames from a capture of raw serial bytes.
    ParseDump(parsedump::ParseDumpOpts),
}

impl ToolRun for ToolCommand {
    fn run(&self) -> anyhow::Result<()> {
        use ToolCommand::*;
        match self {
            Console(o) => o.run(),
            Send(o) => o.run(),
            ParseDump(o) => o.run(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let opts = ToolOptions::parse();
    opts.command.run()
}
