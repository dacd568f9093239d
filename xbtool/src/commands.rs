use xblib::{Address, DioLevel, NetworkId};

/// A line typed at the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Init,
    Send(String),
    Dst(Address),
    NetId(NetworkId),
    RemoteVtx(DioLevel),
    LocalVtx(DioLevel),
    Status,
    Help,
    Quit,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command {0:?}, try `help`")]
    Unknown(String),
    #[error("`{0}` needs {1}")]
    MissingArgument(&'static str, &'static str),
    #[error("`{0}` takes no more than one argument")]
    ExtraArgument(&'static str),
    #[error("`{0}`: {1}")]
    BadArgument(&'static str, String),
}

pub const HELP: &str = "\
commands:
  init              put the radio into API mode
  send TEXT         send TEXT to the current destination
  dst ADDR          set the destination, 64-bit hex (ffff broadcasts)
  net_id ID         set the network id, hex 0 to 7fff
  remote_vtx on|off drive VTX on the destination radio
  local_vtx on|off  drive VTX on the local radio
  status            show the destination and network id
  help              show this
  quit              leave (also exit, Ctrl-D)";

fn no_argument(command: &'static str, rest: &str) -> Result<(), CommandError> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(CommandError::ExtraArgument(command))
    }
}

fn one_argument<'a>(
    command: &'static str,
    what: &'static str,
    rest: &'a str,
) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        Err(CommandError::MissingArgument(command, what))
    } else if rest.contains(char::is_whitespace) {
        Err(CommandError::ExtraArgument(command))
    } else {
        Ok(rest)
    }
}

fn parse_level(command: &'static str, rest: &str) -> Result<DioLevel, CommandError> {
    let arg = one_argument(command, "on or off", rest)?;
    match arg.to_ascii_lowercase().as_str() {
        "on" | "high" | "1" => Ok(DioLevel::High),
        "off" | "low" | "0" => Ok(DioLevel::Low),
        _ => Err(CommandError::BadArgument(
            command,
            format!("expected on or off, got {:?}", arg),
        )),
    }
}

impl std::str::FromStr for ConsoleCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        match name {
            "init" => no_argument("init", rest).map(|_| Self::Init),
            "send" => {
                if rest.is_empty() {
                    Err(CommandError::MissingArgument("send", "some text"))
                } else {
                    Ok(Self::Send(rest.to_owned()))
                }
            }
            "dst" => one_argument("dst", "an address", rest)?
                .parse()
                .map(Self::Dst)
                .map_err(|e: xblib::Error| CommandError::BadArgument("dst", e.to_string())),
            "net_id" => one_argument("net_id", "a network id", rest)?
                .parse()
                .map(Self::NetId)
                .map_err(|e: xblib::Error| CommandError::BadArgument("net_id", e.to_string())),
            "remote_vtx" => parse_level("remote_vtx", rest).map(Self::RemoteVtx),
            "local_vtx" => parse_level("local_vtx", rest).map(Self::LocalVtx),
            "status" => no_argument("status", rest).map(|_| Self::Status),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(line: &str) -> Result<ConsoleCommand, CommandError> {
        line.parse()
    }

    #[test]
    fn send_keeps_spaces() {
        assert_eq!(
            parse("send  hello there "),
            Ok(ConsoleCommand::Send("hello there".to_owned()))
        );
        assert_eq!(
            parse("send"),
            Err(CommandError::MissingArgument("send", "some text"))
        );
    }

    #[test]
    fn dst() {
        assert_eq!(
            parse("dst 0013A20040A1B2C3"),
            Ok(ConsoleCommand::Dst(Address::new(0x0013a20040a1b2c3)))
        );
        assert_eq!(parse("dst ffff"), Ok(ConsoleCommand::Dst(Address::BROADCAST)));
        assert!(matches!(
            parse("dst nope"),
            Err(CommandError::BadArgument("dst", _))
        ));
        assert_eq!(parse("dst 1 2"), Err(CommandError::ExtraArgument("dst")));
    }

    #[test]
    fn net_id() {
        assert_eq!(
            parse("net_id 3332"),
            Ok(ConsoleCommand::NetId(NetworkId::new(0x3332).unwrap()))
        );
        assert!(matches!(
            parse("net_id 8000"),
            Err(CommandError::BadArgument("net_id", _))
        ));
        assert_eq!(
            parse("net_id"),
            Err(CommandError::MissingArgument("net_id", "a network id"))
        );
    }

    #[test]
    fn vtx_levels() {
        assert_eq!(
            parse("remote_vtx on"),
            Ok(ConsoleCommand::RemoteVtx(DioLevel::High))
        );
        assert_eq!(
            parse("local_vtx OFF"),
            Ok(ConsoleCommand::LocalVtx(DioLevel::Low))
        );
        assert!(matches!(
            parse("local_vtx maybe"),
            Err(CommandError::BadArgument("local_vtx", _))
        ));
    }

    #[test]
    fn simple_commands() {
        assert_eq!(parse("init"), Ok(ConsoleCommand::Init));
        assert_eq!(parse("init now"), Err(CommandError::ExtraArgument("init")));
        assert_eq!(parse("status"), Ok(ConsoleCommand::Status));
        assert_eq!(parse(" help "), Ok(ConsoleCommand::Help));
        assert_eq!(parse("exit"), Ok(ConsoleCommand::Quit));
        assert_eq!(
            parse("launch"),
            Err(CommandError::Unknown("launch".to_owned()))
        );
    }
}
