#[derive(Debug, Eq, PartialEq)]
pub enum Command {
    GenKey,
    Server,
    Client,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Default, Eq, PartialEq)]
pub struct Args {
    pub command: Option<Command>,
    pub short_help: bool,
    pub long_help: bool,
    pub version: bool,

    // genkey
    pub output: Option<String>,

    // server
    pub listen: Option<String>,

    // client
    pub connect: Option<String>,

    // server + client
    pub psk_file: Option<String>,
    pub input: Option<String>,
}

impl Args {
    pub fn build_from_args<I>(mut cli_args: I) -> Result<Self, String>
    where
        I: Iterator<Item: AsRef<str> + ToString>,
    {
        let mut args = Self::default();

        while let Some(arg) = cli_args.next() {
            let some_command = args.command.is_some();

            match arg.as_ref() {
                "genkey" if !some_command => args.command = Some(Command::GenKey),
                "server" if !some_command => args.command = Some(Command::Server),
                "client" if !some_command => args.command = Some(Command::Client),
                "-h" => args.short_help = true,
                "--help" => args.long_help = true,
                "-V" | "--version" => args.version = true,
                "-o" | "--output" if args.command == Some(Command::GenKey) => {
                    args.output = Some(take_value(&mut cli_args, "-o/--output")?);
                }
                "--listen" => args.listen = Some(take_value(&mut cli_args, "--listen")?),
                "--connect" => args.connect = Some(take_value(&mut cli_args, "--connect")?),
                "--psk-file" => args.psk_file = Some(take_value(&mut cli_args, "--psk-file")?),
                "--output" if args.command == Some(Command::Server) => {
                    args.output = Some(take_value(&mut cli_args, "--output")?);
                }
                "--input" => args.input = Some(take_value(&mut cli_args, "--input")?),
                unknown => {
                    return Err(format!("Unknown argument: '{unknown}'"));
                }
            }
        }

        Ok(args)
    }
}

fn take_value<I>(cli_args: &mut I, flag: &str) -> Result<String, String>
where
    I: Iterator<Item: AsRef<str> + ToString>,
{
    cli_args
        .next()
        .map(|v| v.to_string())
        .ok_or_else(|| format!("Missing value for '{flag}'"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::iter_on_single_items)]

    use super::*;

    #[test]
    fn command_genkey_regular() {
        let args = Args::build_from_args(["genkey"].iter()).unwrap();
        assert!(args.command.is_some_and(|c| c == Command::GenKey));
    }

    #[test]
    fn second_command_does_not_override_genkey() {
        let err = Args::build_from_args(["genkey", "server"].iter()).unwrap_err();
        assert!(err.contains("'server'"));
    }

    #[test]
    fn genkey_with_output_path() {
        let args = Args::build_from_args(["genkey", "-o", "psk.hex"].iter()).unwrap();
        assert_eq!(args.output.as_deref(), Some("psk.hex"));
    }

    #[test]
    fn server_collects_listen_psk_and_output() {
        let args = Args::build_from_args(
            [
                "server",
                "--listen",
                "0.0.0.0:9999",
                "--psk-file",
                "psk.hex",
                "--output",
                "received.bin",
            ]
            .iter(),
        )
        .unwrap();

        assert!(args.command.is_some_and(|c| c == Command::Server));
        assert_eq!(args.listen.as_deref(), Some("0.0.0.0:9999"));
        assert_eq!(args.psk_file.as_deref(), Some("psk.hex"));
        assert_eq!(args.output.as_deref(), Some("received.bin"));
    }

    #[test]
    fn client_collects_connect_psk_and_input() {
        let args = Args::build_from_args(
            [
                "client",
                "--connect",
                "127.0.0.1:9999",
                "--psk-file",
                "psk.hex",
                "--input",
                "payload.bin",
            ]
            .iter(),
        )
        .unwrap();

        assert!(args.command.is_some_and(|c| c == Command::Client));
        assert_eq!(args.connect.as_deref(), Some("127.0.0.1:9999"));
        assert_eq!(args.psk_file.as_deref(), Some("psk.hex"));
        assert_eq!(args.input.as_deref(), Some("payload.bin"));
    }

    #[test]
    fn missing_flag_value_is_an_error() {
        let err = Args::build_from_args(["client", "--connect"].iter()).unwrap_err();
        assert!(err.contains("--connect"));
    }

    #[test]
    fn command_unknown_is_error() {
        let err = Args::build_from_args(["unknown"].iter()).unwrap_err();
        assert!(err.contains("'unknown'"));
    }

    #[test]
    fn option_short_help_regular() {
        let args = Args::build_from_args(["-h"].iter()).unwrap();
        assert!(args.short_help);
        assert!(!args.long_help);
    }

    #[test]
    fn option_long_help_regular() {
        let args = Args::build_from_args(["--help"].iter()).unwrap();
        assert!(!args.short_help);
        assert!(args.long_help);
    }

    #[test]
    fn option_short_version_regular() {
        let args = Args::build_from_args(["-V"].iter()).unwrap();
        assert!(args.version);
    }

    #[test]
    fn option_long_version_regular() {
        let args = Args::build_from_args(["--version"].iter()).unwrap();
        assert!(args.version);
    }
}
