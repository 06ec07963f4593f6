mod cmd;

use std::env;
use std::process;

use lessify::Pager;

use cmd::cli;

fn main() {
    let args = match cli::Args::build_from_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("fatal: {err}.");
            println!("Try '{bin} -h' for help.", bin = env!("CARGO_BIN_NAME"));
            process::exit(2);
        }
    };

    if args.long_help {
        long_help();
    } else if args.short_help {
        short_help();
    } else if args.version {
        version();
    } else if args.command.is_some() {
        if let Err(code) = run(&args) {
            process::exit(code);
        }
    } else {
        // No arguments.
        short_help();
    }
}

fn run(args: &cli::Args) -> Result<(), i32> {
    match &args.command {
        Some(cli::Command::GenKey) => cmd::genkey(args.output.as_deref()),
        Some(cli::Command::Server) => {
            let listen = required(args.listen.as_deref(), "--listen")?;
            let psk_file = required(args.psk_file.as_deref(), "--psk-file")?;
            let output = required(args.output.as_deref(), "--output")?;
            cmd::server(listen, psk_file, output)
        }
        Some(cli::Command::Client) => {
            let connect = required(args.connect.as_deref(), "--connect")?;
            let psk_file = required(args.psk_file.as_deref(), "--psk-file")?;
            let input = required(args.input.as_deref(), "--input")?;
            cmd::client(connect, psk_file, input)
        }
        None => unreachable!("run() is only called when args.command.is_some()"),
    }
}

fn required<'a>(value: Option<&'a str>, flag: &str) -> Result<&'a str, i32> {
    value.ok_or_else(|| {
        eprintln!("fatal: missing required argument '{flag}'.");
        2
    })
}

fn short_help() {
    println!("{}", short_help_message());
    println!(
        "For full help, see `{bin} --help`.",
        bin = env!("CARGO_BIN_NAME")
    );
}

fn short_help_message() -> String {
    format!(
        "\
{description}

Usage: {bin} <command> [<args>]

Commands:
  genkey [-o <file>]                              Generate a pre-shared key
  server --listen <addr> --psk-file <path>
         --output <path>                          Receive a file over the tunnel
  client --connect <addr> --psk-file <path>
         --input <path>                            Send a file over the tunnel

Options:
  -h, --help             Show this message and exit
  -V, --version          Show the version and exit
",
        description = env!("CARGO_PKG_DESCRIPTION"),
        bin = env!("CARGO_BIN_NAME"),
    )
}

#[allow(clippy::too_many_lines)]
fn long_help() {
    Pager::page_or_print(&format!(
        "\
{help}
What does {package} do?
  Two peers holding the same pre-shared key establish a forward-secret
  session over UDP via an authenticated Diffie-Hellman handshake, then
  exchange encrypted, replay-protected records.

  `{bin} genkey` writes a fresh 32-byte key as hex, to stdout or a file.
  `{bin} server` waits for a client handshake and writes whatever it
  receives to the given output file. `{bin} client` performs the
  handshake and streams a file to the server.
",
        help = short_help_message(),
        bin = env!("CARGO_BIN_NAME"),
        package = env!("CARGO_PKG_NAME"),
    ));
}

fn version() {
    println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
}
