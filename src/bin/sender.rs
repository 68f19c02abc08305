//! Thin CLI wrapper around `gbnet`: reads a file, opens a UDP socket,
//! connects to a peer, sends the file contents, and closes. Argument
//! parsing, hostname resolution and file I/O are deliberately external
//! to the library (see `SPEC_FULL.md` §1).

use std::fs;
use std::net::{ToSocketAddrs, UdpSocket};
use std::process::ExitCode;

use gbnet::{Config, GbnSocket};

fn usage() -> ! {
    eprintln!("usage: gbn-sender <host:port> <input-file>");
    std::process::exit(2);
}

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let peer_spec = args.next().unwrap_or_else(|| usage());
    let input_path = args.next().unwrap_or_else(|| usage());

    let peer = match peer_spec.to_socket_addrs().ok().and_then(|mut it| it.next()) {
        Some(addr) => addr,
        None => {
            eprintln!("gbn-sender: could not resolve {peer_spec}");
            return ExitCode::FAILURE;
        }
    };

    let bytes = match fs::read(&input_path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("gbn-sender: reading {input_path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let udp = match UdpSocket::bind("0.0.0.0:0") {
        Ok(s) => s,
        Err(e) => {
            eprintln!("gbn-sender: binding local socket: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut socket = GbnSocket::with_config(udp, Config::from_env());

    if let Err(e) = socket.connect(peer) {
        eprintln!("gbn-sender: connect to {peer}: {e}");
        return ExitCode::FAILURE;
    }
    log::info!("connected to {peer}");

    match socket.send(&bytes) {
        Ok(n) => log::info!("sent {n} bytes"),
        Err(e) => {
            eprintln!("gbn-sender: send: {e}");
            return ExitCode::FAILURE;
        }
    }

    if let Err(e) = socket.close() {
        eprintln!("gbn-sender: close: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
