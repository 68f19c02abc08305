//! Thin CLI wrapper around `gbnet`: binds a UDP socket, listens for one
//! connection, writes received bytes to a file until the peer closes.

use std::fs::File;
use std::io::Write;
use std::net::UdpSocket;
use std::process::ExitCode;

use gbnet::{Config, GbnSocket, Status};

fn usage() -> ! {
    eprintln!("usage: gbn-receiver <bind-addr:port> <output-file>");
    std::process::exit(2);
}

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let bind_spec = args.next().unwrap_or_else(|| usage());
    let output_path = args.next().unwrap_or_else(|| usage());

    let udp = match UdpSocket::bind(&bind_spec) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("gbn-receiver: binding {bind_spec}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut out = match File::create(&output_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("gbn-receiver: creating {output_path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut socket = GbnSocket::with_config(udp, Config::from_env());

    if let Err(e) = socket.bind("0.0.0.0:0".parse().unwrap()) {
        eprintln!("gbn-receiver: bind: {e}");
        return ExitCode::FAILURE;
    }
    if let Err(e) = socket.listen(1) {
        eprintln!("gbn-receiver: listen: {e}");
        return ExitCode::FAILURE;
    }

    let peer = match socket.accept() {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("gbn-receiver: accept: {e}");
            return ExitCode::FAILURE;
        }
    };
    log::info!("accepted connection from {peer}");

    let mut buf = vec![0u8; gbnet::packet::PAYLOAD_LEN];
    loop {
        match socket.recv(&mut buf) {
            Ok(0) if socket.status() == Status::FinRcvd => {
                log::info!("peer closed");
                break;
            }
            Ok(n) => {
                if let Err(e) = out.write_all(&buf[..n]) {
                    eprintln!("gbn-receiver: writing output: {e}");
                    return ExitCode::FAILURE;
                }
            }
            Err(e) => {
                eprintln!("gbn-receiver: recv: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
