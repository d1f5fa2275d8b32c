#![forbid(unsafe_code)]

//! `agi-link-ctl` — plays the Asterisk side of a `FastAGI` exchange.
//!
//! Connects to an AGI server, sends a variable block, prints the command the
//! server answers with and replies with a result line. Handy for exercising
//! routes without a PBX.

use std::net::TcpStream;
use std::time::Duration;

use clap::Parser;

use agi_link::agi::blocking;
use agi_link::cli::{variable_block, CtlCli};

fn main() {
    let args = CtlCli::parse();

    match exchange(&args) {
        Ok(command) => println!("{}", command.trim_end()),
        Err(err) => {
            eprintln!("AGI exchange with {} failed: {err}", args.addr);
            std::process::exit(1);
        }
    }
}

/// Run one exchange and return the command the server sent.
fn exchange(args: &CtlCli) -> std::io::Result<String> {
    let mut stream = TcpStream::connect(&args.addr)?;
    let timeout = Some(Duration::from_secs(args.timeout_seconds.max(1)));
    stream.set_read_timeout(timeout)?;
    stream.set_write_timeout(timeout)?;

    let block = variable_block(&args.vars);
    let written = blocking::write(&mut stream, &block)?;
    if written < block.len() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::WriteZero,
            format!("short write: {written} of {} bytes", block.len()),
        ));
    }

    let command = blocking::read_once(&mut stream)?;
    blocking::write_line(&mut stream, &args.response)?;
    Ok(command)
}
