//! Minimal line-protocol store for integration tests.
//!
//! Every connection gets one reply line per request line. The first
//! `behaviour` connections misbehave (dropped or answered with an error
//! reply), after which the server answers `+PONG`.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone)]
pub enum Misbehave {
    /// Close the connection without replying.
    Drop,
    /// Reply with this error line (e.g. "-LOADING ...").
    Reply(&'static str),
}

/// Handle to a running server. `connections()` counts accepted sockets.
pub struct StoreServer {
    pub addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
}

impl StoreServer {
    pub fn connections(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

/// Starts a server that misbehaves `times` times, then serves normally.
/// Runs in a background thread until the process exits.
pub fn start(misbehave: Misbehave, times: usize) -> StoreServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepted);
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { continue };
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n < times {
                match &misbehave {
                    Misbehave::Drop => drop(stream),
                    Misbehave::Reply(line) => reply_once(stream, line),
                }
            } else {
                reply_once(stream, "+PONG");
            }
        }
    });
    StoreServer { addr, accepted }
}

fn reply_once(mut stream: TcpStream, line: &str) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut request = String::new();
    if reader.read_line(&mut request).is_ok() {
        let _ = stream.write_all(format!("{}\r\n", line).as_bytes());
        let _ = stream.flush();
    }
}

/// An address with nothing listening on it.
pub fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().unwrap()
}

/// Read one CRLF-terminated line.
pub fn read_line(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut buf = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        let n = stream.read(&mut byte)?;
        if n == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        if byte[0] == b'\n' {
            break;
        }
        buf.push(byte[0]);
    }
    Ok(String::from_utf8_lossy(&buf).trim_end_matches('\r').to_string())
}
