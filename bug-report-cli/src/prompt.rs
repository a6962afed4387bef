//! Install authorization prompt
//!
//! A single keypress on the controlling terminal decides: `y` or `Y`
//! authorizes, anything else declines. Without a terminal the answer is no.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::AsRawFd;

pub trait Confirm {
    fn confirm(&mut self, question: &str) -> bool;
}

/// Reads one key from `/dev/tty` with canonical mode and echo disabled
pub struct TerminalPrompt;

impl Confirm for TerminalPrompt {
    fn confirm(&mut self, question: &str) -> bool {
        let mut tty = match OpenOptions::new().read(true).write(true).open("/dev/tty") {
            Ok(tty) => tty,
            Err(e) => {
                tracing::info!(error = %e, "no controlling terminal, declining");
                return false;
            }
        };

        if write!(tty, "{question} [y/N] ").and_then(|()| tty.flush()).is_err() {
            return false;
        }
        let key = read_key(&tty).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read answer");
            b'\n'
        });
        let _ = writeln!(tty);
        is_affirmative(key)
    }
}

pub fn is_affirmative(key: u8) -> bool {
    matches!(key, b'y' | b'Y')
}

fn read_key(tty: &File) -> io::Result<u8> {
    let fd = tty.as_raw_fd();
    let mut original = std::mem::MaybeUninit::<libc::termios>::uninit();
    // SAFETY: fd is an open terminal and `original` is only read after
    // tcgetattr reports success.
    let original = unsafe {
        if libc::tcgetattr(fd, original.as_mut_ptr()) != 0 {
            return read_line_key(tty);
        }
        original.assume_init()
    };

    let mut raw = original;
    raw.c_lflag &= !(libc::ICANON | libc::ECHO);
    raw.c_cc[libc::VMIN] = 1;
    raw.c_cc[libc::VTIME] = 0;
    // SAFETY: raw is a fully initialized copy of the current attributes.
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &raw) } != 0 {
        return read_line_key(tty);
    }

    let mut byte = [0u8; 1];
    let mut reader = tty;
    let result = reader.read_exact(&mut byte);
    // SAFETY: restores the attributes captured above.
    unsafe {
        libc::tcsetattr(fd, libc::TCSANOW, &original);
    }
    result.map(|()| byte[0])
}

/// Fallback when the terminal mode cannot be changed
fn read_line_key(tty: &File) -> io::Result<u8> {
    let mut line = String::new();
    let mut reader = io::BufReader::new(tty);
    io::BufRead::read_line(&mut reader, &mut line)?;
    Ok(line.trim_start().bytes().next().unwrap_or(b'\n'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_y_authorizes() {
        assert!(is_affirmative(b'y'));
        assert!(is_affirmative(b'Y'));
        for key in [b'n', b'N', b'\n', b' ', b'q', 0x1b] {
            assert!(!is_affirmative(key), "{key}");
        }
    }
}
