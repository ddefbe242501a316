// feeds a capture file of F-PAD/X-PAD frames through PadDecoder and prints
// Dynamic Label updates; stands in for the frame-acquisition collaborator
// the core itself does not own

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;

use clap::Parser;
use dab_pad::PadDecoder;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a capture file.
    capture: PathBuf,
}

// one record: a 2-byte big-endian F-PAD word, a 1-byte X-PAD length, then
// that many X-PAD bytes
#[derive(Debug, Error)]
enum CaptureError {
    #[error("I/O error reading capture file: {0}")]
    Io(#[from] std::io::Error),
    #[error("truncated record: expected {expected} more bytes, found {found}")]
    Truncated { expected: usize, found: usize },
}

fn read_record(r: &mut impl Read) -> Result<Option<(u16, Vec<u8>)>, CaptureError> {
    let mut header = [0u8; 3];
    let n = r.read(&mut header[..1])?;
    if n == 0 {
        return Ok(None);
    }
    r.read_exact(&mut header[1..3])?;
    let fpad = u16::from_be_bytes([header[0], header[1]]);
    let xpad_len = header[2] as usize;
    let mut xpad = vec![0u8; xpad_len];
    r.read_exact(&mut xpad).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            CaptureError::Truncated {
                expected: xpad_len,
                found: 0,
            }
        } else {
            CaptureError::Io(e)
        }
    })?;
    Ok(Some((fpad, xpad)))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    colog::init();

    let args = Args::parse();
    log::info!("reading capture file: {}", args.capture.display());

    let mut decoder = PadDecoder::new();

    let file = File::open(&args.capture)?;
    let mut reader = BufReader::new(file);

    let mut last_label: Vec<u8> = Vec::new();
    loop {
        match read_record(&mut reader) {
            Ok(Some((fpad, xpad))) => {
                decoder.process(fpad, &xpad);
                let label = decoder.dynamic_label();
                if label.raw != last_label {
                    println!("{}", String::from_utf8_lossy(&label.raw));
                    last_label = label.raw;
                }
            }
            Ok(None) => break,
            Err(e) => {
                log::warn!("stopping on capture error: {e}");
                break;
            }
        }
    }

    Ok(())
}
