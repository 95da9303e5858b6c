#![forbid(unsafe_code)]

use super::framing::{
    TransportMode, detect_mode_from_first_line, parse_request, read_content_length_frame,
    write_frame,
};
use crate::{ProgressionServer, SessionLog};
use std::io::{BufRead, BufReader, Write};

/// Serves requests from stdin until EOF. Framing is detected once per process
/// from the first non-empty line and then kept for every response.
pub(crate) fn run_stdio(
    server: &mut ProgressionServer,
    session_log: &mut SessionLog,
) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = std::io::stdin();
    let mut reader = BufReader::new(stdin.lock());
    let mut stdout = std::io::stdout().lock();
    serve(server, session_log, &mut reader, &mut stdout)
}

fn serve<R: BufRead, W: Write>(
    server: &mut ProgressionServer,
    session_log: &mut SessionLog,
    reader: &mut R,
    writer: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mode: Option<TransportMode> = None;

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let current = match mode {
            Some(current) => current,
            None => {
                let Some(detected) = detect_mode_from_first_line(&line) else {
                    session_log.note_error("unrecognized first line");
                    continue;
                };
                session_log.note_mode(detected.as_str());
                mode = Some(detected);
                detected
            }
        };

        let body = match current {
            TransportMode::NewlineJson => line.trim().as_bytes().to_vec(),
            TransportMode::ContentLength => match read_content_length_frame(reader, line) {
                Ok(Some(body)) => body,
                Ok(None) => break,
                Err(err) => {
                    session_log.note_error(&format!("frame: {err}"));
                    return Err(err.into());
                }
            },
        };

        let response = match parse_request(&body) {
            Ok(request) => {
                session_log.note_method(&request.method);
                server.handle(request)
            }
            Err(resp) => {
                session_log.note_error("malformed request");
                Some(resp)
            }
        };
        if let Some(resp) = response {
            write_frame(writer, current, &resp)?;
        }
    }

    Ok(())
}
