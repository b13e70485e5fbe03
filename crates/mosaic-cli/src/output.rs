use std::io::{self, Write};

use serde::Serialize;

use crate::error::CliError;
use crate::metadata::Envelope;

pub fn render<T: Serialize>(envelope: &Envelope<T>, pretty: bool) -> Result<(), CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(envelope)?
    } else {
        serde_json::to_string(envelope)?
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{payload}")?;
    stdout.flush()?;
    Ok(())
}
