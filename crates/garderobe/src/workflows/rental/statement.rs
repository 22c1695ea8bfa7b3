use super::domain::LedgerEntry;

/// Failures while rendering a wallet statement.
#[derive(Debug, thiserror::Error)]
pub enum StatementError {
    #[error("statement serialization failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("statement buffer error: {0}")]
    Io(#[from] std::io::Error),
    #[error("statement was not valid utf-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Renders a wallet's entry history as CSV, oldest first, for bookkeeping
/// exports.
pub fn statement_csv(entries: &[LedgerEntry]) -> Result<String, StatementError> {
    let mut buffer = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        writer.write_record(["entry_id", "type", "amount", "reference", "recorded_at"])?;

        for entry in entries {
            writer.write_record([
                entry.id.0.as_str(),
                entry.entry_type.label(),
                &entry.amount.minor().to_string(),
                entry
                    .reference
                    .as_ref()
                    .map(|booking| booking.0.as_str())
                    .unwrap_or(""),
                &entry.created_at.to_rfc3339(),
            ])?;
        }

        writer.flush()?;
    }

    Ok(String::from_utf8(buffer)?)
}
