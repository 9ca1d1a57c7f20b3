//! Validation functions for write commands.

use kscdb_constants::api::MAX_KEY_SIZE;
use kscdb_constants::api::MAX_VALUE_SIZE;

use crate::KeyValueStoreError;
use crate::write::WriteCommand;

/// Reject empty or oversized keys.
pub fn validate_key(key: &str) -> Result<(), KeyValueStoreError> {
    if key.is_empty() {
        return Err(KeyValueStoreError::EmptyKey);
    }
    let len = key.len();
    if len > MAX_KEY_SIZE as usize {
        return Err(KeyValueStoreError::KeyTooLarge {
            size: len as u32,
            max: MAX_KEY_SIZE,
        });
    }
    Ok(())
}

/// Reject oversized values.
pub fn validate_value(value: &[u8]) -> Result<(), KeyValueStoreError> {
    let len = value.len();
    if len > MAX_VALUE_SIZE as usize {
        return Err(KeyValueStoreError::ValueTooLarge {
            size: len.min(u32::MAX as usize) as u32,
            max: MAX_VALUE_SIZE,
        });
    }
    Ok(())
}

/// Validate a write command against fixed size limits.
pub fn validate_write_command(command: &WriteCommand) -> Result<(), KeyValueStoreError> {
    match command {
        WriteCommand::Set { key, value } => {
            validate_key(key)?;
            validate_value(value)?;
        }
        WriteCommand::Delete { key } => {
            validate_key(key)?;
        }
        WriteCommand::CompareAndSwap {
            key,
            expected,
            new_value,
        } => {
            validate_key(key)?;
            if let Some(exp) = expected {
                validate_value(exp)?;
            }
            validate_value(new_value)?;
        }
        WriteCommand::CompareAndDelete { key, expected } => {
            validate_key(key)?;
            validate_value(expected)?;
        }
    }
    Ok(())
}
