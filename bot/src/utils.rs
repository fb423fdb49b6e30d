//! Utility functions

use serde::{Deserialize, Serialize};

/// Version information for the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Generate a random UUID v4
pub fn generate_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// `refs/heads/main` -> `heads/main`; other strings are returned unchanged
pub fn strip_refs_prefix(git_ref: &str) -> &str {
    git_ref.strip_prefix("refs/").unwrap_or(git_ref)
}

/// Hex encoding utilities
pub mod hex {
    const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";

    pub fn encode(data: impl AsRef<[u8]>) -> String {
        let data = data.as_ref();
        let mut result = String::with_capacity(data.len() * 2);
        for byte in data {
            result.push(HEX_CHARS[(byte >> 4) as usize] as char);
            result.push(HEX_CHARS[(byte & 0x0f) as usize] as char);
        }
        result
    }

    pub fn decode(raw: &str) -> Result<Vec<u8>, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err("hex string cannot be empty".to_string());
        }
        if raw.len() % 2 != 0 {
            return Err("hex string must have an even number of characters".to_string());
        }
        raw.as_bytes()
            .chunks(2)
            .map(|pair| {
                let high = nibble(pair[0])?;
                let low = nibble(pair[1])?;
                Ok((high << 4) | low)
            })
            .collect()
    }

    fn nibble(c: u8) -> Result<u8, String> {
        match c {
            b'0'..=b'9' => Ok(c - b'0'),
            b'a'..=b'f' => Ok(c - b'a' + 10),
            b'A'..=b'F' => Ok(c - b'A' + 10),
            _ => Err(format!("invalid hex character: {}", c as char)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_refs_prefix() {
        assert_eq!(strip_refs_prefix("refs/heads/main"), "heads/main");
        assert_eq!(strip_refs_prefix("heads/main"), "heads/main");
        assert_eq!(strip_refs_prefix("main"), "main");
    }

    #[test]
    fn test_hex_round_trip() {
        let bytes = [0x00, 0x7f, 0xab, 0xff];
        assert_eq!(hex::encode(bytes), "007fabff");
        assert_eq!(hex::decode("007FABff").unwrap(), bytes.to_vec());
    }

    #[test]
    fn test_hex_decode_errors() {
        assert!(hex::decode("").is_err());
        assert!(hex::decode("abc").is_err());
        assert!(hex::decode("zz").is_err());
    }

    #[test]
    fn test_generate_uuid() {
        assert_ne!(generate_uuid(), generate_uuid());
    }
}
