// ═══════════════════════════════════════════════════════════════════
// Storage Tests — PTRK file format and StorageManager
// ═══════════════════════════════════════════════════════════════════

use chrono::{NaiveDate, Utc};
use portfolio_tracker_core::errors::CoreError;
use portfolio_tracker_core::models::portfolio::Portfolio;
use portfolio_tracker_core::models::settings::ProviderKind;
use portfolio_tracker_core::models::transaction::{Transaction, TransactionType};
use portfolio_tracker_core::storage::format::{
    read_file, write_file, CURRENT_VERSION, HEADER_SIZE, MAGIC,
};
use portfolio_tracker_core::storage::manager::StorageManager;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn sample_portfolio() -> Portfolio {
    let mut p = Portfolio::default();
    p.transactions.push(Transaction::with_notes(
        TransactionType::Buy,
        "AAPL",
        10.0,
        150.0,
        d(2025, 1, 15),
        "first lot",
    ));
    p.transactions.push(Transaction::new(
        TransactionType::Sell,
        "AAPL",
        4.0,
        165.0,
        d(2025, 2, 1),
    ));
    p.settings.provider = ProviderKind::AlphaVantage;
    p.settings
        .api_keys
        .insert("alphavantage".into(), "demo".into());
    p.price_cache.set_quote("AAPL", 170.0, Utc::now());
    p.price_cache.set_close("AAPL", d(2025, 1, 15), 150.5);
    p
}

// ═══════════════════════════════════════════════════════════════════
//  File format
// ═══════════════════════════════════════════════════════════════════

mod format {
    use super::*;

    #[test]
    fn layout_is_magic_version_length_payload() {
        let payload = b"hello world";
        let bytes = write_file(CURRENT_VERSION, payload);

        assert_eq!(bytes.len(), HEADER_SIZE + payload.len());
        assert_eq!(&bytes[0..4], MAGIC);
        assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), CURRENT_VERSION);
        let len = u64::from_le_bytes(bytes[6..14].try_into().unwrap());
        assert_eq!(len, payload.len() as u64);
        assert_eq!(&bytes[HEADER_SIZE..], payload);
    }

    #[test]
    fn roundtrip() {
        let payload = vec![0xDEu8, 0xAD, 0xBE, 0xEF];
        let bytes = write_file(CURRENT_VERSION, &payload);
        let (header, parsed) = read_file(&bytes).unwrap();
        assert_eq!(header.version, CURRENT_VERSION);
        assert_eq!(header.payload_len, 4);
        assert_eq!(parsed, payload.as_slice());
    }

    #[test]
    fn empty_payload_is_valid() {
        let bytes = write_file(CURRENT_VERSION, &[]);
        let (header, payload) = read_file(&bytes).unwrap();
        assert_eq!(header.payload_len, 0);
        assert!(payload.is_empty());
    }

    #[test]
    fn rejects_truncated_file() {
        let result = read_file(b"PTRK");
        assert!(matches!(result, Err(CoreError::InvalidFileFormat(_))));
    }

    #[test]
    fn rejects_wrong_magic() {
        let mut bytes = write_file(CURRENT_VERSION, b"data");
        bytes[0..4].copy_from_slice(b"JUNK");
        let result = read_file(&bytes);
        assert!(matches!(result, Err(CoreError::InvalidFileFormat(_))));
    }

    #[test]
    fn rejects_version_zero() {
        let bytes = write_file(0, b"data");
        let result = read_file(&bytes);
        assert!(matches!(result, Err(CoreError::UnsupportedVersion(0))));
    }

    #[test]
    fn rejects_future_version() {
        let bytes = write_file(CURRENT_VERSION + 1, b"data");
        let result = read_file(&bytes);
        assert!(matches!(result, Err(CoreError::UnsupportedVersion(v)) if v == CURRENT_VERSION + 1));
    }

    #[test]
    fn rejects_payload_length_mismatch() {
        let mut bytes = write_file(CURRENT_VERSION, b"data");
        bytes.push(0xFF); // extra byte the header doesn't account for
        let result = read_file(&bytes);
        assert!(matches!(result, Err(CoreError::InvalidFileFormat(_))));
    }
}

// ═══════════════════════════════════════════════════════════════════
//  StorageManager
// ═══════════════════════════════════════════════════════════════════

mod manager {
    use super::*;

    #[test]
    fn bytes_roundtrip_preserves_everything() {
        let portfolio = sample_portfolio();
        let bytes = StorageManager::save_to_bytes(&portfolio).unwrap();
        let loaded = StorageManager::load_from_bytes(&bytes).unwrap();

        assert_eq!(loaded.transactions, portfolio.transactions);
        assert_eq!(loaded.settings, portfolio.settings);
        assert_eq!(loaded.price_cache.quote_count(), 1);
        assert_eq!(
            loaded.price_cache.get_close("AAPL", d(2025, 1, 15)),
            Some(150.5)
        );
    }

    #[test]
    fn saved_bytes_start_with_magic() {
        let bytes = StorageManager::save_to_bytes(&Portfolio::default()).unwrap();
        assert_eq!(&bytes[0..4], b"PTRK");
    }

    #[test]
    fn corrupt_payload_fails_deserialization() {
        let mut bytes = StorageManager::save_to_bytes(&sample_portfolio()).unwrap();
        // Mangle the payload while keeping the header length consistent
        let last = bytes.len() - 1;
        for b in &mut bytes[HEADER_SIZE..=last] {
            *b = !*b;
        }
        let result = StorageManager::load_from_bytes(&bytes);
        assert!(matches!(result, Err(CoreError::Deserialization(_))));
    }

    #[test]
    fn file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portfolio.ptrk");
        let path = path.to_str().unwrap();

        let portfolio = sample_portfolio();
        StorageManager::save_to_file(&portfolio, path).unwrap();
        let loaded = StorageManager::load_from_file(path).unwrap();

        assert_eq!(loaded.transactions.len(), 2);
        assert_eq!(loaded.settings.provider, ProviderKind::AlphaVantage);
    }

    #[test]
    fn save_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portfolio.ptrk");
        let path = path.to_str().unwrap();

        StorageManager::save_to_file(&sample_portfolio(), path).unwrap();
        StorageManager::save_to_file(&Portfolio::default(), path).unwrap();

        let loaded = StorageManager::load_from_file(path).unwrap();
        assert!(loaded.transactions.is_empty());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let result = StorageManager::load_from_file("/nonexistent/portfolio.ptrk");
        assert!(matches!(result, Err(CoreError::FileIO(_))));
    }

    #[test]
    fn load_garbage_file_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.ptrk");
        std::fs::write(&path, b"definitely not a portfolio").unwrap();

        let result = StorageManager::load_from_file(path.to_str().unwrap());
        assert!(matches!(result, Err(CoreError::InvalidFileFormat(_))));
    }
}
