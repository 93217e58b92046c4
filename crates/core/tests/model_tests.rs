// ═══════════════════════════════════════════════════════════════════
// Model Tests — Transaction, Holding, PriceCache, Settings, Portfolio
// ═══════════════════════════════════════════════════════════════════

use chrono::{Duration, NaiveDate, Utc};
use portfolio_tracker_core::models::holding::Holding;
use portfolio_tracker_core::models::performance::PerformancePoint;
use portfolio_tracker_core::models::portfolio::Portfolio;
use portfolio_tracker_core::models::price::{PriceCache, PricePoint};
use portfolio_tracker_core::models::settings::{ProviderKind, Settings};
use portfolio_tracker_core::models::transaction::{Transaction, TransactionType};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

// ═══════════════════════════════════════════════════════════════════
//  TransactionType
// ═══════════════════════════════════════════════════════════════════

mod transaction_type {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(TransactionType::Buy.to_string(), "Buy");
        assert_eq!(TransactionType::Sell.to_string(), "Sell");
    }

    #[test]
    fn equality() {
        assert_eq!(TransactionType::Buy, TransactionType::Buy);
        assert_ne!(TransactionType::Buy, TransactionType::Sell);
    }

    #[test]
    fn serde_roundtrip_json() {
        for kind in [TransactionType::Buy, TransactionType::Sell] {
            let json = serde_json::to_string(&kind).unwrap();
            let back: TransactionType = serde_json::from_str(&json).unwrap();
            assert_eq!(kind, back);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Transaction
// ═══════════════════════════════════════════════════════════════════

mod transaction {
    use super::*;

    #[test]
    fn new_uppercases_and_trims_ticker() {
        let tx = Transaction::new(TransactionType::Buy, "  aapl ", 10.0, 150.0, d(2025, 1, 15));
        assert_eq!(tx.ticker, "AAPL");
    }

    #[test]
    fn new_has_no_notes() {
        let tx = Transaction::new(TransactionType::Buy, "AAPL", 10.0, 150.0, d(2025, 1, 15));
        assert!(tx.notes.is_none());
    }

    #[test]
    fn with_notes_attaches_notes() {
        let tx = Transaction::with_notes(
            TransactionType::Sell,
            "msft",
            2.5,
            410.0,
            d(2025, 3, 1),
            "rebalance",
        );
        assert_eq!(tx.ticker, "MSFT");
        assert_eq!(tx.notes.as_deref(), Some("rebalance"));
    }

    #[test]
    fn unique_ids() {
        let a = Transaction::new(TransactionType::Buy, "AAPL", 1.0, 1.0, d(2025, 1, 1));
        let b = Transaction::new(TransactionType::Buy, "AAPL", 1.0, 1.0, d(2025, 1, 1));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn gross_amount() {
        let tx = Transaction::new(TransactionType::Buy, "AAPL", 10.0, 150.0, d(2025, 1, 15));
        assert!((tx.gross_amount() - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn fractional_quantities_survive_serde() {
        let tx = Transaction::new(TransactionType::Buy, "VTI", 0.3333, 250.12, d(2025, 1, 15));
        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(tx, back);
    }

    #[test]
    fn notes_default_when_missing_in_json() {
        let tx = Transaction::new(TransactionType::Buy, "AAPL", 1.0, 2.0, d(2025, 1, 1));
        let mut value = serde_json::to_value(&tx).unwrap();
        value.as_object_mut().unwrap().remove("notes");
        let back: Transaction = serde_json::from_value(value).unwrap();
        assert!(back.notes.is_none());
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Holding
// ═══════════════════════════════════════════════════════════════════

mod holding {
    use super::*;

    #[test]
    fn new_is_empty() {
        let h = Holding::new("AAPL");
        assert_eq!(h.ticker, "AAPL");
        assert_eq!(h.quantity, 0.0);
        assert_eq!(h.total_cost, 0.0);
        assert_eq!(h.avg_cost_basis, 0.0);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  PriceCache — current quotes
// ═══════════════════════════════════════════════════════════════════

mod quote_cache {
    use super::*;

    #[test]
    fn get_missing_returns_none() {
        let cache = PriceCache::new();
        assert!(cache.get_quote("AAPL").is_none());
    }

    #[test]
    fn set_then_get() {
        let mut cache = PriceCache::new();
        let now = Utc::now();
        cache.set_quote("AAPL", 185.5, now);
        let entry = cache.get_quote("AAPL").unwrap();
        assert_eq!(entry.price, 185.5);
        assert_eq!(entry.last_updated, now);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut cache = PriceCache::new();
        cache.set_quote("aapl", 185.5, Utc::now());
        assert!(cache.get_quote("AAPL").is_some());
        assert!(cache.get_quote("aapl").is_some());
    }

    #[test]
    fn one_entry_per_ticker() {
        let mut cache = PriceCache::new();
        cache.set_quote("AAPL", 100.0, Utc::now());
        cache.set_quote("AAPL", 101.0, Utc::now());
        assert_eq!(cache.quote_count(), 1);
        assert_eq!(cache.get_quote("AAPL").unwrap().price, 101.0);
    }

    #[test]
    fn last_updated_advances_on_upsert() {
        let mut cache = PriceCache::new();
        let t0 = Utc::now();
        cache.set_quote("AAPL", 100.0, t0);
        let t1 = t0 + Duration::seconds(5);
        cache.set_quote("AAPL", 101.0, t1);
        assert!(cache.get_quote("AAPL").unwrap().last_updated > t0);
    }

    #[test]
    fn freshness_respects_ttl() {
        let mut cache = PriceCache::new();
        let now = Utc::now();
        let ttl = Duration::minutes(15);

        cache.set_quote("AAPL", 100.0, now - Duration::minutes(5));
        assert!(cache.is_quote_fresh("AAPL", now, ttl));

        cache.set_quote("MSFT", 100.0, now - Duration::minutes(20));
        assert!(!cache.is_quote_fresh("MSFT", now, ttl));
    }

    #[test]
    fn freshness_is_false_for_missing_entry() {
        let cache = PriceCache::new();
        assert!(!cache.is_quote_fresh("AAPL", Utc::now(), Duration::minutes(15)));
    }

    #[test]
    fn ttl_boundary_is_exclusive() {
        let mut cache = PriceCache::new();
        let now = Utc::now();
        let ttl = Duration::minutes(15);
        // Exactly TTL old is no longer fresh (`now - last_updated < TTL`)
        cache.set_quote("AAPL", 100.0, now - ttl);
        assert!(!cache.is_quote_fresh("AAPL", now, ttl));
    }
}

// ═══════════════════════════════════════════════════════════════════
//  PriceCache — historical closes
// ═══════════════════════════════════════════════════════════════════

mod close_cache {
    use super::*;

    #[test]
    fn get_missing_returns_none() {
        let cache = PriceCache::new();
        assert!(cache.get_close("AAPL", d(2025, 1, 15)).is_none());
    }

    #[test]
    fn set_then_get() {
        let mut cache = PriceCache::new();
        cache.set_close("AAPL", d(2025, 1, 15), 185.0);
        assert_eq!(cache.get_close("AAPL", d(2025, 1, 15)), Some(185.0));
        assert!(cache.get_close("AAPL", d(2025, 1, 16)).is_none());
    }

    #[test]
    fn set_same_date_overwrites() {
        let mut cache = PriceCache::new();
        cache.set_close("AAPL", d(2025, 1, 15), 185.0);
        cache.set_close("AAPL", d(2025, 1, 15), 186.0);
        assert_eq!(cache.get_close("AAPL", d(2025, 1, 15)), Some(186.0));
        assert_eq!(cache.total_closes(), 1);
    }

    #[test]
    fn entries_stay_sorted_regardless_of_insert_order() {
        let mut cache = PriceCache::new();
        cache.set_close("AAPL", d(2025, 1, 17), 3.0);
        cache.set_close("AAPL", d(2025, 1, 15), 1.0);
        cache.set_close("AAPL", d(2025, 1, 16), 2.0);

        let range = cache.get_close_range("AAPL", d(2025, 1, 1), d(2025, 1, 31));
        let dates: Vec<NaiveDate> = range.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![d(2025, 1, 15), d(2025, 1, 16), d(2025, 1, 17)]);
    }

    #[test]
    fn set_closes_bulk_insert() {
        let mut cache = PriceCache::new();
        let points = vec![
            PricePoint {
                date: d(2025, 1, 15),
                price: 1.0,
            },
            PricePoint {
                date: d(2025, 1, 16),
                price: 2.0,
            },
        ];
        cache.set_closes("AAPL", &points);
        assert_eq!(cache.total_closes(), 2);
    }

    #[test]
    fn range_boundaries_are_inclusive() {
        let mut cache = PriceCache::new();
        for (day, price) in [(14, 1.0), (15, 2.0), (16, 3.0), (17, 4.0)] {
            cache.set_close("AAPL", d(2025, 1, day), price);
        }
        let range = cache.get_close_range("AAPL", d(2025, 1, 15), d(2025, 1, 16));
        assert_eq!(range.len(), 2);
        assert_eq!(range[0].price, 2.0);
        assert_eq!(range[1].price, 3.0);
    }

    #[test]
    fn range_for_unknown_ticker_is_empty() {
        let cache = PriceCache::new();
        assert!(cache
            .get_close_range("ZZZZ", d(2025, 1, 1), d(2025, 1, 31))
            .is_empty());
    }

    #[test]
    fn prune_before_removes_old_points() {
        let mut cache = PriceCache::new();
        cache.set_close("AAPL", d(2024, 1, 1), 1.0);
        cache.set_close("AAPL", d(2025, 1, 1), 2.0);
        cache.set_close("MSFT", d(2024, 6, 1), 3.0);

        let removed = cache.prune_before(d(2025, 1, 1));
        assert_eq!(removed, 2);
        assert_eq!(cache.total_closes(), 1);
        // MSFT had only old points; its entry is gone entirely
        assert!(cache
            .get_close_range("MSFT", d(2024, 1, 1), d(2025, 12, 31))
            .is_empty());
    }

    #[test]
    fn prune_keeps_quotes() {
        let mut cache = PriceCache::new();
        cache.set_quote("AAPL", 100.0, Utc::now());
        cache.set_close("AAPL", d(2024, 1, 1), 1.0);
        cache.prune_before(d(2025, 1, 1));
        assert_eq!(cache.quote_count(), 1);
    }

    #[test]
    fn clear_empties_everything() {
        let mut cache = PriceCache::new();
        cache.set_quote("AAPL", 100.0, Utc::now());
        cache.set_close("AAPL", d(2025, 1, 1), 1.0);
        cache.clear();
        assert_eq!(cache.quote_count(), 0);
        assert_eq!(cache.total_closes(), 0);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Settings & Portfolio
// ═══════════════════════════════════════════════════════════════════

mod settings {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.provider, ProviderKind::YahooFinance);
        assert!(s.api_keys.is_empty());
        assert_eq!(s.quote_ttl_minutes, 15);
        assert_eq!(s.batch_delay_ms, 500);
    }

    #[test]
    fn provider_kind_display() {
        assert_eq!(ProviderKind::YahooFinance.to_string(), "Yahoo Finance");
        assert_eq!(ProviderKind::AlphaVantage.to_string(), "Alpha Vantage");
    }

    #[test]
    fn serde_roundtrip() {
        let mut s = Settings::default();
        s.provider = ProviderKind::AlphaVantage;
        s.api_keys.insert("alphavantage".into(), "demo".into());
        let json = serde_json::to_string(&s).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }

    #[test]
    fn tuning_fields_default_when_missing_in_json() {
        // Older files won't carry the tuning knobs
        let json = r#"{"provider":"YahooFinance","api_keys":{}}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.quote_ttl_minutes, 15);
        assert_eq!(s.batch_delay_ms, 500);
    }
}

mod portfolio {
    use super::*;

    #[test]
    fn default_is_empty() {
        let p = Portfolio::default();
        assert!(p.transactions.is_empty());
        assert_eq!(p.price_cache.quote_count(), 0);
        assert_eq!(p.settings, Settings::default());
    }

    #[test]
    fn bincode_roundtrip() {
        let mut p = Portfolio::default();
        p.transactions.push(Transaction::new(
            TransactionType::Buy,
            "AAPL",
            10.0,
            150.0,
            d(2025, 1, 15),
        ));
        p.price_cache.set_close("AAPL", d(2025, 1, 15), 150.0);
        p.price_cache.set_quote("AAPL", 151.0, Utc::now());

        let bytes = bincode::serialize(&p).unwrap();
        let back: Portfolio = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back.transactions, p.transactions);
        assert_eq!(back.price_cache.get_close("AAPL", d(2025, 1, 15)), Some(150.0));
        assert_eq!(back.price_cache.quote_count(), 1);
    }
}

mod performance_point {
    use super::*;

    #[test]
    fn serde_roundtrip() {
        let point = PerformancePoint {
            date: d(2025, 1, 15),
            value: 1234.5,
            invested: 1000.0,
        };
        let json = serde_json::to_string(&point).unwrap();
        let back: PerformancePoint = serde_json::from_str(&json).unwrap();
        assert_eq!(point, back);
    }
}
