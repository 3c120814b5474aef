//! Request layer
//!
//! Turns transport-level inputs (query strings, raw JSON bodies) into store
//! calls and store results into serializable responses. Every failure leaves
//! here as a [`crate::Error`] that is either a client fault or a server fault.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::LogbookConfig;
use crate::entry::{LogEntry, LogPayload};
use crate::id::{IdGenerator, UuidGenerator};
use crate::storage::{DEFAULT_MAX_PAGE_SIZE, DEFAULT_PAGE_SIZE, Filter, LogStore, StatisticsReport};
use crate::{Error, Result};

/// Raw list parameters as they arrive on the wire
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    #[serde(alias = "pageSize")]
    pub limit: Option<String>,
    pub level: Option<String>,
    pub service: Option<String>,
}

/// A page of entries together with the paging actually applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResponse {
    pub logs: Vec<LogEntry>,
    pub page: u32,
    pub limit: u32,
}

pub struct LogService {
    store: Arc<LogStore>,
    ids: Box<dyn IdGenerator>,
    default_page_size: u32,
    max_page_size: u32,
}

impl LogService {
    pub fn new(store: Arc<LogStore>) -> Self {
        Self {
            store,
            ids: Box::new(UuidGenerator),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }

    pub fn from_config(store: Arc<LogStore>, config: &LogbookConfig) -> Self {
        Self::new(store).with_page_sizes(config.default_page_size, config.max_page_size)
    }

    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn with_page_sizes(mut self, default_page_size: u32, max_page_size: u32) -> Self {
        self.default_page_size = default_page_size;
        self.max_page_size = max_page_size;
        self
    }

    pub fn store(&self) -> &LogStore {
        &self.store
    }

    /// Validate list parameters and fill in defaults
    pub fn filter(&self, params: &ListParams) -> Result<Filter> {
        let page = parse_positive("page", params.page.as_deref(), 1)?;
        let limit = parse_positive("limit", params.limit.as_deref(), self.default_page_size)?;
        if limit > self.max_page_size {
            return Err(Error::Validation(format!(
                "limit must not exceed {}",
                self.max_page_size
            )));
        }

        let mut filter = Filter::page(page, limit);
        if let Some(level) = &params.level {
            filter = filter.with_level(level.as_str());
        }
        if let Some(service) = &params.service {
            filter = filter.with_service(service.as_str());
        }
        Ok(filter)
    }

    /// List entries, newest first
    pub fn list(&self, params: &ListParams) -> Result<ListResponse> {
        let filter = self.filter(params)?;
        let logs = self.store.query(&filter)?.collect();

        Ok(ListResponse {
            logs,
            page: filter.page,
            limit: filter.page_size,
        })
    }

    /// Ingest one JSON entry; returns the id it was stored under
    pub fn create(&self, body: &[u8]) -> Result<String> {
        let payload = LogPayload::from_json(body)?;
        let entry = payload.into_entry(self.ids.as_ref(), chrono::Utc::now().timestamp());
        self.store.insert(&entry)?;
        Ok(entry.id)
    }

    pub fn statistics(&self) -> Result<StatisticsReport> {
        self.store.statistics()
    }
}

/// Parse an optional positive integer parameter
fn parse_positive(name: &str, raw: Option<&str>, default: u32) -> Result<u32> {
    let Some(raw) = raw else {
        return Ok(default);
    };

    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| Error::Validation(format!("{} must be an integer, got '{}'", name, raw)))?;
    if value < 1 {
        return Err(Error::Validation(format!("{} must be at least 1, got {}", name, value)));
    }
    u32::try_from(value).map_err(|_| Error::Validation(format!("{} is too large: {}", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::LogLevel;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Sequential(AtomicUsize);

    impl IdGenerator for Sequential {
        fn generate(&self) -> String {
            format!("gen-{}", self.0.fetch_add(1, Ordering::SeqCst))
        }
    }

    fn service() -> LogService {
        let store = Arc::new(LogStore::open_in_memory().unwrap());
        LogService::new(store).with_id_generator(Sequential(AtomicUsize::new(0)))
    }

    fn params(page: Option<&str>, limit: Option<&str>) -> ListParams {
        ListParams {
            page: page.map(String::from),
            limit: limit.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_list_defaults() {
        let service = service();
        let response = service.list(&ListParams::default()).unwrap();
        assert!(response.logs.is_empty());
        assert_eq!(response.page, 1);
        assert_eq!(response.limit, 50);
    }

    #[test]
    fn test_list_rejects_bad_paging() {
        let service = service();
        for (page, limit) in [
            (Some("abc"), None),
            (None, Some("ten")),
            (Some("0"), None),
            (Some("-3"), None),
            (None, Some("0")),
            (None, Some("5000")),
            (Some("99999999999"), None),
            (Some(""), None),
        ] {
            let err = service.list(&params(page, limit)).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{:?} {:?}", page, limit);
            assert!(err.is_client_fault());
        }
    }

    #[test]
    fn test_default_page_size_cap() {
        let service = service();
        let max = DEFAULT_MAX_PAGE_SIZE.to_string();
        let over = (DEFAULT_MAX_PAGE_SIZE + 1).to_string();

        assert_eq!(service.list(&params(None, Some(max.as_str()))).unwrap().limit, DEFAULT_MAX_PAGE_SIZE);
        assert!(matches!(
            service.list(&params(None, Some(over.as_str()))),
            Err(Error::Validation(_))
        ));
        assert_eq!(LogbookConfig::default().max_page_size, DEFAULT_MAX_PAGE_SIZE);
    }

    #[test]
    fn test_list_echoes_paging() {
        let service = service();
        let response = service.list(&params(Some("3"), Some("7"))).unwrap();
        assert_eq!(response.page, 3);
        assert_eq!(response.limit, 7);
    }

    #[test]
    fn test_create_fills_defaults() {
        let service = service();
        let before = chrono::Utc::now().timestamp();
        let id = service.create(br#"{"message": "hello"}"#).unwrap();
        let after = chrono::Utc::now().timestamp();
        assert_eq!(id, "gen-0");

        let logs = service.list(&ListParams::default()).unwrap().logs;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].level, LogLevel::Info);
        assert_eq!(logs[0].message, "hello");
        assert!(logs[0].timestamp >= before && logs[0].timestamp <= after);
    }

    #[test]
    fn test_create_keeps_client_id() {
        let service = service();
        let id = service.create(br#"{"id": "client-1", "timestamp": 5}"#).unwrap();
        assert_eq!(id, "client-1");
    }

    #[test]
    fn test_create_duplicate_is_client_fault() {
        let service = service();
        service.create(br#"{"id": "x", "message": "first"}"#).unwrap();

        let err = service.create(br#"{"id": "x", "message": "second"}"#).unwrap_err();
        assert!(matches!(err, Error::DuplicateId(_)));
        assert!(err.is_client_fault());

        let logs = service.list(&ListParams::default()).unwrap().logs;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].message, "first");
    }

    #[test]
    fn test_create_malformed_is_client_fault() {
        let service = service();
        let err = service.create(b"not json").unwrap_err();
        assert!(err.is_client_fault());
        assert_eq!(service.store().count().unwrap(), 0);
    }

    #[test]
    fn test_create_rejects_non_object_payloads() {
        let service = service();
        for body in [
            &br#"["arr-id", "m", "ERROR", 5, "svc", "comp"]"#[..],
            &b"\"hello\""[..],
            &b"17"[..],
        ] {
            let err = service.create(body).unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }
        assert_eq!(service.store().count().unwrap(), 0);
    }

    #[test]
    fn test_level_case_is_treated_alike_on_ingest_and_filter() {
        let service = service();
        service.create(br#"{"id": "lower", "level": "error", "timestamp": 1}"#).unwrap();
        service.create(br#"{"id": "upper", "level": "ERROR", "timestamp": 2}"#).unwrap();

        let by_level = |level: &str| -> Vec<String> {
            service
                .list(&ListParams {
                    level: Some(level.to_string()),
                    ..Default::default()
                })
                .unwrap()
                .logs
                .into_iter()
                .map(|e| e.id)
                .collect()
        };

        // Non-canonical spellings are unrecognized: stored as INFO, never matched as a filter
        assert_eq!(by_level("ERROR"), vec!["upper"]);
        assert_eq!(by_level("INFO"), vec!["lower"]);
        assert!(by_level("error").is_empty());
    }

    #[test]
    fn test_list_filters() {
        let service = service();
        service
            .create(br#"{"id": "1", "level": "ERROR", "service": "api", "timestamp": 1}"#)
            .unwrap();
        service
            .create(br#"{"id": "2", "level": "ERROR", "service": "db", "timestamp": 2}"#)
            .unwrap();
        service
            .create(br#"{"id": "3", "level": "INFO", "service": "api", "timestamp": 3}"#)
            .unwrap();

        let response = service
            .list(&ListParams {
                level: Some("ERROR".into()),
                service: Some("api".into()),
                ..Default::default()
            })
            .unwrap();
        let ids: Vec<&str> = response.logs.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1"]);

        let response = service
            .list(&ListParams {
                level: Some(String::new()),
                service: Some(String::new()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(response.logs.len(), 3);
    }

    #[test]
    fn test_statistics_counts() {
        let service = service();
        assert!(service.statistics().unwrap().is_empty());

        service.create(br#"{"level": "WARNING", "timestamp": 10}"#).unwrap();
        service.create(br#"{"level": "WARNING", "timestamp": 30}"#).unwrap();
        service.create(br#"{"timestamp": 20}"#).unwrap();

        let report = service.statistics().unwrap();
        assert_eq!(report.get(LogLevel::Warning).unwrap().count, 2);
        assert_eq!(report.get(LogLevel::Warning).unwrap().oldest, 10);
        assert_eq!(report.get(LogLevel::Warning).unwrap().newest, 30);
        assert_eq!(report.get(LogLevel::Info).unwrap().count, 1);
    }
}
