//! In-memory doubles for the fetch and extract seams, used by unit tests

use std::collections::HashMap;
use std::sync::Mutex;

use url::Url;

use crate::app::client::Fetcher;
use crate::app::extract::Extractor;
use crate::app::models::{Category, Record};
use crate::errors::{ExtractionError, ExtractionResult, FetchError, FetchResult};

#[derive(Debug, Clone)]
enum Script {
    Respond(FetchResult<String>),
    FailThen { failures: u32, body: String },
}

/// Fetcher answering from a script; unknown URLs are absent
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<HashMap<String, u32>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self, url: &str, body: &str) {
        self.respond(url, Ok(body.to_string()));
    }

    pub fn respond(&self, url: &str, result: FetchResult<String>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), Script::Respond(result));
    }

    /// Fail transiently `failures` times, then serve `body`
    pub fn fail_then_page(&self, url: &str, failures: u32, body: &str) {
        self.scripts.lock().unwrap().insert(
            url.to_string(),
            Script::FailThen {
                failures,
                body: body.to_string(),
            },
        );
    }

    pub fn always_fail(&self, url: &str) {
        self.respond(url, Err(FetchError::transient(url, "HTTP 500")));
    }

    pub fn calls(&self, url: &str) -> u32 {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> u32 {
        self.calls.lock().unwrap().values().sum()
    }
}

impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &Url) -> FetchResult<String> {
        let key = url.as_str().to_string();
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(key.clone()).or_insert(0);
            *count += 1;
            *count
        };
        let script = self.scripts.lock().unwrap().get(&key).cloned();
        match script {
            Some(Script::Respond(result)) => result,
            Some(Script::FailThen { failures, body }) if call > failures => Ok(body),
            Some(Script::FailThen { .. }) => Err(FetchError::transient(key, "HTTP 503")),
            None => Err(FetchError::Absent {
                url: key,
                status: 404,
            }),
        }
    }
}

/// Extractor storing the payload as the AG number; `garbage` fails extraction
#[derive(Debug, Default)]
pub struct EchoExtractor;

impl Extractor for EchoExtractor {
    fn extract(&self, link: &str, payload: &str) -> ExtractionResult<Record> {
        if payload == "garbage" {
            return Err(ExtractionError::NoContent {
                link: link.to_string(),
            });
        }
        let mut record = Record::new(link)?;
        record.insert(Category::Main, "AG Number", payload);
        Ok(record)
    }
}
