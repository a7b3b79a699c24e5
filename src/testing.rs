//! Test doubles shared by the unit tests.

use crate::error::ProviderError;
use crate::shape::TranslationFields;
use crate::translation::{TranslationRequest, Translator};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Prefixes every top-level text value with the target code after a fixed delay.
#[derive(Default)]
pub struct FakeTranslator {
    pub delay: Duration,
    pub fail_for: Vec<&'static str>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub calls: AtomicUsize,
}

impl FakeTranslator {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    pub fn failing_for(codes: Vec<&'static str>) -> Self {
        Self {
            fail_for: codes,
            ..Default::default()
        }
    }
}

impl Translator for FakeTranslator {
    fn translate<'a>(
        &'a self,
        request: TranslationRequest<'a>,
    ) -> BoxFuture<'a, Result<TranslationFields, ProviderError>> {
        async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let code = request.language.code();
            if self.fail_for.iter().any(|c| *c == code) {
                return Err(ProviderError::Other(format!("provider refused {}", code)));
            }

            let translated: Map<String, Value> = request
                .fields
                .iter()
                .map(|(k, v)| match v {
                    Value::String(s) => (k.clone(), Value::String(format!("[{}] {}", code, s))),
                    other => (k.clone(), other.clone()),
                })
                .collect();
            Ok(TranslationFields::from(translated))
        }
        .boxed()
    }
}

pub fn codes(list: &[&str]) -> Vec<String> {
    list.iter().map(|c| c.to_string()).collect()
}
