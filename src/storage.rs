use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::{
    config::StorageConfig,
    definitions::PageRequest,
    errors::{Result, StorageError},
    mediawiki_api::{QueryUrl, build_query_url},
    page_json::decode_page,
    reqwest_client::{RustClient, Transport},
};

/// Reads json documents stored on wiki pages.
///
/// Holds nothing but the transport, so one value can serve any number of
/// concurrent requests and clones are cheap.
#[derive(Debug)]
pub struct MediawikiStorage<T = RustClient> {
    transport: Arc<T>,
}

impl<T> Clone for MediawikiStorage<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl MediawikiStorage<RustClient> {
    /// Storage backed by reqwest, configured from `config`.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        Ok(Self::new(RustClient::new(config)?))
    }
}

impl<T> MediawikiStorage<T>
where
    T: Transport + 'static,
{
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch the page described by `request` and parse its body as json.
    ///
    /// Invalid requests are rejected here, before anything is sent. Otherwise the
    /// request runs on its own tokio task and the outcome is delivered to the
    /// request's callbacks (if any) and to the returned [`PendingPage`]. Both see
    /// the same outcome. Dropping the `PendingPage` does not cancel the request.
    ///
    /// # Panics
    /// When called outside of a tokio runtime.
    pub fn get(&self, mut request: PageRequest) -> Result<PendingPage> {
        let url = build_query_url(&request)?;
        let callbacks = request.take_callbacks();
        let transport = Arc::clone(&self.transport);
        log::debug!("Requesting {}", url);

        Ok(PendingPage(tokio::spawn(async move {
            let outcome = retrieve(transport.as_ref(), &url).await;
            if let Err(e) = &outcome {
                log::warn!("Failed to read {} ({}: {})", url, e.kind(), e);
            }
            callbacks.notify(&outcome);
            outcome
        })))
    }
}

/// One round trip: transport, then decode.
async fn retrieve<T: Transport>(transport: &T, url: &QueryUrl) -> Result<Value> {
    let envelope = transport.fetch(url).await?;
    log::debug!("Decoding response for {}", url);
    decode_page(&envelope)
}

/// The eventual outcome of [`MediawikiStorage::get`].
#[derive(Debug)]
pub struct PendingPage(JoinHandle<Result<Value>>);

impl Future for PendingPage {
    type Output = Result<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0)
            .poll(cx)
            .map(|joined| joined.unwrap_or_else(|e| Err(StorageError::Interrupted(e))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::{ArgumentKind, EnvelopeStep},
        reqwest_client::RustError,
    };
    use futures::future;
    use serde_json::json;
    use std::{
        collections::HashMap,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    /// Replies to every url with the same canned outcome.
    struct StubTransport {
        reply: std::result::Result<Value, String>,
        calls: AtomicUsize,
        urls: Mutex<Vec<String>>,
    }

    impl StubTransport {
        fn ok(value: Value) -> Self {
            Self {
                reply: Ok(value),
                calls: AtomicUsize::new(0),
                urls: Mutex::new(vec![]),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_owned()),
                calls: AtomicUsize::new(0),
                urls: Mutex::new(vec![]),
            }
        }
    }

    impl Transport for StubTransport {
        fn fetch<'a>(
            &'a self,
            url: &'a QueryUrl,
        ) -> impl Future<Output = std::result::Result<Value, RustError>> + Send + 'a {
            async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.urls.lock().unwrap().push(url.to_string());
                match &self.reply {
                    Ok(value) => Ok(value.clone()),
                    Err(message) => Err(RustError::other(message.clone())),
                }
            }
        }
    }

    /// Serves a different page body per `titles=` value.
    struct PagesTransport(HashMap<String, String>);

    impl Transport for PagesTransport {
        fn fetch<'a>(
            &'a self,
            url: &'a QueryUrl,
        ) -> impl Future<Output = std::result::Result<Value, RustError>> + Send + 'a {
            async move {
                let title = url
                    .as_str()
                    .rsplit("&titles=")
                    .next()
                    .unwrap_or_default()
                    .to_owned();
                tokio::task::yield_now().await;
                match self.0.get(&title) {
                    Some(body) => Ok(json!({"query": {"pages": {"1": {"revisions": [{"*": body}]}}}})),
                    None => Err(RustError::other(format!("no page {}", title))),
                }
            }
        }
    }

    fn envelope(content: &str) -> Value {
        json!({"query": {"pages": {"12345": {"revisions": [{"*": content}]}}}})
    }

    fn request() -> PageRequest {
        PageRequest::new("www.wikimedia.org").page_name("Schema:EventCapsule")
    }

    #[derive(Default)]
    struct Seen {
        successes: Mutex<Vec<Value>>,
        failures: Mutex<Vec<String>>,
    }

    fn watched(request: PageRequest, seen: &Arc<Seen>) -> PageRequest {
        let ok = Arc::clone(seen);
        let err = Arc::clone(seen);
        request
            .on_success(move |v| ok.successes.lock().unwrap().push(v.clone()))
            .on_failure(move |e| err.failures.lock().unwrap().push(format!("{}: {}", e.kind(), e)))
    }

    #[tokio::test]
    async fn returns_results_via_callback_and_future() {
        let storage = MediawikiStorage::new(StubTransport::ok(envelope(r#"{"valid": "json"}"#)));
        let seen = Arc::new(Seen::default());

        let value = storage.get(watched(request(), &seen)).unwrap().await.unwrap();

        assert_eq!(value, json!({"valid": "json"}));
        assert_eq!(*seen.successes.lock().unwrap(), vec![json!({"valid": "json"})]);
        assert!(seen.failures.lock().unwrap().is_empty());
        assert_eq!(
            storage.transport().urls.lock().unwrap().as_slice(),
            ["//www.wikimedia.org/w/api.php?action=query&prop=revisions&format=json&rvprop=content&titles=Schema:EventCapsule"]
        );
    }

    #[tokio::test]
    async fn invalid_page_json_reaches_both_channels() {
        let storage = MediawikiStorage::new(StubTransport::ok(envelope("not a valid json")));
        let seen = Arc::new(Seen::default());

        let err = storage.get(watched(request(), &seen)).unwrap().await.unwrap_err();

        assert!(matches!(err, StorageError::InvalidPageJson(_)));
        assert_eq!(
            *seen.failures.lock().unwrap(),
            vec!["InvalidPageJson: page contents are not a valid json".to_string()]
        );
        assert!(seen.successes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_query_result_is_malformed() {
        let storage = MediawikiStorage::new(StubTransport::ok(json!("bad query result")));
        let seen = Arc::new(Seen::default());

        let err = storage.get(watched(request(), &seen)).unwrap().await.unwrap_err();

        assert!(matches!(
            err,
            StorageError::MalformedEnvelope {
                step: EnvelopeStep::Query
            }
        ));
        assert_eq!(
            *seen.failures.lock().unwrap(),
            vec!["MalformedEnvelope: unexpected query result".to_string()]
        );
    }

    #[tokio::test]
    async fn transport_errors_are_propagated() {
        let storage = MediawikiStorage::new(StubTransport::failing("connection refused"));
        let seen = Arc::new(Seen::default());

        let err = storage.get(watched(request(), &seen)).unwrap().await.unwrap_err();

        assert!(matches!(err, StorageError::Transport(RustError::Other(_))));
        assert_eq!(err.to_string(), "connection refused");
        assert_eq!(
            *seen.failures.lock().unwrap(),
            vec!["TransportError: connection refused".to_string()]
        );
        assert!(seen.successes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn callbacks_fire_without_awaiting() {
        let storage = MediawikiStorage::new(StubTransport::ok(envelope("[true]")));
        let seen = Arc::new(Seen::default());

        drop(storage.get(watched(request(), &seen)).unwrap());

        for _ in 0..100 {
            if !seen.successes.lock().unwrap().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(*seen.successes.lock().unwrap(), vec![json!([true])]);
    }

    #[tokio::test]
    async fn invalid_requests_fail_before_transport() {
        let storage = MediawikiStorage::new(StubTransport::ok(envelope("{}")));
        let seen = Arc::new(Seen::default());

        let err = storage.get(watched(PageRequest::default(), &seen)).unwrap_err();
        assert!(matches!(
            err,
            StorageError::InvalidArgument {
                kind: ArgumentKind::Host
            }
        ));

        let err = storage
            .get(watched(PageRequest::new("w.org"), &seen))
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::InvalidArgument {
                kind: ArgumentKind::SelectorMissing
            }
        ));

        let err = PageRequest::from_value(&Value::Null).unwrap_err();
        assert!(err.is_invalid_argument());

        tokio::task::yield_now().await;
        assert_eq!(storage.transport().calls.load(Ordering::SeqCst), 0);
        assert!(seen.failures.lock().unwrap().is_empty());
        assert!(seen.successes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn identical_requests_give_identical_results() {
        let storage = MediawikiStorage::new(StubTransport::ok(envelope(r#"{"k": [1, 2, 3]}"#)));

        let first = storage.get(request()).unwrap().await.unwrap();
        let second = storage.get(request()).unwrap().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(storage.transport().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_requests_are_independent() {
        let pages = HashMap::from([
            ("A".to_string(), r#"{"page": "a"}"#.to_string()),
            ("B".to_string(), r#"{"page": "b"}"#.to_string()),
            ("C".to_string(), "broken".to_string()),
        ]);
        let storage = MediawikiStorage::new(PagesTransport(pages));

        let pending: Vec<PendingPage> = ["A", "B", "C", "D"]
            .into_iter()
            .map(|title| storage.get(PageRequest::new("w.org").page_name(title)).unwrap())
            .collect();
        let results = future::join_all(pending).await;

        assert_eq!(results[0].as_ref().unwrap(), &json!({"page": "a"}));
        assert_eq!(results[1].as_ref().unwrap(), &json!({"page": "b"}));
        assert!(matches!(results[2], Err(StorageError::InvalidPageJson(_))));
        assert!(matches!(results[3], Err(StorageError::Transport(_))));
    }

    #[tokio::test]
    async fn panicking_callback_interrupts_future() {
        let storage = MediawikiStorage::new(StubTransport::ok(envelope("1")));
        let req = request().on_success(|_| panic!("callback blew up"));

        let err = storage.get(req).unwrap().await.unwrap_err();

        assert!(matches!(err, StorageError::Interrupted(_)));
    }
}
