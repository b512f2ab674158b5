use rpc_transport::{Transport, TransportError};
use serde::Serialize;
use tracing::{Level, debug, error, info, instrument, warn};

use crate::args::Args;
use crate::error::RpcError;
use crate::mask::mask_args;
use crate::options::Options;
use crate::reply::Reply;

/// Tracing target of the per-call audit records.
pub const AUDIT_TARGET: &str = "store_rpc::audit";

/// Blocking client issuing one method call per [`Args`] batch.
///
/// The client owns its transport; once closed every call fails.
pub struct Client {
    transport: Option<Box<dyn Transport>>,
    options: Options,
}

impl Client {
    /// Dial `address` (`host:port`). `None` uses [`Options::defaults`].
    pub fn connect(address: &str, options: Option<&Options>) -> Result<Self, RpcError> {
        let options = options.unwrap_or_else(|| Options::defaults()).clone();
        let transport = rpc_transport::dial(options.network, address, options.codec)
            .map_err(|err| RpcError::connection(address, err))?;
        debug!(%address, codec = %options.codec, "store rpc client connected");
        Ok(Self::with_transport(transport, options))
    }

    /// Wrap an already established transport.
    pub fn with_transport(transport: Box<dyn Transport>, options: Options) -> Self {
        Self {
            transport: Some(transport),
            options,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn is_closed(&self) -> bool {
        self.transport.is_none()
    }

    /// Invoke `method` for every payload in `args` and fill `reply`.
    ///
    /// `reply` is reset first and stays empty when the call fails. Per-store
    /// failures inside a successful reply are not errors here; inspect
    /// [`Reply::has_error`].
    #[instrument(skip(self, args, reply), fields(stores = args.len()))]
    pub fn call(&mut self, method: &str, args: &Args, reply: &mut Reply) -> Result<(), RpcError> {
        reply.reset();
        let result = self.dispatch(method, args).map(|decoded| *reply = decoded);
        self.audit(method, args, reply, result.as_ref().err());
        result
    }

    fn dispatch(&mut self, method: &str, args: &Args) -> Result<Reply, RpcError> {
        let transport = self
            .transport
            .as_mut()
            .ok_or_else(|| RpcError::call(method, TransportError::Closed))?;
        let params = serde_json::to_value(args)
            .map_err(|err| RpcError::call(method, TransportError::Encode(err)))?;
        let raw = transport
            .call(method, &params)
            .map_err(|err| RpcError::call(method, err))?;
        serde_json::from_value(raw).map_err(|err| RpcError::call(method, TransportError::Decode(err)))
    }

    fn audit(&self, method: &str, args: &Args, reply: &Reply, err: Option<&RpcError>) {
        let masked = render(&mask_args(args, &self.options));
        match err {
            Some(err) => error!(
                target: AUDIT_TARGET,
                method,
                args = %masked,
                reply = %render(reply),
                error = %err,
                "rpc call failed"
            ),
            None => {
                let debug_store = args.stores().any(|store| store.debug);
                if debug_store || self.options.log_level.admits(Level::INFO) {
                    info!(
                        target: AUDIT_TARGET,
                        method,
                        args = %masked,
                        reply = %render(reply),
                        "rpc call"
                    );
                }
            }
        }
    }

    /// Release the transport. Closing an already closed client is a no-op.
    pub fn close(&mut self) -> Result<(), RpcError> {
        let Some(mut transport) = self.transport.take() else {
            return Ok(());
        };
        transport.close().map_err(|source| {
            let err = RpcError::close(source);
            error!(target: AUDIT_TARGET, error = %err, "failed to close store rpc client");
            err
        })
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            if let Err(err) = transport.close() {
                warn!(error = %err, "failed to close store rpc transport on drop");
            }
        }
    }
}

fn render<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|err| format!("<unrenderable: {err}>"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Payload;
    use crate::options::LogLevel;
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::fmt;
    use std::sync::{Arc, Mutex};
    use store_types::Store;
    use tracing::field::{Field, Visit};
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    #[derive(Default)]
    struct Recorded {
        calls: Vec<(String, Value)>,
        closes: usize,
    }

    struct MockTransport {
        recorded: Arc<Mutex<Recorded>>,
        response: Option<Value>,
        fail_close: bool,
    }

    impl MockTransport {
        fn new(response: Option<Value>) -> (Self, Arc<Mutex<Recorded>>) {
            let recorded = Arc::new(Mutex::new(Recorded::default()));
            let mock = Self {
                recorded: recorded.clone(),
                response,
                fail_close: false,
            };
            (mock, recorded)
        }
    }

    impl Transport for MockTransport {
        fn call(&mut self, method: &str, params: &Value) -> Result<Value, TransportError> {
            self.recorded
                .lock()
                .unwrap()
                .calls
                .push((method.to_string(), params.clone()));
            self.response
                .clone()
                .ok_or_else(|| TransportError::Remote("backend unavailable".into()))
        }

        fn close(&mut self) -> Result<(), TransportError> {
            self.recorded.lock().unwrap().closes += 1;
            if self.fail_close {
                Err(TransportError::Io(std::io::ErrorKind::BrokenPipe.into()))
            } else {
                Ok(())
            }
        }
    }

    fn args() -> Args {
        Args::new()
            .add(Payload::new(Store::new("1", "Shop A").with_setting("app_secret", "s3cr3t-value")))
            .add(Payload::new(Store::new("2", "Shop B")).set_body(json!({"page": 1})))
    }

    #[test]
    fn call_fills_reply_in_order() {
        let (mock, recorded) = MockTransport::new(Some(json!({
            "request_id": "r-1",
            "results": [
                {"store_id": "1", "store_name": "Shop A", "ok": true, "data": {"n": 1}},
                {"store_id": "2", "store_name": "Shop B", "ok": false, "error": "quota"}
            ]
        })));
        let mut client = Client::with_transport(Box::new(mock), Options::default());
        let mut reply = Reply::new();

        client.call("Shop.Orders", &args(), &mut reply).expect("call");
        assert_eq!(reply.request_id, "r-1");
        assert_eq!(reply.results.len(), 2);
        assert_eq!(reply.error_summary(), ["Shop B: quota"]);

        let recorded = recorded.lock().unwrap();
        let (method, params) = &recorded.calls[0];
        assert_eq!(method, "Shop.Orders");
        assert_eq!(params[0]["store"]["configuration"]["app_secret"], "s3cr3t-value");
        assert_eq!(params[1]["body"], json!({"page": 1}));
    }

    #[test]
    fn failed_call_leaves_reply_reset() {
        let (mock, _) = MockTransport::new(None);
        let mut client = Client::with_transport(Box::new(mock), Options::default());
        let mut reply = Reply {
            request_id: "stale".into(),
            ..Reply::default()
        };

        let err = client.call("Shop.Orders", &args(), &mut reply).unwrap_err();
        match err {
            RpcError::Call { method, source } => {
                assert_eq!(method, "Shop.Orders");
                assert!(matches!(source, TransportError::Remote(_)));
            }
            other => panic!("expected call error, got {other:?}"),
        }
        assert_eq!(reply, Reply::default());
    }

    #[test]
    fn undecodable_reply_is_call_error() {
        let (mock, _) = MockTransport::new(Some(json!("not a reply")));
        let mut client = Client::with_transport(Box::new(mock), Options::default());
        let mut reply = Reply::new();

        let err = client.call("Shop.Orders", &args(), &mut reply).unwrap_err();
        assert!(matches!(
            err,
            RpcError::Call {
                source: TransportError::Decode(_),
                ..
            }
        ));
        assert!(reply.results.is_empty());
    }

    #[test]
    fn close_is_idempotent() {
        let (mock, recorded) = MockTransport::new(Some(json!({})));
        let mut client = Client::with_transport(Box::new(mock), Options::default());

        client.close().expect("first close");
        client.close().expect("second close");
        assert!(client.is_closed());
        assert_eq!(recorded.lock().unwrap().closes, 1);

        let mut reply = Reply::new();
        let err = client.call("Shop.Orders", &args(), &mut reply).unwrap_err();
        assert!(matches!(
            err,
            RpcError::Call {
                source: TransportError::Closed,
                ..
            }
        ));
        assert!(recorded.lock().unwrap().calls.is_empty());
    }

    #[test]
    fn close_failure_is_reported_once() {
        let (mut mock, recorded) = MockTransport::new(Some(json!({})));
        mock.fail_close = true;
        let mut client = Client::with_transport(Box::new(mock), Options::default());

        assert!(matches!(client.close(), Err(RpcError::Close { .. })));
        assert!(client.close().is_ok());
        drop(client);
        assert_eq!(recorded.lock().unwrap().closes, 1);
    }

    #[derive(Debug)]
    struct AuditRecord {
        level: Level,
        fields: HashMap<String, String>,
    }

    #[derive(Default)]
    struct FieldMap(HashMap<String, String>);

    impl Visit for FieldMap {
        fn record_str(&mut self, field: &Field, value: &str) {
            self.0.insert(field.name().to_string(), value.to_string());
        }

        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.0.insert(field.name().to_string(), format!("{value:?}"));
        }
    }

    struct AuditCapture(Arc<Mutex<Vec<AuditRecord>>>);

    impl<S: Subscriber> Layer<S> for AuditCapture {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if event.metadata().target() != AUDIT_TARGET {
                return;
            }
            let mut fields = FieldMap::default();
            event.record(&mut fields);
            self.0.lock().unwrap().push(AuditRecord {
                level: *event.metadata().level(),
                fields: fields.0,
            });
        }
    }

    /// Run `f` with audit events captured and return them.
    fn audited(f: impl FnOnce()) -> Vec<AuditRecord> {
        let records = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(AuditCapture(records.clone()));
        tracing::subscriber::with_default(subscriber, f);
        let mut records = records.lock().unwrap();
        std::mem::take(&mut *records)
    }

    fn ok_reply() -> Value {
        json!({
            "request_id": "r-9",
            "results": [{"store_id": "1", "store_name": "Shop A", "ok": true, "data": 1}]
        })
    }

    #[test]
    fn successful_call_logs_one_masked_info_record() {
        let records = audited(|| {
            let (mock, _) = MockTransport::new(Some(ok_reply()));
            let mut client = Client::with_transport(Box::new(mock), Options::default());
            let mut reply = Reply::new();
            client.call("Shop.Orders", &args(), &mut reply).expect("call");
        });

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.level, Level::INFO);
        assert_eq!(record.fields["method"], "Shop.Orders");
        let logged_args = &record.fields["args"];
        assert!(!logged_args.contains("s3cr3t-value"));
        assert!(logged_args.contains("s3c******lue"));
        assert!(record.fields["reply"].contains("r-9"));
        assert!(!record.fields.contains_key("error"));
    }

    #[test]
    fn failed_call_logs_one_masked_error_record() {
        let records = audited(|| {
            let (mock, _) = MockTransport::new(None);
            let options = Options::default().with_log_level(LogLevel::Error);
            let mut client = Client::with_transport(Box::new(mock), options);
            let mut reply = Reply::new();
            assert!(client.call("Shop.Orders", &args(), &mut reply).is_err());
        });

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.level, Level::ERROR);
        assert!(!record.fields["args"].contains("s3cr3t-value"));
        assert!(record.fields["error"].contains("backend unavailable"));
        assert!(record.fields["reply"].contains("\"results\":[]"));
    }

    #[test]
    fn success_record_is_gated_by_log_level_and_debug_stores() {
        let quiet = audited(|| {
            let (mock, _) = MockTransport::new(Some(ok_reply()));
            let options = Options::default().with_log_level(LogLevel::Warn);
            let mut client = Client::with_transport(Box::new(mock), options);
            let mut reply = Reply::new();
            client.call("Shop.Orders", &args(), &mut reply).expect("call");
        });
        assert!(quiet.is_empty());

        let debug_store = audited(|| {
            let (mock, _) = MockTransport::new(Some(ok_reply()));
            let options = Options::default().with_log_level(LogLevel::Warn);
            let mut client = Client::with_transport(Box::new(mock), options);
            let mut reply = Reply::new();
            let args = args().add(Payload::new(Store::new("3", "Debug").with_debug(true)));
            client.call("Shop.Orders", &args, &mut reply).expect("call");
        });
        assert_eq!(debug_store.len(), 1);
        assert_eq!(debug_store[0].level, Level::INFO);
    }

    #[test]
    fn close_failure_is_logged() {
        let records = audited(|| {
            let (mut mock, _) = MockTransport::new(None);
            mock.fail_close = true;
            let mut client = Client::with_transport(Box::new(mock), Options::default());
            assert!(client.close().is_err());
        });

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, Level::ERROR);
        assert!(records[0].fields["error"].contains("failed to close connection"));
    }

    #[test]
    fn drop_closes_open_transport() {
        let (mock, recorded) = MockTransport::new(Some(json!({})));
        drop(Client::with_transport(Box::new(mock), Options::default()));
        assert_eq!(recorded.lock().unwrap().closes, 1);
    }
}
