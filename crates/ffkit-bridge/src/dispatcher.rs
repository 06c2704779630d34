//! Command dispatch: decode, route, resolve.
//!
//! Argument validation happens here, before any handler runs, so a rejected
//! call never reaches the pool. Blocking requests run on the
//! [`ExecutionPool`]; everything else runs inline on the caller's task.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use tracing::{debug, instrument, warn};

use crate::context::BridgeContext;
use crate::handlers;
use crate::pool::ExecutionPool;
use crate::request::{Invocation, Rejection, Request};
use crate::sink::{self, Resolution, ResultSink};

/// Inline calls slower than this are reported.
const SLOW_CALL: Duration = Duration::from_secs(5);

/// Decode `invocation` and arrange for `sink` to be resolved exactly once.
pub async fn dispatch(
    ctx: &Arc<BridgeContext>,
    pool: &ExecutionPool,
    invocation: &Invocation,
    sink: ResultSink,
) {
    let request = match Request::decode(invocation) {
        Ok(request) => request,
        Err(Rejection::Unknown) => {
            debug!(method = %invocation.method, "method not implemented");
            sink.not_implemented();
            return;
        }
        Err(Rejection::Invalid(error)) => {
            debug!(method = %invocation.method, code = %error.code, "invalid arguments");
            sink.error(error);
            return;
        }
    };

    if request.is_blocking() {
        let ctx = Arc::clone(ctx);
        pool.submit(sink, async move { handlers::handle(&ctx, request).await });
    } else {
        sink.resolve(handlers::handle(ctx, request).await);
    }
}

/// Dispatch `invocation` and wait for its resolution, recording call metrics.
#[instrument(skip_all, fields(method = %invocation.method))]
pub async fn call(ctx: &Arc<BridgeContext>, pool: &ExecutionPool, invocation: &Invocation) -> Resolution {
    let method = invocation.method.clone();
    counter!("bridge_calls_total", "method" => method.clone()).increment(1);

    let start = Instant::now();
    let (sink, receiver) = sink::channel(method.clone());
    dispatch(ctx, pool, invocation, sink).await;
    let resolution = receiver.recv().await;
    let duration = start.elapsed();

    match &resolution {
        Resolution::Error(error) => {
            counter!(
                "bridge_errors_total",
                "method" => method.clone(),
                "code" => error.code.to_string()
            )
            .increment(1);
        }
        Resolution::NotImplemented => {
            counter!(
                "bridge_errors_total",
                "method" => method.clone(),
                "code" => "NOT_IMPLEMENTED"
            )
            .increment(1);
        }
        Resolution::Success(_) => {}
    }

    histogram!("bridge_call_duration_seconds", "method" => method.clone())
        .record(duration.as_secs_f64());

    if duration >= SLOW_CALL && !is_long_running(&method) {
        warn!(method, duration_secs = duration.as_secs_f64(), "slow bridge call");
    }

    resolution
}

/// Calls that legitimately run for the length of a media job.
fn is_long_running(method: &str) -> bool {
    method.ends_with("Execute")
        || method.starts_with("abstractSessionGetAll")
        || method == "ffmpegSessionGetAllStatistics"
        || method == "writeToPipe"
        || method == "selectDocument"
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBroadcaster;
    use crate::platform::{DocumentRequest, MockPlatform, PlatformError, SelectOutcome};
    use assert_matches::assert_matches;
    use ffkit_core::{ErrorCode, SessionState, Toolkit};
    use ffkit_runtime::testing::{Script, ScriptedRunner};
    use ffkit_runtime::{NativeToolkit, NativeToolkitOptions};
    use serde_json::{Value, json};

    struct Harness {
        ctx: Arc<BridgeContext>,
        pool: ExecutionPool,
        runner: Arc<ScriptedRunner>,
        toolkit: NativeToolkit,
    }

    fn harness_with(platform: Option<Arc<dyn crate::platform::Platform>>) -> Harness {
        let runner = Arc::new(ScriptedRunner::new());
        let toolkit = NativeToolkit::new(NativeToolkitOptions::default(), runner.clone());
        let ctx = Arc::new(BridgeContext {
            toolkit: Arc::new(toolkit.clone()),
            events: Arc::new(EventBroadcaster::new(16)),
            platform,
        });
        Harness {
            ctx,
            pool: ExecutionPool::new(4),
            runner,
            toolkit,
        }
    }

    fn harness() -> Harness {
        harness_with(None)
    }

    async fn invoke(h: &Harness, method: &str, arguments: Value) -> Resolution {
        call(&h.ctx, &h.pool, &Invocation::new(method, arguments)).await
    }

    fn success(resolution: Resolution) -> Value {
        match resolution {
            Resolution::Success(v) => v,
            other => panic!("expected success, got {other:?}"),
        }
    }

    fn error_code(resolution: Resolution) -> ErrorCode {
        match resolution {
            Resolution::Error(e) => e.code,
            other => panic!("expected error, got {other:?}"),
        }
    }

    async fn create_ffmpeg(h: &Harness) -> i64 {
        let session = success(
            invoke(h, "ffmpegSession", json!({"arguments": ["-i", "in.mp4", "out.mp4"]})).await,
        );
        session["sessionId"].as_i64().unwrap()
    }

    // ── Decoding ────────────────────────────────────────────────────

    #[tokio::test]
    async fn unknown_method_is_not_implemented() {
        let h = harness();
        assert_eq!(invoke(&h, "noSuchMethod", json!({})).await, Resolution::NotImplemented);
    }

    #[tokio::test]
    async fn missing_session_id_is_rejected() {
        let h = harness();
        let code = error_code(invoke(&h, "abstractSessionGetState", json!({})).await);
        assert_eq!(code, ErrorCode::InvalidSession);
    }

    #[tokio::test]
    async fn missing_arguments_are_rejected_without_creating() {
        let h = harness();
        let code = error_code(invoke(&h, "ffmpegSession", json!({})).await);
        assert_eq!(code, ErrorCode::InvalidArguments);
        assert!(h.toolkit.sessions().is_empty());
    }

    // ── Sessions ────────────────────────────────────────────────────

    #[tokio::test]
    async fn create_ffmpeg_session_returns_map() {
        let h = harness();
        let session = success(
            invoke(&h, "ffmpegSession", json!({"arguments": ["-i", "in.mp4", "out.mp4"]})).await,
        );
        assert!(session["sessionId"].as_i64().is_some());
        assert_eq!(session["type"], 1);
        assert_eq!(session["command"], "-i in.mp4 out.mp4");
        assert_eq!(session["startTime"], 0);
    }

    #[tokio::test]
    async fn state_of_unknown_session_is_not_found() {
        let h = harness();
        let code = error_code(
            invoke(&h, "abstractSessionGetState", json!({"sessionId": 999_999})).await,
        );
        assert_eq!(code, ErrorCode::SessionNotFound);
    }

    #[tokio::test]
    async fn introspection_of_created_session() {
        let h = harness();
        let id = create_ffmpeg(&h).await;
        let args = json!({"sessionId": id});

        let state = success(invoke(&h, "abstractSessionGetState", args.clone()).await);
        assert_eq!(state, SessionState::Created.ordinal());
        assert_eq!(success(invoke(&h, "abstractSessionGetEndTime", args.clone()).await), Value::Null);
        assert_eq!(success(invoke(&h, "abstractSessionGetReturnCode", args.clone()).await), Value::Null);
        assert_eq!(success(invoke(&h, "abstractSessionGetDuration", args.clone()).await), 0);
        assert_eq!(
            success(invoke(&h, "thereAreAsynchronousMessagesInTransmit", args.clone()).await),
            false
        );
        assert_eq!(success(invoke(&h, "messagesInTransmit", args).await), 0);
    }

    #[tokio::test]
    async fn session_queries() {
        let h = harness();
        let first = create_ffmpeg(&h).await;
        let _ = success(invoke(&h, "ffprobeSession", json!({"arguments": ["in.mp4"]})).await);

        let all = success(invoke(&h, "getSessions", json!({})).await);
        assert_eq!(all.as_array().unwrap().len(), 2);

        let ffmpeg = success(invoke(&h, "getFFmpegSessions", json!({})).await);
        assert_eq!(ffmpeg.as_array().unwrap().len(), 1);
        assert_eq!(ffmpeg[0]["sessionId"], first);

        let last = success(invoke(&h, "getLastSession", json!({})).await);
        assert_eq!(last["type"], 2);

        let created = success(
            invoke(&h, "getSessionsByState", json!({"state": SessionState::Created.ordinal()})).await,
        );
        assert_eq!(created.as_array().unwrap().len(), 2);

        assert_eq!(success(invoke(&h, "clearSessions", json!({})).await), Value::Null);
        assert_eq!(success(invoke(&h, "getLastSession", json!({})).await), Value::Null);
    }

    // ── Execution ───────────────────────────────────────────────────

    #[tokio::test]
    async fn execute_runs_on_pool_and_completes() {
        let h = harness();
        h.runner.push_run(Script::exit(0).with_stderr(&["[info] done"]));
        let id = create_ffmpeg(&h).await;

        let result = success(invoke(&h, "ffmpegSessionExecute", json!({"sessionId": id})).await);
        assert_eq!(result, Value::Null);

        let rc = success(invoke(&h, "abstractSessionGetReturnCode", json!({"sessionId": id})).await);
        assert_eq!(rc, 0);
        let logs = success(
            invoke(&h, "abstractSessionGetAllLogsAsString", json!({"sessionId": id, "waitTimeout": 100}))
                .await,
        );
        assert_eq!(logs, "done\n");
    }

    #[tokio::test]
    async fn execute_with_wrong_kind_fails() {
        let h = harness();
        let id = create_ffmpeg(&h).await;
        let code = error_code(invoke(&h, "ffprobeSessionExecute", json!({"sessionId": id})).await);
        assert_eq!(code, ErrorCode::NotFfprobeSession);
    }

    #[tokio::test]
    async fn statistics_on_probe_session_is_wrong_kind() {
        let h = harness();
        let probe = success(invoke(&h, "ffprobeSession", json!({"arguments": ["in.mp4"]})).await);
        let code = error_code(
            invoke(&h, "ffmpegSessionGetStatistics", json!({"sessionId": probe["sessionId"]})).await,
        );
        assert_eq!(code, ErrorCode::NotFfmpegSession);
    }

    #[tokio::test]
    async fn media_information_on_ffmpeg_session_is_wrong_kind() {
        let h = harness();
        let id = create_ffmpeg(&h).await;
        let code = error_code(invoke(&h, "getMediaInformation", json!({"sessionId": id})).await);
        assert_eq!(code, ErrorCode::NotMediaInformationSession);
    }

    #[tokio::test]
    async fn async_execute_resolves_immediately() {
        let h = harness();
        h.runner.push_run(Script::until_cancelled());
        let id = create_ffmpeg(&h).await;

        let result = success(invoke(&h, "asyncFFmpegSessionExecute", json!({"sessionId": id})).await);
        assert_eq!(result, Value::Null);

        assert_eq!(success(invoke(&h, "cancelSession", json!({"sessionId": id})).await), Value::Null);
    }

    // ── Configuration ───────────────────────────────────────────────

    #[tokio::test]
    async fn log_level_roundtrip() {
        let h = harness();
        assert_eq!(success(invoke(&h, "setLogLevel", json!({"level": 48})).await), Value::Null);
        assert_eq!(success(invoke(&h, "getLogLevel", json!({})).await), 48);
    }

    #[tokio::test]
    async fn history_size_out_of_range_is_invalid_size() {
        let h = harness();
        let code = error_code(invoke(&h, "setSessionHistorySize", json!({"sessionHistorySize": 5000})).await);
        assert_eq!(code, ErrorCode::InvalidSize);
    }

    #[tokio::test]
    async fn flags_toggle_broadcaster() {
        let h = harness();
        let _ = success(invoke(&h, "enableLogs", json!({})).await);
        let _ = success(invoke(&h, "enableStatistics", json!({})).await);
        assert!(h.ctx.events.logs_enabled());
        assert!(h.ctx.events.statistics_enabled());
        let _ = success(invoke(&h, "disableLogs", json!({})).await);
        assert!(!h.ctx.events.logs_enabled());
    }

    // ── Media information parsing ───────────────────────────────────

    #[tokio::test]
    async fn parse_media_information() {
        let h = harness();
        let output = r#"{"format": {"filename": "in.mp4"}, "streams": []}"#;
        let info = success(
            invoke(&h, "mediaInformationJsonParserFrom", json!({"ffprobeJsonOutput": output})).await,
        );
        assert_eq!(info["format"]["filename"], "in.mp4");

        let bad = json!({"ffprobeJsonOutput": "not json"});
        assert_eq!(
            success(invoke(&h, "mediaInformationJsonParserFrom", bad.clone()).await),
            Value::Null
        );
        let code = error_code(invoke(&h, "mediaInformationJsonParserFromWithError", bad).await);
        assert_eq!(code, ErrorCode::ParseFailed);
    }

    // ── Pipes ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn write_to_pipe_copies_file() {
        let h = harness();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.bin");
        let pipe = dir.path().join("pipe.bin");
        std::fs::write(&input, b"payload").unwrap();
        std::fs::write(&pipe, b"").unwrap();

        let result = success(
            invoke(
                &h,
                "writeToPipe",
                json!({"input": input.to_str().unwrap(), "pipe": pipe.to_str().unwrap()}),
            )
            .await,
        );
        assert_eq!(result, 0);
        assert_eq!(std::fs::read(&pipe).unwrap(), b"payload");
    }

    #[tokio::test]
    async fn write_to_pipe_missing_input_fails() {
        let h = harness();
        let code = error_code(
            invoke(&h, "writeToPipe", json!({"input": "/nonexistent/in", "pipe": "/nonexistent/pipe"}))
                .await,
        );
        assert_eq!(code, ErrorCode::WriteToPipeFailed);
    }

    // ── Platform ────────────────────────────────────────────────────

    #[tokio::test]
    async fn select_document_without_platform_is_invalid_activity() {
        let h = harness();
        let code = error_code(invoke(&h, "selectDocument", json!({"writable": false})).await);
        assert_eq!(code, ErrorCode::InvalidActivity);
    }

    #[tokio::test]
    async fn select_document_cancel_carries_result_code() {
        let mut platform = MockPlatform::new();
        let _ = platform
            .expect_select_document()
            .returning(|_: DocumentRequest| Ok(SelectOutcome::Cancelled(0)));
        let h = harness_with(Some(Arc::new(platform)));

        let resolution = invoke(&h, "selectDocument", json!({"writable": false})).await;
        assert_matches!(resolution, Resolution::Error(e) => {
            assert_eq!(e.code, ErrorCode::SelectCancelled);
            assert_eq!(e.message, "0");
        });
    }

    #[tokio::test]
    async fn select_document_returns_uri() {
        let mut platform = MockPlatform::new();
        let _ = platform
            .expect_select_document()
            .returning(|_| Ok(SelectOutcome::Selected(Some("file:///tmp/a.mp4".into()))));
        let h = harness_with(Some(Arc::new(platform)));

        let uri = success(invoke(&h, "selectDocument", json!({"writable": true, "title": "a.mp4"})).await);
        assert_eq!(uri, "file:///tmp/a.mp4");
    }

    #[tokio::test]
    async fn saf_parameter_failure_maps_code() {
        let mut platform = MockPlatform::new();
        let _ = platform
            .expect_saf_parameter()
            .returning(|_, _| Err(PlatformError::Failed("denied".into())));
        let h = harness_with(Some(Arc::new(platform)));

        let resolution = invoke(&h, "getSafParameter", json!({"uri": "content://x", "openMode": "r"})).await;
        assert_matches!(resolution, Resolution::Error(e) => {
            assert_eq!(e.code, ErrorCode::GetSafParameterFailed);
            assert_eq!(e.message, "denied");
        });
    }

    #[tokio::test]
    async fn platform_name_comes_from_platform() {
        let mut platform = MockPlatform::new();
        let _ = platform.expect_name().return_const("android".to_string());
        let h = harness_with(Some(Arc::new(platform)));
        assert_eq!(success(invoke(&h, "getPlatform", json!({})).await), "android");
    }

    #[tokio::test]
    async fn platform_name_falls_back_to_os() {
        let h = harness();
        assert_eq!(
            success(invoke(&h, "getPlatform", json!({})).await),
            std::env::consts::OS
        );
    }

    // ── Slow-call classification ────────────────────────────────────

    #[test]
    fn long_running_methods() {
        assert!(is_long_running("ffmpegSessionExecute"));
        assert!(is_long_running("abstractSessionGetAllLogs"));
        assert!(!is_long_running("getLogLevel"));
    }
}
