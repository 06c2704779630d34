//! Request handlers, grouped by area.
//!
//! Every handler takes the [`BridgeContext`] of the current attach cycle and
//! returns the call's value or a [`MethodError`]; [`handle`] routes a decoded
//! [`Request`] to its handler and folds the outcome into a [`Resolution`].

mod config;
mod execution;
mod media;
mod session;
mod system;

use ffkit_core::MethodError;
use serde_json::Value;

use crate::context::BridgeContext;
use crate::request::Request;
use crate::sink::Resolution;

type HandlerResult = Result<Value, MethodError>;

/// Run one decoded request.
pub async fn handle(ctx: &BridgeContext, request: Request) -> Resolution {
    let result = match request {
        // Session introspection
        Request::SessionEndTime(id) => session::end_time(ctx, id),
        Request::SessionDuration(id) => session::duration(ctx, id),
        Request::SessionAllLogs { id, wait_timeout } => {
            session::all_logs(ctx, id, wait_timeout).await
        }
        Request::SessionLogs(id) => session::logs(ctx, id),
        Request::SessionAllLogsAsString { id, wait_timeout } => {
            session::all_logs_as_string(ctx, id, wait_timeout).await
        }
        Request::SessionState(id) => session::state(ctx, id),
        Request::SessionReturnCode(id) => session::return_code(ctx, id),
        Request::SessionFailStackTrace(id) => session::fail_stack_trace(ctx, id),
        Request::HasMessagesInTransmit(id) => session::has_messages_in_transmit(ctx, id),
        Request::MessagesInTransmit(id) => session::messages_in_transmit(ctx, id),
        Request::CreateSession { kind, arguments } => session::create(ctx, kind, arguments),

        // Statistics and media information
        Request::AllStatistics { id, wait_timeout } => {
            media::all_statistics(ctx, id, wait_timeout).await
        }
        Request::Statistics(id) => media::statistics(ctx, id),
        Request::MediaInformation(id) => media::media_information(ctx, id),
        Request::ParseMediaInformation { output, with_error } => media::parse(&output, with_error),

        // Output routing
        Request::EnableRedirection => config::set_redirection(ctx, true),
        Request::DisableRedirection => config::set_redirection(ctx, false),
        Request::EnableLogs => config::set_logs(ctx, true),
        Request::DisableLogs => config::set_logs(ctx, false),
        Request::EnableStatistics => config::set_statistics(ctx, true),
        Request::DisableStatistics => config::set_statistics(ctx, false),

        // Fonts, pipes, environment
        Request::SetFontconfigConfigurationPath(path) => config::set_fontconfig_path(ctx, &path),
        Request::SetFontDirectories {
            directories,
            name_mapping,
        } => config::set_font_directories(ctx, directories, name_mapping),
        Request::RegisterNewPipe => system::register_new_pipe(ctx).await,
        Request::ClosePipe(path) => system::close_pipe(ctx, &path).await,
        Request::SetEnvironmentVariable { name, value } => {
            config::set_environment_variable(ctx, &name, &value)
        }
        Request::IgnoreSignal(signal) => config::ignore_signal(ctx, signal),

        // Execution
        Request::Execute {
            id,
            kind,
            wait_timeout,
        } => execution::execute(ctx, id, kind, wait_timeout).await,
        Request::ExecuteAsync {
            id,
            kind,
            wait_timeout,
        } => execution::execute_async(ctx, id, kind, wait_timeout),
        Request::CancelAll => execution::cancel(ctx, None),
        Request::CancelSession(id) => execution::cancel(ctx, Some(id)),

        // Configuration
        Request::LogLevel => config::log_level(ctx),
        Request::SetLogLevel(level) => config::set_log_level(ctx, level),
        Request::SessionHistorySize => config::session_history_size(ctx),
        Request::SetSessionHistorySize(size) => config::set_session_history_size(ctx, size),
        Request::LogRedirectionStrategy => config::log_redirection_strategy(ctx),
        Request::SetLogRedirectionStrategy(strategy) => {
            config::set_log_redirection_strategy(ctx, strategy)
        }

        // Session queries
        Request::Session(id) => session::get(ctx, id),
        Request::LastSession => session::last(ctx),
        Request::LastCompletedSession => session::last_completed(ctx),
        Request::Sessions => session::all(ctx),
        Request::ClearSessions => session::clear(ctx),
        Request::SessionsByState(state) => session::by_state(ctx, state),
        Request::SessionsByKind(kind) => session::by_kind(ctx, kind),

        // Metadata
        Request::Arch => system::arch(ctx),
        Request::Version => system::version(ctx).await,
        Request::IsLtsBuild => system::is_lts_build(ctx),
        Request::BuildDate => system::build_date(ctx).await,
        Request::PackageName => system::package_name(ctx),
        Request::ExternalLibraries => system::external_libraries(ctx).await,
        Request::Platform => system::platform(ctx),

        // Platform
        Request::WriteToPipe { input, pipe } => system::write_to_pipe(&input, &pipe).await,
        Request::SelectDocument(request) => system::select_document(ctx, request).await,
        Request::SafParameter { uri, open_mode } => {
            system::saf_parameter(ctx, &uri, &open_mode).await
        }
    };

    result.into()
}
