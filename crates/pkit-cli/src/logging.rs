use std::fmt::Write as _;

use nu_ansi_term::Color::{Blue, Magenta, Red, Yellow};
use tracing::{field::Field, Event, Level, Subscriber};
use tracing_subscriber::{
    fmt::{
        self,
        format::{FmtSpan, Writer},
        FmtContext, FormatEvent, FormatFields, MakeWriter,
    },
    registry::LookupSpan,
};

use crate::{cli::Args, utils::Colored};

/// Overrides the filter built from `-v`/`-q`, e.g. `PKIT_LOG=pkit_catalog=trace`.
const LOG_ENV: &str = "PKIT_LOG";

/// The parts of a log record pkit cares about. `op_id` is pulled out of the
/// other fields so lines from one operation can be told apart.
#[derive(Debug, Default, PartialEq)]
struct RecordFields {
    message: Option<String>,
    op_id: Option<u64>,
    extra: Vec<(&'static str, String)>,
}

impl tracing::field::Visit for RecordFields {
    fn record_u64(&mut self, field: &Field, value: u64) {
        if field.name() == "op_id" {
            self.op_id = Some(value);
        } else {
            self.extra.push((field.name(), value.to_string()));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.extra.push((field.name(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            "message" => self.message = Some(format!("{value:?}")),
            name => self.extra.push((name, format!("{value:?}"))),
        }
    }
}

impl RecordFields {
    /// The line body. With `detailed` set, the operation tag and the
    /// structured fields are kept as well.
    fn render(&self, detailed: bool) -> String {
        let mut line = String::new();
        if detailed {
            if let Some(op_id) = self.op_id {
                let _ = write!(line, "[op {op_id}] ");
            }
        }
        line.push_str(self.message.as_deref().unwrap_or_default());
        if detailed {
            for (key, value) in &self.extra {
                let _ = write!(line, " {key}={value}");
            }
        }
        line
    }
}

/// Human readable output: bare messages at INFO, a coloured level tag
/// otherwise. Debug runs also show which operation logged the line.
pub struct PkitFormatter {
    detailed: bool,
}

impl<S, N> FormatEvent<S, N> for PkitFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let mut fields = RecordFields::default();
        event.record(&mut fields);

        match *event.metadata().level() {
            Level::TRACE => write!(writer, "{} ", Colored(Magenta, "[TRACE]"))?,
            Level::DEBUG => write!(writer, "{} ", Colored(Blue, "[DEBUG]"))?,
            Level::INFO => {}
            Level::WARN => write!(writer, "{} ", Colored(Yellow, "[WARN]"))?,
            Level::ERROR => write!(writer, "{} ", Colored(Red, "[ERROR]"))?,
        }

        writeln!(writer, "{}", fields.render(self.detailed))
    }
}

/// Where a record ends up. Results go to stdout, diagnostics to stderr so
/// they never mix into piped output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    fn for_level(level: &Level) -> Self {
        if *level == Level::INFO {
            Stream::Stdout
        } else {
            Stream::Stderr
        }
    }
}

struct ProgressAwareWriter;

/// Buffers one record and prints it with the progress bars suspended.
struct RecordWriter {
    buffer: Vec<u8>,
    stream: Stream,
}

impl std::io::Write for RecordWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for RecordWriter {
    fn drop(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let output = String::from_utf8_lossy(&self.buffer);
        let output = output.trim_end_matches('\n');
        crate::progress::suspend(|| {
            match self.stream {
                Stream::Stdout => println!("{output}"),
                Stream::Stderr => eprintln!("{output}"),
            }
        });
    }
}

impl<'a> MakeWriter<'a> for ProgressAwareWriter {
    type Writer = RecordWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RecordWriter {
            buffer: Vec::new(),
            stream: Stream::Stdout,
        }
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        RecordWriter {
            buffer: Vec::new(),
            stream: Stream::for_level(meta.level()),
        }
    }
}

fn filter_level(args: &Args) -> Level {
    if args.quiet {
        Level::ERROR
    } else if args.verbose >= 2 {
        Level::TRACE
    } else if args.verbose == 1 {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

/// Filter directives for every pkit crate at `level`, unless `env_override`
/// supplies its own.
fn filter_directives(level: Level, env_override: Option<&str>) -> String {
    match env_override.map(str::trim) {
        Some(directives) if !directives.is_empty() => directives.to_string(),
        _ => {
            ["pkit", "pkit_catalog", "pkit_config", "pkit_core", "pkit_operations"]
                .iter()
                .map(|target| format!("{target}={}", level.as_str().to_ascii_lowercase()))
                .collect::<Vec<_>>()
                .join(",")
        }
    }
}

pub fn setup_logging(args: &Args) {
    let level = filter_level(args);
    let env_override = std::env::var(LOG_ENV).ok();
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter_directives(level, env_override.as_deref()))
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(ProgressAwareWriter)
        .without_time();

    let subscriber: Box<dyn Subscriber + Send + Sync> = if args.json {
        Box::new(builder.json().flatten_event(true).finish())
    } else {
        Box::new(
            builder
                .event_format(PkitFormatter {
                    detailed: level >= Level::DEBUG,
                })
                .finish(),
        )
    };

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_filter_level_from_flags() {
        let level = |argv: &[&str]| filter_level(&Args::parse_from(argv));
        assert_eq!(level(&["pkit", "repos"]), Level::INFO);
        assert_eq!(level(&["pkit", "-v", "repos"]), Level::DEBUG);
        assert_eq!(level(&["pkit", "-vvv", "repos"]), Level::TRACE);
        assert_eq!(level(&["pkit", "-q", "-v", "repos"]), Level::ERROR);
    }

    #[test]
    fn test_filter_directives_cover_library_crates() {
        let directives = filter_directives(Level::DEBUG, None);
        assert!(directives.starts_with("pkit=debug,"));
        assert!(directives.contains("pkit_operations=debug"));
        assert!(directives.contains("pkit_catalog=debug"));
    }

    #[test]
    fn test_env_override_replaces_directives() {
        assert_eq!(
            filter_directives(Level::INFO, Some("pkit_catalog=trace")),
            "pkit_catalog=trace"
        );
        assert_eq!(
            filter_directives(Level::ERROR, Some("  ")),
            filter_directives(Level::ERROR, None)
        );
    }

    #[test]
    fn test_render_operation_fields() {
        let fields = RecordFields {
            message: Some("removing package".to_string()),
            op_id: Some(7),
            extra: vec![("package_id", "foo".to_string())],
        };
        assert_eq!(fields.render(false), "removing package");
        assert_eq!(
            fields.render(true),
            "[op 7] removing package package_id=foo"
        );
    }

    #[test]
    fn test_render_without_operation() {
        let fields = RecordFields {
            message: Some("Refreshed 2 repositories".to_string()),
            ..Default::default()
        };
        assert_eq!(fields.render(true), "Refreshed 2 repositories");
    }

    #[test]
    fn test_diagnostics_go_to_stderr() {
        assert_eq!(Stream::for_level(&Level::INFO), Stream::Stdout);
        assert_eq!(Stream::for_level(&Level::WARN), Stream::Stderr);
        assert_eq!(Stream::for_level(&Level::DEBUG), Stream::Stderr);
    }
}
